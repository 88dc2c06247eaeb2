use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::{SolCall, SolInterface};
use log::debug;

use crate::abi::IERC20::IERC20Calls;
use crate::abi::IERC4626::{self, IERC4626Calls};
use crate::chain::{erc20, CallContext, Contract, Host, Revert};

/// Liquid-staking token exposed as an ERC-4626 vault.
///
/// The share token is the vault address itself. `totalAssets` is whatever amount
/// of the underlying the vault holds, so staking rewards can be simulated by simply
/// sending it more underlying.
#[derive(Debug, Clone)]
pub struct LstVault {
    /// Underlying asset accepted by `deposit`
    pub asset: Address,
    /// Share ticker, for logs only
    pub symbol: String,
}

impl LstVault {
    /// Creates a vault over `asset`.
    pub fn new(asset: Address, symbol: impl Into<String>) -> Self {
        Self {
            asset,
            symbol: symbol.into(),
        }
    }

    /// Underlying held by the vault at `vault`.
    fn total_assets(&self, host: &Host, vault: Address) -> U256 {
        host.balance_of(self.asset, vault)
    }

    /// Shares minted for `assets`, rounded down. An empty vault mints 1:1.
    #[must_use]
    pub fn convert_to_shares(&self, host: &Host, vault: Address, assets: U256) -> U256 {
        let supply = host.ledger().total_supply(vault);
        let total_assets = self.total_assets(host, vault);
        if supply.is_zero() || total_assets.is_zero() {
            assets
        } else {
            assets * supply / total_assets
        }
    }

    /// Underlying paid out for `shares`, rounded down.
    #[must_use]
    pub fn convert_to_assets(&self, host: &Host, vault: Address, shares: U256) -> U256 {
        let supply = host.ledger().total_supply(vault);
        if supply.is_zero() {
            shares
        } else {
            shares * self.total_assets(host, vault) / supply
        }
    }
}

impl Contract for LstVault {
    fn call(&self, host: &mut Host, ctx: CallContext, input: &[u8]) -> Result<Bytes, Revert> {
        if erc20::is_erc20_call(input) {
            return erc20::dispatch(host, ctx, IERC20Calls::abi_decode(input, true)?);
        }

        let vault = ctx.address;
        let output = match IERC4626Calls::abi_decode(input, true)? {
            IERC4626Calls::asset(_) => IERC4626::assetCall::abi_encode_returns(&(self.asset,)),
            IERC4626Calls::totalAssets(_) => {
                IERC4626::totalAssetsCall::abi_encode_returns(&(self.total_assets(host, vault),))
            }
            IERC4626Calls::convertToShares(IERC4626::convertToSharesCall { assets }) => {
                let shares = self.convert_to_shares(host, vault, assets);
                IERC4626::convertToSharesCall::abi_encode_returns(&(shares,))
            }
            IERC4626Calls::convertToAssets(IERC4626::convertToAssetsCall { shares }) => {
                let assets = self.convert_to_assets(host, vault, shares);
                IERC4626::convertToAssetsCall::abi_encode_returns(&(assets,))
            }
            IERC4626Calls::deposit(IERC4626::depositCall { assets, receiver }) => {
                let shares = self.convert_to_shares(host, vault, assets);
                if shares.is_zero() {
                    return Err(Revert::venue(vault, "ZERO_SHARES"));
                }
                erc20::transfer_from(host, vault, self.asset, ctx.caller, vault, assets)?;
                host.ledger_mut().mint(vault, receiver, shares);
                debug!(
                    "{}::deposit: {assets} assets -> {shares} shares for {receiver}",
                    self.symbol
                );
                IERC4626::depositCall::abi_encode_returns(&(shares,))
            }
            IERC4626Calls::redeem(IERC4626::redeemCall {
                shares,
                receiver,
                owner,
            }) => {
                if ctx.caller != owner {
                    host.ledger_mut()
                        .spend_allowance(vault, owner, ctx.caller, shares)?;
                }
                let assets = self.convert_to_assets(host, vault, shares);
                if assets.is_zero() {
                    return Err(Revert::venue(vault, "ZERO_ASSETS"));
                }
                host.ledger_mut().burn(vault, owner, shares)?;
                erc20::transfer(host, vault, self.asset, receiver, assets)?;
                debug!(
                    "{}::redeem: {shares} shares -> {assets} assets for {receiver}",
                    self.symbol
                );
                IERC4626::redeemCall::abi_encode_returns(&(assets,))
            }
        };
        Ok(output.into())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::abi::IERC20;
    use crate::chain::erc20::Erc20Token;
    use crate::chain::BlockEnv;

    fn setup() -> (Host, Address, Address, Address) {
        let weth = Address::repeat_byte(0x01);
        let lst = Address::repeat_byte(0x02);
        let user = Address::repeat_byte(0x03);
        let mut host = Host::new(BlockEnv::default());
        host.deploy(weth, Arc::new(Erc20Token::new("WETH", 18)));
        host.deploy(lst, Arc::new(LstVault::new(weth, "stETH")));
        // 1100 assets backing 1000 shares: 1.1 per share
        host.deal(weth, lst, U256::from(1_100));
        host.deal(lst, Address::repeat_byte(0x09), U256::from(1_000));
        host.deal(weth, user, U256::from(110));
        (host, weth, lst, user)
    }

    #[test]
    fn test_deposit_and_redeem() {
        let (mut host, weth, lst, user) = setup();

        erc20::approve(&mut host, user, weth, lst, U256::from(110)).unwrap();
        let shares = host
            .transact_sol(
                user,
                lst,
                &IERC4626::depositCall {
                    assets: U256::from(110),
                    receiver: user,
                },
            )
            .unwrap()
            ._0;
        assert_eq!(shares, U256::from(100));
        assert_eq!(host.balance_of(lst, user), U256::from(100));
        assert_eq!(host.balance_of(weth, user), U256::ZERO);

        let assets = host
            .transact_sol(
                user,
                lst,
                &IERC4626::redeemCall {
                    shares: U256::from(100),
                    receiver: user,
                    owner: user,
                },
            )
            .unwrap()
            ._0;
        assert_eq!(assets, U256::from(110));
        assert_eq!(host.ledger().total_supply(lst), U256::from(1_000));
    }

    #[test]
    fn test_deposit_requires_allowance() {
        let (mut host, _, lst, user) = setup();
        let err = host
            .transact_sol(
                user,
                lst,
                &IERC4626::depositCall {
                    assets: U256::from(110),
                    receiver: user,
                },
            )
            .unwrap_err();
        assert!(matches!(err, Revert::InsufficientAllowance { .. }));
        assert_eq!(host.balance_of(lst, user), U256::ZERO);
    }

    #[test]
    fn test_share_token_is_erc20() {
        let (mut host, weth, lst, user) = setup();
        let asset = host
            .simulate_sol(user, lst, &IERC4626::assetCall {})
            .unwrap()
            ._0;
        assert_eq!(asset, weth);

        let supply = host
            .simulate_sol(user, lst, &IERC20::totalSupplyCall {})
            .unwrap()
            ._0;
        assert_eq!(supply, U256::from(1_000));
    }
}
