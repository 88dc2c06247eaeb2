use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::{SolCall, SolInterface};
use log::debug;

use super::amm;
use crate::abi::ICurvePool::{self, ICurvePoolCalls};
use crate::chain::{erc20, CallContext, Contract, Host, Revert};

/// Curve-style pool addressing its coins by index.
///
/// `exchange` pulls `dx` from the caller with `transferFrom` and sends the output
/// back to the caller. Reserves are the pool's own balances.
#[derive(Debug, Clone)]
pub struct IndexedPool {
    /// Coins by index
    pub coins: Vec<Address>,
    /// Swap fee in basis points
    pub fee_bps: u32,
}

impl IndexedPool {
    /// Creates a pool over `coins`.
    #[must_use]
    pub const fn new(coins: Vec<Address>, fee_bps: u32) -> Self {
        Self { coins, fee_bps }
    }

    /// Coin at `index`.
    fn coin(&self, pool: Address, index: U256) -> Result<Address, Revert> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.coins.get(i).copied())
            .ok_or_else(|| Revert::venue(pool, "coin index out of range"))
    }

    /// Output of exchanging `dx` of coin `i` for coin `j`.
    ///
    /// # Errors
    ///
    /// [`Revert::Venue`] if either index is out of range or both are the same.
    pub fn get_dy(&self, host: &Host, pool: Address, i: U256, j: U256, dx: U256) -> Result<U256, Revert> {
        if i == j {
            return Err(Revert::venue(pool, "same coin"));
        }
        let (coin_in, coin_out) = (self.coin(pool, i)?, self.coin(pool, j)?);
        Ok(amm::amount_out(
            host.balance_of(coin_in, pool),
            host.balance_of(coin_out, pool),
            dx,
            self.fee_bps,
        ))
    }
}

impl Contract for IndexedPool {
    fn call(&self, host: &mut Host, ctx: CallContext, input: &[u8]) -> Result<Bytes, Revert> {
        let pool = ctx.address;
        let output = match ICurvePoolCalls::abi_decode(input, true)? {
            ICurvePoolCalls::coins(ICurvePool::coinsCall { index }) => {
                ICurvePool::coinsCall::abi_encode_returns(&(self.coin(pool, index)?,))
            }
            ICurvePoolCalls::get_dy(ICurvePool::get_dyCall { i, j, dx }) => {
                ICurvePool::get_dyCall::abi_encode_returns(&(self.get_dy(host, pool, i, j, dx)?,))
            }
            ICurvePoolCalls::exchange(ICurvePool::exchangeCall { i, j, dx, min_dy }) => {
                let dy = self.get_dy(host, pool, i, j, dx)?;
                if dy.is_zero() || dy < min_dy {
                    return Err(Revert::venue(pool, "Exchange resulted in fewer coins than expected"));
                }
                let (coin_in, coin_out) = (self.coin(pool, i)?, self.coin(pool, j)?);
                erc20::transfer_from(host, pool, coin_in, ctx.caller, pool, dx)?;
                erc20::transfer(host, pool, coin_out, ctx.caller, dy)?;
                debug!("curve::exchange: {pool} {dx} {coin_in} -> {dy} {coin_out}");
                ICurvePool::exchangeCall::abi_encode_returns(&())
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
    use crate::chain::erc20::Erc20Token;
    use crate::chain::BlockEnv;

    fn setup() -> (Host, Address, Address, Address, Address) {
        let (token0, token1) = (Address::repeat_byte(0x01), Address::repeat_byte(0x02));
        let pool = Address::repeat_byte(0x50);
        let trader = Address::repeat_byte(0x60);
        let mut host = Host::new(BlockEnv::default());
        host.deploy(token0, Arc::new(Erc20Token::new("A", 18)));
        host.deploy(token1, Arc::new(Erc20Token::new("B", 18)));
        host.deploy(pool, Arc::new(IndexedPool::new(vec![token0, token1], 30)));
        host.deal(token0, pool, U256::from(100));
        host.deal(token1, pool, U256::from(200));
        host.deal(token0, trader, U256::from(10));
        (host, pool, trader, token0, token1)
    }

    #[test]
    fn test_exchange() {
        let (mut host, pool, trader, token0, token1) = setup();
        erc20::approve(&mut host, trader, token0, pool, U256::from(10)).unwrap();
        host.transact_sol(
            trader,
            pool,
            &ICurvePool::exchangeCall {
                i: U256::ZERO,
                j: U256::from(1),
                dx: U256::from(10),
                min_dy: U256::ZERO,
            },
        )
        .unwrap();
        assert_eq!(host.balance_of(token1, trader), U256::from(18));
        assert_eq!(host.balance_of(token0, pool), U256::from(110));
    }

    #[test]
    fn test_exchange_min_dy() {
        let (mut host, pool, trader, token0, _) = setup();
        erc20::approve(&mut host, trader, token0, pool, U256::from(10)).unwrap();
        let err = host
            .transact_sol(
                trader,
                pool,
                &ICurvePool::exchangeCall {
                    i: U256::ZERO,
                    j: U256::from(1),
                    dx: U256::from(10),
                    min_dy: U256::from(19),
                },
            )
            .unwrap_err();
        assert!(matches!(err, Revert::Venue { .. }));
    }

    #[test]
    fn test_coins_out_of_range() {
        let (mut host, pool, trader, token0, _) = setup();
        let coin = host
            .simulate_sol(trader, pool, &ICurvePool::coinsCall { index: U256::ZERO })
            .unwrap()
            ._0;
        assert_eq!(coin, token0);
        assert!(host
            .simulate_sol(trader, pool, &ICurvePool::coinsCall { index: U256::from(2) })
            .is_err());
    }
}
