//! Minting LST shares with the borrowed base asset.

use alloy::primitives::{Address, U256};
use log::debug;

use crate::abi::IERC4626;
use crate::chain::{erc20, Host, Revert};

/// Deposits `amount` of `base_asset` into the ERC-4626 `lst` and returns the
/// shares minted to the executor.
///
/// The vault's declared asset is checked before anything is approved or moved,
/// and the approval covers exactly `amount`.
///
/// # Errors
///
/// [`Revert::AssetMismatch`] if `lst` is not backed by `base_asset`, otherwise
/// whatever the vault or the token revert with.
pub fn deposit_into_lst(
    host: &mut Host,
    executor: Address,
    lst: Address,
    base_asset: Address,
    amount: U256,
) -> Result<U256, Revert> {
    let asset = host.call_sol(executor, lst, &IERC4626::assetCall {})?._0;
    if asset != base_asset {
        return Err(Revert::AssetMismatch {
            lst,
            expected: base_asset,
            actual: asset,
        });
    }

    erc20::approve(host, executor, base_asset, lst, amount)?;
    let shares = host
        .call_sol(
            executor,
            lst,
            &IERC4626::depositCall {
                assets: amount,
                receiver: executor,
            },
        )?
        ._0;
    debug!("deposit::deposit_into_lst: {amount} {base_asset} -> {shares} {lst}");
    Ok(shares)
}
