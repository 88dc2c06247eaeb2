//! Venue adapters. Each one turns "sell `amount_in` on this venue" into the
//! venue's own calls, made with the executor as `msg.sender`.
//!
//! None of them protects against slippage, and a venue revert is passed through
//! untouched.

use alloy::primitives::{Address, Bytes, B256, I256, U256};
use log::debug;

use super::coordinator;
use super::swap::{Direction, RepayPlan, SwapCallbackData};
use crate::abi::{IBalancerVault, ICurvePool, IUniswapV3Pool};
use crate::chain::{erc20, Host, Revert};
use crate::utils::constants::{
    NO_DEADLINE, ONE_FOR_ZERO_PRICE_LIMIT, SWAP_KIND_GIVEN_IN, ZERO_FOR_ONE_PRICE_LIMIT,
};

/// Sells `amount_in` through an ordered pool. The pool is paid from the executor's
/// balance when it calls back.
///
/// # Errors
///
/// Whatever the pool, its tokens or the swap callback revert with.
pub fn sell_ordered_pool(
    host: &mut Host,
    executor: Address,
    pool: Address,
    direction: Direction,
    amount_in: U256,
) -> Result<(), Revert> {
    let (token_in, _) = ordered_pool_tokens(host, executor, pool, direction)?;
    let data = SwapCallbackData {
        pool,
        token_in,
        plan: RepayPlan::DirectRepay,
    };
    ordered_pool_swap(host, executor, pool, direction, amount_in, data)?;
    Ok(())
}

/// Buys `token_out` with `amount_in` of `token_in` that the executor does not
/// hold yet: the received LST shares are redeemed inside the callback and the
/// proceeds repay the pool.
///
/// # Errors
///
/// Whatever the pool, its tokens, the LST vault or the swap callback revert with.
pub fn flash_swap_ordered_pool(
    host: &mut Host,
    executor: Address,
    pool: Address,
    direction: Direction,
    (token_in, token_out): (Address, Address),
    amount_in: U256,
) -> Result<(), Revert> {
    let data = SwapCallbackData {
        pool,
        token_in,
        plan: RepayPlan::RedeemThenRepay { lst: token_out },
    };
    ordered_pool_swap(host, executor, pool, direction, amount_in, data)?;
    Ok(())
}

/// `(token_in, token_out)` of an ordered pool for `direction`.
///
/// # Errors
///
/// Whatever the pool reverts with.
pub fn ordered_pool_tokens(
    host: &mut Host,
    executor: Address,
    pool: Address,
    direction: Direction,
) -> Result<(Address, Address), Revert> {
    let token0 = host
        .call_sol(executor, pool, &IUniswapV3Pool::token0Call {})?
        ._0;
    let token1 = host
        .call_sol(executor, pool, &IUniswapV3Pool::token1Call {})?
        ._0;
    Ok(match direction {
        Direction::ZeroForOne => (token0, token1),
        Direction::OneForZero => (token1, token0),
    })
}

/// Calls `swap` as an exact-input trade with a price limit that never binds.
fn ordered_pool_swap(
    host: &mut Host,
    executor: Address,
    pool: Address,
    direction: Direction,
    amount_in: U256,
    data: SwapCallbackData,
) -> Result<(I256, I256), Revert> {
    let amount_specified =
        I256::try_from(amount_in).map_err(|_| Revert::Decode(format!("amount {amount_in} exceeds int256")))?;
    let sqrt_price_limit = match direction {
        Direction::ZeroForOne => ZERO_FOR_ONE_PRICE_LIMIT,
        Direction::OneForZero => ONE_FOR_ZERO_PRICE_LIMIT,
    };
    debug!("adapters::ordered_pool_swap: {pool} {direction} {amount_in} with {:?}", data.plan);

    coordinator::flash_swap(
        host,
        executor,
        pool,
        &IUniswapV3Pool::swapCall {
            recipient: executor,
            zeroForOne: direction.zero_for_one(),
            amountSpecified: amount_specified,
            sqrtPriceLimitX96: sqrt_price_limit,
            data: data.encode(),
        },
    )
}

/// Sells `amount_in` of `token_in` for `token_out` in vault pool `pool_id`.
///
/// # Errors
///
/// Whatever the vault or the tokens revert with.
pub fn sell_vault_pool(
    host: &mut Host,
    executor: Address,
    vault: Address,
    pool_id: B256,
    token_in: Address,
    token_out: Address,
    amount_in: U256,
) -> Result<U256, Revert> {
    erc20::approve(host, executor, token_in, vault, U256::MAX)?;
    let amount_out = host
        .call_sol(
            executor,
            vault,
            &IBalancerVault::swapCall {
                singleSwap: IBalancerVault::SingleSwap {
                    poolId: pool_id,
                    kind: SWAP_KIND_GIVEN_IN,
                    assetIn: token_in,
                    assetOut: token_out,
                    amount: amount_in,
                    userData: Bytes::new(),
                },
                funds: IBalancerVault::FundManagement {
                    sender: executor,
                    fromInternalBalance: false,
                    recipient: executor,
                    toInternalBalance: false,
                },
                limit: U256::ZERO,
                deadline: NO_DEADLINE,
            },
        )?
        ._0;
    debug!("adapters::sell_vault_pool: {pool_id} {amount_in} {token_in} -> {amount_out} {token_out}");
    Ok(amount_out)
}

/// Sells `amount_in` of coin `index_in` for coin `index_out` in an indexed pool.
///
/// # Errors
///
/// Whatever the pool or the tokens revert with.
pub fn sell_indexed_pool(
    host: &mut Host,
    executor: Address,
    pool: Address,
    index_in: U256,
    index_out: U256,
    amount_in: U256,
) -> Result<(), Revert> {
    let token_in = host
        .call_sol(executor, pool, &ICurvePool::coinsCall { index: index_in })?
        ._0;
    erc20::approve(host, executor, token_in, pool, amount_in)?;
    host.call_sol(
        executor,
        pool,
        &ICurvePool::exchangeCall {
            i: index_in,
            j: index_out,
            dx: amount_in,
            min_dy: U256::ZERO,
        },
    )?;
    debug!("adapters::sell_indexed_pool: {pool} {amount_in} of coin {index_in} for coin {index_out}");
    Ok(())
}
