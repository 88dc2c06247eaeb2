//! Arbitrage entry points.
//!
//! Each function here is one top-level operation of the executor. They fail as a
//! whole: any error, wherever it came from, is returned as is and the host
//! unwinds every write the transaction made.

use alloy::primitives::{Address, I256, U256};
use log::{debug, info};

use super::adapters;
use super::coordinator;
use super::strategy::{ArbitragePayload, SellStrategy};
use super::swap::Direction;
use crate::abi::ILstArbitrage;
use crate::chain::{erc20, Host, Revert};

/// Borrows `amount_in` of `base_asset` from `vault`, mints `lst` with it, sells
/// the shares as `sell_payload` says and repays the loan. Returns the profit in
/// `base_asset`.
///
/// The payload is decoded before anything is borrowed, so an unknown venue
/// fails without a single external call.
///
/// # Errors
///
/// [`Revert::UnsupportedStrategy`] or [`Revert::Decode`] for a bad payload,
/// otherwise whatever the loan and its callback revert with.
pub fn run_vault_arbitrage(
    host: &mut Host,
    executor: Address,
    vault: Address,
    lst: Address,
    base_asset: Address,
    amount_in: U256,
    sell_payload: &[u8],
) -> Result<U256, Revert> {
    let strategy = SellStrategy::decode(sell_payload)?;
    let profit = coordinator::flash_loan(
        host,
        executor,
        vault,
        base_asset,
        amount_in,
        &ArbitragePayload { lst, strategy },
    )?;
    info!("orchestrator::run_vault_arbitrage: {amount_in} via {} made {profit}", strategy.kind());
    Ok(profit)
}

/// Buys the LST from an ordered pool with `amount_in` of the other token,
/// redeems it in the swap callback and repays the pool with the proceeds.
/// Returns the profit in the input token.
///
/// # Errors
///
/// [`Revert::Unprofitable`] if the executor ends with less of the input token
/// than it started with. If it cannot fund the repayment at all, the pool's own
/// payment check (or the token's balance check) fails first.
pub fn run_flash_swap_arbitrage(
    host: &mut Host,
    executor: Address,
    pool: Address,
    direction: Direction,
    amount_in: U256,
) -> Result<U256, Revert> {
    let tokens = adapters::ordered_pool_tokens(host, executor, pool, direction)?;
    let token_in = tokens.0;
    let before = erc20::balance_of(host, executor, token_in, executor)?;

    adapters::flash_swap_ordered_pool(host, executor, pool, direction, tokens, amount_in)?;

    let after = erc20::balance_of(host, executor, token_in, executor)?;
    let profit = require_profit(token_in, after, before)?;
    info!("orchestrator::run_flash_swap_arbitrage: {amount_in} {token_in} on {pool} made {profit}");
    Ok(profit)
}

/// Profit gate: `balance - cost`, or [`Revert::Unprofitable`] if that would be
/// negative.
///
/// # Errors
///
/// [`Revert::Unprofitable`] carrying the (negative) shortfall.
pub fn require_profit(token: Address, balance: U256, cost: U256) -> Result<U256, Revert> {
    if balance >= cost {
        return Ok(balance - cost);
    }
    let shortfall = I256::try_from(cost - balance).unwrap_or(I256::MAX);
    debug!("orchestrator::require_profit: short {shortfall} {token}");
    Err(Revert::Unprofitable {
        token,
        profit: -shortfall,
    })
}

/// `runVaultArbitrage` call selling through `strategy`.
#[must_use]
pub fn vault_arbitrage_call(
    lst: Address,
    base_asset: Address,
    amount_in: U256,
    strategy: &SellStrategy,
) -> ILstArbitrage::runVaultArbitrageCall {
    ILstArbitrage::runVaultArbitrageCall {
        lst,
        baseAsset: base_asset,
        amountIn: amount_in,
        sellPayload: strategy.encode(),
    }
}

/// `runFlashSwapArbitrage` call on `pool`.
#[must_use]
pub const fn flash_swap_arbitrage_call(
    pool: Address,
    direction: Direction,
    amount_in: U256,
) -> ILstArbitrage::runFlashSwapArbitrageCall {
    ILstArbitrage::runFlashSwapArbitrageCall {
        pool,
        zeroForOne: direction.zero_for_one(),
        amountIn: amount_in,
    }
}
