//! Search for the borrow size that maximises profit.
//!
//! The profit curve of a round trip through constant-product venues is concave
//! in the amount borrowed, so a bracketing grid search converges on the peak:
//! try evenly spaced amounts, keep the best, shrink the bracket to one step on
//! either side of it, repeat until the bracket is narrower than the tolerance.

use std::time::Instant;

use alloy::primitives::{Address, U256};
use eyre::Result;
use futures::future::join_all;
use log::{debug, info};

use super::orchestrator::{flash_swap_arbitrage_call, vault_arbitrage_call};
use super::strategy::SellStrategy;
use super::swap::Direction;
use crate::chain::{Host, Revert};

/// What to size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// `runVaultArbitrage` selling through `strategy`
    Vault {
        /// LST minted with the loan
        lst: Address,
        /// Asset borrowed and measured in
        base_asset: Address,
        /// Where the LST is sold
        strategy: SellStrategy,
    },
    /// `runFlashSwapArbitrage` on `pool`
    FlashSwap {
        /// Ordered pool the LST is bought from
        pool: Address,
        /// Direction of the purchase
        direction: Direction,
    },
}

/// Who sends the simulated transactions, and to which executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sender {
    /// Externally owned caller
    pub caller: Address,
    /// Deployed executor
    pub executor: Address,
}

/// Fewest grid intervals that still shrink the bracket every round. With one
/// interval the step spans the whole bracket, and with two a best candidate in
/// the middle rebuilds the same bracket.
pub const MIN_SEARCH_INTERVALS: u64 = 3;

/// Grid search settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchParams {
    /// Grid intervals per round; `intervals + 1` candidates are tried. Raised
    /// to [`MIN_SEARCH_INTERVALS`] when lower
    pub intervals: u64,
    /// Stop once the bracket is at most this wide
    pub tolerance: U256,
    /// Largest amount ever tried
    pub ceiling: U256,
}

impl Default for SearchParams {
    fn default() -> Self {
        let ether = U256::from(10).pow(U256::from(18));
        Self {
            intervals: 10,
            // 0.001 ether
            tolerance: U256::from(10).pow(U256::from(15)),
            ceiling: ether * U256::from(1_000),
        }
    }
}

/// Best amount found and the profit it makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Optimized {
    /// Amount to borrow
    pub amount_in: U256,
    /// Profit at that amount, in the borrowed asset
    pub profit: U256,
}

/// Runs `target` with `amount_in` against `host` and discards the effects.
///
/// # Errors
///
/// The revert the transaction would hit.
pub fn simulate(host: &mut Host, sender: Sender, target: &Target, amount_in: U256) -> Result<U256, Revert> {
    let Sender { caller, executor } = sender;
    match *target {
        Target::Vault {
            lst,
            base_asset,
            strategy,
        } => Ok(host
            .simulate_sol(
                caller,
                executor,
                &vault_arbitrage_call(lst, base_asset, amount_in, &strategy),
            )?
            ._0),
        Target::FlashSwap { pool, direction } => Ok(host
            .simulate_sol(
                caller,
                executor,
                &flash_swap_arbitrage_call(pool, direction, amount_in),
            )?
            ._0),
    }
}

/// Searches `[0, params.ceiling]` for the most profitable `amount_in`.
///
/// Candidates of one round are simulated concurrently, each on its own copy of
/// `host`. A candidate that reverts scores zero.
///
/// # Errors
///
/// Only if a simulation task panics.
pub async fn optimize_amount_in(
    host: &Host,
    sender: Sender,
    target: Target,
    params: SearchParams,
) -> Result<Optimized> {
    let SearchParams {
        intervals,
        tolerance,
        ceiling,
    } = params;
    let intervals = U256::from(intervals.max(MIN_SEARCH_INTERVALS));

    let mut min_amount_in = U256::ZERO;
    let mut max_amount_in = ceiling;
    let mut best = Optimized::default();

    while max_amount_in - min_amount_in > tolerance {
        let step = (max_amount_in - min_amount_in) / intervals;
        if step.is_zero() {
            break;
        }

        let mut candidates = Vec::new();
        let mut i = U256::ZERO;
        while i <= intervals {
            let amount_in = (min_amount_in + i * step).min(ceiling);
            candidates.push(amount_in);
            if amount_in == ceiling {
                break;
            }
            i += U256::from(1);
        }

        let started = Instant::now();
        let tasks = candidates.iter().map(|amount_in| {
            let mut host = host.clone();
            let amount_in = *amount_in;
            tokio::task::spawn_blocking(move || {
                simulate(&mut host, sender, &target, amount_in).unwrap_or(U256::ZERO)
            })
        });
        let profits = join_all(tasks).await.into_iter().collect::<Result<Vec<_>, _>>()?;
        debug!(
            "optimizer::optimize_amount_in: {} candidates in [{min_amount_in}, {max_amount_in}] took {}ms",
            candidates.len(),
            started.elapsed().as_millis()
        );

        let mut best_local = Optimized {
            amount_in: min_amount_in,
            profit: U256::ZERO,
        };
        for (amount_in, profit) in candidates.into_iter().zip(profits) {
            debug!("optimizer::optimize_amount_in: amount_in={amount_in}, profit={profit}");
            if profit > best_local.profit {
                best_local = Optimized { amount_in, profit };
            }
            if profit > best.profit {
                best = Optimized { amount_in, profit };
            }
        }

        if best_local.amount_in == min_amount_in {
            max_amount_in = (best_local.amount_in + step).min(ceiling);
        } else if best_local.amount_in == max_amount_in {
            // the peak may lie right at the upper bound, keep it
            min_amount_in = max_amount_in.saturating_sub(step);
        } else {
            min_amount_in = best_local.amount_in.saturating_sub(step);
            max_amount_in = (best_local.amount_in + step).min(ceiling);
        }
    }

    info!(
        "optimizer::optimize_amount_in: best amount_in={}, profit={}",
        best.amount_in, best.profit
    );
    Ok(best)
}
