//! Sell-strategy dispatch. A decoded [`SellStrategy`] selects one venue adapter
//! and nothing else is touched.

use alloy::primitives::{Address, U256};
use log::debug;

use super::adapters;
use super::strategy::SellStrategy;
use crate::chain::{Host, Revert};

/// Sells `amount` through exactly one adapter, the one `strategy` names.
///
/// `vault` is the executor's lender, which also hosts the vault pools.
///
/// # Errors
///
/// Whatever the selected adapter reverts with.
pub fn route(
    host: &mut Host,
    executor: Address,
    vault: Address,
    strategy: &SellStrategy,
    amount: U256,
) -> Result<(), Revert> {
    debug!("router::route: {amount} via {} {strategy:?}", strategy.kind());
    match *strategy {
        SellStrategy::OrderedPool { pool, direction } => {
            adapters::sell_ordered_pool(host, executor, pool, direction, amount)
        }
        SellStrategy::VaultPool {
            pool_id,
            token_in,
            token_out,
        } => adapters::sell_vault_pool(host, executor, vault, pool_id, token_in, token_out, amount)
            .map(|_| ()),
        SellStrategy::IndexedPool {
            pool,
            index_in,
            index_out,
        } => adapters::sell_indexed_pool(host, executor, pool, index_in, index_out, amount),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use alloy::sol_types::SolCall;

    use super::*;
    use crate::abi::{IBalancerVault, ICurvePool, IUniswapV3Pool};
    use crate::arb::swap::Direction;
    use crate::arb::test_helpers::{fixture, Fixture};

    #[test]
    fn test_each_strategy_reaches_only_its_venue() {
        let amount = U256::from(10).pow(U256::from(16));
        let deployed = fixture();
        let venues = [
            deployed.ordered_pool,
            deployed.inverted_pool,
            deployed.cheap_pool,
            deployed.cheap_inverted_pool,
            deployed.vault,
            deployed.indexed_pool,
        ];
        let cases = [
            (
                SellStrategy::OrderedPool {
                    pool: deployed.ordered_pool,
                    direction: Direction::ZeroForOne,
                },
                deployed.ordered_pool,
                IUniswapV3Pool::swapCall::SELECTOR,
            ),
            (
                SellStrategy::OrderedPool {
                    pool: deployed.inverted_pool,
                    direction: Direction::OneForZero,
                },
                deployed.inverted_pool,
                IUniswapV3Pool::swapCall::SELECTOR,
            ),
            (
                SellStrategy::VaultPool {
                    pool_id: deployed.vault_pool_id,
                    token_in: deployed.lst,
                    token_out: deployed.weth,
                },
                deployed.vault,
                IBalancerVault::swapCall::SELECTOR,
            ),
            (
                SellStrategy::IndexedPool {
                    pool: deployed.indexed_pool,
                    index_in: U256::from(1),
                    index_out: U256::ZERO,
                },
                deployed.indexed_pool,
                ICurvePool::exchangeCall::SELECTOR,
            ),
        ];

        for (strategy, venue, selector) in cases {
            let Fixture {
                mut host,
                executor,
                vault,
                lst,
                ..
            } = fixture();
            host.deal(lst, executor, amount);

            route(&mut host, executor, vault, &strategy, amount).unwrap();
            assert!(host.trace().iter().any(|record| record.caller == executor
                && record.target == venue
                && record.selector.0 == selector));
            assert!(host
                .trace()
                .iter()
                .filter(|record| venues.contains(&record.target))
                .all(|record| record.target == venue));
            assert_eq!(host.balance_of(lst, executor), U256::ZERO);
        }
    }
}
