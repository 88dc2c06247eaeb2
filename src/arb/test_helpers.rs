//! Shared fixtures for unit tests, integration tests and benches.
//!
//! One LST backed 1.1 to 1 by WETH, priced by every venue above its redemption
//! value except for `cheap_pool` and `cheap_inverted_pool`, where it trades
//! below it. Each ordered pool has a twin with the tokens in the other order.

use std::collections::BTreeMap;

use alloy::primitives::{b256, Address, B256, U256};

use super::strategy::SellStrategy;
use super::swap::Direction;
use crate::bootstrap::types::{
    BlockSpec, ExecutorSpec, FlashVaultSpec, IndexedPoolSpec, LiquiditySpec, LstVaultSpec,
    OrderedPoolSpec, RouteSpec, Scenario, TokenSpec, VaultPoolSpec,
};
use crate::bootstrap::{deploy, Deployment};
use crate::chain::Host;

/// Base asset
pub const WETH: Address = Address::repeat_byte(0x01);
/// LST vault and share token
pub const LST: Address = Address::repeat_byte(0x02);
/// Ordered pool, token0 = LST, token1 = WETH
pub const ORDERED_POOL: Address = Address::repeat_byte(0x10);
/// Ordered pool, token0 = WETH, token1 = LST, LST below redemption value
pub const CHEAP_POOL: Address = Address::repeat_byte(0x11);
/// Ordered pool, token0 = WETH, token1 = LST
pub const INVERTED_POOL: Address = Address::repeat_byte(0x12);
/// Ordered pool, token0 = LST, token1 = WETH, LST below redemption value
pub const CHEAP_INVERTED_POOL: Address = Address::repeat_byte(0x13);
/// Flash-loan vault
pub const VAULT: Address = Address::repeat_byte(0x30);
/// LST/WETH pool inside the vault
pub const VAULT_POOL_ID: B256 =
    b256!("0x1e19cf2d73a72ef1332c882f20534b6519be0276000200000000000000000112");
/// Indexed pool, coins [WETH, LST]
pub const INDEXED_POOL: Address = Address::repeat_byte(0x50);
/// Executor
pub const EXECUTOR: Address = Address::repeat_byte(0xa0);
/// Operator sending transactions to the executor
pub const OPERATOR: Address = Address::repeat_byte(0xb0);

/// `amount` whole tokens of 18 decimals.
#[must_use]
pub fn ether(amount: u64) -> U256 {
    U256::from(amount) * U256::from(10).pow(U256::from(18))
}

/// The fixture scenario. Tests tweak it before deploying.
#[must_use]
pub fn scenario() -> Scenario {
    let routes = BTreeMap::from([
        (
            "ordered".to_string(),
            RouteSpec {
                lst: LST,
                base_asset: WETH,
                strategy: SellStrategy::OrderedPool {
                    pool: ORDERED_POOL,
                    direction: Direction::ZeroForOne,
                },
            },
        ),
        (
            "inverted".to_string(),
            RouteSpec {
                lst: LST,
                base_asset: WETH,
                strategy: SellStrategy::OrderedPool {
                    pool: INVERTED_POOL,
                    direction: Direction::OneForZero,
                },
            },
        ),
        (
            "vault".to_string(),
            RouteSpec {
                lst: LST,
                base_asset: WETH,
                strategy: SellStrategy::VaultPool {
                    pool_id: VAULT_POOL_ID,
                    token_in: LST,
                    token_out: WETH,
                },
            },
        ),
        (
            "indexed".to_string(),
            RouteSpec {
                lst: LST,
                base_asset: WETH,
                strategy: SellStrategy::IndexedPool {
                    pool: INDEXED_POOL,
                    index_in: U256::from(1),
                    index_out: U256::ZERO,
                },
            },
        ),
    ]);

    Scenario {
        block: BlockSpec {
            number: 19_000_000,
            timestamp: 1_705_000_000,
        },
        tokens: vec![TokenSpec {
            address: WETH,
            symbol: "WETH".to_string(),
            decimals: 18,
        }],
        lst_vaults: vec![LstVaultSpec {
            address: LST,
            symbol: "stETH".to_string(),
            asset: WETH,
            assets: ether(11_000),
            shares: ether(10_000),
            share_holder: Address::repeat_byte(0xde),
        }],
        ordered_pools: vec![
            OrderedPoolSpec {
                address: ORDERED_POOL,
                token0: LST,
                token1: WETH,
                fee_bps: 30,
                reserve0: ether(1_000),
                reserve1: ether(1_150),
            },
            OrderedPoolSpec {
                address: CHEAP_POOL,
                token0: WETH,
                token1: LST,
                fee_bps: 30,
                reserve0: ether(1_000),
                reserve1: ether(1_000),
            },
            OrderedPoolSpec {
                address: INVERTED_POOL,
                token0: WETH,
                token1: LST,
                fee_bps: 30,
                reserve0: ether(1_150),
                reserve1: ether(1_000),
            },
            OrderedPoolSpec {
                address: CHEAP_INVERTED_POOL,
                token0: LST,
                token1: WETH,
                fee_bps: 30,
                reserve0: ether(1_000),
                reserve1: ether(1_000),
            },
        ],
        flash_vault: FlashVaultSpec {
            address: VAULT,
            pools: vec![VaultPoolSpec {
                pool_id: VAULT_POOL_ID,
                token_a: LST,
                token_b: WETH,
                fee_bps: 30,
                balance_a: ether(1_000),
                balance_b: ether(1_150),
            }],
            liquidity: vec![LiquiditySpec {
                token: WETH,
                amount: ether(10_000),
            }],
        },
        indexed_pools: vec![IndexedPoolSpec {
            address: INDEXED_POOL,
            coins: vec![WETH, LST],
            fee_bps: 4,
            balances: vec![ether(1_150), ether(1_000)],
        }],
        executor: ExecutorSpec {
            address: EXECUTOR,
            operator: OPERATOR,
            unchecked_swap_callback: false,
        },
        funding: Vec::new(),
        routes,
    }
}

/// A deployed fixture with every address spelled out.
#[derive(Debug, Clone)]
pub struct Fixture {
    /// The simulated chain
    pub host: Host,
    /// Executor
    pub executor: Address,
    /// Operator
    pub operator: Address,
    /// Base asset
    pub weth: Address,
    /// LST
    pub lst: Address,
    /// Flash-loan vault
    pub vault: Address,
    /// LST/WETH pool inside the vault
    pub vault_pool_id: B256,
    /// LST-over-WETH ordered pool
    pub ordered_pool: Address,
    /// WETH-over-LST ordered pool with cheap LST
    pub cheap_pool: Address,
    /// WETH-over-LST twin of `ordered_pool`
    pub inverted_pool: Address,
    /// LST-over-WETH twin of `cheap_pool`
    pub cheap_inverted_pool: Address,
    /// Indexed pool
    pub indexed_pool: Address,
    /// Named routes
    pub routes: BTreeMap<String, RouteSpec>,
}

impl From<Deployment> for Fixture {
    fn from(deployment: Deployment) -> Self {
        Self {
            host: deployment.host,
            executor: deployment.executor,
            operator: deployment.operator,
            weth: WETH,
            lst: LST,
            vault: deployment.vault,
            vault_pool_id: VAULT_POOL_ID,
            ordered_pool: ORDERED_POOL,
            cheap_pool: CHEAP_POOL,
            inverted_pool: INVERTED_POOL,
            cheap_inverted_pool: CHEAP_INVERTED_POOL,
            indexed_pool: INDEXED_POOL,
            routes: deployment.routes,
        }
    }
}

/// Deploys `scenario`.
///
/// # Panics
///
/// If the scenario does not deploy.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn fixture_from(scenario: &Scenario) -> Fixture {
    deploy(scenario).unwrap().into()
}

/// Deploys the unmodified fixture scenario.
///
/// # Panics
///
/// Never for the bundled fixture.
#[must_use]
pub fn fixture() -> Fixture {
    fixture_from(&scenario())
}
