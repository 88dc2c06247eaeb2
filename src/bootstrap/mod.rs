/// Scenario file types
pub mod types;

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use alloy::primitives::Address;
use eyre::{bail, eyre, Result, WrapErr};
use log::info;

use self::types::{RouteSpec, Scenario};
use crate::arb::coordinator::SwapCallbackPolicy;
use crate::arb::executor::LstArbitrageur;
use crate::chain::erc20::Erc20Token;
use crate::chain::Host;
use crate::venues::{FlashVault, IndexedPool, LstVault, OrderedPool, VaultPool};

/// A host with a scenario deployed in it.
#[derive(Debug, Clone)]
pub struct Deployment {
    /// The simulated chain
    pub host: Host,
    /// Executor address
    pub executor: Address,
    /// Account that sends transactions to the executor
    pub operator: Address,
    /// Flash-loan vault the executor borrows from
    pub vault: Address,
    /// Named vault arbitrage routes
    pub routes: BTreeMap<String, RouteSpec>,
}

impl Deployment {
    /// Looks up a route by name.
    ///
    /// # Errors
    /// * If the scenario has no route called `name`
    pub fn route(&self, name: &str) -> Result<&RouteSpec> {
        self.routes.get(name).ok_or_else(|| {
            eyre!(
                "unknown route {name}, expected one of: {}",
                self.routes.keys().cloned().collect::<Vec<_>>().join(", ")
            )
        })
    }
}

/// Reads a scenario from a JSON file
///
/// # Arguments
/// * `path` - Location of the scenario file
///
/// # Returns
/// The parsed scenario
///
/// # Errors
/// * If the file cannot be read
/// * If the JSON does not describe a scenario
pub fn load_scenario(path: &Path) -> Result<Scenario> {
    let raw = fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read scenario {}", path.display()))?;
    serde_json::from_str(&raw).wrap_err_with(|| format!("invalid scenario {}", path.display()))
}

/// Deploys every contract of a scenario into a fresh host and hands out its
/// starting balances
///
/// # Arguments
/// * `scenario` - What to deploy
///
/// # Returns
/// The populated host together with the addresses callers need
///
/// # Errors
/// * If two contracts share an address
/// * If an indexed pool lists a different number of coins and balances
/// * If a vault pool is funded with a token it does not hold
/// * If venues are seeded with more LST shares than the LST has outstanding
/// * If a route refers to an LST that was not deployed
pub fn deploy(scenario: &Scenario) -> Result<Deployment> {
    let mut host = Host::new(scenario.block.into());
    let mut taken = HashSet::new();
    let mut claim = |address: Address| -> Result<()> {
        if !taken.insert(address) {
            bail!("address {address} deployed twice");
        }
        Ok(())
    };

    for token in &scenario.tokens {
        claim(token.address)?;
        host.deploy(
            token.address,
            Arc::new(Erc20Token::new(token.symbol.clone(), token.decimals)),
        );
    }

    for lst in &scenario.lst_vaults {
        claim(lst.address)?;
        host.deploy(lst.address, Arc::new(LstVault::new(lst.asset, lst.symbol.clone())));
        host.deal(lst.asset, lst.address, lst.assets);
    }

    for pool in &scenario.ordered_pools {
        claim(pool.address)?;
        host.deploy(
            pool.address,
            Arc::new(OrderedPool::new(pool.token0, pool.token1, pool.fee_bps)),
        );
        host.deal(pool.token0, pool.address, pool.reserve0);
        host.deal(pool.token1, pool.address, pool.reserve1);
    }

    let vault_spec = &scenario.flash_vault;
    claim(vault_spec.address)?;
    let flash_vault = vault_spec.pools.iter().fold(FlashVault::new(), |vault, pool| {
        vault.with_pool(
            pool.pool_id,
            VaultPool {
                token_a: pool.token_a,
                token_b: pool.token_b,
                fee_bps: pool.fee_bps,
            },
        )
    });
    for pool in &vault_spec.pools {
        flash_vault.fund_pool(&mut host, vault_spec.address, pool.pool_id, pool.token_a, pool.balance_a)?;
        flash_vault.fund_pool(&mut host, vault_spec.address, pool.pool_id, pool.token_b, pool.balance_b)?;
    }
    for liquidity in &vault_spec.liquidity {
        host.deal(liquidity.token, vault_spec.address, liquidity.amount);
    }
    host.deploy(vault_spec.address, Arc::new(flash_vault));

    for pool in &scenario.indexed_pools {
        claim(pool.address)?;
        if pool.coins.len() != pool.balances.len() {
            bail!(
                "indexed pool {} has {} coins but {} balances",
                pool.address,
                pool.coins.len(),
                pool.balances.len()
            );
        }
        host.deploy(
            pool.address,
            Arc::new(IndexedPool::new(pool.coins.clone(), pool.fee_bps)),
        );
        for (coin, balance) in pool.coins.iter().zip(&pool.balances) {
            host.deal(*coin, pool.address, *balance);
        }
    }

    // venues already hold part of each supply
    for lst in &scenario.lst_vaults {
        let placed = host.ledger().total_supply(lst.address);
        if placed > lst.shares {
            bail!(
                "venues hold {placed} of {}, more than its {} shares",
                lst.symbol,
                lst.shares
            );
        }
        host.deal(lst.address, lst.share_holder, lst.shares - placed);
    }

    let executor_spec = &scenario.executor;
    claim(executor_spec.address)?;
    let policy = if executor_spec.unchecked_swap_callback {
        SwapCallbackPolicy::Unchecked
    } else {
        SwapCallbackPolicy::RequirePendingPool
    };
    host.deploy(
        executor_spec.address,
        Arc::new(LstArbitrageur::new(vault_spec.address).with_swap_callback_policy(policy)),
    );

    for funding in &scenario.funding {
        host.deal(funding.token, funding.holder, funding.amount);
    }

    for (name, route) in &scenario.routes {
        if !host.has_code(route.lst) {
            bail!("route {name} mints {}, which is not deployed", route.lst);
        }
    }

    info!(
        "bootstrap::deploy: {} tokens, {} lst vaults, {} ordered pools, {} vault pools, {} indexed pools, {} routes",
        scenario.tokens.len(),
        scenario.lst_vaults.len(),
        scenario.ordered_pools.len(),
        vault_spec.pools.len(),
        scenario.indexed_pools.len(),
        scenario.routes.len()
    );

    Ok(Deployment {
        host,
        executor: executor_spec.address,
        operator: executor_spec.operator,
        vault: vault_spec.address,
        routes: scenario.routes.clone(),
    })
}
