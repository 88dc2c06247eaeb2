use alloy::primitives::{Address, U256};
use alloy::sol_types::SolCall;
use clap::{Parser, Subcommand};
use eyre::{bail, Error, Result};
use log::{info, warn};

use lst_arb::arb::optimizer::{optimize_amount_in, Optimized, Sender, Target};
use lst_arb::arb::orchestrator::{flash_swap_arbitrage_call, vault_arbitrage_call};
use lst_arb::arb::portfolio::Portfolio;
use lst_arb::arb::swap::Direction;
use lst_arb::bootstrap::{deploy, load_scenario, Deployment};
use lst_arb::config::Config;
use lst_arb::utils::logger::setup_logger;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Flash-loan the base asset, mint the LST and sell it along a named route
    Vault {
        /// Route name from the scenario
        #[arg(long)]
        route: String,
        /// Amount to borrow, in wei
        #[arg(long)]
        amount: U256,
    },
    /// Buy the LST from an ordered pool on credit and repay by redeeming it
    FlashSwap {
        /// Ordered pool address
        #[arg(long)]
        pool: Address,
        /// Swap token0 for token1
        #[arg(long)]
        zero_for_one: bool,
        /// Amount of the input token, in wei
        #[arg(long)]
        amount: U256,
    },
    /// Search for the most profitable borrow along a named route
    Optimize {
        /// Route name from the scenario
        #[arg(long)]
        route: String,
    },
    /// Search for the most profitable flash swap on a pool
    OptimizeFlashSwap {
        /// Ordered pool address
        #[arg(long)]
        pool: Address,
        /// Swap token0 for token1
        #[arg(long)]
        zero_for_one: bool,
    },
    /// Print the hex sell payload of a named route
    EncodeRoute {
        /// Route name from the scenario
        #[arg(long)]
        route: String,
    },
}

/// Sends `call` from the operator to the executor, commits it on success and
/// reports what it did to the executor's balances.
fn execute<C: SolCall<Return = R>, R>(
    deployment: &mut Deployment,
    tokens: &[Address],
    call: &C,
    profit: impl Fn(&R) -> U256,
) -> Result<U256, Error> {
    let Deployment {
        host,
        executor,
        operator,
        ..
    } = deployment;
    let before = Portfolio::snapshot(host, *executor, tokens);

    match host.transact_sol(*operator, *executor, call) {
        Ok(ret) => {
            let after = Portfolio::snapshot(host, *executor, tokens);
            for (token, change) in after.diff(&before) {
                info!("{token}: {change}");
            }
            for record in host.trace() {
                info!("{record:?}");
            }
            Ok(profit(&ret))
        }
        Err(err) => {
            warn!("{} calls before the revert", host.trace().len());
            bail!("{} reverted with {}: {err}", C::SIGNATURE, err.kind())
        }
    }
}

/// Runs the optimizer on `target` and logs the result.
async fn optimize(config: &Config, deployment: &Deployment, target: Target) -> Result<Optimized, Error> {
    let sender = Sender {
        caller: deployment.operator,
        executor: deployment.executor,
    };
    let optimized = optimize_amount_in(&deployment.host, sender, target, config.search).await?;
    info!(
        "optimized amount_in={}, profit={}",
        optimized.amount_in, optimized.profit
    );
    Ok(optimized)
}

/// Optimizes every route of the scenario.
async fn run_default_behavior(config: &Config, deployment: &Deployment) -> Result<(), Error> {
    for (name, route) in &deployment.routes {
        info!("Optimizing route {name}");
        let target = Target::Vault {
            lst: route.lst,
            base_asset: route.base_asset,
            strategy: route.strategy,
        };
        let Optimized { amount_in, profit } = optimize(config, deployment, target).await?;
        println!("{name}: amount_in={amount_in} profit={profit}");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let cli = Cli::parse();
    dotenv::dotenv().ok();
    let config = Config::from_env()?;
    setup_logger(config.log_file.as_deref())?;

    info!("Loading scenario {}", config.scenario.display());
    let mut deployment = deploy(&load_scenario(&config.scenario)?)?;

    match cli.command {
        Some(Commands::Vault { route, amount }) => {
            let route = *deployment.route(&route)?;
            let call = vault_arbitrage_call(route.lst, route.base_asset, amount, &route.strategy);
            let profit = execute(&mut deployment, &[route.base_asset, route.lst], &call, |ret| ret._0)?;
            println!("profit={profit}");
        }
        Some(Commands::FlashSwap {
            pool,
            zero_for_one,
            amount,
        }) => {
            let call = flash_swap_arbitrage_call(pool, Direction::from_zero_for_one(zero_for_one), amount);
            let tokens = pool_tokens(&deployment, pool)?;
            let profit = execute(&mut deployment, &tokens, &call, |ret| ret._0)?;
            println!("profit={profit}");
        }
        Some(Commands::Optimize { route }) => {
            let route = *deployment.route(&route)?;
            let target = Target::Vault {
                lst: route.lst,
                base_asset: route.base_asset,
                strategy: route.strategy,
            };
            let Optimized { amount_in, profit } = optimize(&config, &deployment, target).await?;
            println!("amount_in={amount_in} profit={profit}");
        }
        Some(Commands::OptimizeFlashSwap { pool, zero_for_one }) => {
            let target = Target::FlashSwap {
                pool,
                direction: Direction::from_zero_for_one(zero_for_one),
            };
            let Optimized { amount_in, profit } = optimize(&config, &deployment, target).await?;
            println!("amount_in={amount_in} profit={profit}");
        }
        Some(Commands::EncodeRoute { route }) => {
            let route = deployment.route(&route)?;
            println!("0x{}", hex::encode(route.strategy.encode()));
        }
        None => {
            // Default behavior when no subcommand is provided
            run_default_behavior(&config, &deployment).await?;
        }
    }

    Ok(())
}

/// Tokens of an ordered pool, read without touching state.
fn pool_tokens(deployment: &Deployment, pool: Address) -> Result<Vec<Address>, Error> {
    use lst_arb::abi::IUniswapV3Pool;

    let mut host = deployment.host.clone();
    let token0 = host
        .simulate_sol(deployment.operator, pool, &IUniswapV3Pool::token0Call {})?
        ._0;
    let token1 = host
        .simulate_sol(deployment.operator, pool, &IUniswapV3Pool::token1Call {})?
        ._0;
    Ok(vec![token0, token1])
}
