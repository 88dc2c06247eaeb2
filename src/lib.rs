/*!
 * # lst-arb - Flash-loan funded LST arbitrage
 *
 * lst-arb executes single-transaction arbitrage between an ERC-4626 liquid
 * staking token's redemption rate and its market price, funded entirely by
 * borrowed capital, against an in-process simulated chain.
 *
 * ## Core Features
 *
 * - **Vault flash loans**: borrow the base asset, mint the LST, sell it on one
 *   of three venue families and repay the principal
 * - **Pool flash swaps**: buy the LST on credit, redeem it and repay the pool
 * - **Atomicity**: every failure unwinds the whole transaction
 * - **Sizing**: grid search for the most profitable borrow
 *
 * ## Module Structure
 *
 * - `abi`: Contract interfaces
 * - `arb`: Executor logic
 * - `bootstrap`: Scenario loading and deployment
 * - `chain`: Execution host and ledger
 * - `config`: Configuration management
 * - `utils`: Logging and constants
 * - `venues`: Simulated external venues
 */

/// Contract interfaces
pub mod abi;
/// Executor logic
pub mod arb;
/// Scenario loading and deployment
pub mod bootstrap;
/// Execution host and ledger
pub mod chain;
/// Configuration management
pub mod config;
/// Utility functions and helpers
pub mod utils;
/// Simulated external venues
pub mod venues;
