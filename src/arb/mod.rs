//! # Arbitrage Module
//!
//! The executor's logic: borrow the base asset (flash loan from the vault, or
//! flash swap from an ordered pool), turn it into LST shares at the vault's
//! redemption rate, sell them on the chosen venue and repay, all inside one
//! transaction. Nothing here compensates for a failed step; a failure reverts
//! the whole transaction.

/// Venue adapters
pub mod adapters;
/// Borrow state and the two callbacks
pub mod coordinator;
/// LST deposit step
mod deposit;
/// Executor contract and call dispatch
pub mod executor;
/// Amount search
pub mod optimizer;
/// Arbitrage entry points and call builders
pub mod orchestrator;
/// Balance snapshots
pub mod portfolio;
/// Sell-strategy dispatch
mod router;
/// Sell strategies and payload codec
pub mod strategy;
/// Swap direction and callback data
pub mod swap;
/// Shared test fixtures
pub mod test_helpers;

pub use deposit::deposit_into_lst;
pub use executor::LstArbitrageur;
pub use router::route;
