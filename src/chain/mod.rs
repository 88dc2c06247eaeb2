//! # Chain Module
//!
//! A minimal synchronous stand-in for the EVM: a journaled [`ledger::Ledger`], a
//! [`host::Host`] that dispatches ABI calls between registered contracts, and the
//! [`revert::Revert`] taxonomy. Whole-transaction rollback, which the executor
//! relies on for atomicity, is provided here and nowhere else.

/// Generic ERC-20 token and call helpers
pub mod erc20;
/// Contract registry and nested call dispatch
pub mod host;
/// Journaled balances, allowances and storage
pub mod ledger;
/// Failure taxonomy
pub mod revert;

pub use host::{BlockEnv, CallContext, CallRecord, Contract, Host};
pub use ledger::{Checkpoint, Ledger, State};
pub use revert::{FailureKind, Revert};
