//! Simulated external venues.
//!
//! These stand in for the on-chain contracts the executor talks to. They expose
//! the same ABI and the same flash semantics, priced on a plain constant-product
//! curve.

pub mod amm;
pub mod indexed_pool;
pub mod lst_vault;
pub mod ordered_pool;
pub mod vault;

pub use indexed_pool::IndexedPool;
pub use lst_vault::LstVault;
pub use ordered_pool::OrderedPool;
pub use vault::{FlashVault, VaultPool};
