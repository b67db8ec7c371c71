//! Application layer: the operations the ledger core exposes to its callers.
//!
//! Each service takes the storage ports and an explicit acting identity;
//! there is no ambient request context anywhere below this layer.

pub mod auth;
pub mod directory;
pub mod engine;
pub mod policy;
pub mod query;
