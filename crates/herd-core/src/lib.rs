//! Core types, lifecycle rules, and trait definitions for the herd ledger.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement [`store::HerdStore`]; the [`herd::Herd`]
//! service drives the state transition engine against any of them.

pub mod animal;
pub mod bulk;
pub mod context;
pub mod engine;
pub mod error;
pub mod establishment;
pub mod event;
pub mod herd;
pub mod lineage;
pub mod lot;
pub mod occupancy;
pub mod performance;
pub mod registry;
pub mod store;
pub mod summary;

#[cfg(test)]
mod fixtures;

pub use context::Context;
pub use error::{Error, Result};
pub use herd::Herd;
