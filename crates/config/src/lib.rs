//! Configuration for ledgerprep
//!
//! A single immutable [`Config`] is built at start-up by [`ConfigLoader`]
//! and handed to the ledger gateway, the artifact store and the pipeline.

pub mod config;
pub mod loader;

pub use config::*;
pub use loader::*;
