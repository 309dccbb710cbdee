//! Shared utilities for ledgerprep
//!
//! Filesystem helpers used by the store and the pipeline, archive
//! extraction for data samples, retry with backoff for ledger writes, and
//! tracing initialisation for the binary.

pub mod archive;
pub mod atomic_file;
pub mod fs;
pub mod logging;
pub mod resilience;

pub use archive::*;
pub use atomic_file::*;
pub use resilience::{retry, RetryConfig};
