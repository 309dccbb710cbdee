//! Core domain types, errors, and constants for `ledgerprep`.
//!
//! Every other crate in the workspace builds on the pieces defined here:
//!
//! - **`errors`**: the `Error` enum and `Result` alias. Variants follow the
//!   failure taxonomy the pipeline branches on (transport, ledger rejection,
//!   integrity, not found).
//! - **`types`**: content hashes, artifact records, and the ledger-resident
//!   task model.
//! - **`events`**: record events and the subscriber table used for deletion
//!   reconciliation.
//! - **`constants`**: status codes, wire constants and on-disk layout names.

pub mod constants;
pub mod errors;
pub mod events;
pub mod types;

pub use self::{
    constants::*,
    errors::{Error, Result, ResultExt},
    events::{EnhancedEvent, EventEmitter, EventSubscriber, RecordEvent},
    types::*,
};
