//! Ledger gateway
//!
//! The ledger is reached only through two primitives: `query`, which never
//! mutates state, and `invoke`, which submits a chaincode transaction.
//! Invokes are either synchronous (wait for commit, `201` on success) or
//! handed to a background queue (`202`, no completion signal).
//!
//! Transport failures surface as [`Error::Transport`]; a reachable ledger
//! that refuses a request answers with a non-success [`LedgerResponse`].
//!
//! [`Error::Transport`]: ledgerprep_core::Error::Transport

pub mod gateway;
pub mod queue;
pub mod request;
pub mod response;
pub mod testing;
pub mod transport;

pub use gateway::{InvokeMode, LedgerGateway};
pub use queue::{Completion, InvokeQueue, QueueStats};
pub use request::{ChaincodeFunction, LedgerRequest};
pub use response::LedgerResponse;
pub use transport::{HttpLedgerTransport, LedgerTransport};
