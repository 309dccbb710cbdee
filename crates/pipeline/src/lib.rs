//! Task preparation
//!
//! A sweep lists the ledger tasks assigned to this node for one phase and,
//! task by task, fetches and verifies the referenced artifacts, stages them
//! into `<media_root>/traintuple/<key>/` and reports the next status. A
//! failing task is reported `failed` on the ledger and the sweep moves on.

pub mod phase;
pub mod preparer;
pub mod scheduler;
pub mod workdir;

pub use phase::Phase;
pub use preparer::{SweepReport, TaskPreparer};
pub use scheduler::Scheduler;
pub use workdir::WorkingDirectory;
