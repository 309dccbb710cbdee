//! Registration of local artifacts on the ledger
//!
//! Data samples are stored locally first, unvalidated, then announced with
//! `registerData`. A committed registration validates the records; a refused
//! one removes them again. Test tasks are created with `createTesttuple`.

pub mod data;
pub mod testtuple;

pub use data::{DataRegistrar, Registration};
pub use testtuple::TesttupleRegistrar;
