//! Content-addressed artifact storage
//!
//! - [`hashing`]: the SHA-256 content hash used as every artifact's key
//! - [`store`]: records plus blobs under the media root, with a persisted
//!   per-kind index
//! - [`fetch`]: HTTP retrieval of remote artifacts, rejected unless their
//!   hash matches the ledger declaration
//! - [`cleanup`]: removes blobs once their record is deleted

pub mod cleanup;
pub mod fetch;
pub mod hashing;
pub mod store;

pub use cleanup::{register_blob_cleanup, BlobCleanup};
pub use fetch::RemoteFetcher;
pub use hashing::{compute_hash, hash_file, ContentHasher};
pub use store::ArtifactStore;
