//! Domain types shared by the ledger gateway, the artifact store and the
//! task preparation pipeline.

use crate::errors::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Length of a hex-encoded SHA-256 digest
pub const CONTENT_HASH_LEN: usize = 64;

/// Hex-encoded SHA-256 digest of an artifact's bytes.
///
/// Serves both as the artifact's identity and as its integrity proof.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash(String);

impl ContentHash {
    /// Parse a hash, accepting only 64 lowercase or uppercase hex characters.
    /// The stored form is lowercase.
    pub fn parse(value: impl AsRef<str>) -> Result<Self> {
        let value = value.as_ref();
        if value.len() != CONTENT_HASH_LEN || !value.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::invalid_input(
                "content_hash",
                format!("'{value}' is not a {CONTENT_HASH_LEN} character hex digest"),
            ));
        }
        Ok(Self(value.to_ascii_lowercase()))
    }

    /// Wrap a raw SHA-256 digest
    pub fn from_digest(digest: [u8; 32]) -> Self {
        Self(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compare against a hash declared elsewhere, ignoring case
    pub fn matches(&self, declared: &str) -> bool {
        self.0.eq_ignore_ascii_case(declared)
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ContentHash {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.0
    }
}

impl FromStr for ContentHash {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Kind of content-addressed artifact held by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Dataset,
    DataSample,
    Algorithm,
    Model,
    ChallengeMetrics,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 5] = [
        ArtifactKind::Dataset,
        ArtifactKind::DataSample,
        ArtifactKind::Algorithm,
        ArtifactKind::Model,
        ArtifactKind::ChallengeMetrics,
    ];

    /// Directory under the media root holding blobs of this kind
    pub fn blob_dir(self) -> &'static str {
        match self {
            ArtifactKind::Dataset => "datasets",
            ArtifactKind::DataSample => "data",
            ArtifactKind::Algorithm => "algos",
            ArtifactKind::Model => "models",
            ArtifactKind::ChallengeMetrics => "challenges",
        }
    }

    /// File name used when a blob of this kind is persisted from a remote fetch
    pub fn default_file_name(self) -> &'static str {
        match self {
            ArtifactKind::Dataset => "opener.py",
            ArtifactKind::DataSample => "data.zip",
            ArtifactKind::Algorithm => "algo.tar.gz",
            ArtifactKind::Model => "model",
            ArtifactKind::ChallengeMetrics => "metrics.py",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::Dataset => "dataset",
            ArtifactKind::DataSample => "data_sample",
            ArtifactKind::Algorithm => "algorithm",
            ArtifactKind::Model => "model",
            ArtifactKind::ChallengeMetrics => "challenge_metrics",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "dataset" => Ok(ArtifactKind::Dataset),
            "data_sample" | "data" => Ok(ArtifactKind::DataSample),
            "algorithm" | "algo" => Ok(ArtifactKind::Algorithm),
            "model" => Ok(ArtifactKind::Model),
            "challenge_metrics" | "challenge" => Ok(ArtifactKind::ChallengeMetrics),
            other => Err(Error::invalid_input(
                "kind",
                format!("unknown artifact kind '{other}'"),
            )),
        }
    }
}

/// Local record of an artifact blob on disk.
///
/// `validated` goes from false to true once, when the ledger confirms the
/// registration, and never reverts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    pub content_hash: ContentHash,
    pub kind: ArtifactKind,
    pub blob_path: PathBuf,
    pub validated: bool,
    pub registered_at: DateTime<Utc>,
}

impl ArtifactRecord {
    pub fn new(content_hash: ContentHash, kind: ArtifactKind, blob_path: PathBuf) -> Self {
        Self {
            content_hash,
            kind,
            blob_path,
            validated: false,
            registered_at: Utc::now(),
        }
    }

    /// File name of the blob, used when staging it into a working directory
    pub fn file_name(&self) -> Option<&std::ffi::OsStr> {
        self.blob_path.file_name()
    }
}

/// Lifecycle of a train/test task as recorded on the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Todo,
    Training,
    Trained,
    Testing,
    Tested,
    Failed,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::Training => "training",
            TaskStatus::Trained => "trained",
            TaskStatus::Testing => "testing",
            TaskStatus::Tested => "tested",
            TaskStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remote artifact reference as declared by the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactRef {
    pub hash: String,
    pub storage_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Challenge reference carrying its metrics location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeRef {
    pub hash: String,
    pub metrics: ArtifactRef,
}

/// Dataset opener plus the ordered data-sample keys a task consumes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataRef {
    pub opener_hash: String,
    #[serde(default)]
    pub keys: Vec<String>,
}

/// Train/test task as returned by the ledger. Read-only on this side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub key: String,
    pub status: TaskStatus,
    pub challenge: ChallengeRef,
    pub algo: ArtifactRef,
    #[serde(default)]
    pub start_model: Option<ArtifactRef>,
    #[serde(default)]
    pub end_model: Option<ArtifactRef>,
    #[serde(default)]
    pub train_data: Option<DataRef>,
    #[serde(default)]
    pub test_data: Option<DataRef>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH: &str = "24fb12ff87485f6b0bc5349e5bf7f36ccca4eb1353395417fdae7d8d787f178c";

    #[test]
    fn test_content_hash_accepts_hex_digest() {
        let hash = ContentHash::parse(HASH).unwrap();
        assert_eq!(hash.as_str(), HASH);
    }

    #[test]
    fn test_content_hash_normalises_case() {
        let hash = ContentHash::parse(HASH.to_ascii_uppercase()).unwrap();
        assert_eq!(hash.as_str(), HASH);
    }

    #[test]
    fn test_content_hash_rejects_bad_input() {
        assert!(ContentHash::parse("abc").is_err());
        assert!(ContentHash::parse("z".repeat(64)).is_err());
        assert!(ContentHash::parse("").is_err());
    }

    #[test]
    fn test_from_digest_and_matches() {
        let hash = ContentHash::from_digest([0xab; 32]);
        assert_eq!(hash.as_str(), "ab".repeat(32));
        assert!(hash.matches(&"AB".repeat(32)));
        assert!(!hash.matches("H1"));
    }

    #[test]
    fn test_from_digest_keeps_leading_zero_nibbles() {
        let mut digest = [0u8; 32];
        digest[0] = 0x0f;
        digest[31] = 0xa0;

        let hash = ContentHash::from_digest(digest);

        assert!(hash.as_str().starts_with("0f00"));
        assert!(hash.as_str().ends_with("00a0"));
        assert_eq!(ContentHash::parse(hash.as_str()).unwrap(), hash);
    }

    #[test]
    fn test_artifact_kind_round_trips_through_str() {
        for kind in ArtifactKind::ALL {
            assert_eq!(kind.as_str().parse::<ArtifactKind>().unwrap(), kind);
        }
        assert!("weights".parse::<ArtifactKind>().is_err());
    }

    #[test]
    fn test_task_deserializes_from_ledger_json() {
        let json = serde_json::json!({
            "key": "abc",
            "status": "todo",
            "challenge": {
                "hash": "c1",
                "metrics": {"hash": "m1", "storageAddress": "http://x/metrics"}
            },
            "algo": {"hash": "H1", "storageAddress": "http://x/algo", "name": "logreg"},
            "startModel": {"hash": "s1", "storageAddress": "http://x/model"},
            "endModel": null,
            "trainData": {"openerHash": "o1", "keys": ["d1", "d2"]}
        });

        let task: Task = serde_json::from_value(json).unwrap();
        assert_eq!(task.key, "abc");
        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.algo.storage_address, "http://x/algo");
        assert_eq!(task.start_model.unwrap().hash, "s1");
        assert!(task.end_model.is_none());
        assert!(task.test_data.is_none());
        assert_eq!(task.train_data.unwrap().keys, vec!["d1", "d2"]);
    }
}
