//! Artifact store
//!
//! Blobs live at `<media_root>/<kind_dir>/<hash>/<file_name>`. Records are
//! kept in memory and persisted per kind to `<media_root>/.index/<kind_dir>.json`
//! after every mutation.

use crate::hashing::{compute_hash, hash_file};
use dashmap::DashMap;
use ledgerprep_core::{
    constants::INDEX_DIR, ArtifactKind, ArtifactRecord, ContentHash, Error, EventEmitter, RecordEvent,
    Result,
};
use ledgerprep_utils::atomic_file::{copy_atomic, write_atomic, write_json_atomic};
use ledgerprep_utils::fs::create_directory;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

type RecordKey = (ArtifactKind, ContentHash);

/// Local records of content-addressed artifacts
pub struct ArtifactStore {
    media_root: PathBuf,
    records: DashMap<RecordKey, ArtifactRecord>,
    index_lock: Mutex<()>,
    events: EventEmitter,
}

impl ArtifactStore {
    /// Open the store under `media_root`, loading any persisted index
    pub fn open(media_root: impl Into<PathBuf>, events: EventEmitter) -> Result<Self> {
        let media_root = media_root.into();
        create_directory(&media_root)?;

        let records = DashMap::new();
        for kind in ArtifactKind::ALL {
            let path = index_path(&media_root, kind);
            if !path.exists() {
                continue;
            }
            let content = std::fs::read_to_string(&path)
                .map_err(|e| Error::file_system(&path, "read index", e))?;
            let loaded: Vec<ArtifactRecord> = serde_json::from_str(&content)?;
            debug!(kind = %kind, count = loaded.len(), "Loaded artifact index");
            for record in loaded {
                records.insert((record.kind, record.content_hash.clone()), record);
            }
        }

        Ok(Self {
            media_root,
            records,
            index_lock: Mutex::new(()),
            events,
        })
    }

    pub fn media_root(&self) -> &Path {
        &self.media_root
    }

    pub fn events(&self) -> &EventEmitter {
        &self.events
    }

    /// Directory holding every blob of `kind`
    pub fn blob_root(&self, kind: ArtifactKind) -> PathBuf {
        self.media_root.join(kind.blob_dir())
    }

    pub fn blob_path(&self, kind: ArtifactKind, hash: &ContentHash, file_name: &str) -> PathBuf {
        self.blob_root(kind).join(hash.as_str()).join(file_name)
    }

    pub fn get(&self, kind: ArtifactKind, hash: &ContentHash) -> Option<ArtifactRecord> {
        self.records
            .get(&(kind, hash.clone()))
            .map(|entry| entry.value().clone())
    }

    /// Look up a record by the key a ledger declares, failing with `NotFound`
    pub fn require(&self, kind: ArtifactKind, key: &str) -> Result<ArtifactRecord> {
        ContentHash::parse(key)
            .ok()
            .and_then(|hash| self.get(kind, &hash))
            .ok_or_else(|| Error::not_found(kind.as_str(), key))
    }

    pub fn contains_validated(&self, kind: ArtifactKind, hash: &ContentHash) -> bool {
        self.records
            .get(&(kind, hash.clone()))
            .is_some_and(|entry| entry.validated)
    }

    /// Records of one kind, ordered by hash
    pub fn records(&self, kind: ArtifactKind) -> Vec<ArtifactRecord> {
        let mut records: Vec<_> = self
            .records
            .iter()
            .filter(|entry| entry.key().0 == kind)
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by(|a, b| a.content_hash.cmp(&b.content_hash));
        records
    }

    /// Insert or replace a record. A validated record is never downgraded.
    pub async fn insert(&self, mut record: ArtifactRecord) -> Result<()> {
        let key = (record.kind, record.content_hash.clone());
        if let Some(existing) = self.records.get(&key) {
            record.validated |= existing.validated;
        }
        self.records.insert(key, record.clone());
        self.persist_index(record.kind)?;

        debug!(
            kind = %record.kind,
            hash = %record.content_hash,
            validated = record.validated,
            "Artifact record stored"
        );
        self.events.publish(RecordEvent::Created { record }).await;
        Ok(())
    }

    /// Write `bytes` as the blob of a new record and store the record
    pub async fn persist_blob(
        &self,
        kind: ArtifactKind,
        file_name: &str,
        bytes: &[u8],
        validated: bool,
    ) -> Result<ArtifactRecord> {
        let hash = compute_hash(bytes);
        let blob_path = self.blob_path(kind, &hash, file_name);
        write_atomic(&blob_path, bytes)?;

        let mut record = ArtifactRecord::new(hash, kind, blob_path);
        record.validated = validated;
        self.insert(record.clone()).await?;
        Ok(self.get(kind, &record.content_hash).unwrap_or(record))
    }

    /// Copy a local file in as the blob of an unvalidated record.
    ///
    /// `hash` must be the content hash of `source`.
    pub async fn import_file(
        &self,
        kind: ArtifactKind,
        source: &Path,
        hash: ContentHash,
    ) -> Result<ArtifactRecord> {
        let file_name = source
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(kind.default_file_name());
        let blob_path = self.blob_path(kind, &hash, file_name);
        copy_atomic(source, &blob_path)?;

        let record = ArtifactRecord::new(hash, kind, blob_path);
        self.insert(record.clone()).await?;
        Ok(record)
    }

    /// Flip `validated` to true. Returns `false` when it already was.
    pub async fn mark_validated(&self, kind: ArtifactKind, hash: &ContentHash) -> Result<bool> {
        let changed = {
            let mut entry = self
                .records
                .get_mut(&(kind, hash.clone()))
                .ok_or_else(|| Error::not_found(kind.as_str(), hash.as_str()))?;
            let changed = !entry.validated;
            entry.validated = true;
            changed
        };

        if changed {
            self.persist_index(kind)?;
            info!(kind = %kind, hash = %hash, "Artifact validated by ledger");
            self.events
                .publish(RecordEvent::Validated {
                    kind,
                    content_hash: hash.clone(),
                })
                .await;
        }
        Ok(changed)
    }

    /// Remove a record and announce it so subscribers can clean up its blob
    pub async fn delete(&self, kind: ArtifactKind, hash: &ContentHash) -> Result<Option<ArtifactRecord>> {
        let Some((_, record)) = self.records.remove(&(kind, hash.clone())) else {
            return Ok(None);
        };
        self.persist_index(kind)?;

        info!(kind = %kind, hash = %hash, "Artifact record deleted");
        self.events
            .publish(RecordEvent::Deleted {
                record: record.clone(),
            })
            .await;
        Ok(Some(record))
    }

    /// Re-hash the blob on disk and compare it with the declared hash
    pub fn verify(&self, record: &ArtifactRecord, declared: &str) -> Result<()> {
        let actual = hash_file(&record.blob_path)?;
        if actual.matches(declared) {
            return Ok(());
        }

        warn!(
            kind = %record.kind,
            declared,
            actual = %actual,
            path = %record.blob_path.display(),
            "Local blob does not match declared hash"
        );
        Err(Error::integrity(
            format!("{} {}", record.kind, record.blob_path.display()),
            declared,
            actual.as_str(),
        ))
    }

    fn persist_index(&self, kind: ArtifactKind) -> Result<()> {
        let _guard = self.index_lock.lock();
        let records = self.records(kind);
        write_json_atomic(&index_path(&self.media_root, kind), &records)
    }
}

fn index_path(media_root: &Path, kind: ArtifactKind) -> PathBuf {
    media_root
        .join(INDEX_DIR)
        .join(format!("{}.json", kind.blob_dir()))
}
