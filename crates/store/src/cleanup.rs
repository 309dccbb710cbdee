//! Blob cleanup on record deletion
//!
//! One [`BlobCleanup`] is registered per artifact kind. It reacts only to
//! `Deleted` events of its kind and removes the blob, then its `<root>/<hash>`
//! container if that is now empty.

use crate::store::ArtifactStore;
use async_trait::async_trait;
use ledgerprep_core::{ArtifactKind, EnhancedEvent, EventSubscriber, RecordEvent};
use ledgerprep_utils::fs::{remove_dir_if_empty, remove_file_if_exists};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

pub struct BlobCleanup {
    kind: ArtifactKind,
    root: PathBuf,
}

impl BlobCleanup {
    pub fn new(kind: ArtifactKind, root: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            root: root.into(),
        }
    }
}

#[async_trait]
impl EventSubscriber for BlobCleanup {
    async fn handle_event(
        &self,
        event: &EnhancedEvent,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let RecordEvent::Deleted { record } = &event.event else {
            return Ok(());
        };

        let removed = remove_file_if_exists(&record.blob_path)?;
        debug!(
            kind = %self.kind,
            path = %record.blob_path.display(),
            removed,
            "Blob cleaned up"
        );

        // Only the per-hash container, never the kind root itself
        if let Some(container) = record.blob_path.parent() {
            if container.starts_with(&self.root) && container != self.root {
                remove_dir_if_empty(container);
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        match self.kind {
            ArtifactKind::Dataset => "blob-cleanup-dataset",
            ArtifactKind::DataSample => "blob-cleanup-data-sample",
            ArtifactKind::Algorithm => "blob-cleanup-algorithm",
            ArtifactKind::Model => "blob-cleanup-model",
            ArtifactKind::ChallengeMetrics => "blob-cleanup-challenge-metrics",
        }
    }

    fn is_interested(&self, event: &RecordEvent) -> bool {
        matches!(event, RecordEvent::Deleted { record } if record.kind == self.kind)
    }
}

/// Register a cleanup subscriber for every artifact kind of `store`
pub async fn register_blob_cleanup(store: &ArtifactStore) {
    for kind in ArtifactKind::ALL {
        store
            .events()
            .register_subscriber(Arc::new(BlobCleanup::new(kind, store.blob_root(kind))))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerprep_core::EventEmitter;
    use tempfile::TempDir;

    async fn store_with_cleanup(temp_dir: &TempDir) -> ArtifactStore {
        let store = ArtifactStore::open(temp_dir.path(), EventEmitter::default()).unwrap();
        register_blob_cleanup(&store).await;
        store
    }

    #[tokio::test]
    async fn test_delete_removes_blob_and_container() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_with_cleanup(&temp_dir).await;
        let record = store
            .persist_blob(ArtifactKind::Model, "model", b"weights", true)
            .await
            .unwrap();
        let container = record.blob_path.parent().unwrap().to_path_buf();

        store
            .delete(ArtifactKind::Model, &record.content_hash)
            .await
            .unwrap();

        assert!(!record.blob_path.exists());
        assert!(!container.exists());
        assert!(temp_dir.path().join("models").is_dir());
    }

    #[tokio::test]
    async fn test_non_empty_container_is_left_in_place() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_with_cleanup(&temp_dir).await;
        let record = store
            .persist_blob(ArtifactKind::Algorithm, "algo.tar.gz", b"algo", true)
            .await
            .unwrap();
        let container = record.blob_path.parent().unwrap().to_path_buf();
        std::fs::write(container.join("notes.txt"), b"keep").unwrap();

        store
            .delete(ArtifactKind::Algorithm, &record.content_hash)
            .await
            .unwrap();

        assert!(!record.blob_path.exists());
        assert!(container.join("notes.txt").exists());
        assert!(store.get(ArtifactKind::Algorithm, &record.content_hash).is_none());
    }

    #[tokio::test]
    async fn test_already_missing_blob_is_not_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_with_cleanup(&temp_dir).await;
        let record = store
            .persist_blob(ArtifactKind::ChallengeMetrics, "metrics.py", b"metrics", true)
            .await
            .unwrap();
        std::fs::remove_dir_all(record.blob_path.parent().unwrap()).unwrap();

        let removed = store
            .delete(ArtifactKind::ChallengeMetrics, &record.content_hash)
            .await
            .unwrap();

        assert!(removed.is_some());
        assert!(temp_dir.path().join("challenges").is_dir());
        assert!(store.records(ArtifactKind::ChallengeMetrics).is_empty());
    }

    #[test]
    fn test_only_interested_in_own_kind_deletions() {
        let cleanup = BlobCleanup::new(ArtifactKind::Model, "/m/models");
        let record = ledgerprep_core::ArtifactRecord::new(
            crate::hashing::compute_hash(b"x"),
            ArtifactKind::Algorithm,
            PathBuf::from("/m/algos/x/algo.tar.gz"),
        );

        assert!(!cleanup.is_interested(&RecordEvent::Deleted {
            record: record.clone()
        }));
        let mut model = record;
        model.kind = ArtifactKind::Model;
        assert!(cleanup.is_interested(&RecordEvent::Deleted {
            record: model.clone()
        }));
        assert!(!cleanup.is_interested(&RecordEvent::Created { record: model }));
    }
}
