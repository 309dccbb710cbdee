//! Data-sample registration
//!
//! Archives are stored locally as unvalidated records before `registerData`
//! is invoked. A committed registration validates them; any other answer
//! removes them again. With asynchronous invokes the same decision is taken
//! on the queue worker once the ledger has answered.

use futures::FutureExt;
use indexmap::IndexMap;
use ledgerprep_config::Config;
use ledgerprep_core::{
    constants::STATUS_CREATED, ArtifactKind, ContentHash, Error, Result,
};
use ledgerprep_ledger::{
    ChaincodeFunction, Completion, InvokeMode, LedgerGateway, LedgerRequest, LedgerResponse,
};
use ledgerprep_store::{hash_file, ArtifactStore};
use ledgerprep_utils::ensure_zip_archive;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Result of a registration request
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    /// Data-sample keys, in input order
    pub keys: Vec<ContentHash>,
    /// `201` when committed, `202` when queued
    pub status: u16,
    pub message: String,
}

impl Registration {
    pub fn is_validated(&self) -> bool {
        self.status == STATUS_CREATED
    }
}

/// Registers data-sample archives against datasets
pub struct DataRegistrar {
    gateway: Arc<LedgerGateway>,
    store: Arc<ArtifactStore>,
    mode: InvokeMode,
}

impl DataRegistrar {
    pub fn new(config: &Config, gateway: Arc<LedgerGateway>, store: Arc<ArtifactStore>) -> Self {
        Self {
            gateway,
            store,
            mode: InvokeMode::from_sync_flag(config.ledger.sync_enabled),
        }
    }

    pub fn with_mode(mut self, mode: InvokeMode) -> Self {
        self.mode = mode;
        self
    }

    #[instrument(skip_all, fields(count = paths.len(), test_only = test_only))]
    pub async fn register(
        &self,
        paths: &[PathBuf],
        dataset_keys: &[String],
        test_only: bool,
    ) -> Result<Registration> {
        if paths.is_empty() {
            return Err(Error::invalid_input("paths", "at least one data archive is required"));
        }
        if dataset_keys.is_empty() {
            return Err(Error::invalid_input("dataset_keys", "at least one dataset key is required"));
        }

        let hashed = self.hash_inputs(paths)?;
        let imported = self.import(&hashed).await?;

        let request = LedgerRequest::register_data(
            imported.iter().map(ContentHash::as_str),
            dataset_keys,
            test_only,
        );

        let response = match self.mode {
            InvokeMode::Sync => {
                let outcome = self.gateway.invoke(request, InvokeMode::Sync).await;
                let response = settle(&self.store, &imported, outcome).await?;
                info!(count = imported.len(), "Data samples registered");
                response
            }
            InvokeMode::Async => {
                let completion = settle_later(Arc::clone(&self.store), imported.clone());
                match self.gateway.invoke_queued(request, completion).await {
                    Ok(response) => response,
                    Err(e) => {
                        rollback(&self.store, &imported).await;
                        return Err(e);
                    }
                }
            }
        };

        Ok(Registration {
            message: response.message(),
            status: response.status,
            keys: imported,
        })
    }

    /// Hash every input, failing on non-zip input or two inputs with the
    /// same content
    fn hash_inputs<'a>(&self, paths: &'a [PathBuf]) -> Result<IndexMap<ContentHash, &'a Path>> {
        let mut hashed: IndexMap<ContentHash, &Path> = IndexMap::with_capacity(paths.len());
        for path in paths {
            ensure_zip_archive(path)?;
            let hash = hash_file(path)?;
            if let Some(first) = hashed.get(&hash) {
                return Err(Error::duplicate_content(
                    first.display().to_string(),
                    path.display().to_string(),
                ));
            }
            if self.store.get(ArtifactKind::DataSample, &hash).is_some() {
                return Err(Error::invalid_input(
                    "paths",
                    format!("data sample {hash} from {} already exists", path.display()),
                ));
            }
            hashed.insert(hash, path.as_path());
        }
        Ok(hashed)
    }

    async fn import(&self, hashed: &IndexMap<ContentHash, &Path>) -> Result<Vec<ContentHash>> {
        let mut imported = Vec::with_capacity(hashed.len());
        for (hash, path) in hashed {
            if let Err(e) = self
                .store
                .import_file(ArtifactKind::DataSample, path, hash.clone())
                .await
            {
                rollback(&self.store, &imported).await;
                return Err(e);
            }
            imported.push(hash.clone());
        }
        Ok(imported)
    }
}

/// Validate every record on a committed registration, remove them on any
/// other outcome
async fn settle(
    store: &ArtifactStore,
    keys: &[ContentHash],
    outcome: Result<LedgerResponse>,
) -> Result<LedgerResponse> {
    match outcome {
        Ok(response) if response.is_created() => {
            for hash in keys {
                store.mark_validated(ArtifactKind::DataSample, hash).await?;
            }
            Ok(response)
        }
        Ok(response) => {
            rollback(store, keys).await;
            Err(response.into_rejection(ChaincodeFunction::RegisterData.as_str()))
        }
        Err(e) => {
            rollback(store, keys).await;
            Err(e)
        }
    }
}

fn settle_later(store: Arc<ArtifactStore>, keys: Vec<ContentHash>) -> Completion {
    Box::new(move |outcome: Result<LedgerResponse>| {
        async move {
            match settle(&store, &keys, outcome).await {
                Ok(_) => info!(count = keys.len(), "Queued registration committed"),
                Err(e) => warn!(count = keys.len(), error = %e, "Queued registration not committed"),
            }
        }
        .boxed()
    })
}

async fn rollback(store: &ArtifactStore, hashes: &[ContentHash]) {
    for hash in hashes {
        if let Err(e) = store.delete(ArtifactKind::DataSample, hash).await {
            warn!(hash = %hash, error = %e, "Failed to roll back data sample");
        }
    }
    if !hashes.is_empty() {
        warn!(count = hashes.len(), "Registration rolled back");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerprep_core::{constants::ASYNC_NOTIFICATION_MESSAGE, EventEmitter};
    use ledgerprep_ledger::testing::{Scripted, ScriptedTransport};
    use ledgerprep_store::register_blob_cleanup;
    use ledgerprep_utils::RetryConfig;
    use serde_json::json;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    /// One zip per `(name, content)`, holding a single `samples.csv` entry
    fn write_archives(dir: &Path, archives: &[(&str, &str)]) -> Vec<PathBuf> {
        archives
            .iter()
            .map(|(name, content)| {
                let path = dir.join(name);
                let mut writer = ZipWriter::new(File::create(&path).unwrap());
                writer.start_file("samples.csv", FileOptions::default()).unwrap();
                writer.write_all(content.as_bytes()).unwrap();
                writer.finish().unwrap();
                path
            })
            .collect()
    }

    struct Fixture {
        _media: TempDir,
        inputs: TempDir,
        transport: Arc<ScriptedTransport>,
        gateway: Arc<LedgerGateway>,
        store: Arc<ArtifactStore>,
        config: Config,
    }

    async fn fixture() -> Fixture {
        let media = TempDir::new().unwrap();
        let config = Config::builder().media_root(media.path()).build().unwrap();
        let transport = Arc::new(ScriptedTransport::new());
        let gateway = Arc::new(LedgerGateway::new(transport.clone(), 1, RetryConfig::default()));
        let store = Arc::new(ArtifactStore::open(media.path(), EventEmitter::default()).unwrap());
        register_blob_cleanup(&store).await;
        Fixture {
            _media: media,
            inputs: TempDir::new().unwrap(),
            transport,
            gateway,
            store,
            config,
        }
    }

    fn registrar(f: &Fixture) -> DataRegistrar {
        DataRegistrar::new(&f.config, f.gateway.clone(), f.store.clone())
    }

    fn blob_count(f: &Fixture) -> usize {
        std::fs::read_dir(f.store.blob_root(ArtifactKind::DataSample))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    #[tokio::test]
    async fn test_committed_registration_validates_records() {
        let f = fixture().await;
        let paths = write_archives(f.inputs.path(), &[("a.zip", "aaa"), ("b.zip", "bbb")]);

        let registration = registrar(&f)
            .register(&paths, &["ds1".to_string()], false)
            .await
            .unwrap();

        assert!(registration.is_validated());
        assert_eq!(registration.keys.len(), 2);
        for key in &registration.keys {
            assert!(f.store.contains_validated(ArtifactKind::DataSample, key));
        }

        let invoked = f.transport.invoked_with(ChaincodeFunction::RegisterData);
        assert_eq!(
            invoked[0].args(),
            &[
                format!("{},{}", registration.keys[0], registration.keys[1]),
                "ds1".to_string(),
                "false".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_rejected_registration_removes_records_and_blobs() {
        let f = fixture().await;
        f.transport.push_invoke(
            ChaincodeFunction::RegisterData,
            Scripted::Status(400, json!({"message": "unknown dataset"})),
        );
        let paths = write_archives(f.inputs.path(), &[("a.zip", "aaa")]);

        let err = registrar(&f)
            .register(&paths, &["ds1".to_string()], true)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::LedgerRejection { status: 400, .. }));
        assert!(f.store.records(ArtifactKind::DataSample).is_empty());
        assert_eq!(blob_count(&f), 0);
        assert!(paths[0].exists());
    }

    #[tokio::test]
    async fn test_unreachable_ledger_rolls_back() {
        let f = fixture().await;
        f.transport
            .push_invoke(ChaincodeFunction::RegisterData, Scripted::Unreachable);
        let paths = write_archives(f.inputs.path(), &[("a.zip", "aaa")]);

        let err = registrar(&f)
            .register(&paths, &["ds1".to_string()], false)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Transport { .. }));
        assert!(f.store.records(ArtifactKind::DataSample).is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_archives_are_rejected_before_storing() {
        let f = fixture().await;
        let first = write_archives(f.inputs.path(), &[("first.zip", "same")]).remove(0);
        let second = f.inputs.path().join("second.zip");
        std::fs::copy(&first, &second).unwrap();

        let err = registrar(&f)
            .register(&[first, second], &["ds1".to_string()], false)
            .await
            .unwrap_err();

        let message = err.to_string();
        assert!(message.starts_with(
            "Your data archives/paths contain same files leading to same pkhash"
        ));
        assert!(message.contains("first.zip"));
        assert!(message.contains("second.zip"));
        assert!(f.store.records(ArtifactKind::DataSample).is_empty());
        assert!(f.transport.invoked().is_empty());
    }

    #[tokio::test]
    async fn test_non_zip_input_is_refused_before_storing() {
        let f = fixture().await;
        let valid = write_archives(f.inputs.path(), &[("a.zip", "aaa")]).remove(0);
        let plain = f.inputs.path().join("b.csv");
        std::fs::write(&plain, "1,2,3").unwrap();

        let err = registrar(&f)
            .register(&[valid, plain], &["ds1".to_string()], false)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Archive { .. }));
        assert!(f.store.records(ArtifactKind::DataSample).is_empty());
        assert!(f.transport.invoked().is_empty());
    }

    #[tokio::test]
    async fn test_async_commit_validates_records_once_drained() {
        let f = fixture().await;
        let paths = write_archives(f.inputs.path(), &[("a.zip", "aaa"), ("b.zip", "bbb")]);

        let registration = registrar(&f)
            .with_mode(InvokeMode::Async)
            .register(&paths, &["ds1".to_string()], false)
            .await
            .unwrap();

        assert_eq!(registration.status, 202);
        assert_eq!(registration.message, ASYNC_NOTIFICATION_MESSAGE);
        assert!(!registration.is_validated());

        f.gateway.shutdown().await;

        for key in &registration.keys {
            assert!(f.store.contains_validated(ArtifactKind::DataSample, key));
        }
        assert_eq!(
            f.transport
                .invoked_with(ChaincodeFunction::RegisterData)
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn test_async_rejection_removes_records_and_allows_retry() {
        let f = fixture().await;
        f.transport.push_invoke(
            ChaincodeFunction::RegisterData,
            Scripted::Status(400, json!({"message": "unknown dataset"})),
        );
        let paths = write_archives(f.inputs.path(), &[("a.zip", "aaa")]);

        let registration = registrar(&f)
            .with_mode(InvokeMode::Async)
            .register(&paths, &["ds1".to_string()], false)
            .await
            .unwrap();
        assert_eq!(registration.status, 202);

        f.gateway.shutdown().await;

        assert!(f.store.records(ArtifactKind::DataSample).is_empty());
        assert_eq!(blob_count(&f), 0);

        let retried = registrar(&f)
            .register(&paths, &["ds1".to_string()], false)
            .await
            .unwrap();
        assert!(retried.is_validated());
        assert_eq!(retried.keys, registration.keys);
    }

    #[tokio::test]
    async fn test_already_registered_sample_is_refused() {
        let f = fixture().await;
        let paths = write_archives(f.inputs.path(), &[("a.zip", "aaa")]);
        let registrar = registrar(&f);
        registrar
            .register(&paths, &["ds1".to_string()], false)
            .await
            .unwrap();

        let err = registrar
            .register(&paths, &["ds1".to_string()], false)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidInput { .. }));
        assert_eq!(f.store.records(ArtifactKind::DataSample).len(), 1);
    }

    #[tokio::test]
    async fn test_empty_inputs_are_rejected() {
        let f = fixture().await;

        assert!(registrar(&f)
            .register(&[], &["ds1".to_string()], false)
            .await
            .is_err());
        assert!(registrar(&f)
            .register(&[PathBuf::from("x")], &[], false)
            .await
            .is_err());
    }
}
