use ledgerprep_config::Config;
use ledgerprep_core::{EventEmitter, Result};
use ledgerprep_ledger::LedgerGateway;
use ledgerprep_pipeline::TaskPreparer;
use ledgerprep_store::{register_blob_cleanup, ArtifactStore, RemoteFetcher};
use std::sync::Arc;

/// Long-lived services built once from the configuration
pub struct AppContext {
    pub config: Arc<Config>,
    pub gateway: Arc<LedgerGateway>,
    pub store: Arc<ArtifactStore>,
}

impl AppContext {
    pub async fn build(config: Config) -> Result<Self> {
        let gateway = Arc::new(LedgerGateway::from_config(&config)?);
        let store = Arc::new(ArtifactStore::open(
            config.media_root.clone(),
            EventEmitter::default(),
        )?);
        register_blob_cleanup(&store).await;

        Ok(Self {
            config: Arc::new(config),
            gateway,
            store,
        })
    }

    pub fn preparer(&self) -> Result<TaskPreparer> {
        let fetcher = RemoteFetcher::new(&self.config.fetch)?;
        Ok(TaskPreparer::new(
            &self.config,
            Arc::clone(&self.gateway),
            Arc::clone(&self.store),
            fetcher,
        ))
    }

    /// Let queued ledger invokes finish before the process exits
    pub async fn shutdown(&self) {
        self.gateway.shutdown().await;
    }
}
