use crate::queue::{Completion, InvokeQueue};
use crate::request::LedgerRequest;
use crate::response::LedgerResponse;
use crate::transport::{HttpLedgerTransport, LedgerTransport};
use ledgerprep_config::Config;
use ledgerprep_core::{constants::ASYNC_NOTIFICATION_MESSAGE, Result};
use ledgerprep_utils::RetryConfig;
use std::sync::Arc;
use tracing::{debug, instrument};

/// How an invoke waits for the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvokeMode {
    /// Wait for commit; `201` on success
    Sync,
    /// Queue for background submission; always `202`
    Async,
}

impl InvokeMode {
    pub fn from_sync_flag(sync_enabled: bool) -> Self {
        if sync_enabled {
            InvokeMode::Sync
        } else {
            InvokeMode::Async
        }
    }
}

/// Single entry point to the ledger
pub struct LedgerGateway {
    transport: Arc<dyn LedgerTransport>,
    queue: InvokeQueue,
}

impl LedgerGateway {
    /// Build a gateway over `transport`. Must be called inside a Tokio runtime.
    pub fn new(transport: Arc<dyn LedgerTransport>, workers: usize, retry_config: RetryConfig) -> Self {
        let queue = InvokeQueue::new(Arc::clone(&transport), workers, retry_config);
        Self { transport, queue }
    }

    /// HTTP gateway configured from `config`
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = Arc::new(HttpLedgerTransport::new(&config.ledger)?);
        Ok(Self::new(
            transport,
            config.scheduler.invoke_workers,
            RetryConfig::for_ledger(config.scheduler.invoke_max_retries),
        ))
    }

    #[instrument(skip_all, fields(function = %request.function()))]
    pub async fn query(&self, request: &LedgerRequest) -> Result<LedgerResponse> {
        self.transport.query(request).await
    }

    /// Submit a transaction.
    ///
    /// In async mode the request is queued and `202` is returned at once with
    /// a notification message; no completion signal follows.
    #[instrument(skip_all, fields(function = %request.function(), mode = ?mode))]
    pub async fn invoke(&self, request: LedgerRequest, mode: InvokeMode) -> Result<LedgerResponse> {
        match mode {
            InvokeMode::Sync => self.transport.invoke(&request).await,
            InvokeMode::Async => {
                self.queue.enqueue(request)?;
                debug!("Invoke queued");
                Ok(LedgerResponse::accepted(ASYNC_NOTIFICATION_MESSAGE))
            }
        }
    }

    /// Queue `request` and answer `202` at once. `completion` runs on the
    /// worker with the ledger's final answer, after retries.
    #[instrument(skip_all, fields(function = %request.function()))]
    pub async fn invoke_queued(
        &self,
        request: LedgerRequest,
        completion: Completion,
    ) -> Result<LedgerResponse> {
        self.queue.enqueue_then(request, completion)?;
        debug!("Invoke queued with completion");
        Ok(LedgerResponse::accepted(ASYNC_NOTIFICATION_MESSAGE))
    }

    pub fn queue(&self) -> &InvokeQueue {
        &self.queue
    }

    /// Drain queued invokes
    pub async fn shutdown(&self) {
        self.queue.shutdown().await;
    }
}
