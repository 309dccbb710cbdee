//! Background invoke queue
//!
//! Asynchronous invokes are pushed onto an unbounded channel drained by a
//! fixed pool of workers. Transport failures are retried with backoff. The
//! caller has already been answered, so the final outcome goes to the job's
//! completion, if it has one, after being logged.

use crate::request::LedgerRequest;
use crate::response::LedgerResponse;
use crate::transport::LedgerTransport;
use futures::future::BoxFuture;
use ledgerprep_core::{Error, Result};
use ledgerprep_utils::{retry, RetryConfig};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Counters for queued invokes
#[derive(Debug, Default)]
pub struct QueueStats {
    pub enqueued: AtomicU64,
    pub committed: AtomicU64,
    pub rejected: AtomicU64,
    pub failed: AtomicU64,
}

/// Runs on the worker with the final outcome of a queued invoke
pub type Completion = Box<dyn FnOnce(Result<LedgerResponse>) -> BoxFuture<'static, ()> + Send>;

struct QueuedInvoke {
    request: LedgerRequest,
    completion: Option<Completion>,
}

/// Fixed pool of workers submitting invokes in the background
pub struct InvokeQueue {
    sender: Mutex<Option<mpsc::UnboundedSender<QueuedInvoke>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    stats: Arc<QueueStats>,
}

impl InvokeQueue {
    /// Spawn `workers` tasks on the current runtime
    pub fn new(transport: Arc<dyn LedgerTransport>, workers: usize, retry_config: RetryConfig) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel::<QueuedInvoke>();
        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));
        let stats = Arc::new(QueueStats::default());

        let handles = (0..workers.max(1))
            .map(|worker_id| {
                let receiver = Arc::clone(&receiver);
                let transport = Arc::clone(&transport);
                let stats = Arc::clone(&stats);
                let retry_config = retry_config.clone();
                tokio::spawn(async move {
                    loop {
                        let next = receiver.lock().await.recv().await;
                        let Some(job) = next else {
                            break;
                        };
                        let outcome =
                            submit(worker_id, transport.as_ref(), &retry_config, &stats, &job.request)
                                .await;
                        if let Some(completion) = job.completion {
                            completion(outcome).await;
                        }
                    }
                    debug!(worker_id, "Invoke worker stopped");
                })
            })
            .collect();

        Self {
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(handles),
            stats,
        }
    }

    /// Hand a request to the workers without waiting for it
    pub fn enqueue(&self, request: LedgerRequest) -> Result<()> {
        self.push(QueuedInvoke {
            request,
            completion: None,
        })
    }

    /// Like [`enqueue`](Self::enqueue), running `completion` once the
    /// ledger's final answer is known
    pub fn enqueue_then(&self, request: LedgerRequest, completion: Completion) -> Result<()> {
        self.push(QueuedInvoke {
            request,
            completion: Some(completion),
        })
    }

    fn push(&self, job: QueuedInvoke) -> Result<()> {
        let guard = self.sender.lock();
        let sender = guard
            .as_ref()
            .ok_or_else(|| Error::configuration("invoke queue is shut down"))?;

        sender
            .send(job)
            .map_err(|_| Error::configuration("invoke queue workers are gone"))?;
        self.stats.enqueued.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub fn stats(&self) -> &QueueStats {
        &self.stats
    }

    /// Stop accepting work and wait for queued requests to drain
    pub async fn shutdown(&self) {
        drop(self.sender.lock().take());

        let handles: Vec<_> = std::mem::take(&mut *self.workers.lock());
        for handle in handles {
            if let Err(e) = handle.await {
                error!(error = %e, "Invoke worker panicked");
            }
        }
        info!(
            committed = self.stats.committed.load(Ordering::Relaxed),
            rejected = self.stats.rejected.load(Ordering::Relaxed),
            failed = self.stats.failed.load(Ordering::Relaxed),
            "Invoke queue drained"
        );
    }
}

async fn submit(
    worker_id: usize,
    transport: &dyn LedgerTransport,
    retry_config: &RetryConfig,
    stats: &QueueStats,
    request: &LedgerRequest,
) -> Result<LedgerResponse> {
    let function = request.function();
    let outcome = retry(retry_config, || transport.invoke(request)).await;
    match &outcome {
        Ok(response) if response.is_created() => {
            stats.committed.fetch_add(1, Ordering::Relaxed);
            debug!(worker_id, %function, "Queued invoke committed");
        }
        Ok(response) => {
            stats.rejected.fetch_add(1, Ordering::Relaxed);
            warn!(
                worker_id,
                %function,
                status = response.status,
                message = %response.message(),
                "Queued invoke rejected by ledger"
            );
        }
        Err(e) => {
            stats.failed.fetch_add(1, Ordering::Relaxed);
            error!(worker_id, %function, error = %e, "Queued invoke failed");
        }
    }
    outcome
}
