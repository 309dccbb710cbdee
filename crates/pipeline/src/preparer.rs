//! Sweep over the ledger tasks of one phase
//!
//! Per task: make sure the challenge metrics are held locally, fetch and
//! verify the algorithm and phase model, then stage opener, data samples,
//! model and algorithm into a fresh working directory after re-hashing each
//! local blob. The task's next status is reported last. Any failure on the
//! way is written back with `logFailTrainTest` and the sweep continues.

use crate::phase::Phase;
use crate::workdir::WorkingDirectory;
use ledgerprep_config::Config;
use ledgerprep_core::{
    constants::STATUS_OK, ArtifactKind, ArtifactRef, ContentHash, Error, Result, Task,
};
use ledgerprep_ledger::{ChaincodeFunction, InvokeMode, LedgerGateway, LedgerRequest};
use ledgerprep_store::{hash_file, ArtifactStore, RemoteFetcher};
use ledgerprep_utils::{extract_in_place, fs::copy_into};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};

/// Outcome of one sweep
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub phase: Phase,
    /// Keys of staged tasks, in ledger order
    pub prepared: Vec<String>,
    /// Keys of failed tasks with the reason sent to the ledger
    pub failed: Vec<(String, String)>,
}

impl SweepReport {
    fn new(phase: Phase) -> Self {
        Self {
            phase,
            prepared: Vec::new(),
            failed: Vec::new(),
        }
    }

    pub fn total(&self) -> usize {
        self.prepared.len() + self.failed.len()
    }
}

pub struct TaskPreparer {
    signcert: PathBuf,
    gateway: Arc<LedgerGateway>,
    store: Arc<ArtifactStore>,
    fetcher: RemoteFetcher,
}

impl TaskPreparer {
    pub fn new(
        config: &Config,
        gateway: Arc<LedgerGateway>,
        store: Arc<ArtifactStore>,
        fetcher: RemoteFetcher,
    ) -> Self {
        Self {
            signcert: config.ledger.signcert.clone(),
            gateway,
            store,
            fetcher,
        }
    }

    /// Content hash of the signing certificate, the ledger partition key
    pub fn operator_identity(&self) -> Result<ContentHash> {
        hash_file(&self.signcert)
    }

    /// Process every task currently listed for `phase`, in ledger order.
    ///
    /// Fails only when the task list itself cannot be obtained.
    pub async fn sweep(&self, phase: Phase) -> Result<SweepReport> {
        let span = info_span!("sweep", phase = %phase);
        self.sweep_inner(phase).instrument(span).await
    }

    async fn sweep_inner(&self, phase: Phase) -> Result<SweepReport> {
        let tasks = self.list_tasks(phase).await?;
        info!(count = tasks.len(), "Tasks listed");

        let mut report = SweepReport::new(phase);
        for entry in tasks {
            let task: Task = match serde_json::from_value(entry.clone()) {
                Ok(task) => task,
                Err(e) => {
                    let message = format!("malformed task: {e}");
                    match entry.get("key").and_then(Value::as_str) {
                        Some(key) => {
                            self.report_failure(key, &message).await;
                            report.failed.push((key.to_string(), message));
                        }
                        None => warn!(error = %e, "Skipping task without a key"),
                    }
                    continue;
                }
            };

            let span = info_span!("task", task_key = %task.key);
            let outcome = self.prepare(&task, phase).instrument(span.clone()).await;
            match outcome {
                Ok(dir) => {
                    self.report_started(&task.key, phase)
                        .instrument(span)
                        .await;
                    info!(task_key = %task.key, path = %dir.root().display(), "Task staged");
                    report.prepared.push(task.key);
                }
                Err(e) => {
                    let message = e.to_string();
                    warn!(task_key = %task.key, error = %message, "Task preparation failed");
                    self.report_failure(&task.key, &message)
                        .instrument(span)
                        .await;
                    report.failed.push((task.key, message));
                }
            }
        }

        info!(
            prepared = report.prepared.len(),
            failed = report.failed.len(),
            "Sweep finished"
        );
        Ok(report)
    }

    async fn list_tasks(&self, phase: Phase) -> Result<Vec<Value>> {
        let identity = self.operator_identity()?;
        let request = LedgerRequest::query_tasks(identity.as_str(), phase.status_filter().as_str());
        let response = self.gateway.query(&request).await?;

        if response.status != STATUS_OK {
            return Err(response.into_rejection(ChaincodeFunction::QueryFilter.as_str()));
        }

        match response.body {
            Value::Null => Ok(Vec::new()),
            Value::Array(tasks) => Ok(tasks),
            other => Err(Error::invalid_input(
                "queryFilter",
                format!("expected a list of tasks, got {other}"),
            )),
        }
    }

    /// Stage one task. Nothing is reported to the ledger here.
    pub async fn prepare(&self, task: &Task, phase: Phase) -> Result<WorkingDirectory> {
        self.ensure_challenge_metrics(task).await?;

        self.fetch_verified(ArtifactKind::Algorithm, &task.algo).await?;
        let model_ref = phase.model_ref(task)?;
        self.fetch_verified(ArtifactKind::Model, model_ref).await?;

        let dir = WorkingDirectory::create(self.store.media_root(), &task.key)?;

        let data = phase.data_ref(task)?;
        let opener = self.verified_record(ArtifactKind::Dataset, &data.opener_hash)?;
        copy_into(&opener, &dir.opener())?;

        for key in &data.keys {
            let sample = self.verified_record(ArtifactKind::DataSample, key)?;
            let archive = copy_into(&sample, &dir.data())?;
            extract_in_place(&archive)?;
            debug!(data_key = %key, "Data sample unpacked");
        }

        let model = self.verified_record(ArtifactKind::Model, &model_ref.hash)?;
        copy_into(&model, &dir.model())?;

        let algo = self.verified_record(ArtifactKind::Algorithm, &task.algo.hash)?;
        copy_into(&algo, dir.root())?;

        Ok(dir)
    }

    async fn ensure_challenge_metrics(&self, task: &Task) -> Result<()> {
        let metrics = &task.challenge.metrics;
        let held = ContentHash::parse(&metrics.hash)
            .map(|hash| self.store.contains_validated(ArtifactKind::ChallengeMetrics, &hash))
            .unwrap_or(false);
        if held {
            return Ok(());
        }

        debug!(challenge = %task.challenge.hash, "Fetching challenge metrics");
        let content = self
            .fetcher
            .fetch_and_verify(&metrics.storage_address, &metrics.hash)
            .await?;
        self.store
            .persist_blob(
                ArtifactKind::ChallengeMetrics,
                ArtifactKind::ChallengeMetrics.default_file_name(),
                &content,
                true,
            )
            .await?;
        Ok(())
    }

    /// Fetch and verify a declared artifact, keeping the bytes when no
    /// validated local copy exists yet
    async fn fetch_verified(&self, kind: ArtifactKind, artifact: &ArtifactRef) -> Result<()> {
        let content = self
            .fetcher
            .fetch_and_verify(&artifact.storage_address, &artifact.hash)
            .await?;

        let hash = ContentHash::parse(&artifact.hash)?;
        if !self.store.contains_validated(kind, &hash) {
            self.store
                .persist_blob(kind, kind.default_file_name(), &content, true)
                .await?;
        }
        Ok(())
    }

    /// Blob path of a local record whose bytes still hash to `declared`
    fn verified_record(&self, kind: ArtifactKind, declared: &str) -> Result<PathBuf> {
        let record = self.store.require(kind, declared)?;
        self.store.verify(&record, declared)?;
        Ok(record.blob_path)
    }

    async fn report_started(&self, task_key: &str, phase: Phase) {
        let request = LedgerRequest::log_start(task_key, phase.next_status().as_str());
        self.notify(request).await;
    }

    async fn report_failure(&self, task_key: &str, message: &str) {
        self.notify(LedgerRequest::log_fail(task_key, message)).await;
    }

    /// Best-effort status notification; the outcome is only logged
    async fn notify(&self, request: LedgerRequest) {
        let function = request.function();
        match self.gateway.invoke(request, InvokeMode::Sync).await {
            Ok(response) if response.is_created() => {
                debug!(%function, "Ledger notified");
            }
            Ok(response) => warn!(
                %function,
                status = response.status,
                message = %response.message(),
                "Ledger did not commit status update"
            ),
            Err(e) => warn!(%function, error = %e, "Ledger unreachable for status update"),
        }
    }
}
