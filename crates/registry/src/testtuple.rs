use ledgerprep_config::Config;
use ledgerprep_core::{ContentHash, Error, Result};
use ledgerprep_ledger::{ChaincodeFunction, InvokeMode, LedgerGateway, LedgerRequest, LedgerResponse};
use std::sync::Arc;
use tracing::{info, instrument};

/// Creates test tasks for existing train tasks
pub struct TesttupleRegistrar {
    gateway: Arc<LedgerGateway>,
    mode: InvokeMode,
}

impl TesttupleRegistrar {
    pub fn new(config: &Config, gateway: Arc<LedgerGateway>) -> Self {
        Self {
            gateway,
            mode: InvokeMode::from_sync_flag(config.ledger.sync_enabled),
        }
    }

    pub fn with_mode(mut self, mode: InvokeMode) -> Self {
        self.mode = mode;
        self
    }

    /// Invoke `createTesttuple`. Returns the ledger answer on `201`/`202`.
    #[instrument(skip(self, data_keys))]
    pub async fn create(
        &self,
        traintuple_key: &str,
        dataset_key: &str,
        data_keys: &[String],
    ) -> Result<LedgerResponse> {
        let traintuple = ContentHash::parse(traintuple_key).map_err(|_| {
            Error::invalid_input(
                "traintuple_key",
                format!("'{traintuple_key}' is not a 64 character hex digest"),
            )
        })?;
        if dataset_key.is_empty() {
            return Err(Error::invalid_input("dataset_key", "must not be empty"));
        }

        let request = LedgerRequest::create_testtuple(traintuple.as_str(), dataset_key, data_keys);
        let response = self.gateway.invoke(request, self.mode).await?;

        if response.is_created() || (self.mode == InvokeMode::Async && response.is_accepted()) {
            info!(status = response.status, "Testtuple submitted");
            Ok(response)
        } else {
            Err(response.into_rejection(ChaincodeFunction::CreateTesttuple.as_str()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerprep_ledger::testing::{Scripted, ScriptedTransport};
    use ledgerprep_utils::RetryConfig;

    const TRAINTUPLE: &str = "24fb12ff87485f6b0bc5349e5bf7f36ccca4eb1353395417fdae7d8d787f178c";

    fn registrar(transport: Arc<ScriptedTransport>) -> TesttupleRegistrar {
        let gateway = Arc::new(LedgerGateway::new(transport, 1, RetryConfig::default()));
        TesttupleRegistrar::new(&Config::default(), gateway)
    }

    #[tokio::test]
    async fn test_create_invokes_with_ordered_arguments() {
        let transport = Arc::new(ScriptedTransport::new());

        let response = registrar(transport.clone())
            .create(TRAINTUPLE, "ds1", &["d1".to_string(), "d2".to_string()])
            .await
            .unwrap();

        assert!(response.is_created());
        assert_eq!(
            transport.invoked(),
            vec![LedgerRequest::create_testtuple(TRAINTUPLE, "ds1", ["d1", "d2"])]
        );
    }

    #[tokio::test]
    async fn test_malformed_traintuple_key_is_rejected_locally() {
        let transport = Arc::new(ScriptedTransport::new());

        let err = registrar(transport.clone())
            .create("not-a-key", "ds1", &[])
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidInput { ref field, .. } if field == "traintuple_key"));
        assert!(transport.invoked().is_empty());
    }

    #[tokio::test]
    async fn test_ledger_refusal_is_an_error() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_invoke(
            ChaincodeFunction::CreateTesttuple,
            Scripted::Status(400, serde_json::json!({"message": "traintuple not trained"})),
        );

        let err = registrar(transport)
            .create(TRAINTUPLE, "ds1", &["d1".to_string()])
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "ledger rejected 'createTesttuple' with status 400: traintuple not trained"
        );
    }
}
