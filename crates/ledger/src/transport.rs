//! Ledger transports
//!
//! [`HttpLedgerTransport`] talks to a ledger gateway over HTTP. Each call is a
//! `POST` to `{url}/query` or `{url}/invoke` with the channel coordinates and
//! the chaincode arguments; the HTTP status becomes the ledger status.

use crate::request::LedgerRequest;
use crate::response::LedgerResponse;
use async_trait::async_trait;
use ledgerprep_config::LedgerSettings;
use ledgerprep_core::{Error, Result};
use serde_json::{json, Value};
use tracing::{debug, instrument};

/// Ledger primitives
///
/// `invoke` waits for the transaction to be committed. Asynchronous submission
/// is layered on top by the gateway.
#[async_trait]
pub trait LedgerTransport: Send + Sync {
    /// Read-only chaincode call
    async fn query(&self, request: &LedgerRequest) -> Result<LedgerResponse>;

    /// State-changing chaincode call
    async fn invoke(&self, request: &LedgerRequest) -> Result<LedgerResponse>;
}

/// HTTP client for a ledger gateway
#[derive(Debug, Clone)]
pub struct HttpLedgerTransport {
    base_url: String,
    org: String,
    peer: String,
    channel: String,
    chaincode: String,
    client: reqwest::Client,
}

impl HttpLedgerTransport {
    pub fn new(settings: &LedgerSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| Error::transport(&settings.url, e.to_string()))?;

        Ok(Self {
            base_url: settings.url.trim_end_matches('/').to_string(),
            org: settings.org.clone(),
            peer: settings.peer.clone(),
            channel: settings.channel.clone(),
            chaincode: settings.chaincode.clone(),
            client,
        })
    }

    fn envelope(&self, request: &LedgerRequest) -> Value {
        json!({
            "org": self.org,
            "peer": self.peer,
            "channel": self.channel,
            "chaincode": self.chaincode,
            "args": request,
        })
    }

    async fn post(&self, endpoint: &str, request: &LedgerRequest) -> Result<LedgerResponse> {
        let url = format!("{}/{endpoint}", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&self.envelope(request))
            .send()
            .await
            .map_err(|e| Error::transport(&url, e.to_string()))?;

        let status = response.status().as_u16();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::transport(&url, e.to_string()))?;

        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        debug!(
            function = %request.function(),
            status,
            "Ledger call completed"
        );

        Ok(LedgerResponse::new(status, body))
    }
}

#[async_trait]
impl LedgerTransport for HttpLedgerTransport {
    #[instrument(skip_all, fields(function = %request.function()))]
    async fn query(&self, request: &LedgerRequest) -> Result<LedgerResponse> {
        self.post("query", request).await
    }

    #[instrument(skip_all, fields(function = %request.function()))]
    async fn invoke(&self, request: &LedgerRequest) -> Result<LedgerResponse> {
        self.post("invoke", request).await
    }
}
