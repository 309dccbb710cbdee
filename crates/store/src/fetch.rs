//! Remote fetch with hash verification
//!
//! Artifacts declared by the ledger are downloaded with a plain `GET` and
//! accepted only if their content hash equals the declared one. A mismatch
//! is never retried here.

use crate::hashing::compute_hash;
use bytes::Bytes;
use ledgerprep_config::FetchSettings;
use ledgerprep_core::{
    constants::{FETCH_ACCEPT_HEADER, STATUS_OK},
    Error, Result,
};
use reqwest::header::ACCEPT;
use tracing::{debug, instrument, warn};

/// HTTP client for ledger-declared artifact locations
#[derive(Debug, Clone)]
pub struct RemoteFetcher {
    client: reqwest::Client,
}

impl RemoteFetcher {
    pub fn new(settings: &FetchSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| Error::configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Download `url` and return its bytes if they hash to `expected`
    #[instrument(skip(self))]
    pub async fn fetch_and_verify(&self, url: &str, expected: &str) -> Result<Bytes> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, FETCH_ACCEPT_HEADER)
            .send()
            .await
            .map_err(|e| Error::fetch(url, None, e.to_string()))?;

        let status = response.status().as_u16();
        if status != STATUS_OK {
            return Err(Error::fetch(url, Some(status), "unexpected status"));
        }

        let content = response
            .bytes()
            .await
            .map_err(|e| Error::fetch(url, Some(status), e.to_string()))?;

        let actual = compute_hash(&content);
        if !actual.matches(expected) {
            warn!(
                actual = %actual,
                "Computed hash differs from the hosted file declaration, possible corruption or tampering"
            );
            return Err(Error::integrity(url, expected, actual.as_str()));
        }

        debug!(bytes = content.len(), "Remote artifact verified");
        Ok(content)
    }
}
