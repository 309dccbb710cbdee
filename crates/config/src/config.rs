//! Centralized configuration
//!
//! `Config` is the single source of truth for ledger endpoints, the media
//! root and scheduling. It is immutable after construction and cheap to clone.

use ledgerprep_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Immutable process configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Root of the blob store and of task working directories
    pub media_root: PathBuf,

    /// Ledger endpoint and identity
    pub ledger: LedgerSettings,

    /// Remote artifact retrieval
    pub fetch: FetchSettings,

    /// Periodic sweeps and the background invoke queue
    pub scheduler: SchedulerSettings,
}

/// Ledger endpoint configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSettings {
    /// Base URL of the ledger gateway
    pub url: String,

    /// Organisation this node acts for
    pub org: String,

    /// Peer the gateway should address
    pub peer: String,

    /// Channel the chaincode is deployed on
    pub channel: String,

    /// Chaincode name
    pub chaincode: String,

    /// Signing certificate; its content hash is the operator identity
    pub signcert: PathBuf,

    /// Whether registrations wait for ledger commit
    pub sync_enabled: bool,

    /// Timeout of a single gateway call
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
}

/// Remote fetch configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchSettings {
    /// Timeout of a single artifact download
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
}

/// Scheduling configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulerSettings {
    /// Delay between two training+testing sweeps
    #[serde(with = "duration_secs")]
    pub interval: Duration,

    /// Number of workers draining the async invoke queue
    pub invoke_workers: usize,

    /// Retries of a queued invoke on transport failure
    pub invoke_max_retries: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            media_root: PathBuf::from("/var/lib/ledgerprep/medias"),
            ledger: LedgerSettings::default(),
            fetch: FetchSettings::default(),
            scheduler: SchedulerSettings::default(),
        }
    }
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:7050".to_string(),
            org: "owkin".to_string(),
            peer: "peer1".to_string(),
            channel: "mychannel".to_string(),
            chaincode: "mycc".to_string(),
            signcert: PathBuf::from("/etc/ledgerprep/signcert.pem"),
            sync_enabled: true,
            timeout: Duration::from_secs(30),
        }
    }
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
        }
    }
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            invoke_workers: 2,
            invoke_max_retries: 5,
        }
    }
}

impl Config {
    /// Start building a configuration from the defaults
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Reject settings the gateway and scheduler cannot work with
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.ledger.url).map_err(|e| {
            Error::configuration(format!("invalid ledger url '{}': {e}", self.ledger.url))
        })?;

        if self.scheduler.invoke_workers == 0 {
            return Err(Error::configuration("invoke_workers must be at least 1"));
        }

        if self.scheduler.interval.is_zero() {
            return Err(Error::configuration("sweep interval must be greater than zero"));
        }

        if self.media_root.as_os_str().is_empty() {
            return Err(Error::configuration("media_root must not be empty"));
        }

        Ok(())
    }
}

/// Builder for [`Config`]
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn media_root(mut self, media_root: impl Into<PathBuf>) -> Self {
        self.config.media_root = media_root.into();
        self
    }

    pub fn ledger_url(mut self, url: impl Into<String>) -> Self {
        self.config.ledger.url = url.into();
        self
    }

    pub fn org(mut self, org: impl Into<String>) -> Self {
        self.config.ledger.org = org.into();
        self
    }

    pub fn peer(mut self, peer: impl Into<String>) -> Self {
        self.config.ledger.peer = peer.into();
        self
    }

    pub fn signcert(mut self, signcert: impl Into<PathBuf>) -> Self {
        self.config.ledger.signcert = signcert.into();
        self
    }

    pub fn sync_enabled(mut self, enabled: bool) -> Self {
        self.config.ledger.sync_enabled = enabled;
        self
    }

    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.config.scheduler.interval = interval;
        self
    }

    pub fn invoke_workers(mut self, workers: usize) -> Self {
        self.config.scheduler.invoke_workers = workers;
        self
    }

    pub fn invoke_max_retries(mut self, retries: usize) -> Self {
        self.config.scheduler.invoke_max_retries = retries;
        self
    }

    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.config.fetch.timeout = timeout;
        self
    }

    /// Validate and return the configuration
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
