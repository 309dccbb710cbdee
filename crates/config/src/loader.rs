//! Configuration loader with precedence handling
//!
//! Defaults are overridden by an optional JSON file, which is in turn
//! overridden by `LEDGERPREP_*` environment variables.

use crate::config::Config;
use ledgerprep_core::{
    constants::{
        ENV_CONFIG_FILE, ENV_INVOKE_WORKERS, ENV_LEDGER_CHAINCODE, ENV_LEDGER_CHANNEL,
        ENV_LEDGER_ORG, ENV_LEDGER_PEER, ENV_LEDGER_SYNC, ENV_LEDGER_URL, ENV_MEDIA_ROOT,
        ENV_SIGNCERT, ENV_SWEEP_INTERVAL_SECS,
    },
    Error, Result, ResultExt,
};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where the effective configuration came from, for diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Default,
    ConfigFile(PathBuf),
    EnvironmentVariable(String),
}

/// Loads [`Config`] once at start-up
#[derive(Debug)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    use_env: bool,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            file: None,
            use_env: true,
        }
    }

    /// Read overrides from this JSON file instead of `LEDGERPREP_CONFIG`
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Skip environment variable overrides
    pub fn without_env(mut self) -> Self {
        self.use_env = false;
        self
    }

    /// Load and validate the configuration, returning the sources applied
    pub fn load(self) -> Result<(Config, Vec<ConfigSource>)> {
        let mut config = Config::default();
        let mut sources = vec![ConfigSource::Default];

        let file = self.file.clone().or_else(|| {
            if self.use_env {
                std::env::var(ENV_CONFIG_FILE).ok().map(PathBuf::from)
            } else {
                None
            }
        });

        if let Some(path) = file {
            apply_file(&mut config, &path)?;
            sources.push(ConfigSource::ConfigFile(path));
        }

        if self.use_env {
            let applied = apply_env(&mut config)?;
            if !applied.is_empty() {
                sources.push(ConfigSource::EnvironmentVariable(applied.join(",")));
            }
        }

        config.validate()?;

        tracing::debug!(
            media_root = %config.media_root.display(),
            ledger_url = %config.ledger.url,
            sources = ?sources,
            "Configuration loaded"
        );

        Ok((config, sources))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_file(config: &mut Config, path: &Path) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::file_system(path, "read config file", e))?;

    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("invalid JSON in config file {}", path.display()))?;

    if let Some(media_root) = value.get("media_root").and_then(Value::as_str) {
        config.media_root = PathBuf::from(media_root);
    }

    if let Some(ledger) = value.get("ledger").and_then(Value::as_object) {
        let ledger_cfg = &mut config.ledger;
        if let Some(v) = ledger.get("url").and_then(Value::as_str) {
            ledger_cfg.url = v.to_string();
        }
        if let Some(v) = ledger.get("org").and_then(Value::as_str) {
            ledger_cfg.org = v.to_string();
        }
        if let Some(v) = ledger.get("peer").and_then(Value::as_str) {
            ledger_cfg.peer = v.to_string();
        }
        if let Some(v) = ledger.get("channel").and_then(Value::as_str) {
            ledger_cfg.channel = v.to_string();
        }
        if let Some(v) = ledger.get("chaincode").and_then(Value::as_str) {
            ledger_cfg.chaincode = v.to_string();
        }
        if let Some(v) = ledger.get("signcert").and_then(Value::as_str) {
            ledger_cfg.signcert = PathBuf::from(v);
        }
        if let Some(v) = ledger.get("sync_enabled").and_then(Value::as_bool) {
            ledger_cfg.sync_enabled = v;
        }
        if let Some(v) = ledger.get("timeout").and_then(Value::as_u64) {
            ledger_cfg.timeout = Duration::from_secs(v);
        }
    }

    if let Some(v) = value
        .get("fetch")
        .and_then(|f| f.get("timeout"))
        .and_then(Value::as_u64)
    {
        config.fetch.timeout = Duration::from_secs(v);
    }

    if let Some(scheduler) = value.get("scheduler").and_then(Value::as_object) {
        if let Some(v) = scheduler.get("interval").and_then(Value::as_u64) {
            config.scheduler.interval = Duration::from_secs(v);
        }
        if let Some(v) = scheduler.get("invoke_workers").and_then(Value::as_u64) {
            config.scheduler.invoke_workers = v as usize;
        }
        if let Some(v) = scheduler.get("invoke_max_retries").and_then(Value::as_u64) {
            config.scheduler.invoke_max_retries = v as usize;
        }
    }

    Ok(())
}

fn apply_env(config: &mut Config) -> Result<Vec<String>> {
    let mut applied = Vec::new();

    let mut string_var = |name: &str, target: &mut String| {
        if let Ok(value) = std::env::var(name) {
            *target = value;
            applied.push(name.to_string());
        }
    };
    string_var(ENV_LEDGER_URL, &mut config.ledger.url);
    string_var(ENV_LEDGER_ORG, &mut config.ledger.org);
    string_var(ENV_LEDGER_PEER, &mut config.ledger.peer);
    string_var(ENV_LEDGER_CHANNEL, &mut config.ledger.channel);
    string_var(ENV_LEDGER_CHAINCODE, &mut config.ledger.chaincode);

    if let Ok(value) = std::env::var(ENV_MEDIA_ROOT) {
        config.media_root = PathBuf::from(value);
        applied.push(ENV_MEDIA_ROOT.to_string());
    }

    if let Ok(value) = std::env::var(ENV_SIGNCERT) {
        config.ledger.signcert = PathBuf::from(value);
        applied.push(ENV_SIGNCERT.to_string());
    }

    if let Ok(value) = std::env::var(ENV_LEDGER_SYNC) {
        config.ledger.sync_enabled = matches!(value.to_lowercase().as_str(), "1" | "true" | "yes");
        applied.push(ENV_LEDGER_SYNC.to_string());
    }

    if let Ok(value) = std::env::var(ENV_SWEEP_INTERVAL_SECS) {
        let secs = value.parse::<u64>().map_err(|e| {
            Error::configuration(format!("{ENV_SWEEP_INTERVAL_SECS}='{value}': {e}"))
        })?;
        config.scheduler.interval = Duration::from_secs(secs);
        applied.push(ENV_SWEEP_INTERVAL_SECS.to_string());
    }

    if let Ok(value) = std::env::var(ENV_INVOKE_WORKERS) {
        config.scheduler.invoke_workers = value.parse::<usize>().map_err(|e| {
            Error::configuration(format!("{ENV_INVOKE_WORKERS}='{value}': {e}"))
        })?;
        applied.push(ENV_INVOKE_WORKERS.to_string());
    }

    Ok(applied)
}
