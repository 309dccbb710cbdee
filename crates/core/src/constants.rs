//! Constants shared across the workspace

/// Query succeeded
pub const STATUS_OK: u16 = 200;

/// Transaction committed on the ledger
pub const STATUS_CREATED: u16 = 201;

/// Transaction handed to the background invoke queue
pub const STATUS_ACCEPTED: u16 = 202;

/// Rejected by the wrapping gateway as malformed
pub const STATUS_BAD_REQUEST: u16 = 400;

/// Ledger did not commit in time
pub const STATUS_REQUEST_TIMEOUT: u16 = 408;

/// Accept header sent when fetching remote artifacts
pub const FETCH_ACCEPT_HEADER: &str = "application/json;version=0.0";

/// Directory under the media root holding task working directories
pub const TASK_ROOT_DIR: &str = "traintuple";

/// Working directory subfolder receiving the dataset opener
pub const OPENER_DIR: &str = "opener";

/// Working directory subfolder receiving the data samples
pub const DATA_DIR: &str = "data";

/// Working directory subfolder receiving the model
pub const MODEL_DIR: &str = "model";

/// Working directory subfolder reserved for predictions
pub const PRED_DIR: &str = "pred";

/// Directory under the media root holding the persisted artifact index
pub const INDEX_DIR: &str = ".index";

/// Ledger composite key used to list tasks by worker and status
pub const TASK_FILTER_INDEX: &str = "traintuple~trainWorker~status";

/// Message returned when a ledger write is handed to the invoke queue
pub const ASYNC_NOTIFICATION_MESSAGE: &str = "The network has been notified of this request. \
     Please be aware you won't get return values from the ledger. You will need to check manually";

// Environment variables read by the configuration loader
pub const ENV_CONFIG_FILE: &str = "LEDGERPREP_CONFIG";
pub const ENV_MEDIA_ROOT: &str = "LEDGERPREP_MEDIA_ROOT";
pub const ENV_LEDGER_URL: &str = "LEDGERPREP_LEDGER_URL";
pub const ENV_LEDGER_ORG: &str = "LEDGERPREP_LEDGER_ORG";
pub const ENV_LEDGER_PEER: &str = "LEDGERPREP_LEDGER_PEER";
pub const ENV_LEDGER_CHANNEL: &str = "LEDGERPREP_LEDGER_CHANNEL";
pub const ENV_LEDGER_CHAINCODE: &str = "LEDGERPREP_LEDGER_CHAINCODE";
pub const ENV_SIGNCERT: &str = "LEDGERPREP_SIGNCERT";
pub const ENV_LEDGER_SYNC: &str = "LEDGERPREP_LEDGER_SYNC";
pub const ENV_SWEEP_INTERVAL_SECS: &str = "LEDGERPREP_SWEEP_INTERVAL_SECS";
pub const ENV_INVOKE_WORKERS: &str = "LEDGERPREP_INVOKE_WORKERS";
