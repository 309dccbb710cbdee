use std::path::PathBuf;

/// Result type alias for ledgerprep operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for ledgerprep operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The ledger gateway or a remote host could not be reached
    #[error("transport error for '{endpoint}': {message}")]
    Transport { endpoint: String, message: String },

    /// A reachable ledger answered with a non-success status
    #[error("ledger rejected '{function}' with status {status}: {message}")]
    LedgerRejection {
        function: String,
        status: u16,
        message: String,
    },

    /// Declared and computed content hashes disagree
    #[error("integrity check failed for {subject}: expected hash {expected}, computed {actual}")]
    Integrity {
        subject: String,
        expected: String,
        actual: String,
    },

    /// A referenced local artifact record is missing
    #[error("{kind} '{key}' not found in local store")]
    NotFound { kind: String, key: String },

    /// Remote artifact retrieval failed
    #[error("{}", format_fetch_error(.url, .status, .message))]
    Fetch {
        url: String,
        status: Option<u16>,
        message: String,
    },

    /// File system operations
    #[error("file system {operation} operation failed for '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// Archive extraction errors
    #[error("failed to extract archive '{path}': {message}")]
    Archive { path: PathBuf, message: String },

    /// Configuration errors
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// Caller supplied arguments that cannot be used
    #[error("invalid input for '{field}': {message}")]
    InvalidInput { field: String, message: String },

    /// Two registration inputs resolve to the same content hash
    #[error("Your data archives/paths contain same files leading to same pkhash, please review the content of your achives/paths. {first} and {second} are the same")]
    DuplicateContent { first: String, second: String },
}

fn format_fetch_error(url: &str, status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("fetching '{url}' returned status code {code}: {message}"),
        None => format!("failed to fetch '{url}': {message}"),
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::FileSystem {
            path: PathBuf::new(),
            operation: "unknown".to_string(),
            source: error,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::Json {
            message: error.to_string(),
            source: error,
        }
    }
}

impl Error {
    /// Create a transport error
    #[must_use]
    pub fn transport(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Transport {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create a ledger rejection error
    #[must_use]
    pub fn ledger_rejection(
        function: impl Into<String>,
        status: u16,
        message: impl Into<String>,
    ) -> Self {
        Error::LedgerRejection {
            function: function.into(),
            status,
            message: message.into(),
        }
    }

    /// Create an integrity error
    #[must_use]
    pub fn integrity(
        subject: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Error::Integrity {
            subject: subject.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a not-found error
    #[must_use]
    pub fn not_found(kind: impl Into<String>, key: impl Into<String>) -> Self {
        Error::NotFound {
            kind: kind.into(),
            key: key.into(),
        }
    }

    /// Create a fetch error
    #[must_use]
    pub fn fetch(url: impl Into<String>, status: Option<u16>, message: impl Into<String>) -> Self {
        Error::Fetch {
            url: url.into(),
            status,
            message: message.into(),
        }
    }

    /// Create a file system error with context
    #[must_use]
    pub fn file_system(
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Error::FileSystem {
            path: path.into(),
            operation: operation.into(),
            source,
        }
    }

    /// Create an archive error
    #[must_use]
    pub fn archive(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Error::Archive {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Create an invalid input error
    #[must_use]
    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a duplicate content error naming both colliding inputs
    #[must_use]
    pub fn duplicate_content(first: impl Into<String>, second: impl Into<String>) -> Self {
        Error::DuplicateContent {
            first: first.into(),
            second: second.into(),
        }
    }

    /// Whether the failure may clear up on its own. Only unreachable
    /// endpoints qualify; integrity failures never do.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Transport { .. })
    }
}

// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to a Result
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a lazy message
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<Error>,
{
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let base_error = e.into();
            Error::Configuration {
                message: format!("{}: {}", message.into(), base_error),
            }
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let base_error = e.into();
            Error::Configuration {
                message: format!("{}: {}", f(), base_error),
            }
        })
    }
}
