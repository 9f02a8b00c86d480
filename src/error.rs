//! Error handling for the bridge
//!
//! Every lifecycle failure has its own variant so the foreign-function layer can
//! hand callers a distinct status code without inspecting messages.

use thiserror::Error;

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the bridge
#[derive(Error, Debug)]
pub enum Error {
    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML configuration parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A worker is active, the requested operation needs an idle bridge
    #[error("Worker is already running")]
    AlreadyRunning,

    /// `start` was called before any configuration was staged
    #[error("No configuration has been staged")]
    NotConfigured,

    /// No writable temporary location for the staged configuration
    #[error("Failed to create staging file: {message}")]
    StagingFailed { message: String },

    /// The staged configuration could not be written
    #[error("Failed to write staged configuration: {message}")]
    WriteFailed { message: String },

    /// The worker could not be launched
    #[error("Failed to spawn worker: {message}")]
    SpawnFailed { message: String },

    /// Rejected configuration payload or argument
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Host configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// External process errors
    #[error("External process error: {message}")]
    ExternalProcess { message: String },

    /// The async runtime backing the foreign-function layer is unavailable
    #[error("Runtime unavailable: {message}")]
    Runtime { message: String },

    /// Cancellation errors for async operations
    #[error("Operation was cancelled: {operation}")]
    Cancelled { operation: String },
}

/// Status codes handed across the C and JNI boundaries
pub mod status {
    /// Success
    pub const OK: i32 = 0;
    /// A worker is active
    pub const ALREADY_RUNNING: i32 = -1;
    /// No writable temporary location
    pub const STAGING_FAILED: i32 = -2;
    /// Payload could not be persisted
    pub const WRITE_FAILED: i32 = -3;
    /// `start` without a staged configuration
    pub const NOT_CONFIGURED: i32 = -4;
    /// Worker launch failed
    pub const SPAWN_FAILED: i32 = -5;
    /// Null, non-UTF-8, empty or malformed payload
    pub const INVALID_CONFIG: i32 = -6;
    /// Runtime could not be built
    pub const RUNTIME_UNAVAILABLE: i32 = -7;
    /// Anything else
    pub const OTHER: i32 = -99;
}

impl Error {
    /// Create a staging error
    pub fn staging_failed(message: impl Into<String>) -> Self {
        Self::StagingFailed {
            message: message.into(),
        }
    }

    /// Create a write error
    pub fn write_failed(message: impl Into<String>) -> Self {
        Self::WriteFailed {
            message: message.into(),
        }
    }

    /// Create a spawn error
    pub fn spawn_failed(message: impl Into<String>) -> Self {
        Self::SpawnFailed {
            message: message.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a host configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an external process error
    pub fn external_process(message: impl Into<String>) -> Self {
        Self::ExternalProcess {
            message: message.into(),
        }
    }

    /// Create a runtime error
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime {
            message: message.into(),
        }
    }

    /// Create a cancellation error
    pub fn cancelled(operation: impl Into<String>) -> Self {
        Self::Cancelled {
            operation: operation.into(),
        }
    }

    /// Status code reported across the foreign-function boundary
    pub fn status_code(&self) -> i32 {
        match self {
            Error::AlreadyRunning => status::ALREADY_RUNNING,
            Error::StagingFailed { .. } => status::STAGING_FAILED,
            Error::WriteFailed { .. } => status::WRITE_FAILED,
            Error::NotConfigured => status::NOT_CONFIGURED,
            Error::SpawnFailed { .. } => status::SPAWN_FAILED,
            Error::InvalidConfig { .. } | Error::Json(_) => status::INVALID_CONFIG,
            Error::Runtime { .. } => status::RUNTIME_UNAVAILABLE,
            _ => status::OTHER,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Error::Json(_) => "json",
            Error::Yaml(_) => "yaml",
            Error::Io(_) => "io",
            Error::AlreadyRunning => "already_running",
            Error::NotConfigured => "not_configured",
            Error::StagingFailed { .. } => "staging",
            Error::WriteFailed { .. } => "write",
            Error::SpawnFailed { .. } => "spawn",
            Error::InvalidConfig { .. } => "invalid_config",
            Error::Config { .. } => "config",
            Error::ExternalProcess { .. } => "external_process",
            Error::Runtime { .. } => "runtime",
            Error::Cancelled { .. } => "cancelled",
        }
    }
}
