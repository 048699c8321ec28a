//! Error types for Darkroom image processing.
//!
//! Processing errors cross the worker thread boundary inside response
//! messages, so they carry owned strings only and are `Clone`.

use thiserror::Error;

/// Top-level error type for Darkroom operations.
#[derive(Error, Debug)]
pub enum DarkroomError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Image processing errors
    #[error("Processing error: {0}")]
    Processing(#[from] ProcessingError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Errors produced by operation handlers, the worker backend and the dispatcher.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProcessingError {
    /// Input could not be interpreted as a raster image
    #[error("Decode error for {name}: {message}")]
    Decode { name: String, message: String },

    /// Re-encoding the processed raster failed
    #[error("Encode error: {0}")]
    Encode(String),

    /// Operation parameters are out of range or malformed
    #[error("Invalid parameters: {0}")]
    Validation(String),

    /// The backend received an operation kind it does not know
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// No offloaded backend exists in this environment
    #[error("Offloaded backend is not available")]
    UnsupportedBackend,

    /// A stage (decode, or a dispatched task) did not finish in time
    #[error("Timeout in {stage} after {timeout_ms}ms")]
    Timeout { stage: String, timeout_ms: u64 },

    /// The backend itself failed; every pending task is rejected with this
    #[error("Backend fault: {0}")]
    BackendFault(String),
}

impl ProcessingError {
    /// Errors caused by the caller's parameters; retrying elsewhere cannot help.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Convenience type alias for Darkroom results.
pub type Result<T> = std::result::Result<T, DarkroomError>;

/// Convenience type alias for processing results.
pub type ProcessingResult<T> = std::result::Result<T, ProcessingError>;
