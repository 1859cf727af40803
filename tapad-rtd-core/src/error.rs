//! Error types for Tapad RTD operations

use thiserror::Error;

/// Key-value store errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Read failed for key {key}: {reason}")]
    ReadFailed { key: String, reason: String },

    #[error("Write failed for key {key}: {reason}")]
    WriteFailed { key: String, reason: String },

    #[error("Remove failed for key {key}: {reason}")]
    RemoveFailed { key: String, reason: String },

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

/// HTTP transport errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("Request to {url} failed with status {status}: {message}")]
    RequestFailed {
        url: String,
        status: u16,
        message: String,
    },

    #[error("Request to {url} could not be sent: {reason}")]
    Unreachable { url: String, reason: String },

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("Failed to build HTTP client: {reason}")]
    ClientBuild { reason: String },
}

/// Encoding and decoding errors at the JSON boundary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("Response body is empty")]
    EmptyBody,

    #[error("Invalid envelope response: {reason}")]
    InvalidResponse { reason: String },

    #[error("Failed to serialize envelope: {reason}")]
    Serialize { reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all Tapad RTD errors.
#[derive(Debug, Clone, Error)]
pub enum RtdError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for Tapad RTD operations.
pub type RtdResult<T> = Result<T, RtdError>;

// =============================================================================
// TESTS
// =============================================================================
