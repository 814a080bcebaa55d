//! Core error types for focusdeck-core.
//!
//! One umbrella [`CoreError`] with per-subsystem enums underneath, all
//! built on thiserror so callers can match on the failure class.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for focusdeck-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Task-store client errors
    #[error("Task store error: {0}")]
    Store(#[from] StoreError),

    /// Ranking-service errors
    #[error("Ranking error: {0}")]
    Ranking(#[from] RankingError),

    /// Invocation parameter validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to parse the configuration file
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Task-store client errors.
#[derive(Error, Debug)]
pub enum StoreError {
    /// No API token configured for the task store
    #[error("Task store token is not configured (set store.token or FOCUSDECK_STORE_TOKEN)")]
    MissingToken,

    /// The configured base URL is not a valid URL
    #[error("Invalid task store URL '{0}'")]
    InvalidBaseUrl(String),

    /// Non-retryable HTTP error status from the store
    #[error("Task store returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Network/transport failure
    #[error("Task store request failed: {0}")]
    Transport(String),

    /// Retryable failures exhausted the retry budget
    #[error("Task store request failed after {attempts} attempts: {message}")]
    ExhaustedRetries { attempts: usize, message: String },

    /// Response body did not match the expected shape
    #[error("Failed to decode task store response: {0}")]
    Decode(String),
}

/// Ranking-service errors. All of these degrade to the heuristic order;
/// none of them fail a focus session.
#[derive(Error, Debug)]
pub enum RankingError {
    /// No API key configured
    #[error("Ranking service is not configured")]
    Unconfigured,

    /// The single ranking call exceeded its deadline
    #[error("Ranking request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// HTTP error status from the service
    #[error("Ranking service returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Network/transport failure
    #[error("Ranking request failed: {0}")]
    Transport(String),

    /// The service replied, but not with parseable ranking JSON
    #[error("Malformed ranking response: {0}")]
    MalformedResponse(String),
}

/// Invocation parameter validation errors. The one error class surfaced
/// as a hard failure to callers of the engine.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// Numeric parameter outside its allowed range
    #[error("'{field}' must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: String,
        value: i64,
        min: i64,
        max: i64,
    },
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        StoreError::Transport(err.to_string())
    }
}

impl From<reqwest::Error> for RankingError {
    fn from(err: reqwest::Error) -> Self {
        RankingError::Transport(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
