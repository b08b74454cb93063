//! Error types for API model loading.

use thiserror::Error;

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors that can occur while loading an API description.
#[derive(Error, Debug)]
pub enum ModelError {
    /// OpenAPI spec parsing error
    #[error("Failed to parse OpenAPI spec: {0}")]
    ParseError(String),

    /// Invalid OpenAPI specification
    #[error("Invalid OpenAPI spec: {0}")]
    InvalidSpec(String),

    /// HTTP request error while downloading a description
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Operation not found
    #[error("Operation '{0}' not found in the API model")]
    OperationNotFound(String),
}
