//! Error types for the registry engine
//!
//! Validation findings are not errors in this sense; they are collected as
//! [`crate::diagnostics::Diagnostic`] values. The types here cover failures
//! that stop an operation outright.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Failures while reading a registry document into memory
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Cannot read registry {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed {format} document: {message}")]
    Parse { format: &'static str, message: String },

    #[error("Unsupported registry format '{extension}' (expected json, yaml, yml or toml)")]
    UnsupportedFormat { extension: String },

    #[error("Registry shape check failed: {message}")]
    Shape { message: String },

    #[error("Registry does not match the data model: {0}")]
    Decode(#[from] serde_json::Error),
}

impl LoadError {
    pub(crate) fn shape(message: impl Into<String>) -> Self {
        Self::Shape {
            message: message.into(),
        }
    }
}

/// Engine-level errors
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("Schema asset error: {0}")]
    SchemaAsset(String),

    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("Version '{version}' not found in project '{project}'")]
    VersionNotFound { project: String, version: String },

    #[error("Language '{language}' not found in project '{project}'")]
    LanguageNotFound { project: String, language: String },

    #[error("Invalid environment: {0}")]
    InvalidEnvironment(String),

    #[error("Invalid change frequency: {0}")]
    InvalidChangeFrequency(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),
}
