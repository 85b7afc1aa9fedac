//! Error types for CLI operations.

use std::path::Path;

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Dataset directory not found
    #[error("Dataset directory not found: {path}")]
    DatasetNotFound { path: String },

    /// An input produced by an earlier step is missing
    #[error("{what} not found at {path} ({hint})")]
    MissingInput {
        what: &'static str,
        path: String,
        hint: &'static str,
    },

    /// Configuration validation error
    #[error("Configuration validation failed: {message}")]
    ConfigValidation { message: String },
}

impl CliError {
    pub fn config_not_found(path: &Path) -> Self {
        Self::ConfigNotFound {
            path: path.display().to_string(),
        }
    }

    pub fn dataset_not_found(path: &Path) -> Self {
        Self::DatasetNotFound {
            path: path.display().to_string(),
        }
    }

    pub fn missing_input(what: &'static str, path: &Path, hint: &'static str) -> Self {
        Self::MissingInput {
            what,
            path: path.display().to_string(),
            hint,
        }
    }

    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }
}
