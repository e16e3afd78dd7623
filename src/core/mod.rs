use std::{io, path::Path};

use thiserror::Error;

use crate::{power::PowerError, services::SourceError};

/// Error types for the autopower application.
///
/// Covers configuration loading and validation, plus the errors surfaced by
/// the power controller and the playback event source.
#[derive(Error, Debug)]
pub enum AutopowerError {
    /// Configuration validation error
    #[error("configuration validation failed for '{component}': {details}")]
    ConfigValidation {
        /// Component that failed validation
        component: String,
        /// Validation error details
        details: String,
    },

    /// Standard I/O operation error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// TOML parsing error with location context
    #[error("failed to parse TOML at '{location}': {details}")]
    TomlParseError {
        /// Location of TOML being parsed (file path or "string")
        location: String,
        /// Parse error details
        details: String,
    },

    /// Power controller error
    #[error(transparent)]
    Power(#[from] PowerError),

    /// Playback event source error
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// A specialized `Result` type for autopower operations.
pub type Result<T> = std::result::Result<T, AutopowerError>;

impl AutopowerError {
    /// Creates a TOML parsing error with optional file path context.
    ///
    /// # Arguments
    ///
    /// * `error` - The underlying parsing error
    /// * `path` - Optional path to the file that failed to parse
    pub fn toml_parse(error: impl std::fmt::Display, path: Option<&Path>) -> Self {
        let location = match path {
            Some(p) => {
                let clean_path = p.canonicalize().unwrap_or_else(|_| p.to_path_buf());
                clean_path.to_string_lossy().to_string()
            }
            None => "string".to_string(),
        };

        AutopowerError::TomlParseError {
            location,
            details: error.to_string(),
        }
    }

    /// Creates a validation error for a configuration component.
    pub fn validation(component: &str, details: impl Into<String>) -> Self {
        AutopowerError::ConfigValidation {
            component: component.to_string(),
            details: details.into(),
        }
    }
}
