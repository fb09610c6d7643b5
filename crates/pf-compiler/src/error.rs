//! Compiler error types

use std::path::PathBuf;

use pf_core::RuleBaseError;

/// Error type for loading and validating a compiler configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid {field} regex {pattern:?}: {source}")]
    Regex {
        field: &'static str,
        pattern: String,
        #[source]
        source: Box<regex::Error>,
    },
    #[error("Unknown option {name:?} in {field}")]
    UnknownOption { field: &'static str, name: String },
}

/// Error type for a compile pass.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    RuleBase(#[from] RuleBaseError),
}
