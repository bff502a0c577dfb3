//! Error types for batch compilation.
//!
//! [`CftemplateError`] covers the failures that abort a batch. Problems inside
//! a template are never errors of this type; they are reported as issues on
//! the file's [`CompileResult`](cftemplate_core::CompileResult).

use std::{io, path::PathBuf};

use thiserror::Error;

/// The main error type for cftemplate operations.
#[derive(Debug, Error)]
pub enum CftemplateError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to walk source directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Invalid file pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("Failed to serialize {}: {source}", path.display())]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{count} errors compiling CloudFormation templates")]
    BatchFailed { count: usize },
}

impl CftemplateError {
    /// Create an `Io` error for `path`.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
