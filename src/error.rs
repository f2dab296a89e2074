//! Errors for a generation run.
//!
//! Everything here is fatal: the run stops at the first error. Artifacts
//! already written stay on disk.

use std::io;
use std::path::PathBuf;

use polybind_core::{ModelError, ParseError};
use thiserror::Error;

/// Invalid or unreadable configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("{action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl GenerateError {
    pub(crate) fn io(action: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        GenerateError::Io {
            action,
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, GenerateError>;
