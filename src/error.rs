//src/error.rs

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the I/O edges of the generator. Classification is
/// total; sampling only fails on invalid parameters, before any draw.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Write failure on an in-memory or caller-supplied writer.
    #[error("write error: {0}")]
    Write(#[from] io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid config '{}': {detail}", .path.display())]
    Config { path: PathBuf, detail: String },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("sink rejected record #{index}: {detail}")]
    Sink { index: usize, detail: String },
}

impl GeneratorError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        GeneratorError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, GeneratorError>;
