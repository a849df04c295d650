use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while interpreting a line as a typed value.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("not an integer: {0:?}")]
    NotAnInteger(String),

    #[error("unknown value kind: {0}")]
    UnknownKind(String),

    #[error("unknown sort order: {0}")]
    UnknownOrder(String),
}

/// Errors produced while loading or validating a [`MergeConfig`](crate::MergeConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no input files given")]
    NoInputs,

    #[error("output file not specified")]
    MissingOutput,

    #[error("value kind not specified")]
    MissingKind,

    #[error("buffer capacity must be 1 or 2, got {0}")]
    InvalidCapacity(usize),

    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}
