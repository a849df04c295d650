use std::io;
use std::path::PathBuf;

use sortmerge_types::ConfigError;

/// Errors that end a merge run.
///
/// Per-source problems never surface here; they become a [`DropReason`]
/// in the run's report instead.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The run configuration is unusable.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// The output file could not be created or truncated.
    #[error("cannot create output file {path}: {source}")]
    OutputCreate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A single input could not be opened. Recoverable: the orchestrator
    /// skips the source and carries on.
    #[error("cannot open input file {path}: {source}")]
    SourceOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// None of the inputs could be opened.
    #[error("no usable input files among {attempted} given")]
    NoUsableSources { attempted: usize },

    /// The merge thread panicked before finishing.
    #[error("merge thread panicked")]
    MergePanicked,
}

/// A push was attempted on a buffer the merge has stopped reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("buffer closed")]
pub struct BufferClosed;

/// Why a source was excluded from (the rest of) the output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DropReason {
    /// The file could not be opened; nothing was read.
    OpenFailed(String),
    /// A buffered line does not parse as the configured kind.
    InvalidValue { line: String },
    /// The buffered window contradicts the configured order.
    OrderViolation { front: String, back: String },
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenFailed(cause) => write!(f, "open failed: {cause}"),
            Self::InvalidValue { line } => write!(f, "invalid value {line:?}"),
            Self::OrderViolation { front, back } => {
                write!(f, "wrong sort order: {front:?} before {back:?}")
            }
        }
    }
}

/// Convenience alias used throughout the engine crate.
pub type Result<T> = std::result::Result<T, EngineError>;
