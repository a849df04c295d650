use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::mode::{MergeMode, SortOrder, ValueKind};

/// Upper bound on values buffered per source.
pub const MAX_BUFFER_CAPACITY: usize = 2;

/// Fully resolved configuration for one merge run.
///
/// Built once before any source is opened and passed by reference to the
/// engine and the sink; nothing mutates it afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeConfig {
    pub mode: MergeMode,
    pub output: PathBuf,
    pub inputs: Vec<PathBuf>,
    /// Values each source may buffer ahead of the merge.
    pub buffer_capacity: usize,
    /// How long the merge parks when a live source has nothing buffered yet.
    pub idle_wait_ms: u64,
}

impl MergeConfig {
    pub fn new(mode: MergeMode, output: impl Into<PathBuf>, inputs: Vec<PathBuf>) -> Self {
        Self {
            mode,
            output: output.into(),
            inputs,
            buffer_capacity: MAX_BUFFER_CAPACITY,
            idle_wait_ms: 1,
        }
    }

    pub fn idle_wait(&self) -> Duration {
        Duration::from_millis(self.idle_wait_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.inputs.is_empty() {
            return Err(ConfigError::NoInputs);
        }
        if !(1..=MAX_BUFFER_CAPACITY).contains(&self.buffer_capacity) {
            return Err(ConfigError::InvalidCapacity(self.buffer_capacity));
        }
        Ok(())
    }
}

/// Optional on-disk defaults, as read from a TOML file.
///
/// ```toml
/// kind = "integer"
/// order = "descending"
/// output = "merged.txt"
/// inputs = ["a.txt", "b.txt"]
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub kind: Option<ValueKind>,
    pub order: Option<SortOrder>,
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub inputs: Vec<PathBuf>,
    pub buffer_capacity: Option<usize>,
    pub idle_wait_ms: Option<u64>,
}

impl ConfigFile {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Resolve into a [`MergeConfig`], letting explicit values win over the file.
    ///
    /// Explicit inputs replace the file's list rather than extending it.
    pub fn resolve(
        self,
        kind: Option<ValueKind>,
        order: Option<SortOrder>,
        output: Option<PathBuf>,
        inputs: Vec<PathBuf>,
    ) -> Result<MergeConfig, ConfigError> {
        let kind = kind.or(self.kind).ok_or(ConfigError::MissingKind)?;
        let order = order.or(self.order).unwrap_or_default();
        let output = output.or(self.output).ok_or(ConfigError::MissingOutput)?;
        let inputs = if inputs.is_empty() { self.inputs } else { inputs };

        let mut config = MergeConfig::new(MergeMode::new(kind, order), output, inputs);
        if let Some(capacity) = self.buffer_capacity {
            config.buffer_capacity = capacity;
        }
        if let Some(ms) = self.idle_wait_ms {
            config.idle_wait_ms = ms;
        }
        config.validate()?;
        Ok(config)
    }
}
