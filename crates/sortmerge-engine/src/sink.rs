use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{EngineError, Result};

/// Single writer for the merged output: one value per line.
///
/// Every [`emit`](Self::emit) is flushed before it returns, so a crash
/// loses at most the value being written.
pub struct OutputSink<W: Write = File> {
    path: PathBuf,
    writer: BufWriter<W>,
    written: u64,
}

impl OutputSink {
    /// Create (or truncate) the output file.
    pub fn create(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .map_err(|source| EngineError::OutputCreate {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(path = %path.display(), "output opened");
        Ok(Self::from_writer(path, file))
    }
}

impl<W: Write> OutputSink<W> {
    /// Wrap an arbitrary writer. `path` is only used for logging.
    pub fn from_writer(path: impl Into<PathBuf>, writer: W) -> Self {
        Self {
            path: path.into(),
            writer: BufWriter::new(writer),
            written: 0,
        }
    }

    /// Append `value` and a newline, then flush.
    pub fn emit(&mut self, value: &str) -> io::Result<()> {
        self.writer.write_all(value.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        self.written += 1;
        Ok(())
    }

    /// Number of values successfully written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush and release the writer, returning it. Errors are logged, not
    /// propagated.
    pub fn close(self) -> Option<W> {
        match self.writer.into_inner() {
            Ok(inner) => {
                debug!(path = %self.path.display(), written = self.written, "output closed");
                Some(inner)
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e.error(), "failed to close output");
                None
            }
        }
    }
}
