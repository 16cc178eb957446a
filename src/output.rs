//! Destination for the downloaded GEDCOM bytes.
//!
//! The file is only created once the export job has finished, so a run that
//! fails earlier never leaves an empty or truncated file behind.

use std::fmt;
use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::GedcomError;

const STDOUT_LABEL: &str = "<stdout>";

/// Where the download should go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Standard output.
    Stdout,
    /// A named file, created or overwritten.
    File(PathBuf),
}

impl OutputTarget {
    /// `None` means standard output.
    #[must_use]
    pub fn from_path(path: Option<PathBuf>) -> Self {
        match path {
            Some(path) => Self::File(path),
            None => Self::Stdout,
        }
    }

    /// Opens the target for writing.
    ///
    /// # Errors
    ///
    /// Returns [`GedcomError::Io`] if the file cannot be created.
    pub async fn open(&self) -> Result<OutputSink, GedcomError> {
        match self {
            Self::Stdout => Ok(OutputSink::new(
                PathBuf::from(STDOUT_LABEL),
                Box::new(tokio::io::stdout()),
            )),
            Self::File(path) => {
                debug!(path = %path.display(), "creating output file");
                let file = File::create(path)
                    .await
                    .map_err(|e| GedcomError::io(path.clone(), e))?;
                Ok(OutputSink::new(path.clone(), Box::new(file)))
            }
        }
    }
}

impl fmt::Display for OutputTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => f.write_str(STDOUT_LABEL),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// An open output stream. Dropping it closes the underlying file.
pub struct OutputSink {
    label: PathBuf,
    writer: Box<dyn AsyncWrite + Send + Unpin>,
}

impl OutputSink {
    /// Wraps any async writer; `label` is used in error messages.
    pub fn new(label: impl Into<PathBuf>, writer: Box<dyn AsyncWrite + Send + Unpin>) -> Self {
        Self {
            label: label.into(),
            writer,
        }
    }

    /// Name of the destination, for messages.
    #[must_use]
    pub fn label(&self) -> &Path {
        &self.label
    }

    /// Writes one chunk of the response body straight through.
    ///
    /// # Errors
    ///
    /// Returns [`GedcomError::Io`] on write failure.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), GedcomError> {
        self.writer
            .write_all(chunk)
            .await
            .map_err(|e| GedcomError::io(self.label.clone(), e))
    }

    /// Flushes everything written so far.
    ///
    /// # Errors
    ///
    /// Returns [`GedcomError::Io`] on flush failure.
    pub async fn finish(&mut self) -> Result<(), GedcomError> {
        self.writer
            .flush()
            .await
            .map_err(|e| GedcomError::io(self.label.clone(), e))
    }
}

impl fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputSink")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}
