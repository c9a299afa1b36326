//! Collaborator traits for reading hourly grids and persisting daily grids.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::daily::DailyGridSet;
use crate::field::SourceFile;

/// Errors reported by grid sources and writers.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("unreadable file {path}: {message}")]
    UnreadableFile { path: PathBuf, message: String },

    #[error("corrupt file {path}: {message}")]
    CorruptFile { path: PathBuf, message: String },

    #[error("failed to write {path}: {message}")]
    WriteError { path: PathBuf, message: String },
}

impl IoError {
    pub fn unreadable(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::UnreadableFile {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn corrupt(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::CorruptFile {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn write(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::WriteError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Path the error refers to.
    pub fn path(&self) -> &Path {
        match self {
            IoError::UnreadableFile { path, .. }
            | IoError::CorruptFile { path, .. }
            | IoError::WriteError { path, .. } => path,
        }
    }

    /// True for read-side failures, which cost a day one sample rather than the whole day.
    pub fn is_read_failure(&self) -> bool {
        matches!(
            self,
            IoError::UnreadableFile { .. } | IoError::CorruptFile { .. }
        )
    }
}

/// Opens one hourly grid file and returns its variables.
///
/// Implementations must release any file handle or native buffer before
/// returning; the returned [`SourceFile`] owns plain memory only.
pub trait GridSource: Send + Sync {
    fn open(&self, path: &Path) -> Result<SourceFile, IoError>;
}

/// Summary of a completed write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteSummary {
    /// Number of variables persisted
    pub variables: usize,
    /// Approximate payload size in bytes
    pub bytes_written: u64,
}

/// Persists a day's grids with their metadata.
pub trait DailyGridWriter: Send + Sync {
    fn write(&self, path: &Path, grids: DailyGridSet) -> Result<WriteSummary, IoError>;
}

impl<T: GridSource + ?Sized> GridSource for &T {
    fn open(&self, path: &Path) -> Result<SourceFile, IoError> {
        (**self).open(path)
    }
}

impl<T: DailyGridWriter + ?Sized> DailyGridWriter for &T {
    fn write(&self, path: &Path, grids: DailyGridSet) -> Result<WriteSummary, IoError> {
        (**self).write(path, grids)
    }
}
