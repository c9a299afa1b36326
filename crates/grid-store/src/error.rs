//! Error types for Zarr storage.

use std::path::Path;

use grid_common::IoError;
use thiserror::Error;

/// Errors raised inside the Zarr collaborators.
///
/// They never cross the [`GridSource`](grid_common::GridSource) or
/// [`DailyGridWriter`](grid_common::DailyGridWriter) boundary directly; see
/// [`StoreError::into_read_error`] and [`StoreError::into_write_error`].
#[derive(Error, Debug)]
pub enum StoreError {
    /// The hierarchy does not exist or cannot be accessed.
    #[error("not found: {0}")]
    NotFound(String),

    /// Filesystem error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Zarr format error.
    #[error("Zarr format error: {0}")]
    Zarr(String),

    /// Array metadata that cannot be mapped to a grid or axis.
    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl StoreError {
    pub fn zarr(err: impl std::fmt::Display) -> Self {
        Self::Zarr(err.to_string())
    }

    pub fn storage(err: impl std::fmt::Display) -> Self {
        Self::Storage(err.to_string())
    }

    /// Classify a read failure: an inaccessible hierarchy is unreadable,
    /// anything that fails after opening is corrupt.
    pub fn into_read_error(self, path: &Path) -> IoError {
        match self {
            StoreError::NotFound(msg) | StoreError::Storage(msg) => IoError::unreadable(path, msg),
            other => IoError::corrupt(path, other.to_string()),
        }
    }

    pub fn into_write_error(self, path: &Path) -> IoError {
        IoError::write(path, self.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
