//! Error types for grid construction and elementwise operations.

use thiserror::Error;

use crate::grid::GridShape;

/// Result type alias using GridError.
pub type GridResult<T> = Result<T, GridError>;

/// Errors raised by [`Grid`](crate::Grid) operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    #[error("grid shape mismatch: expected {expected}, found {actual}")]
    ShapeMismatch {
        expected: GridShape,
        actual: GridShape,
    },

    #[error("grid data length {actual} does not match shape ({expected} cells)")]
    DataLength { expected: usize, actual: usize },
}
