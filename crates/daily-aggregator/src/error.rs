//! Error types for the daily aggregation crate.

use grid_common::{GridError, GridShape, IoError};
use thiserror::Error;

/// Errors that can occur while building a day's composite.
#[derive(Error, Debug)]
pub enum AggregationError {
    #[error("shape mismatch for '{variable}': expected {expected}, found {actual}")]
    ShapeMismatch {
        variable: String,
        expected: GridShape,
        actual: GridShape,
    },

    #[error("no samples ingested for '{0}'")]
    EmptyAccumulation(String),

    #[error("latitude {0} outside [-90, 90]")]
    InvalidLatitude(f64),

    #[error("day of year {0} outside [1, 366]")]
    InvalidDayOfYear(u32),

    #[error("variable '{variable}' must be a {expected}")]
    UnexpectedField {
        variable: String,
        expected: &'static str,
    },

    #[error("aggregated variable '{0}' is missing")]
    MissingVariable(String),

    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] IoError),
}

impl AggregationError {
    /// Attach a variable name to a low-level grid error.
    pub fn from_grid(variable: impl Into<String>, err: GridError) -> Self {
        match err {
            GridError::ShapeMismatch { expected, actual } => Self::ShapeMismatch {
                variable: variable.into(),
                expected,
                actual,
            },
            GridError::DataLength { expected, actual } => Self::ShapeMismatch {
                variable: variable.into(),
                expected: GridShape::new(1, expected),
                actual: GridShape::new(1, actual),
            },
        }
    }

    /// Short machine-friendly label, used as a structured log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ShapeMismatch { .. } => "shape_mismatch",
            Self::EmptyAccumulation(_) => "empty_accumulation",
            Self::InvalidLatitude(_) => "invalid_latitude",
            Self::InvalidDayOfYear(_) => "invalid_day_of_year",
            Self::UnexpectedField { .. } => "unexpected_field",
            Self::MissingVariable(_) => "missing_variable",
            Self::InvalidCatalog(_) => "invalid_catalog",
            Self::InvalidConfig(_) => "invalid_config",
            Self::Io(IoError::UnreadableFile { .. }) => "unreadable_file",
            Self::Io(IoError::CorruptFile { .. }) => "corrupt_file",
            Self::Io(IoError::WriteError { .. }) => "write_error",
        }
    }
}

/// Result type for aggregation operations.
pub type Result<T> = std::result::Result<T, AggregationError>;
