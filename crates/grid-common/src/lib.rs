//! Common types shared across the daily aggregation crates.
//!
//! The aggregation core never touches files directly. It consumes a
//! [`GridSource`] that turns a path into named fields and hands its result
//! to a [`DailyGridWriter`]. Both traits, and the data they exchange, live
//! here so that storage backends and the core can depend on them without
//! depending on each other.

pub mod daily;
pub mod error;
pub mod field;
pub mod grid;
pub mod io;

pub use daily::{DailyGridSet, DailyVariable};
pub use error::{GridError, GridResult};
pub use field::{Attributes, Field, SourceFile, SourceVariable};
pub use grid::{Grid, GridShape, DEFAULT_FILL_VALUE};
pub use io::{DailyGridWriter, GridSource, IoError, WriteSummary};
