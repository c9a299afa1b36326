//! Shared test utilities for the met-daily workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Synthetic grid and coordinate generators
//! - In-memory grid source and writer doubles
//! - A compact catalog fixture exercising every aggregation role
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```
//!
//! Then import in your tests:
//!
//! ```ignore
//! use test_utils::{fixtures, MemoryGridSource};
//! ```

pub mod fixtures;
pub mod generators;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f32, 1.0_f32, 0.001_f32);    // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Assert every non-fill cell of a grid is within `epsilon` of `expected`.
#[macro_export]
macro_rules! assert_grid_approx_eq {
    ($grid:expr, $expected:expr, $epsilon:expr) => {{
        let grid = &$grid;
        for (idx, value) in grid.data().iter().enumerate() {
            if grid.is_fill(*value) {
                continue;
            }
            let diff = (*value as f64 - $expected as f64).abs();
            if diff > $epsilon as f64 {
                panic!(
                    "assertion failed: cell {} = {:?}, expected {:?} (epsilon {:?})",
                    idx, value, $expected, $epsilon
                );
            }
        }
    }};
}
