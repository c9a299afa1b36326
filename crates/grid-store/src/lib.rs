//! Zarr V3 storage for hourly inputs and daily outputs.
//!
//! A Zarr hierarchy holds one array per variable directly under its root
//! group: 2D `float32` arrays for grids, 1D `float64` arrays for coordinate
//! axes. [`ZarrGridSource`] reads such a hierarchy into a
//! [`SourceFile`](grid_common::SourceFile), [`ZarrDailyWriter`] persists a
//! [`DailyGridSet`](grid_common::DailyGridSet) in the same layout.

pub mod config;
pub mod error;
pub mod reader;
pub mod writer;

pub use config::{StoreCompression, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use reader::ZarrGridSource;
pub use writer::ZarrDailyWriter;

/// Name of the metadata document of every Zarr V3 node.
pub(crate) const METADATA_FILE: &str = "zarr.json";
