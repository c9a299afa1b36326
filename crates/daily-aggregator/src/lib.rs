//! Hourly-to-daily aggregation of gridded meteorological fields.
//!
//! A [`VariableCatalog`] declares, per dataset, how each source variable is
//! folded over a day. The [`DailyPipeline`] reads one day's hourly files
//! through a [`GridSource`](grid_common::GridSource), accumulates them,
//! derives wind speed, mean temperature and FAO-56 reference
//! evapotranspiration, and hands the result to a
//! [`DailyGridWriter`](grid_common::DailyGridWriter).
//!
//! # Example
//!
//! ```ignore
//! use daily_aggregator::{Dataset, DailyPipeline, DayRequest, PipelineConfig};
//!
//! let pipeline = DailyPipeline::new(
//!     Dataset::Nldas.catalog()?,
//!     PipelineConfig::from_env(),
//!     source,
//!     writer,
//! )?;
//! let report = pipeline.process_day(&request)?;
//! ```

pub mod accumulator;
pub mod batch;
pub mod catalog;
pub mod config;
pub mod derived;
pub mod error;
pub mod evapotranspiration;
pub mod logging;
pub mod pipeline;

pub use accumulator::{AggregatedDay, DailyAccumulator};
pub use batch::{run_batch, BatchOutcome};
pub use catalog::{
    AggregationRole, Dataset, DerivedInputs, DerivedOutputs, VariableCatalog, VariableSpec,
};
pub use config::{LogFormat, LoggingConfig, PipelineConfig};
pub use derived::{mean_temperature, wind_speed};
pub use error::{AggregationError, Result};
pub use evapotranspiration::{CellInputs, EtInputs, EvapotranspirationEngine, SolarContext};
pub use logging::init_logging;
pub use pipeline::{
    output_grid, DailyPipeline, DayAggregate, DayReport, DayRequest, SkippedInput,
};
