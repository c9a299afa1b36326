//! One calendar day: read, accumulate, derive, write.

use std::path::PathBuf;

use chrono::NaiveDate;
use grid_common::{
    Attributes, DailyGridSet, DailyGridWriter, Field, Grid, GridShape, GridSource,
};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::accumulator::{AggregatedDay, DailyAccumulator};
use crate::catalog::VariableCatalog;
use crate::config::PipelineConfig;
use crate::derived::{mean_temperature, wind_speed};
use crate::error::{AggregationError, Result};
use crate::evapotranspiration::{EtInputs, EvapotranspirationEngine, SolarContext};

/// Work description for one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayRequest {
    pub date: NaiveDate,
    /// Hourly input files, in ingestion order
    pub inputs: Vec<PathBuf>,
    /// Destination handed to the writer
    pub output: PathBuf,
}

impl DayRequest {
    pub fn new(date: NaiveDate, inputs: Vec<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            date,
            inputs,
            output: output.into(),
        }
    }
}

/// An input that could not be read and was left out of the day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedInput {
    pub path: PathBuf,
    pub reason: String,
}

/// A day's grids before they are handed to the writer.
#[derive(Debug, Clone)]
pub struct DayAggregate {
    pub grids: DailyGridSet,
    pub samples_ingested: usize,
    /// Fewest samples behind any aggregated output; below the catalog's
    /// `samples_per_day` the day is logged as partial.
    pub min_samples: usize,
    pub skipped: Vec<SkippedInput>,
}

/// Outcome of a successfully processed day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayReport {
    pub date: NaiveDate,
    pub samples_ingested: usize,
    pub skipped: Vec<SkippedInput>,
    pub variables_written: usize,
    pub bytes_written: u64,
}

/// Catalog-driven daily pipeline over a grid source and a writer.
pub struct DailyPipeline<S, W> {
    catalog: VariableCatalog,
    config: PipelineConfig,
    engine: EvapotranspirationEngine,
    source: S,
    writer: W,
}

impl<S: GridSource, W: DailyGridWriter> DailyPipeline<S, W> {
    /// Build a pipeline after validating the catalog and configuration.
    pub fn new(catalog: VariableCatalog, config: PipelineConfig, source: S, writer: W) -> Result<Self> {
        catalog.validate()?;
        config.validate().map_err(AggregationError::InvalidConfig)?;

        Ok(Self {
            engine: EvapotranspirationEngine::new(config.albedo),
            catalog,
            config,
            source,
            writer,
        })
    }

    pub fn catalog(&self) -> &VariableCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Read and aggregate one day without writing it.
    ///
    /// Unreadable or corrupt inputs are skipped and reported. The day fails
    /// with `EmptyAccumulation` if nothing usable remains.
    pub fn aggregate_day(&self, date: NaiveDate, inputs: &[PathBuf]) -> Result<DayAggregate> {
        let solar = SolarContext::for_date(date, self.config.altitude_m)?;
        let mut accumulator = DailyAccumulator::new(&self.catalog, self.catalog.shape);
        let mut skipped = Vec::new();

        for path in inputs {
            match self.source.open(path) {
                Ok(file) => accumulator.ingest(&file)?,
                Err(e) if e.is_read_failure() => {
                    warn!(
                        dataset = %self.catalog.dataset,
                        date = %date,
                        path = %path.display(),
                        error = %e,
                        "Skipping unreadable input"
                    );
                    skipped.push(SkippedInput {
                        path: path.clone(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e.into()),
            }
        }

        let day = accumulator.finalize()?;
        let samples = day.files_ingested();
        let min_samples = day.min_samples();
        if min_samples < self.catalog.samples_per_day {
            warn!(
                dataset = %self.catalog.dataset,
                date = %date,
                files = samples,
                samples = min_samples,
                expected = self.catalog.samples_per_day,
                "Partial day"
            );
        }

        let grids = self.assemble(date, day, &solar)?;

        Ok(DayAggregate {
            grids,
            samples_ingested: samples,
            min_samples,
            skipped,
        })
    }

    /// Aggregate a day and hand it to the writer.
    pub fn process_day(&self, request: &DayRequest) -> Result<DayReport> {
        info!(
            dataset = %self.catalog.dataset,
            date = %request.date,
            inputs = request.inputs.len(),
            "Processing day"
        );

        let DayAggregate {
            grids,
            samples_ingested,
            skipped,
            ..
        } = self.aggregate_day(request.date, &request.inputs)?;

        let summary = self.writer.write(&request.output, grids)?;

        info!(
            dataset = %self.catalog.dataset,
            date = %request.date,
            samples = samples_ingested,
            skipped = skipped.len(),
            variables = summary.variables,
            bytes = summary.bytes_written,
            output = %request.output.display(),
            "Day complete"
        );

        Ok(DayReport {
            date: request.date,
            samples_ingested,
            skipped,
            variables_written: summary.variables,
            bytes_written: summary.bytes_written,
        })
    }

    fn assemble(&self, date: NaiveDate, day: AggregatedDay, solar: &SolarContext) -> Result<DailyGridSet> {
        let d = &self.catalog.derived;
        let tmax = day.grid(&d.max_temperature)?;
        let tmin = day.grid(&d.min_temperature)?;
        let shape = tmax.shape();

        let latitude = day.axis(&d.latitude)?;
        let longitude = day.axis(&d.longitude)?;
        check_axis(&d.latitude, shape, GridShape::new(latitude.len(), shape.cols))?;
        check_axis(&d.longitude, shape, GridShape::new(shape.rows, longitude.len()))?;

        let wind = wind_speed(day.grid(&d.u_wind)?, day.grid(&d.v_wind)?)?;
        let mean = mean_temperature(tmax, tmin)?;

        let pressure = d.pressure.as_deref().map(|name| day.grid(name)).transpose()?;
        let dew_point = d.dew_point.as_deref().map(|name| day.grid(name)).transpose()?;
        let et = self.engine.compute(
            &EtInputs {
                tmax,
                tmin,
                shortwave: day.grid(&d.shortwave_radiation)?,
                wind_speed: &wind,
                pressure,
                dew_point,
                latitude,
            },
            solar,
        )?;

        let mut set = DailyGridSet::new(&self.catalog.dataset, date, shape, day.files_ingested());
        for (name, field, attrs) in day.into_fields() {
            let long_name = self.catalog.spec(&name).and_then(|s| s.long_name.as_deref());
            debug!(variable = %name, kind = field.kind(), "Aggregated variable");
            set.insert(name, field, output_attributes(attrs, long_name));
        }

        let o = &self.catalog.outputs;
        set.insert(o.wind_speed.clone(), wind, derived_attributes("Wind speed", "m/s"));
        set.insert(
            o.mean_temperature.clone(),
            mean,
            derived_attributes("Average of maximum and minimum temperature", "K"),
        );
        set.insert(
            o.evapotranspiration.clone(),
            et,
            derived_attributes("Reference evapotranspiration (FAO-56 Penman-Monteith)", "mm/day"),
        );

        Ok(set)
    }
}

/// Coordinate axes must span the grid: `actual` is the shape implied by the axis length.
fn check_axis(name: &str, expected: GridShape, actual: GridShape) -> Result<()> {
    if actual != expected {
        return Err(AggregationError::ShapeMismatch {
            variable: name.to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}

/// Attributes of an aggregated output: the source attributes without the
/// fill value, marked as daily.
pub fn output_attributes(mut attrs: Attributes, long_name: Option<&str>) -> Attributes {
    attrs.remove("_FillValue");
    attrs.insert("forecast_time_units".to_string(), Value::from("daily"));
    if let Some(long_name) = long_name {
        attrs.insert("long_name".to_string(), Value::from(long_name));
    }
    attrs
}

fn derived_attributes(long_name: &str, units: &str) -> Attributes {
    let mut attrs = Attributes::new();
    attrs.insert("long_name".to_string(), Value::from(long_name));
    attrs.insert("units".to_string(), Value::from(units));
    attrs.insert("forecast_time_units".to_string(), Value::from("daily"));
    attrs
}

/// Borrow a grid from a set, used by callers inspecting a finished day.
pub fn output_grid<'a>(set: &'a DailyGridSet, name: &str) -> Result<&'a Grid> {
    match set.field(name) {
        Some(Field::Grid(grid)) => Ok(grid),
        Some(Field::Axis(_)) => Err(AggregationError::UnexpectedField {
            variable: name.to_string(),
            expected: "grid",
        }),
        None => Err(AggregationError::MissingVariable(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_attributes() {
        let mut attrs = Attributes::new();
        attrs.insert("_FillValue".to_string(), Value::from(1.0e20));
        attrs.insert("units".to_string(), Value::from("K"));

        let out = output_attributes(attrs, Some("Maximum Temperature"));
        assert!(!out.contains_key("_FillValue"));
        assert_eq!(out["units"], "K");
        assert_eq!(out["forecast_time_units"], "daily");
        assert_eq!(out["long_name"], "Maximum Temperature");
    }

    #[test]
    fn test_axis_check() {
        let shape = GridShape::new(3, 4);
        assert!(check_axis("lat", shape, GridShape::new(3, 4)).is_ok());
        assert!(matches!(
            check_axis("lon", shape, GridShape::new(3, 5)),
            Err(AggregationError::ShapeMismatch { .. })
        ));
    }
}
