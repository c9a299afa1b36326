//! Common test fixtures for met-daily tests.
//!
//! In-memory collaborators stand in for on-disk grid files so that the
//! aggregation core can be tested without a storage backend.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use chrono::NaiveDate;
use grid_common::{DailyGridSet, DailyGridWriter, GridShape, GridSource, IoError, SourceFile, WriteSummary};

/// Grid dimensions of the supported datasets.
pub mod shapes {
    use grid_common::GridShape;

    /// NLDAS-2 0.125 degree CONUS grid
    pub const NLDAS: GridShape = GridShape { rows: 224, cols: 464 };

    /// GFS 0.5 degree global grid
    pub const GFS: GridShape = GridShape { rows: 361, cols: 720 };

    /// Small grid for fast unit tests
    pub const SMALL: GridShape = GridShape { rows: 4, cols: 5 };
}

/// A compact catalog with one variable per aggregation role.
///
/// Source names are short (`T`, `U`, `V`, ...) so tests can build hourly
/// files by hand. Latitudes and longitudes are carried as `lat` / `lon`.
pub const TEST_CATALOG_YAML: &str = r#"
dataset: test
description: Synthetic catalog covering every aggregation role
samples_per_day: 3
variables:
  - name: T
    output: TMAX
    role: running_max
    long_name: Maximum Temperature
  - name: T
    output: TMIN
    role: running_min
    long_name: Minimum Temperature
  - name: U
    role: sum_then_average
  - name: V
    role: sum_then_average
  - name: SW
    role: sum_then_average
  - name: PRES
    role: sum_then_average
  - name: APCP
    role: accumulate_no_divide
  - name: lat
    role: carry_last
  - name: lon
    role: carry_last
  - name: CAPE
    role: ignore
derived:
  max_temperature: TMAX
  min_temperature: TMIN
  u_wind: U
  v_wind: V
  shortwave_radiation: SW
  pressure: PRES
  latitude: lat
  longitude: lon
outputs:
  wind_speed: WIND_SPEED
  mean_temperature: AVG_TEMP
  evapotranspiration: ET
"#;

/// A fixed test date (1 January 2018, day-of-year 1).
pub fn test_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2018, 1, 1).expect("valid date")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Failure {
    Unreadable,
    Corrupt,
}

/// A [`GridSource`] serving pre-built files from memory.
#[derive(Debug, Default)]
pub struct MemoryGridSource {
    files: HashMap<PathBuf, SourceFile>,
    failures: HashMap<PathBuf, Failure>,
    opened: AtomicUsize,
}

impl MemoryGridSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file under its own path.
    pub fn add(&mut self, file: SourceFile) -> PathBuf {
        let path = file.path().to_path_buf();
        self.files.insert(path.clone(), file);
        path
    }

    /// Builder-style [`add`](Self::add).
    pub fn with(mut self, file: SourceFile) -> Self {
        self.add(file);
        self
    }

    /// Make `path` fail with `CorruptFile`.
    pub fn corrupt(mut self, path: impl Into<PathBuf>) -> Self {
        self.failures.insert(path.into(), Failure::Corrupt);
        self
    }

    /// Make `path` fail with `UnreadableFile`.
    pub fn unreadable(mut self, path: impl Into<PathBuf>) -> Self {
        self.failures.insert(path.into(), Failure::Unreadable);
        self
    }

    /// Number of successful opens so far.
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

impl GridSource for MemoryGridSource {
    fn open(&self, path: &Path) -> Result<SourceFile, IoError> {
        match self.failures.get(path) {
            Some(Failure::Corrupt) => return Err(IoError::corrupt(path, "truncated record")),
            Some(Failure::Unreadable) => return Err(IoError::unreadable(path, "permission denied")),
            None => {}
        }
        let file = self
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| IoError::unreadable(path, "no such file"))?;
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(file)
    }
}

/// A [`DailyGridWriter`] keeping every written set in memory.
#[derive(Debug, Default)]
pub struct MemoryWriter {
    written: Mutex<Vec<(PathBuf, DailyGridSet)>>,
    fail_on: HashSet<PathBuf>,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make writes to `path` fail with `WriteError`.
    pub fn failing_on(mut self, path: impl Into<PathBuf>) -> Self {
        self.fail_on.insert(path.into());
        self
    }

    /// Snapshot of everything written so far, in write order.
    pub fn written(&self) -> Vec<(PathBuf, DailyGridSet)> {
        self.written.lock().map(|w| w.clone()).unwrap_or_default()
    }

    /// The set written to `path`, if any.
    pub fn get(&self, path: &Path) -> Option<DailyGridSet> {
        self.written()
            .into_iter()
            .find(|(p, _)| p == path)
            .map(|(_, set)| set)
    }
}

impl DailyGridWriter for MemoryWriter {
    fn write(&self, path: &Path, grids: DailyGridSet) -> Result<WriteSummary, IoError> {
        if self.fail_on.contains(path) {
            return Err(IoError::write(path, "disk full"));
        }
        let summary = WriteSummary {
            variables: grids.len(),
            bytes_written: grids
                .iter()
                .map(|(_, v)| match v.field.shape() {
                    Some(shape) => (shape.len() * 4) as u64,
                    None => v.field.as_axis().map_or(0, |a| a.len() as u64 * 8),
                })
                .sum(),
        };
        let mut written = self
            .written
            .lock()
            .map_err(|_| IoError::write(path, "writer lock poisoned"))?;
        written.push((path.to_path_buf(), grids));
        Ok(summary)
    }
}

/// Hourly files for the test catalog with uniform values, named
/// `{prefix}/{hour:02}.zarr`.
///
/// Each tuple is `(tmp_k, u, v, sw_wm2, pres_pa, apcp_mm)`.
pub fn test_catalog_samples(
    prefix: &str,
    shape: GridShape,
    hours: &[(f32, f32, f32, f32, f32, f32)],
) -> Vec<SourceFile> {
    hours
        .iter()
        .enumerate()
        .map(|(hour, &(t, u, v, sw, pres, apcp))| {
            crate::SampleBuilder::new(&format!("{}/{:02}.zarr", prefix, hour), shape)
                .with_units("T", t, "K")
                .uniform("U", u)
                .uniform("V", v)
                .with_units("SW", sw, "W m-2")
                .with_units("PRES", pres, "Pa")
                .uniform("APCP", apcp)
                .uniform("CAPE", 1000.0)
                .axis("lat", crate::latitude_axis(shape.rows, 25.0, 0.5))
                .axis("lon", crate::longitude_axis(shape.cols, -100.0, 0.5))
                .build()
        })
        .collect()
}
