//! Variable catalogs: which source variables a dataset carries and how each
//! one is folded into a daily composite.
//!
//! A catalog is data, not code. The two built-in tables are embedded from
//! `config/datasets/*.yaml`; custom tables can be loaded from any YAML file
//! with the same layout.

use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::path::Path;

use grid_common::GridShape;
use serde::{Deserialize, Serialize};

use crate::error::{AggregationError, Result};

const NLDAS_CATALOG: &str = include_str!("../../../config/datasets/nldas.yaml");
const GFS_CATALOG: &str = include_str!("../../../config/datasets/gfs.yaml");

/// How successive samples of one variable are combined over a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationRole {
    /// Sum every sample, divide by the number of samples at finalize
    SumThenAverage,
    /// Elementwise maximum
    RunningMax,
    /// Elementwise minimum
    RunningMin,
    /// Keep the first occurrence (coordinate vectors)
    CarryLast,
    /// Sum every sample and keep the total (precipitation)
    AccumulateNoDivide,
    /// Not read at all
    Ignore,
}

impl AggregationRole {
    /// Whether variables with this role take part in aggregation.
    pub fn is_active(self) -> bool {
        self != Self::Ignore
    }

    /// Whether each ingestion increments the variable's sample count.
    pub fn counts_samples(self) -> bool {
        !matches!(self, Self::CarryLast | Self::Ignore)
    }

    /// Whether a 1D coordinate axis is acceptable for this role.
    pub fn accepts_axis(self) -> bool {
        self == Self::CarryLast
    }

    /// Whether samples are added together, for an average or a total.
    pub fn is_summed(self) -> bool {
        matches!(self, Self::SumThenAverage | Self::AccumulateNoDivide)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SumThenAverage => "sum_then_average",
            Self::RunningMax => "running_max",
            Self::RunningMin => "running_min",
            Self::CarryLast => "carry_last",
            Self::AccumulateNoDivide => "accumulate_no_divide",
            Self::Ignore => "ignore",
        }
    }
}

impl fmt::Display for AggregationRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableSpec {
    /// Variable name in the source files
    pub name: String,
    /// Output name, when it differs from the source name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    pub role: AggregationRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_name: Option<String>,
}

impl VariableSpec {
    pub fn new(name: impl Into<String>, role: AggregationRole) -> Self {
        Self {
            name: name.into(),
            output: None,
            role,
            long_name: None,
        }
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }

    /// Name under which the aggregated field is produced.
    pub fn output_name(&self) -> &str {
        self.output.as_deref().unwrap_or(&self.name)
    }
}

/// Catalog outputs feeding the derived field calculator and ET engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedInputs {
    pub max_temperature: String,
    pub min_temperature: String,
    pub u_wind: String,
    pub v_wind: String,
    pub shortwave_radiation: String,
    /// Surface pressure in Pa; altitude-derived pressure is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure: Option<String>,
    /// Dew point in K; the Tmin proxy is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dew_point: Option<String>,
    pub latitude: String,
    pub longitude: String,
}

/// Names of the derived output fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedOutputs {
    #[serde(default = "default_wind_speed")]
    pub wind_speed: String,
    #[serde(default = "default_mean_temperature")]
    pub mean_temperature: String,
    #[serde(default = "default_evapotranspiration")]
    pub evapotranspiration: String,
}

fn default_wind_speed() -> String {
    "WIND_SPEED".to_string()
}

fn default_mean_temperature() -> String {
    "AVG_TEMP".to_string()
}

fn default_evapotranspiration() -> String {
    "ET".to_string()
}

impl Default for DerivedOutputs {
    fn default() -> Self {
        Self {
            wind_speed: default_wind_speed(),
            mean_temperature: default_mean_temperature(),
            evapotranspiration: default_evapotranspiration(),
        }
    }
}

impl DerivedOutputs {
    pub fn names(&self) -> [&str; 3] {
        [
            &self.wind_speed,
            &self.mean_temperature,
            &self.evapotranspiration,
        ]
    }
}

/// The full per-dataset table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableCatalog {
    pub dataset: String,
    #[serde(default)]
    pub description: String,
    /// Nominal samples per day; only used to flag partial days
    pub samples_per_day: usize,
    /// Expected grid dimensions, when known up front
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<GridShape>,
    pub variables: Vec<VariableSpec>,
    pub derived: DerivedInputs,
    #[serde(default)]
    pub outputs: DerivedOutputs,
}

impl VariableCatalog {
    /// Parse and validate a catalog from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let catalog: Self = serde_yaml::from_str(yaml)
            .map_err(|e| AggregationError::InvalidCatalog(e.to_string()))?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Read, parse and validate a catalog file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            AggregationError::InvalidCatalog(format!("{}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Specs that take part in aggregation, in declaration order.
    pub fn active_specs(&self) -> impl Iterator<Item = &VariableSpec> {
        self.variables.iter().filter(|s| s.role.is_active())
    }

    /// Look up a spec by its output name.
    pub fn spec(&self, output: &str) -> Option<&VariableSpec> {
        self.variables.iter().find(|s| s.output_name() == output)
    }

    /// Distinct source variable names that must be read, sorted.
    pub fn source_names(&self) -> Vec<String> {
        self.active_specs()
            .map(|s| s.name.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Whether a source variable is only ever declared as ignored.
    pub fn is_ignored(&self, name: &str) -> bool {
        let mut declared = self.variables.iter().filter(|s| s.name == name).peekable();
        declared.peek().is_some() && declared.all(|s| s.role == AggregationRole::Ignore)
    }

    /// Check the catalog is internally consistent.
    pub fn validate(&self) -> Result<()> {
        if self.dataset.trim().is_empty() {
            return Err(invalid("dataset name must not be empty"));
        }
        if self.samples_per_day == 0 {
            return Err(invalid("samples_per_day must be >= 1"));
        }
        if let Some(shape) = self.shape {
            if shape.is_empty() {
                return Err(invalid(format!("shape {} has no cells", shape)));
            }
        }

        let mut outputs = HashSet::new();
        for spec in self.active_specs() {
            if spec.name.trim().is_empty() {
                return Err(invalid("variable name must not be empty"));
            }
            if !outputs.insert(spec.output_name()) {
                return Err(invalid(format!(
                    "output '{}' is declared more than once",
                    spec.output_name()
                )));
            }
        }

        let derived = self.outputs.names();
        for (i, name) in derived.iter().enumerate() {
            if outputs.contains(name) {
                return Err(invalid(format!(
                    "derived output '{}' collides with a catalog output",
                    name
                )));
            }
            if derived[..i].contains(name) {
                return Err(invalid(format!("derived output '{}' is declared twice", name)));
            }
        }

        let d = &self.derived;
        self.check_binding("max_temperature", &d.max_temperature, |r| {
            r == AggregationRole::RunningMax
        })?;
        self.check_binding("min_temperature", &d.min_temperature, |r| {
            r == AggregationRole::RunningMin
        })?;
        self.check_binding("latitude", &d.latitude, |r| r == AggregationRole::CarryLast)?;
        self.check_binding("longitude", &d.longitude, |r| r == AggregationRole::CarryLast)?;

        let mut grids = vec![
            ("u_wind", &d.u_wind),
            ("v_wind", &d.v_wind),
            ("shortwave_radiation", &d.shortwave_radiation),
        ];
        if let Some(pressure) = &d.pressure {
            grids.push(("pressure", pressure));
        }
        if let Some(dew_point) = &d.dew_point {
            grids.push(("dew_point", dew_point));
        }
        for (binding, output) in grids {
            self.check_binding(binding, output, |r| {
                r.is_active() && r != AggregationRole::CarryLast
            })?;
        }

        Ok(())
    }

    fn check_binding(
        &self,
        binding: &str,
        output: &str,
        allowed: impl Fn(AggregationRole) -> bool,
    ) -> Result<()> {
        let spec = self
            .active_specs()
            .find(|s| s.output_name() == output)
            .ok_or_else(|| {
                invalid(format!(
                    "derived input {} refers to unknown output '{}'",
                    binding, output
                ))
            })?;
        if !allowed(spec.role) {
            return Err(invalid(format!(
                "derived input {} cannot use '{}' with role {}",
                binding, output, spec.role
            )));
        }
        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> AggregationError {
    AggregationError::InvalidCatalog(msg.into())
}

/// Built-in datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dataset {
    /// NLDAS-2 hourly forcing, 224x464
    Nldas,
    /// GFS 0.5 degree, 6-hourly, 361x720
    Gfs,
}

impl Dataset {
    pub fn all() -> &'static [Dataset] {
        &[Dataset::Nldas, Dataset::Gfs]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Dataset::Nldas => "nldas",
            Dataset::Gfs => "gfs",
        }
    }

    /// Parse from string (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "nldas" => Some(Dataset::Nldas),
            "gfs" => Some(Dataset::Gfs),
            _ => None,
        }
    }

    /// Load the embedded catalog for this dataset.
    pub fn catalog(&self) -> Result<VariableCatalog> {
        let yaml = match self {
            Dataset::Nldas => NLDAS_CATALOG,
            Dataset::Gfs => GFS_CATALOG,
        };
        VariableCatalog::from_yaml_str(yaml)
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
