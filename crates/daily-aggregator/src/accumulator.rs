//! Folds the hourly samples of one day into one field per catalog output.

use std::collections::BTreeMap;

use grid_common::{Attributes, Field, Grid, GridShape, SourceFile};
use tracing::debug;

use crate::catalog::{AggregationRole, VariableCatalog, VariableSpec};
use crate::error::{AggregationError, Result};

/// Running state of one output.
enum Running {
    /// Running max/min, or the carried field.
    Field(Field),
    /// Running sum. NaN marks cells missing in some sample.
    Sum {
        total: Vec<f64>,
        shape: GridShape,
        fill_value: f32,
    },
}

impl Running {
    fn seed_sum(grid: &Grid) -> Self {
        Running::Sum {
            total: grid
                .data()
                .iter()
                .map(|&v| if grid.is_fill(v) { f64::NAN } else { f64::from(v) })
                .collect(),
            shape: grid.shape(),
            fill_value: grid.fill_value(),
        }
    }
}

struct Slot<'a> {
    spec: &'a VariableSpec,
    value: Option<Running>,
    samples: usize,
}

/// Per-day accumulation state.
///
/// Created empty for a day, fed with [`ingest`](Self::ingest) once per source
/// file and consumed by [`finalize`](Self::finalize). Sums are carried in
/// f64 and rounded to f32 once, in `finalize`.
pub struct DailyAccumulator<'a> {
    catalog: &'a VariableCatalog,
    shape: Option<GridShape>,
    slots: BTreeMap<&'a str, Slot<'a>>,
    attributes: BTreeMap<&'a str, Attributes>,
    files_ingested: usize,
}

impl<'a> DailyAccumulator<'a> {
    /// Create an empty accumulator. When `expected_shape` is `None` the first
    /// ingested grid fixes the day's shape.
    pub fn new(catalog: &'a VariableCatalog, expected_shape: Option<GridShape>) -> Self {
        let slots = catalog
            .active_specs()
            .map(|spec| {
                (
                    spec.output_name(),
                    Slot {
                        spec,
                        value: None,
                        samples: 0,
                    },
                )
            })
            .collect();

        Self {
            catalog,
            shape: expected_shape,
            slots,
            attributes: BTreeMap::new(),
            files_ingested: 0,
        }
    }

    pub fn catalog(&self) -> &VariableCatalog {
        self.catalog
    }

    /// Grid shape fixed for this day, if any grid has been seen.
    pub fn shape(&self) -> Option<GridShape> {
        self.shape
    }

    pub fn files_ingested(&self) -> usize {
        self.files_ingested
    }

    /// Samples folded into an output so far.
    pub fn sample_count(&self, output: &str) -> Option<usize> {
        self.slots.get(output).map(|s| s.samples)
    }

    /// Fold one source file into the running state.
    ///
    /// The whole file is checked before anything is mutated, so a rejected
    /// file leaves the accumulator exactly as it was.
    pub fn ingest(&mut self, file: &SourceFile) -> Result<()> {
        let shape = self.check(file)?;
        self.shape = shape;

        for slot in self.slots.values_mut() {
            let spec = slot.spec;
            let Some(variable) = file.get(&spec.name) else {
                continue;
            };

            match (&mut slot.value, spec.role) {
                (Some(_), AggregationRole::CarryLast) => {}
                (None, role) if role.is_summed() => {
                    slot.value = Some(Running::seed_sum(as_grid(spec, &variable.field)?));
                }
                (None, _) => slot.value = Some(Running::Field(variable.field.clone())),
                (Some(Running::Sum { total, .. }), _) => {
                    let incoming = as_grid(spec, &variable.field)?;
                    for (acc, &v) in total.iter_mut().zip(incoming.data()) {
                        *acc += if incoming.is_fill(v) { f64::NAN } else { f64::from(v) };
                    }
                }
                (Some(Running::Field(Field::Grid(acc))), role) => {
                    let incoming = as_grid(spec, &variable.field)?;
                    let combine: fn(f32, f32) -> f32 = match role {
                        AggregationRole::RunningMin => f32::min,
                        _ => f32::max,
                    };
                    acc.zip_apply(incoming, combine)
                        .map_err(|e| AggregationError::from_grid(spec.output_name(), e))?;
                }
                (Some(Running::Field(Field::Axis(_))), _) => return Err(unexpected(spec)),
            }

            if spec.role.counts_samples() {
                slot.samples += 1;
            }
            self.attributes
                .entry(spec.name.as_str())
                .or_insert_with(|| variable.attributes.clone());
        }

        self.files_ingested += 1;
        debug!(
            path = %file.path().display(),
            files = self.files_ingested,
            "Ingested sample"
        );
        Ok(())
    }

    /// Validate every relevant field of `file` and return the day's shape
    /// after this file.
    fn check(&self, file: &SourceFile) -> Result<Option<GridShape>> {
        let mut shape = self.shape;

        for slot in self.slots.values() {
            let spec = slot.spec;
            let Some(field) = file.field(&spec.name) else {
                continue;
            };

            let grid = match field {
                Field::Grid(grid) => {
                    if matches!(slot.value, Some(Running::Field(Field::Axis(_)))) {
                        return Err(AggregationError::UnexpectedField {
                            variable: spec.name.clone(),
                            expected: "axis",
                        });
                    }
                    grid
                }
                Field::Axis(values) => {
                    match &slot.value {
                        _ if !spec.role.accepts_axis() => return Err(unexpected(spec)),
                        Some(Running::Field(Field::Grid(_))) => return Err(unexpected(spec)),
                        // Coordinates are fixed for the day
                        Some(Running::Field(Field::Axis(first))) if first.len() != values.len() => {
                            return Err(AggregationError::ShapeMismatch {
                                variable: spec.name.clone(),
                                expected: GridShape::new(first.len(), 1),
                                actual: GridShape::new(values.len(), 1),
                            });
                        }
                        _ => {}
                    }
                    continue;
                }
            };

            match shape {
                Some(expected) if expected != grid.shape() => {
                    return Err(AggregationError::ShapeMismatch {
                        variable: spec.name.clone(),
                        expected,
                        actual: grid.shape(),
                    });
                }
                Some(_) => {}
                None => shape = Some(grid.shape()),
            }
        }

        Ok(shape)
    }

    /// Produce the day's aggregated fields.
    ///
    /// Averages are divided by the number of samples each variable actually
    /// received. Fails with `EmptyAccumulation` if any active output never
    /// received a sample.
    pub fn finalize(self) -> Result<AggregatedDay> {
        let mut fields = BTreeMap::new();
        let mut samples = BTreeMap::new();
        let mut attributes = BTreeMap::new();
        let mut min_samples: Option<usize> = None;

        for (output, slot) in self.slots {
            let running = slot
                .value
                .ok_or_else(|| AggregationError::EmptyAccumulation(output.to_string()))?;

            let field = match running {
                Running::Field(field) => field,
                Running::Sum {
                    total,
                    shape,
                    fill_value,
                } => {
                    let divisor = match slot.spec.role {
                        AggregationRole::SumThenAverage => slot.samples as f64,
                        _ => 1.0,
                    };
                    let data = total
                        .into_iter()
                        .map(|v| if v.is_nan() { fill_value } else { (v / divisor) as f32 })
                        .collect();
                    Field::Grid(
                        Grid::new(data, shape, fill_value)
                            .map_err(|e| AggregationError::from_grid(output, e))?,
                    )
                }
            };

            let attrs = self
                .attributes
                .get(slot.spec.name.as_str())
                .cloned()
                .unwrap_or_default();

            if slot.spec.role.counts_samples() {
                min_samples = Some(min_samples.map_or(slot.samples, |m| m.min(slot.samples)));
            }
            fields.insert(output.to_string(), field);
            samples.insert(output.to_string(), slot.samples);
            attributes.insert(output.to_string(), attrs);
        }

        Ok(AggregatedDay {
            shape: self.shape,
            fields,
            samples,
            attributes,
            min_samples: min_samples.unwrap_or(self.files_ingested),
            files_ingested: self.files_ingested,
        })
    }
}

fn as_grid<'f>(spec: &VariableSpec, field: &'f Field) -> Result<&'f Grid> {
    field.as_grid().ok_or_else(|| unexpected(spec))
}

fn unexpected(spec: &VariableSpec) -> AggregationError {
    AggregationError::UnexpectedField {
        variable: spec.name.clone(),
        expected: "grid",
    }
}

/// Result of [`DailyAccumulator::finalize`], keyed by output name.
#[derive(Debug, Clone)]
pub struct AggregatedDay {
    shape: Option<GridShape>,
    fields: BTreeMap<String, Field>,
    samples: BTreeMap<String, usize>,
    attributes: BTreeMap<String, Attributes>,
    min_samples: usize,
    files_ingested: usize,
}

impl AggregatedDay {
    pub fn shape(&self) -> Option<GridShape> {
        self.shape
    }

    pub fn files_ingested(&self) -> usize {
        self.files_ingested
    }

    pub fn field(&self, output: &str) -> Option<&Field> {
        self.fields.get(output)
    }

    /// Borrow a 2D output, failing if it is absent or an axis.
    pub fn grid(&self, output: &str) -> Result<&Grid> {
        match self.fields.get(output) {
            Some(Field::Grid(grid)) => Ok(grid),
            Some(Field::Axis(_)) => Err(AggregationError::UnexpectedField {
                variable: output.to_string(),
                expected: "grid",
            }),
            None => Err(AggregationError::MissingVariable(output.to_string())),
        }
    }

    /// Borrow a 1D coordinate output, failing if it is absent or a grid.
    pub fn axis(&self, output: &str) -> Result<&[f64]> {
        match self.fields.get(output) {
            Some(Field::Axis(values)) => Ok(values),
            Some(Field::Grid(_)) => Err(AggregationError::UnexpectedField {
                variable: output.to_string(),
                expected: "axis",
            }),
            None => Err(AggregationError::MissingVariable(output.to_string())),
        }
    }

    pub fn sample_count(&self, output: &str) -> Option<usize> {
        self.samples.get(output).copied()
    }

    /// Fewest samples behind any averaged, extreme or summed output.
    ///
    /// Coordinates are not counted. A day with only coordinates reports
    /// the number of files ingested.
    pub fn min_samples(&self) -> usize {
        self.min_samples
    }

    /// Attributes of the source variable behind an output.
    pub fn attributes(&self, output: &str) -> Option<&Attributes> {
        self.attributes.get(output)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// Consume into `(output, field, attributes)` triples in name order.
    pub fn into_fields(self) -> impl Iterator<Item = (String, Field, Attributes)> {
        let mut attributes = self.attributes;
        self.fields.into_iter().map(move |(name, field)| {
            let attrs = attributes.remove(&name).unwrap_or_default();
            (name, field, attrs)
        })
    }
}
