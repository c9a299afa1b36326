//! The finalized per-day output handed to a [`DailyGridWriter`](crate::DailyGridWriter).

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::field::{Attributes, Field};
use crate::grid::GridShape;

/// One output variable of a day.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyVariable {
    pub field: Field,
    pub attributes: Attributes,
}

/// Daily composite grids for one dataset and calendar day.
///
/// Ownership moves to the writer; nothing in the pipeline keeps a reference.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyGridSet {
    /// Dataset identifier (e.g. "nldas")
    pub dataset: String,
    /// Calendar day the composite covers
    pub date: NaiveDate,
    /// Shape shared by every 2D grid in the set
    pub shape: GridShape,
    /// Number of source files that contributed
    pub samples: usize,
    variables: BTreeMap<String, DailyVariable>,
}

impl DailyGridSet {
    pub fn new(dataset: impl Into<String>, date: NaiveDate, shape: GridShape, samples: usize) -> Self {
        Self {
            dataset: dataset.into(),
            date,
            shape,
            samples,
            variables: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, field: impl Into<Field>, attributes: Attributes) {
        self.variables.insert(
            name.into(),
            DailyVariable {
                field: field.into(),
                attributes,
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&DailyVariable> {
        self.variables.get(name)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.variables.get(name).map(|v| &v.field)
    }

    /// Iterate variables in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DailyVariable)> {
        self.variables.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> Vec<&str> {
        self.variables.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}
