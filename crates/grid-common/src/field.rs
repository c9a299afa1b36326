//! Named fields as delivered by a grid source.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::grid::{Grid, GridShape};

/// Free-form per-variable attributes (units, long_name, ...).
pub type Attributes = serde_json::Map<String, serde_json::Value>;

/// A variable read from a grid file: either a 2D grid or a 1D coordinate axis.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Grid(Grid),
    Axis(Vec<f64>),
}

impl Field {
    pub fn as_grid(&self) -> Option<&Grid> {
        match self {
            Field::Grid(grid) => Some(grid),
            Field::Axis(_) => None,
        }
    }

    pub fn as_axis(&self) -> Option<&[f64]> {
        match self {
            Field::Axis(values) => Some(values),
            Field::Grid(_) => None,
        }
    }

    pub fn into_grid(self) -> Option<Grid> {
        match self {
            Field::Grid(grid) => Some(grid),
            Field::Axis(_) => None,
        }
    }

    /// Grid shape for 2D fields, `None` for axes.
    pub fn shape(&self) -> Option<GridShape> {
        self.as_grid().map(Grid::shape)
    }

    /// Short description used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Field::Grid(_) => "grid",
            Field::Axis(_) => "axis",
        }
    }
}

impl From<Grid> for Field {
    fn from(grid: Grid) -> Self {
        Field::Grid(grid)
    }
}

impl From<Vec<f64>> for Field {
    fn from(values: Vec<f64>) -> Self {
        Field::Axis(values)
    }
}

/// One variable of an opened source file.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceVariable {
    pub field: Field,
    pub attributes: Attributes,
}

/// The contents of one opened hourly file, keyed by variable name.
///
/// Dropping a `SourceFile` releases every buffer it holds.
#[derive(Debug, Clone, Default)]
pub struct SourceFile {
    path: PathBuf,
    variables: HashMap<String, SourceVariable>,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            variables: HashMap::new(),
        }
    }

    /// Add a variable, replacing any previous variable of the same name.
    pub fn insert(&mut self, name: impl Into<String>, field: impl Into<Field>, attributes: Attributes) {
        self.variables.insert(
            name.into(),
            SourceVariable {
                field: field.into(),
                attributes,
            },
        );
    }

    /// Builder-style variant of [`insert`](Self::insert) without attributes.
    pub fn with(mut self, name: impl Into<String>, field: impl Into<Field>) -> Self {
        self.insert(name, field, Attributes::new());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, name: &str) -> Option<&SourceVariable> {
        self.variables.get(name)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.variables.get(name).map(|v| &v.field)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    /// Variable names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.variables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::DEFAULT_FILL_VALUE;

    #[test]
    fn test_source_file_lookup() {
        let grid = Grid::filled(GridShape::new(2, 2), 280.0, DEFAULT_FILL_VALUE);
        let file = SourceFile::new("/data/2018/001/a.grb")
            .with("TMP", grid.clone())
            .with("lat", vec![10.0, 20.0]);

        assert_eq!(file.len(), 2);
        assert_eq!(file.names(), vec!["TMP", "lat"]);
        assert_eq!(file.field("TMP").and_then(Field::as_grid), Some(&grid));
        assert_eq!(file.field("lat").and_then(Field::as_axis), Some(&[10.0, 20.0][..]));
        assert_eq!(file.field("lat").map(Field::kind), Some("axis"));
        assert!(file.field("missing").is_none());
    }
}
