//! Zarr V3 grid source.

use std::path::Path;
use std::sync::Arc;

use grid_common::{Attributes, Field, Grid, GridShape, GridSource, IoError, SourceFile, DEFAULT_FILL_VALUE};
use tracing::debug;
use zarrs::array::{Array, DataType};
use zarrs::array_subset::ArraySubset;
use zarrs::group::Group;
use zarrs::storage::ReadableStorageTraits;
use zarrs_filesystem::FilesystemStore;

use crate::error::{StoreError, StoreResult};
use crate::METADATA_FILE;

/// Reads named variables from a Zarr hierarchy.
///
/// Built with a list of variable names (usually the catalog's source names)
/// it reads only those, skipping any the hierarchy does not hold. Built with
/// [`ZarrGridSource::all`] it reads every array under the root.
#[derive(Debug, Clone, Default)]
pub struct ZarrGridSource {
    variables: Option<Vec<String>>,
}

impl ZarrGridSource {
    pub fn new<I, S>(variables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            variables: Some(variables.into_iter().map(Into::into).collect()),
        }
    }

    /// A source reading every array in the hierarchy.
    pub fn all() -> Self {
        Self { variables: None }
    }

    /// Root group attributes of a hierarchy (dataset, date, ... for daily outputs).
    pub fn root_attributes(&self, path: &Path) -> Result<Attributes, IoError> {
        self.open_root(path)
            .and_then(|store| {
                let group = Group::open(store, "/").map_err(StoreError::zarr)?;
                Ok(group.attributes().clone())
            })
            .map_err(|e| e.into_read_error(path))
    }

    fn open_root(&self, path: &Path) -> StoreResult<Arc<FilesystemStore>> {
        if !path.is_dir() {
            return Err(StoreError::NotFound(format!(
                "no Zarr hierarchy at {}",
                path.display()
            )));
        }
        if !path.join(METADATA_FILE).is_file() {
            return Err(StoreError::InvalidMetadata(format!(
                "{} has no root {}",
                path.display(),
                METADATA_FILE
            )));
        }
        Ok(Arc::new(FilesystemStore::new(path).map_err(StoreError::storage)?))
    }

    /// Names to read: the requested ones, or every child holding array metadata.
    fn names_in(&self, path: &Path) -> StoreResult<Vec<String>> {
        if let Some(variables) = &self.variables {
            return Ok(variables.clone());
        }

        let mut names = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            if entry.path().join(METADATA_FILE).is_file() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort_unstable();
        Ok(names)
    }

    fn read(&self, path: &Path) -> StoreResult<SourceFile> {
        let store = self.open_root(path)?;
        let mut file = SourceFile::new(path);

        for name in self.names_in(path)? {
            if !path.join(&name).join(METADATA_FILE).is_file() {
                debug!(path = %path.display(), variable = %name, "Variable not present");
                continue;
            }
            let array = Array::open(store.clone(), &format!("/{}", name))
                .map_err(|e| StoreError::Zarr(format!("{}: {}", name, e)))?;
            let field = read_field(&array, &name)?;
            file.insert(name, field, array.attributes().clone());
        }

        debug!(path = %path.display(), variables = file.len(), "Opened Zarr");
        Ok(file)
    }
}

impl GridSource for ZarrGridSource {
    fn open(&self, path: &Path) -> Result<SourceFile, IoError> {
        self.read(path).map_err(|e| e.into_read_error(path))
    }
}

/// Decode one array: 2D arrays become grids, 1D arrays become axes.
fn read_field<S: ReadableStorageTraits + 'static>(array: &Array<S>, name: &str) -> StoreResult<Field> {
    let shape = array.shape().to_vec();
    let subset = ArraySubset::new_with_shape(shape.clone());

    match shape.as_slice() {
        [rows, cols] => {
            let data: Vec<f32> = match array.data_type() {
                DataType::Float32 => array
                    .retrieve_array_subset_elements(&subset)
                    .map_err(StoreError::zarr)?,
                DataType::Float64 => array
                    .retrieve_array_subset_elements::<f64>(&subset)
                    .map_err(StoreError::zarr)?
                    .into_iter()
                    .map(|v| v as f32)
                    .collect(),
                other => return Err(unsupported_type(name, other)),
            };

            let fill_bytes = array.fill_value().as_ne_bytes();
            let fill_value = fill_bytes
                .try_into()
                .map(f32::from_ne_bytes)
                .or_else(|_| fill_bytes.try_into().map(|b| f64::from_ne_bytes(b) as f32))
                .unwrap_or(DEFAULT_FILL_VALUE);

            let grid = Grid::new(data, GridShape::new(*rows as usize, *cols as usize), fill_value)
                .map_err(|e| StoreError::InvalidMetadata(format!("{}: {}", name, e)))?;
            Ok(Field::Grid(grid))
        }
        [_] => {
            let values: Vec<f64> = match array.data_type() {
                DataType::Float64 => array
                    .retrieve_array_subset_elements(&subset)
                    .map_err(StoreError::zarr)?,
                DataType::Float32 => array
                    .retrieve_array_subset_elements::<f32>(&subset)
                    .map_err(StoreError::zarr)?
                    .into_iter()
                    .map(f64::from)
                    .collect(),
                other => return Err(unsupported_type(name, other)),
            };
            Ok(Field::Axis(values))
        }
        _ => Err(StoreError::InvalidMetadata(format!(
            "{} has {} dimensions, expected 1 or 2",
            name,
            shape.len()
        ))),
    }
}

fn unsupported_type(name: &str, data_type: &DataType) -> StoreError {
    StoreError::InvalidMetadata(format!("{} has unsupported data type {:?}", name, data_type))
}
