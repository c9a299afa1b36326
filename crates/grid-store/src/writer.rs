//! Zarr V3 writer for daily grid sets and staged hourly files.

use std::path::Path;
use std::sync::Arc;

use grid_common::{
    Attributes, DailyGridSet, DailyGridWriter, Field, Grid, IoError, SourceFile, WriteSummary,
};
use tracing::{debug, info};
use zarrs::array::codec::bytes_to_bytes::blosc::{
    BloscCodec, BloscCompressionLevel, BloscCompressor, BloscShuffleMode,
};
use zarrs::array::codec::BytesToBytesCodecTraits;
use zarrs::array::{Array, ArrayBuilder, ChunkGrid, DataType, FillValue};
use zarrs::array_subset::ArraySubset;
use zarrs::group::GroupBuilder;
use zarrs::storage::{ReadableStorageTraits, WritableStorageTraits};
use zarrs_filesystem::FilesystemStore;

use crate::config::{StoreCompression, StoreConfig};
use crate::error::{StoreError, StoreResult};

/// Writes grids and axes as Zarr V3 arrays under a root group.
///
/// An existing hierarchy at the target path is replaced.
#[derive(Debug, Clone, Default)]
pub struct ZarrDailyWriter {
    config: StoreConfig,
}

impl ZarrDailyWriter {
    /// Create a writer, rejecting an invalid configuration.
    pub fn new(config: StoreConfig) -> StoreResult<Self> {
        config.validate().map_err(StoreError::Config)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Persist a daily grid set. Set-level metadata goes on the root group.
    pub fn write_set(&self, path: &Path, grids: &DailyGridSet) -> StoreResult<WriteSummary> {
        let mut root = Attributes::new();
        root.insert("dataset".to_string(), serde_json::json!(grids.dataset));
        root.insert("date".to_string(), serde_json::json!(grids.date.to_string()));
        root.insert("samples".to_string(), serde_json::json!(grids.samples));
        root.insert(
            "shape".to_string(),
            serde_json::json!([grids.shape.rows, grids.shape.cols]),
        );

        let store = self.create_store(path, root)?;
        let mut summary = WriteSummary::default();
        for (name, variable) in grids.iter() {
            summary.bytes_written +=
                self.write_field(store.clone(), name, &variable.field, &variable.attributes)?;
            summary.variables += 1;
        }

        info!(
            path = %path.display(),
            dataset = %grids.dataset,
            date = %grids.date,
            variables = summary.variables,
            bytes = summary.bytes_written,
            compression = %self.config.compression,
            "Wrote daily Zarr"
        );
        Ok(summary)
    }

    /// Persist an hourly file in the layout [`ZarrGridSource`](crate::ZarrGridSource) reads.
    pub fn write_source_file(&self, path: &Path, file: &SourceFile) -> StoreResult<WriteSummary> {
        let store = self.create_store(path, Attributes::new())?;
        let mut summary = WriteSummary::default();
        for name in file.names() {
            if let Some(variable) = file.get(name) {
                summary.bytes_written +=
                    self.write_field(store.clone(), name, &variable.field, &variable.attributes)?;
                summary.variables += 1;
            }
        }
        debug!(path = %path.display(), variables = summary.variables, "Wrote source Zarr");
        Ok(summary)
    }

    /// Replace whatever is at `path` with an empty hierarchy carrying `attributes`.
    fn create_store(&self, path: &Path, attributes: Attributes) -> StoreResult<Arc<FilesystemStore>> {
        if path.exists() {
            std::fs::remove_dir_all(path)?;
        }
        std::fs::create_dir_all(path)?;
        let store = Arc::new(FilesystemStore::new(path).map_err(StoreError::storage)?);

        GroupBuilder::new()
            .attributes(attributes)
            .build(store.clone(), "/")
            .map_err(StoreError::zarr)?
            .store_metadata()
            .map_err(StoreError::storage)?;

        Ok(store)
    }

    /// Write one variable as an array at `/{name}`. Returns the payload size.
    fn write_field<S: ReadableStorageTraits + WritableStorageTraits + 'static>(
        &self,
        store: Arc<S>,
        name: &str,
        field: &Field,
        attributes: &Attributes,
    ) -> StoreResult<u64> {
        let array_path = format!("/{}", name);
        match field {
            Field::Grid(grid) => {
                let array = self.build_grid_array(store, &array_path, grid, attributes)?;
                array.store_metadata().map_err(StoreError::storage)?;

                let subset = ArraySubset::new_with_start_shape(
                    vec![0, 0],
                    vec![grid.rows() as u64, grid.cols() as u64],
                )
                .map_err(StoreError::zarr)?;
                array
                    .store_array_subset_elements(&subset, grid.data())
                    .map_err(StoreError::storage)?;

                debug!(variable = name, rows = grid.rows(), cols = grid.cols(), "Stored grid");
                Ok((grid.data().len() * std::mem::size_of::<f32>()) as u64)
            }
            Field::Axis(values) => {
                let array = self.build_axis_array(store, &array_path, values.len(), attributes)?;
                array.store_metadata().map_err(StoreError::storage)?;

                let subset = ArraySubset::new_with_start_shape(vec![0], vec![values.len() as u64])
                    .map_err(StoreError::zarr)?;
                array
                    .store_array_subset_elements(&subset, values.as_slice())
                    .map_err(StoreError::storage)?;

                Ok((values.len() * std::mem::size_of::<f64>()) as u64)
            }
        }
    }

    fn build_grid_array<S: ReadableStorageTraits + WritableStorageTraits + 'static>(
        &self,
        store: Arc<S>,
        path: &str,
        grid: &Grid,
        attributes: &Attributes,
    ) -> StoreResult<Array<S>> {
        let chunk_rows = self.config.chunk_size.min(grid.rows()).max(1);
        let chunk_cols = self.config.chunk_size.min(grid.cols()).max(1);
        let chunk_grid: ChunkGrid = vec![chunk_rows as u64, chunk_cols as u64]
            .try_into()
            .map_err(|e| StoreError::Config(format!("{:?}", e)))?;

        let mut binding = ArrayBuilder::new(
            vec![grid.rows() as u64, grid.cols() as u64],
            DataType::Float32,
            chunk_grid,
            FillValue::from(grid.fill_value()),
        );
        binding
            .attributes(attributes.clone())
            .bytes_to_bytes_codecs(compression_codecs(&self.config, 4)?)
            .build(store, path)
            .map_err(StoreError::zarr)
    }

    fn build_axis_array<S: ReadableStorageTraits + WritableStorageTraits + 'static>(
        &self,
        store: Arc<S>,
        path: &str,
        len: usize,
        attributes: &Attributes,
    ) -> StoreResult<Array<S>> {
        let chunk_grid: ChunkGrid = vec![len.max(1) as u64]
            .try_into()
            .map_err(|e| StoreError::Config(format!("{:?}", e)))?;

        let mut binding = ArrayBuilder::new(
            vec![len as u64],
            DataType::Float64,
            chunk_grid,
            FillValue::from(f64::NAN),
        );
        binding
            .attributes(attributes.clone())
            .bytes_to_bytes_codecs(compression_codecs(&self.config, 8)?)
            .build(store, path)
            .map_err(StoreError::zarr)
    }
}

impl StoreCompression {
    fn blosc_compressor(self) -> Option<BloscCompressor> {
        match self {
            Self::None => None,
            Self::BloscLz4 => Some(BloscCompressor::LZ4),
            Self::BloscZstd => Some(BloscCompressor::Zstd),
        }
    }
}

/// Bytes-to-bytes codec chain for arrays of `element_size`-byte values.
/// Empty when compression is off.
fn compression_codecs(
    config: &StoreConfig,
    element_size: usize,
) -> StoreResult<Vec<Arc<dyn BytesToBytesCodecTraits>>> {
    let Some(compressor) = config.compression.blosc_compressor() else {
        return Ok(Vec::new());
    };
    let level = BloscCompressionLevel::try_from(config.compression_level).map_err(|_| {
        StoreError::Config(format!("compression level {} out of range", config.compression_level))
    })?;
    let (shuffle, typesize) = if config.shuffle {
        (BloscShuffleMode::Shuffle, Some(element_size))
    } else {
        (BloscShuffleMode::NoShuffle, None)
    };

    let blosc: Arc<dyn BytesToBytesCodecTraits> = Arc::new(
        BloscCodec::new(compressor, level, None, shuffle, typesize)
            .map_err(|e| StoreError::Config(e.to_string()))?,
    );
    Ok(vec![blosc])
}

impl DailyGridWriter for ZarrDailyWriter {
    fn write(&self, path: &Path, grids: DailyGridSet) -> Result<WriteSummary, IoError> {
        self.write_set(path, &grids)
            .map_err(|e| e.into_write_error(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = StoreConfig::default();
        config.compression_level = 0;
        assert!(matches!(
            ZarrDailyWriter::new(config),
            Err(StoreError::Config(_))
        ));
    }

    #[test]
    fn test_codec_chain_follows_compression() {
        for compression in [StoreCompression::BloscLz4, StoreCompression::BloscZstd] {
            for shuffle in [true, false] {
                let config = StoreConfig {
                    compression,
                    shuffle,
                    ..StoreConfig::default()
                };
                assert_eq!(compression_codecs(&config, 4).unwrap().len(), 1);
                assert_eq!(compression_codecs(&config, 8).unwrap().len(), 1);
            }
        }

        assert!(compression_codecs(&StoreConfig::uncompressed(), 4)
            .unwrap()
            .is_empty());
    }
}
