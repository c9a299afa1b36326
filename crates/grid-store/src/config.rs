//! Configuration for the Zarr collaborators.

use serde::{Deserialize, Serialize};

/// Chunking and compression settings for written arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Chunk dimension for 2D arrays (square chunks, clipped to the grid).
    pub chunk_size: usize,

    /// Compression codec.
    pub compression: StoreCompression,

    /// Compression level (1-9).
    pub compression_level: u8,

    /// Enable byte shuffle filter for better compression.
    pub shuffle: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            chunk_size: 512,
            compression: StoreCompression::BloscZstd,
            compression_level: 1,
            shuffle: true,
        }
    }
}

impl StoreConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("STORE_CHUNK_SIZE") {
            if let Ok(size) = val.parse() {
                config.chunk_size = size;
            }
        }

        if let Ok(val) = std::env::var("STORE_COMPRESSION") {
            config.compression = StoreCompression::from_str(&val);
        }

        if let Ok(val) = std::env::var("STORE_COMPRESSION_LEVEL") {
            if let Ok(level) = val.parse() {
                config.compression_level = level;
            }
        }

        if let Ok(val) = std::env::var("STORE_SHUFFLE") {
            config.shuffle = val.to_lowercase() == "true" || val == "1";
        }

        config
    }

    /// Uncompressed arrays, mainly for staging and tests.
    pub fn uncompressed() -> Self {
        Self {
            compression: StoreCompression::None,
            ..Self::default()
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("chunk_size must be > 0".to_string());
        }

        if self.compression_level == 0 || self.compression_level > 9 {
            return Err("compression_level must be 1-9".to_string());
        }

        Ok(())
    }
}

/// Compression codec for Zarr arrays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreCompression {
    /// No compression.
    None,
    /// Blosc with LZ4.
    BloscLz4,
    /// Blosc with Zstd (recommended).
    #[default]
    BloscZstd,
}

impl StoreCompression {
    /// Parse from string (case-insensitive). Unknown names fall back to Blosc Zstd.
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "none" => Self::None,
            "lz4" | "blosc_lz4" => Self::BloscLz4,
            "zstd" | "blosc_zstd" => Self::BloscZstd,
            _ => Self::BloscZstd,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::BloscLz4 => "blosc_lz4",
            Self::BloscZstd => "blosc_zstd",
        }
    }
}

impl std::fmt::Display for StoreCompression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = StoreConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.compression, StoreCompression::BloscZstd);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = StoreConfig::default();
        config.chunk_size = 0;
        assert!(config.validate().is_err());

        let mut config = StoreConfig::default();
        config.compression_level = 10;
        assert_eq!(
            config.validate(),
            Err("compression_level must be 1-9".to_string())
        );
    }

    #[test]
    fn test_compression_from_str() {
        assert_eq!(StoreCompression::from_str("NONE"), StoreCompression::None);
        assert_eq!(StoreCompression::from_str("blosc_lz4"), StoreCompression::BloscLz4);
        assert_eq!(StoreCompression::from_str("lz4"), StoreCompression::BloscLz4);
        assert_eq!(StoreCompression::from_str("gzip"), StoreCompression::BloscZstd);
        assert_eq!(StoreCompression::BloscLz4.to_string(), "blosc_lz4");
    }

    #[test]
    fn test_deserialize_partial() {
        let config: StoreConfig =
            serde_json::from_str(r#"{"compression": "none", "chunk_size": 64}"#).unwrap();
        assert_eq!(config.compression, StoreCompression::None);
        assert_eq!(config.chunk_size, 64);
        assert!(config.shuffle);
    }
}
