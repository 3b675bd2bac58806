//! Tracking configuration.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::bucket::BucketKind;

/// Largest accepted `entity_view_distance`, in chunks.
pub const MAX_ENTITY_VIEW_DISTANCE: u8 = 32;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading or writing the config file failed.
    #[error("failed to access config file {path}: {source}")]
    Io {
        /// The file that was accessed.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: io::Error,
    },
    /// The file is not valid json5 for the expected shape.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json5::Error),
    /// A value is out of its allowed range.
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}

/// Settings of a tracking index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Window radius, in chunks, used when a non-observer entity crosses a
    /// chunk border: observers within this many chunks care about it.
    pub entity_view_distance: u8,
    /// Storage strategy of the chunk buckets.
    pub bucket_kind: BucketKind,
}

impl TrackingConfig {
    /// Checks every value is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_ENTITY_VIEW_DISTANCE).contains(&self.entity_view_distance) {
            return Err(ConfigError::Invalid(
                "Entity view distance must be in range 1..=32",
            ));
        }
        Ok(())
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            entity_view_distance: 8,
            bucket_kind: BucketKind::Plain,
        }
    }
}

/// Parses a json5 document.
pub fn parse_json5<T: DeserializeOwned>(source: &str) -> Result<T, ConfigError> {
    Ok(serde_json5::from_str(source)?)
}

/// Reads and parses a json5 config file.
pub fn load<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_json5(&contents)
}

/// Loads a json5 config file, writing `default_contents` to `path` first if
/// the file does not exist yet.
pub fn load_or_create<T: DeserializeOwned>(
    path: &Path,
    default_contents: &str,
) -> Result<T, ConfigError> {
    if !path.exists() {
        let io_error = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        fs::write(path, default_contents).map_err(io_error)?;
        log::info!("Wrote default config to {}", path.display());
    }
    load(path)
}
