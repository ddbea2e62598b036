use std::path::{Path, PathBuf};

use log::info;

use crate::error::{ConsistError, Result};
use crate::model::{TrainConfig, Validate};
use crate::reader::{ConsistFormat, ConsistReader, FormatReader};

/// A fully loaded consist file.
#[derive(Debug, Clone, PartialEq)]
pub struct Consist {
    pub name: String,
    pub train: TrainConfig,
}

impl Consist {
    /// Loads a consist, picking the encoding from the file extension
    /// (`.con` or `.toml`, any case).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let format =
            ConsistFormat::from_path(path).ok_or_else(|| ConsistError::UnsupportedFormat {
                path: path.to_path_buf(),
            })?;

        let bytes = std::fs::read(path).map_err(|source| ConsistError::Io {
            path: PathBuf::from(path),
            source,
        })?;

        let consist = Self::from_bytes(format, &bytes)?;
        info!(
            "Loaded {:?} consist '{}' from {}: {} vehicles",
            format,
            consist.name,
            path.display(),
            consist.train.vehicles.len()
        );
        Ok(consist)
    }

    /// Parses an in-memory consist in the given encoding.
    pub fn from_bytes(format: ConsistFormat, bytes: &[u8]) -> Result<Self> {
        let mut reader = FormatReader::new(format, bytes)?;
        let mut train = TrainConfig::default();
        reader.parse(&mut train)?;
        train.validate()?;

        Ok(Self {
            name: train.name.clone(),
            train,
        })
    }
}
