use std::path::Path;

use crate::error::Result;
use crate::model::{TrainConfig, Vehicle};

pub mod legacy;
pub mod stf;
pub mod toml_reader;

pub use legacy::*;
pub use stf::{StfReader, Units};
pub use toml_reader::*;

/// Populates a train config in place from some encoding.
pub trait ConsistReader {
    fn parse(&mut self, ctx: &mut TrainConfig) -> Result<()>;
}

/// Populates a single vehicle in place from some encoding.
pub trait VehicleReader {
    fn parse(&mut self, ctx: &mut Vehicle) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsistFormat {
    /// Legacy `.con` block files.
    Legacy,
    Toml,
}

impl ConsistFormat {
    /// Picks the encoding from the file extension, ignoring case.
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "con" => Some(ConsistFormat::Legacy),
            "toml" => Some(ConsistFormat::Toml),
            _ => None,
        }
    }
}

pub enum FormatReader {
    Legacy(LegacyConsistReader),
    Toml(TomlConsistReader),
}

impl FormatReader {
    /// Binds a reader for `format` to the raw file contents, failing if they
    /// are not valid text for that encoding.
    pub fn new(format: ConsistFormat, bytes: &[u8]) -> Result<Self> {
        Ok(match format {
            ConsistFormat::Legacy => {
                FormatReader::Legacy(LegacyConsistReader::new(StfReader::from_bytes(bytes)?))
            }
            ConsistFormat::Toml => {
                FormatReader::Toml(TomlConsistReader::new(stf::decode_utf8(bytes)?))
            }
        })
    }
}

impl ConsistReader for FormatReader {
    fn parse(&mut self, ctx: &mut TrainConfig) -> Result<()> {
        match self {
            FormatReader::Legacy(reader) => reader.parse(ctx),
            FormatReader::Toml(reader) => reader.parse(ctx),
        }
    }
}
