use serde::Deserialize;

use super::{ConsistReader, VehicleReader};
use crate::error::{ConsistError, Result};
use crate::model::{MaxVelocity, TrainConfig, Vehicle, DEFAULT_TRAIN_NAME};
use crate::units::to_meters_per_second;

#[derive(Debug, Clone, Deserialize)]
pub struct ConsistDocument {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub serial: Option<i32>,
    #[serde(default = "default_durability")]
    pub durability: f32,
    pub max_speed: SpeedValue,
    #[serde(default)]
    pub consist: Vec<VehicleEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpeedValue {
    pub value: f32,
    pub unit: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VehicleEntry {
    #[serde(default)]
    pub flip: Option<bool>,
    #[serde(rename = "type", default = "default_vehicle_type")]
    pub vehicle_type: String,
    /// `folder/name` of the vehicle asset.
    pub path: String,
}

fn default_name() -> String {
    DEFAULT_TRAIN_NAME.to_string()
}

fn default_durability() -> f32 {
    1.0
}

fn default_vehicle_type() -> String {
    "wagon".to_string()
}

/// Reads the TOML encoding of a consist.
pub struct TomlConsistReader {
    text: String,
}

impl TomlConsistReader {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl ConsistReader for TomlConsistReader {
    fn parse(&mut self, ctx: &mut TrainConfig) -> Result<()> {
        let document: ConsistDocument = toml::from_str(&self.text)?;

        ctx.name = document.name;
        ctx.serial = document.serial.unwrap_or(1);
        ctx.max_velocity = Some(MaxVelocity::new(to_meters_per_second(
            document.max_speed.value,
            &document.max_speed.unit,
        )));
        ctx.durability = document.durability;

        for (index, entry) in document.consist.iter().enumerate() {
            let mut vehicle = Vehicle {
                uid: vehicle_uid(index)?,
                ..Vehicle::default()
            };
            TomlVehicleReader::new(entry).parse(&mut vehicle)?;
            ctx.vehicles.push(vehicle);
        }
        Ok(())
    }
}

pub struct TomlVehicleReader<'a> {
    entry: &'a VehicleEntry,
}

impl<'a> TomlVehicleReader<'a> {
    pub fn new(entry: &'a VehicleEntry) -> Self {
        Self { entry }
    }
}

impl VehicleReader for TomlVehicleReader<'_> {
    fn parse(&mut self, ctx: &mut Vehicle) -> Result<()> {
        if let Some(flip) = self.entry.flip {
            ctx.flip = flip;
        }

        let (folder, name) = split_vehicle_path(&self.entry.path)?;
        ctx.folder = folder.to_string();
        ctx.name = name.to_string();

        ctx.is_engine = self.entry.vehicle_type == "engine";
        Ok(())
    }
}

/// Uid for the vehicle at `index`; uids follow file order.
fn vehicle_uid(index: usize) -> Result<i32> {
    i32::try_from(index).map_err(|_| ConsistError::TooManyVehicles(index))
}

/// Splits `folder/name`, rejecting paths with no or more than one separator.
fn split_vehicle_path(path: &str) -> Result<(&str, &str)> {
    match path.split_once('/') {
        Some((folder, name)) if !name.contains('/') => Ok((folder, name)),
        _ => Err(ConsistError::MalformedVehiclePath(path.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_folder_and_name() -> Result<()> {
        assert_eq!(split_vehicle_path("BoxcarsDir/Boxcar1")?, ("BoxcarsDir", "Boxcar1"));
        Ok(())
    }

    #[test]
    fn rejects_paths_without_exactly_one_separator() {
        for path in ["Boxcar1", "a/b/c", ""] {
            assert!(matches!(
                split_vehicle_path(path),
                Err(ConsistError::MalformedVehiclePath(ref p)) if p == path
            ));
        }
    }

    #[test]
    fn uids_follow_index_and_reject_overflow() -> Result<()> {
        assert_eq!(vehicle_uid(0)?, 0);
        assert_eq!(vehicle_uid(41)?, 41);
        assert_eq!(vehicle_uid(i32::MAX as usize)?, i32::MAX);

        let overflow = i32::MAX as usize + 1;
        assert!(matches!(
            vehicle_uid(overflow),
            Err(ConsistError::TooManyVehicles(n)) if n == overflow
        ));
        Ok(())
    }
}
