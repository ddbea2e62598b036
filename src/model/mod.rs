use std::collections::HashSet;

use crate::error::{ConsistError, Result};

/// Name given to a train whose file never names it.
pub const DEFAULT_TRAIN_NAME: &str = "Loose consist";

/// Hysteresis band applied to a speed limit when none is given.
pub const DEFAULT_SPEED_TOLERANCE: f32 = 0.001;

/// Train level metadata plus the ordered list of vehicles.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainConfig {
    pub name: String,
    pub serial: i32,
    pub max_velocity: Option<MaxVelocity>,
    pub durability: f32,
    /// Train control system parameter file, empty when not given.
    pub tcs_parameters_file: String,
    /// Vehicles in coupling order, front to rear.
    pub vehicles: Vec<Vehicle>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_TRAIN_NAME.to_string(),
            serial: 1,
            max_velocity: None,
            durability: 1.0,
            tcs_parameters_file: String::new(),
            vehicles: Vec::new(),
        }
    }
}

impl TrainConfig {
    pub fn engine_count(&self) -> usize {
        self.vehicles.iter().filter(|v| v.is_engine).count()
    }

    pub fn eot_count(&self) -> usize {
        self.vehicles.iter().filter(|v| v.is_eot).count()
    }
}

/// Speed ceiling in m/s plus a small tolerance band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaxVelocity {
    pub limit: f32,
    pub tolerance: f32,
}

impl MaxVelocity {
    pub fn new(limit: f32) -> Self {
        Self::with_tolerance(limit, DEFAULT_SPEED_TOLERANCE)
    }

    pub fn with_tolerance(limit: f32, tolerance: f32) -> Self {
        Self { limit, tolerance }
    }
}

/// One entry of a consist: an engine, a wagon or an end-of-train device.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Vehicle {
    pub folder: String,
    pub name: String,
    pub uid: i32,
    pub is_engine: bool,
    pub is_eot: bool,
    /// Vehicle faces against the direction of travel.
    pub flip: bool,
    /// `None` when no cargo is declared at all, as opposed to an empty list.
    pub loads: Option<Vec<LoadData>>,
}

impl Vehicle {
    pub fn kind(&self) -> &'static str {
        if self.is_engine {
            "engine"
        } else if self.is_eot {
            "eot"
        } else {
            "wagon"
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoadData {
    pub name: String,
    pub folder: String,
    pub position: LoadPosition,
    pub state: LoadState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPosition {
    #[default]
    Above,
    Center,
    Front,
    Rear,
}

impl LoadPosition {
    const ALL: [LoadPosition; 4] = [Self::Above, Self::Center, Self::Front, Self::Rear];

    /// Resolves a variant by its exact name or numeric value, falling back to
    /// [`LoadPosition::Above`] for anything unrecognised.
    pub fn from_name(name: &str) -> Self {
        let position = match name {
            "Above" => Some(Self::Above),
            "Center" => Some(Self::Center),
            "Front" => Some(Self::Front),
            "Rear" => Some(Self::Rear),
            _ => name
                .parse::<usize>()
                .ok()
                .and_then(|i| Self::ALL.get(i).copied()),
        };
        position.unwrap_or_else(|| {
            log::warn!("Unknown load position '{}', using {:?}", name, Self::default());
            Self::default()
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadState {
    #[default]
    Empty,
    Random,
    Full,
}

impl LoadState {
    const ALL: [LoadState; 3] = [Self::Empty, Self::Random, Self::Full];

    /// Resolves a variant by its exact name or numeric value, falling back to
    /// [`LoadState::Empty`] for anything unrecognised.
    pub fn from_name(name: &str) -> Self {
        let state = match name {
            "Empty" => Some(Self::Empty),
            "Random" => Some(Self::Random),
            "Full" => Some(Self::Full),
            _ => name
                .parse::<usize>()
                .ok()
                .and_then(|i| Self::ALL.get(i).copied()),
        };
        state.unwrap_or_else(|| {
            log::warn!("Unknown load state '{}', using {:?}", name, Self::default());
            Self::default()
        })
    }
}

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

impl Validate for TrainConfig {
    fn validate(&self) -> Result<()> {
        let mut seen_uids = HashSet::new();

        for (index, vehicle) in self.vehicles.iter().enumerate() {
            if vehicle.folder.is_empty() || vehicle.name.is_empty() {
                return Err(ConsistError::MissingVehicleData {
                    index,
                    uid: vehicle.uid,
                });
            }

            if !seen_uids.insert(vehicle.uid) {
                log::warn!(
                    "Consist '{}' has more than one vehicle with uid {}",
                    self.name,
                    vehicle.uid
                );
            }
        }

        Ok(())
    }
}
