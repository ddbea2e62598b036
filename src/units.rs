//! Speed unit conversion into meters per second.

/// Kilometers per hour in one meter per second.
const KPH_PER_MPS: f32 = 3.6;
/// Statute miles per hour in one meter per second.
const MPH_PER_MPS: f32 = 2.236_936_3;

/// Converts `value`, expressed in `unit`, into meters per second.
///
/// Recognised units are `"m/s"`, `"km/h"` and `"mph"`. Any other tag is taken
/// to already be meters per second.
pub fn to_meters_per_second(value: f32, unit: &str) -> f32 {
    match unit {
        "m/s" => value,
        "km/h" => value / KPH_PER_MPS,
        "mph" => value / MPH_PER_MPS,
        _ => {
            log::debug!("Unknown speed unit '{}', treating value as m/s", unit);
            value
        }
    }
}

/// Converts a speed in meters per second into kilometers per hour.
pub fn to_kilometers_per_hour(meters_per_second: f32) -> f32 {
    meters_per_second * KPH_PER_MPS
}

/// Maps the unit suffixes found in legacy files onto the canonical tags
/// understood by [`to_meters_per_second`]. An empty suffix means m/s.
pub fn canonical_speed_unit(suffix: &str) -> &str {
    match suffix.to_ascii_lowercase().as_str() {
        "" | "m/s" | "mps" => "m/s",
        "km/h" | "kph" | "kmh" | "kmph" => "km/h",
        "mph" => "mph",
        _ => suffix,
    }
}
