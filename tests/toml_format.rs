use anyhow::Result;
use approx::assert_relative_eq;
use std::path::PathBuf;

use consist_formats::{Consist, ConsistError, ConsistFormat, DEFAULT_SPEED_TOLERANCE, DEFAULT_TRAIN_NAME};

fn data(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data").join(name)
}

#[test]
fn test_passenger_consist_metadata() -> Result<()> {
    let consist = Consist::load(data("passenger.toml"))?;
    let train = &consist.train;

    assert_eq!(consist.name, "Morning Express");
    assert_eq!(train.serial, 3);
    assert_relative_eq!(train.durability, 0.9);

    let max = train.max_velocity.expect("max velocity");
    assert_relative_eq!(max.limit, 44.444_443, epsilon = 1e-4);
    assert_eq!(max.tolerance, DEFAULT_SPEED_TOLERANCE);
    assert!(train.tcs_parameters_file.is_empty());
    Ok(())
}

#[test]
fn test_vehicle_paths_and_types() -> Result<()> {
    let consist = Consist::load(data("passenger.toml"))?;
    let vehicles = &consist.train.vehicles;

    let summary: Vec<_> = vehicles
        .iter()
        .map(|v| (v.uid, v.folder.as_str(), v.name.as_str(), v.is_engine, v.flip))
        .collect();
    assert_eq!(
        summary,
        vec![
            (0, "Locos", "Class90", true, false),
            (1, "Coaches", "Mk3", false, false),
            (2, "Coaches", "Mk3DVT", false, true),
            (3, "Misc", "Marker", false, false),
        ]
    );

    // No end-of-train or cargo representation in this encoding
    assert!(vehicles.iter().all(|v| !v.is_eot && v.loads.is_none()));
    Ok(())
}

#[test]
fn test_missing_optional_fields_use_defaults() -> Result<()> {
    let consist = Consist::load(data("minimal.toml"))?;
    let train = &consist.train;

    assert_eq!(consist.name, DEFAULT_TRAIN_NAME);
    assert_eq!(train.serial, 1);
    assert_eq!(train.durability, 1.0);
    assert!(train.vehicles.is_empty());
    assert_relative_eq!(train.max_velocity.expect("max velocity").limit, 22.352, epsilon = 1e-3);
    Ok(())
}

#[test]
fn test_unknown_speed_unit_passes_value_through() -> Result<()> {
    let consist = Consist::from_bytes(
        ConsistFormat::Toml,
        br#"max_speed = { value = 12.5, unit = "knots" }"#,
    )?;
    assert_eq!(consist.train.max_velocity.map(|m| m.limit), Some(12.5));
    Ok(())
}

#[test]
fn test_path_without_separator_is_malformed() {
    let result = Consist::load(data("bad_path.toml"));
    match result {
        Err(ConsistError::MalformedVehiclePath(path)) => assert_eq!(path, "Boxcar1"),
        other => panic!("expected MalformedVehiclePath, got {:?}", other),
    }
}

#[test]
fn test_missing_max_speed_is_a_toml_error() {
    let result = Consist::from_bytes(ConsistFormat::Toml, br#"name = "No speed""#);
    assert!(matches!(result, Err(ConsistError::Toml(_))));
}

#[test]
fn test_invalid_utf8_fails_the_load() {
    let result = Consist::from_bytes(
        ConsistFormat::Toml,
        b"name = \"Bad\xFF\"\nmax_speed = { value = 10.0, unit = \"m/s\" }\n",
    );
    assert!(
        matches!(result, Err(ConsistError::InvalidEncoding { encoding: "UTF-8" })),
        "expected InvalidEncoding, got {:?}",
        result
    );
}
