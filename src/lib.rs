pub mod error;
pub mod loader;
pub mod model;
pub mod reader;
pub mod units;

pub use error::ConsistError;
pub use loader::Consist;
pub use model::*;
pub use reader::{ConsistFormat, ConsistReader, VehicleReader};
