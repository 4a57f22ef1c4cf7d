//! Vehicle aggregate
//!
//! Vehicle records, their category and availability flag, and the
//! repository interface of the Vehicle Directory.

pub mod model;
pub mod repository;

pub use model::{AvailabilityStatus, NewVehicle, Vehicle, VehiclePatch, VehicleType};
pub use repository::VehicleRepository;
