//! Vehicle Directory use-cases

pub mod service;

pub use service::VehicleService;
