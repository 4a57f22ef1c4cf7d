//! Application layer: use-case services over the domain
//!
//! Services receive the storage handle (`Arc<dyn RepositoryProvider>`) at
//! construction and consult the authorization gate before every mutation.
//! HTTP handlers should be thin wrappers that delegate to them.

pub mod bookings;
pub mod identity;
pub mod services;
pub mod vehicles;

pub use bookings::BookingService;
pub use identity::{AdminSeed, AuthResult, SignUp, UserService};
pub use services::{OverdueSweeper, SweepReport};
pub use vehicles::VehicleService;
