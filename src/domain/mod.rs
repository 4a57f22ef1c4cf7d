//! Domain layer: entities, booking state machine, pricing, the
//! authorization gate, and repository interfaces.

pub mod access;
pub mod booking;
pub mod repositories;
pub mod user;
pub mod vehicle;

pub use access::{authorize, Action, Actor, Resource};
pub use booking::{
    Booking, BookingDetails, BookingEvent, BookingRepository, BookingStatus, CreatedBooking,
    CustomerSummary, DecideFn, NewBooking, QuoteFn, VehicleSummary,
};
pub use repositories::{DomainResult, RepositoryProvider};
pub use user::{normalize_email, NewUser, User, UserPatch, UserRepository, UserRole};
pub use vehicle::{
    AvailabilityStatus, NewVehicle, Vehicle, VehiclePatch, VehicleRepository, VehicleType,
};

pub use crate::shared::errors::DomainError;
