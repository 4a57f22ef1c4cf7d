//! Booking aggregate
//!
//! Booking records, the booking state machine, pricing, and the
//! repository interface whose operations are the ledger's transactional
//! primitives.

pub mod model;
pub mod pricing;
pub mod repository;

pub use model::{
    Booking, BookingDetails, BookingEvent, BookingStatus, CreatedBooking, CustomerSummary,
    NewBooking, VehicleSummary,
};
pub use pricing::{quote, rental_days};
pub use repository::{BookingRepository, DecideFn, QuoteFn};
