//! Booking Ledger use-cases

pub mod service;

pub use crate::domain::CreatedBooking;
pub use service::BookingService;
