//! Booking repository interface
//!
//! `open` and `transition` are the only writers of `Booking.status` and
//! `Vehicle.availability_status`. Implementations run each call as one
//! atomic unit: read, guard, and the paired booking/vehicle writes commit
//! together or not at all.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::model::{Booking, BookingDetails, BookingStatus, CreatedBooking, NewBooking};
use crate::domain::vehicle::Vehicle;
use crate::domain::DomainResult;

/// Guard + price evaluated against the locked vehicle row.
pub type QuoteFn = dyn Fn(&Vehicle) -> DomainResult<Decimal> + Send + Sync;

/// Guard evaluated against the locked booking row; returns the target status.
pub type DecideFn = dyn Fn(&Booking) -> DomainResult<BookingStatus> + Send + Sync;

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Create an active booking and mark its vehicle booked. Returns the
    /// booking together with the vehicle as it stands after the claim.
    ///
    /// Fails with `NotFound` for a missing customer or vehicle, and with
    /// whatever `quote` rejects (e.g. an unavailable vehicle).
    async fn open(&self, booking: NewBooking, quote: &QuoteFn) -> DomainResult<CreatedBooking>;

    /// Move an active booking to the status chosen by `decide` and release
    /// its vehicle. A booking that is no longer active is a `Conflict`.
    async fn transition(&self, id: i32, decide: &DecideFn) -> DomainResult<Booking>;

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Booking>>;

    /// Bookings with customer and vehicle summaries, optionally restricted
    /// to one customer.
    async fn find_details(&self, customer_id: Option<i32>) -> DomainResult<Vec<BookingDetails>>;

    /// Active bookings whose end date is strictly before `now`.
    async fn find_overdue(&self, now: DateTime<Utc>) -> DomainResult<Vec<Booking>>;
}
