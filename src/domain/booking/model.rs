//! Booking domain entity and state machine

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::vehicle::{Vehicle, VehicleType};
use crate::domain::DomainResult;
use crate::shared::DomainError;

/// Booking status.
///
/// `Active` is the only non-terminal state. There is no "completed" state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingStatus {
    Active,
    Cancelled,
    Returned,
}

/// Something that can happen to a booking after creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingEvent {
    /// Customer or admin calls it off before the rental starts
    Cancel,
    /// Admin checks the vehicle back in
    Return,
    /// The sweeper finds the rental period elapsed
    Expire,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Cancelled => "cancelled",
            Self::Returned => "returned",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Active)
    }

    /// Transition table. Every event requires `Active`.
    pub fn on(self, event: BookingEvent) -> DomainResult<BookingStatus> {
        match (self, event) {
            (Self::Active, BookingEvent::Cancel) => Ok(Self::Cancelled),
            (Self::Active, BookingEvent::Return) => Ok(Self::Returned),
            (Self::Active, BookingEvent::Expire) => Ok(Self::Returned),
            (Self::Cancelled | Self::Returned, _) => {
                Err(DomainError::Conflict("Booking is not active".into()))
            }
        }
    }
}

impl FromStr for BookingStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "cancelled" => Ok(Self::Cancelled),
            "returned" => Ok(Self::Returned),
            other => Err(DomainError::Validation(format!(
                "Unknown booking status: {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl BookingEvent {
    /// Map a status requested by a caller onto the event that produces it.
    pub fn from_requested_status(status: &str) -> DomainResult<Self> {
        match status {
            "cancelled" => Ok(Self::Cancel),
            "returned" => Ok(Self::Return),
            _ => Err(DomainError::Validation("Invalid status update".into())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Booking {
    pub id: i32,
    pub customer_id: i32,
    pub vehicle_id: i32,
    pub rent_start_date: DateTime<Utc>,
    pub rent_end_date: DateTime<Utc>,
    /// Frozen at creation
    pub total_price: Decimal,
    pub status: BookingStatus,
}

impl Booking {
    pub fn is_active(&self) -> bool {
        self.status == BookingStatus::Active
    }

    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        self.rent_start_date <= now
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.is_active() && self.rent_end_date < now
    }
}

/// A reservation request, validated before any storage access.
/// A freshly opened booking with the vehicle it claimed, as committed.
#[derive(Debug, Clone)]
pub struct CreatedBooking {
    pub booking: Booking,
    pub vehicle: Vehicle,
}

#[derive(Debug, Clone)]
pub struct NewBooking {
    pub customer_id: i32,
    pub vehicle_id: i32,
    pub rent_start_date: DateTime<Utc>,
    pub rent_end_date: DateTime<Utc>,
}

impl NewBooking {
    pub fn validate(&self) -> DomainResult<()> {
        if self.rent_end_date <= self.rent_start_date {
            return Err(DomainError::Validation(
                "End date must be after start date".into(),
            ));
        }
        Ok(())
    }

    /// Guard and price for the vehicle as it currently stands.
    pub fn quote(&self, vehicle: &Vehicle) -> DomainResult<Decimal> {
        if !vehicle.is_available() {
            return Err(DomainError::Conflict("Vehicle is not available".into()));
        }
        super::pricing::quote(
            self.rent_start_date,
            self.rent_end_date,
            vehicle.daily_rent_price,
        )
    }

    pub fn into_booking(self, id: i32, total_price: Decimal) -> Booking {
        Booking {
            id,
            customer_id: self.customer_id,
            vehicle_id: self.vehicle_id,
            rent_start_date: self.rent_start_date,
            rent_end_date: self.rent_end_date,
            total_price,
            status: BookingStatus::Active,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomerSummary {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VehicleSummary {
    pub vehicle_name: String,
    pub registration_number: String,
    pub vehicle_type: VehicleType,
}

/// A booking joined with its customer and vehicle.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingDetails {
    pub booking: Booking,
    pub customer: CustomerSummary,
    pub vehicle: VehicleSummary,
}
