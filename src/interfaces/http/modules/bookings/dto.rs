//! Booking DTOs
//!
//! Listing responses are shaped by visibility: admins see the customer
//! behind every booking, customers see their own bookings with the vehicle
//! category instead.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::bookings::CreatedBooking;
use crate::domain::{Booking, BookingDetails, BookingStatus, DomainError, DomainResult};

/// Accepts an RFC 3339 timestamp or a plain `YYYY-MM-DD` date (midnight UTC).
pub fn parse_rental_date(field: &str, raw: &str) -> DomainResult<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| Utc.from_utc_datetime(&midnight))
        .ok_or_else(|| {
            DomainError::Validation(format!(
                "{} must be a date (YYYY-MM-DD) or an RFC 3339 timestamp",
                field
            ))
        })
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBookingRequest {
    /// Required for admins; customers always book for themselves
    #[validate(range(min = 1, message = "customer_id must be positive"))]
    pub customer_id: Option<i32>,
    #[validate(range(min = 1, message = "vehicle_id must be positive"))]
    pub vehicle_id: i32,
    /// `YYYY-MM-DD` or RFC 3339
    #[validate(length(min = 1, message = "rent_start_date is required"))]
    pub rent_start_date: String,
    #[validate(length(min = 1, message = "rent_end_date is required"))]
    pub rent_end_date: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateBookingRequest {
    /// `cancelled` or `returned`
    #[validate(length(min = 1, message = "status is required"))]
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingDto {
    pub id: i32,
    pub customer_id: i32,
    pub vehicle_id: i32,
    pub rent_start_date: DateTime<Utc>,
    pub rent_end_date: DateTime<Utc>,
    #[schema(value_type = f64)]
    pub total_price: Decimal,
    /// `active`, `cancelled` or `returned`
    pub status: String,
}

impl From<Booking> for BookingDto {
    fn from(b: Booking) -> Self {
        Self {
            id: b.id,
            customer_id: b.customer_id,
            vehicle_id: b.vehicle_id,
            rent_start_date: b.rent_start_date,
            rent_end_date: b.rent_end_date,
            total_price: b.total_price,
            status: b.status.as_str().to_string(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PricedVehicle {
    pub vehicle_name: String,
    #[schema(value_type = f64)]
    pub daily_rent_price: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedBookingDto {
    #[serde(flatten)]
    pub booking: BookingDto,
    pub vehicle: PricedVehicle,
}

impl From<CreatedBooking> for CreatedBookingDto {
    fn from(created: CreatedBooking) -> Self {
        Self {
            booking: created.booking.into(),
            vehicle: PricedVehicle {
                vehicle_name: created.vehicle.vehicle_name,
                daily_rent_price: created.vehicle.daily_rent_price,
            },
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerRef {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisteredVehicle {
    pub vehicle_name: String,
    pub registration_number: String,
}

/// Admin listing row
#[derive(Debug, Serialize, ToSchema)]
pub struct AdminBookingView {
    #[serde(flatten)]
    pub booking: BookingDto,
    pub customer: CustomerRef,
    pub vehicle: RegisteredVehicle,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategorizedVehicle {
    pub vehicle_name: String,
    pub registration_number: String,
    #[serde(rename = "type")]
    pub vehicle_type: String,
}

/// Customer listing row; the customer is implied.
#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerBookingView {
    pub id: i32,
    pub vehicle_id: i32,
    pub rent_start_date: DateTime<Utc>,
    pub rent_end_date: DateTime<Utc>,
    #[schema(value_type = f64)]
    pub total_price: Decimal,
    pub status: String,
    pub vehicle: CategorizedVehicle,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(untagged)]
pub enum BookingListItem {
    Admin(AdminBookingView),
    Customer(CustomerBookingView),
}

impl BookingListItem {
    pub fn for_admin(details: BookingDetails) -> Self {
        Self::Admin(AdminBookingView {
            booking: details.booking.into(),
            customer: CustomerRef {
                name: details.customer.name,
                email: details.customer.email,
            },
            vehicle: RegisteredVehicle {
                vehicle_name: details.vehicle.vehicle_name,
                registration_number: details.vehicle.registration_number,
            },
        })
    }

    pub fn for_customer(details: BookingDetails) -> Self {
        let b = details.booking;
        Self::Customer(CustomerBookingView {
            id: b.id,
            vehicle_id: b.vehicle_id,
            rent_start_date: b.rent_start_date,
            rent_end_date: b.rent_end_date,
            total_price: b.total_price,
            status: b.status.as_str().to_string(),
            vehicle: CategorizedVehicle {
                vehicle_name: details.vehicle.vehicle_name,
                registration_number: details.vehicle.registration_number,
                vehicle_type: details.vehicle.vehicle_type.as_str().to_string(),
            },
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReleasedVehicle {
    pub availability_status: String,
}

/// Result of a status update. A return also reports the freed vehicle.
#[derive(Debug, Serialize, ToSchema)]
pub struct TransitionedBookingDto {
    #[serde(flatten)]
    pub booking: BookingDto,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle: Option<ReleasedVehicle>,
}

impl From<Booking> for TransitionedBookingDto {
    fn from(booking: Booking) -> Self {
        let vehicle = (booking.status == BookingStatus::Returned).then(|| ReleasedVehicle {
            availability_status: "available".to_string(),
        });
        Self {
            booking: booking.into(),
            vehicle,
        }
    }
}
