//! SeaORM implementation of BookingRepository
//!
//! `open` and `transition` each run in one database transaction that
//! takes the row's write lock before reading it (`lock_row`). The
//! status columns are then written with compare-and-set `UPDATE ... WHERE`
//! statements so a concurrent writer that slipped in first makes the
//! second one fail with `Conflict` instead of double-booking.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use tracing::debug;

use crate::domain::booking::{
    Booking, BookingDetails, BookingRepository, BookingStatus, CreatedBooking, CustomerSummary,
    DecideFn, NewBooking, QuoteFn, VehicleSummary,
};
use crate::domain::vehicle::AvailabilityStatus;
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::{booking, user, vehicle};

use super::{lock_row, vehicle_repository};

pub struct SeaOrmBookingRepository {
    db: DatabaseConnection,
}

impl SeaOrmBookingRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn status_to_domain(s: booking::BookingStatus) -> BookingStatus {
    match s {
        booking::BookingStatus::Active => BookingStatus::Active,
        booking::BookingStatus::Cancelled => BookingStatus::Cancelled,
        booking::BookingStatus::Returned => BookingStatus::Returned,
    }
}

fn status_to_entity(s: BookingStatus) -> booking::BookingStatus {
    match s {
        BookingStatus::Active => booking::BookingStatus::Active,
        BookingStatus::Cancelled => booking::BookingStatus::Cancelled,
        BookingStatus::Returned => booking::BookingStatus::Returned,
    }
}

fn model_to_domain(m: booking::Model) -> Booking {
    Booking {
        id: m.id,
        customer_id: m.customer_id,
        vehicle_id: m.vehicle_id,
        rent_start_date: m.rent_start_date,
        rent_end_date: m.rent_end_date,
        total_price: m.total_price,
        status: status_to_domain(m.status),
    }
}

fn not_active() -> DomainError {
    DomainError::Conflict("Booking is not active".into())
}

// ── BookingRepository impl ──────────────────────────────────────

#[async_trait]
impl BookingRepository for SeaOrmBookingRepository {
    async fn open(&self, b: NewBooking, quote: &QuoteFn) -> DomainResult<CreatedBooking> {
        let txn = self.db.begin().await?;
        lock_row::<vehicle::Entity>(
            &txn,
            vehicle::Column::Id,
            vehicle::Column::AvailabilityStatus,
            b.vehicle_id,
        )
        .await?;

        if user::Entity::find_by_id(b.customer_id)
            .one(&txn)
            .await?
            .is_none()
        {
            return Err(DomainError::not_found("User", b.customer_id));
        }

        let Some(vehicle_model) = vehicle::Entity::find_by_id(b.vehicle_id)
            .lock_exclusive()
            .one(&txn)
            .await?
        else {
            return Err(DomainError::not_found("Vehicle", b.vehicle_id));
        };

        let mut vehicle = vehicle_repository::model_to_domain(vehicle_model);
        let total_price = quote(&vehicle)?;

        // Claim the vehicle only if nobody else did since the read above.
        let claimed = vehicle::Entity::update_many()
            .col_expr(
                vehicle::Column::AvailabilityStatus,
                Expr::value(vehicle::AvailabilityStatus::Booked),
            )
            .filter(vehicle::Column::Id.eq(b.vehicle_id))
            .filter(vehicle::Column::AvailabilityStatus.eq(vehicle::AvailabilityStatus::Available))
            .exec(&txn)
            .await?;
        if claimed.rows_affected == 0 {
            return Err(DomainError::Conflict("Vehicle is not available".into()));
        }

        let model = booking::ActiveModel {
            customer_id: Set(b.customer_id),
            vehicle_id: Set(b.vehicle_id),
            rent_start_date: Set(b.rent_start_date),
            rent_end_date: Set(b.rent_end_date),
            total_price: Set(total_price),
            status: Set(booking::BookingStatus::Active),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        debug!(
            booking_id = model.id,
            vehicle_id = model.vehicle_id,
            total_price = %model.total_price,
            "Booking opened"
        );
        vehicle.availability_status = AvailabilityStatus::Booked;
        Ok(CreatedBooking {
            booking: model_to_domain(model),
            vehicle,
        })
    }

    async fn transition(&self, id: i32, decide: &DecideFn) -> DomainResult<Booking> {
        let txn = self.db.begin().await?;
        lock_row::<booking::Entity>(&txn, booking::Column::Id, booking::Column::Status, id).await?;

        let Some(model) = booking::Entity::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await?
        else {
            return Err(DomainError::not_found("Booking", id));
        };
        let current = model_to_domain(model);

        let target = decide(&current)?;
        if !current.is_active() || target == BookingStatus::Active {
            return Err(not_active());
        }

        let moved = booking::Entity::update_many()
            .col_expr(booking::Column::Status, Expr::value(status_to_entity(target)))
            .filter(booking::Column::Id.eq(id))
            .filter(booking::Column::Status.eq(booking::BookingStatus::Active))
            .exec(&txn)
            .await?;
        if moved.rows_affected == 0 {
            return Err(not_active());
        }

        vehicle::Entity::update_many()
            .col_expr(
                vehicle::Column::AvailabilityStatus,
                Expr::value(vehicle::AvailabilityStatus::Available),
            )
            .filter(vehicle::Column::Id.eq(current.vehicle_id))
            .exec(&txn)
            .await?;

        txn.commit().await?;

        debug!(booking_id = id, status = %target, "Booking transitioned");
        Ok(Booking {
            status: target,
            ..current
        })
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Booking>> {
        let model = booking::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(model_to_domain))
    }

    async fn find_details(&self, customer_id: Option<i32>) -> DomainResult<Vec<BookingDetails>> {
        let mut query = booking::Entity::find().order_by_asc(booking::Column::Id);
        if let Some(customer_id) = customer_id {
            query = query.filter(booking::Column::CustomerId.eq(customer_id));
        }
        let bookings = query.all(&self.db).await?;
        if bookings.is_empty() {
            return Ok(Vec::new());
        }

        let customer_ids: HashSet<i32> = bookings.iter().map(|b| b.customer_id).collect();
        let vehicle_ids: HashSet<i32> = bookings.iter().map(|b| b.vehicle_id).collect();

        let customers: HashMap<i32, user::Model> = user::Entity::find()
            .filter(user::Column::Id.is_in(customer_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();
        let vehicles: HashMap<i32, vehicle::Model> = vehicle::Entity::find()
            .filter(vehicle::Column::Id.is_in(vehicle_ids))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|v| (v.id, v))
            .collect();

        let details = bookings
            .into_iter()
            .filter_map(|b| {
                let customer = customers.get(&b.customer_id)?;
                let vehicle = vehicles.get(&b.vehicle_id)?;
                Some(BookingDetails {
                    customer: CustomerSummary {
                        name: customer.name.clone(),
                        email: customer.email.clone(),
                    },
                    vehicle: VehicleSummary {
                        vehicle_name: vehicle.vehicle_name.clone(),
                        registration_number: vehicle.registration_number.clone(),
                        vehicle_type: vehicle_repository::type_to_domain(vehicle.vehicle_type),
                    },
                    booking: model_to_domain(b),
                })
            })
            .collect();
        Ok(details)
    }

    async fn find_overdue(&self, now: DateTime<Utc>) -> DomainResult<Vec<Booking>> {
        let models = booking::Entity::find()
            .filter(booking::Column::Status.eq(booking::BookingStatus::Active))
            .filter(booking::Column::RentEndDate.lt(now))
            .order_by_asc(booking::Column::Id)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }
}
