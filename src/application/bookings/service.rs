//! Booking Ledger service
//!
//! Every mutation funnels through `BookingRepository::open` or
//! `BookingRepository::transition`; the guard closures passed to them run
//! against the row state read inside the storage transaction, so the
//! authorization, state-machine and date checks can never act on a stale
//! read.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::domain::{
    authorize, Action, Actor, Booking, BookingDetails, BookingEvent, BookingStatus,
    CreatedBooking, DomainError, DomainResult, NewBooking, RepositoryProvider, Resource, Vehicle,
};

pub struct BookingService {
    repos: Arc<dyn RepositoryProvider>,
}

impl BookingService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    /// Reserve a vehicle. The price is frozen from the vehicle's current rate.
    pub async fn create_booking(
        &self,
        actor: &Actor,
        request: NewBooking,
    ) -> DomainResult<CreatedBooking> {
        authorize(
            actor,
            Action::Create,
            Resource::Booking {
                owner_id: request.customer_id,
            },
        )?;
        request.validate()?;

        let pricing = request.clone();
        let created = self
            .repos
            .bookings()
            .open(request, &move |vehicle: &Vehicle| pricing.quote(vehicle))
            .await?;
        let booking = &created.booking;

        metrics::counter!("rental_bookings_created_total").increment(1);
        info!(
            booking_id = booking.id,
            customer_id = booking.customer_id,
            vehicle_id = booking.vehicle_id,
            total_price = %booking.total_price,
            "Booking created"
        );

        Ok(created)
    }

    /// Bookings visible to `actor`: everything for admins, own bookings for
    /// customers.
    pub async fn list_bookings(&self, actor: &Actor) -> DomainResult<Vec<BookingDetails>> {
        let scope = if actor.is_admin() {
            None
        } else {
            Some(actor.id)
        };
        self.repos.bookings().find_details(scope).await
    }

    pub async fn get_booking(&self, actor: &Actor, id: i32) -> DomainResult<Booking> {
        let booking = self
            .repos
            .bookings()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Booking", id))?;
        authorize(
            actor,
            Action::Read,
            Resource::Booking {
                owner_id: booking.customer_id,
            },
        )?;
        Ok(booking)
    }

    /// Apply a caller-requested status (`"cancelled"` or `"returned"`).
    pub async fn transition_booking(
        &self,
        id: i32,
        requested_status: &str,
        actor: &Actor,
    ) -> DomainResult<Booking> {
        let event = BookingEvent::from_requested_status(requested_status)?;
        self.apply(id, event, Some(*actor), Utc::now()).await
    }

    /// Sweep-expire an overdue booking. No actor is involved.
    pub async fn expire(&self, id: i32, now: DateTime<Utc>) -> DomainResult<Booking> {
        self.apply(id, BookingEvent::Expire, None, now).await
    }

    async fn apply(
        &self,
        id: i32,
        event: BookingEvent,
        actor: Option<Actor>,
        now: DateTime<Utc>,
    ) -> DomainResult<Booking> {
        let booking = self
            .repos
            .bookings()
            .transition(id, &move |current: &Booking| {
                decide(current, event, actor.as_ref(), now)
            })
            .await?;

        metrics::counter!("rental_booking_transitions_total", "to" => booking.status.as_str())
            .increment(1);
        info!(
            booking_id = id,
            vehicle_id = booking.vehicle_id,
            status = %booking.status,
            actor_id = actor.map(|a| a.id),
            "Booking transitioned"
        );
        Ok(booking)
    }
}

/// Guard for one event against the current row: authorization first, then
/// the transition table, then the date rules.
fn decide(
    booking: &Booking,
    event: BookingEvent,
    actor: Option<&Actor>,
    now: DateTime<Utc>,
) -> DomainResult<BookingStatus> {
    if let Some(actor) = actor {
        let action = match event {
            BookingEvent::Cancel => Action::Cancel,
            BookingEvent::Return => Action::Return,
            BookingEvent::Expire => Action::Update,
        };
        authorize(
            actor,
            action,
            Resource::Booking {
                owner_id: booking.customer_id,
            },
        )?;
    }

    let target = booking.status.on(event)?;

    match event {
        BookingEvent::Cancel if booking.has_started(now) => Err(DomainError::Conflict(
            "Cannot cancel booking after start date".into(),
        )),
        BookingEvent::Expire if !booking.is_overdue(now) => {
            debug!(booking_id = booking.id, "Booking is not overdue");
            Err(DomainError::Conflict("Booking is not overdue".into()))
        }
        _ => Ok(target),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AvailabilityStatus, NewUser, NewVehicle, UserRole, VehicleType};
    use crate::infrastructure::storage::InMemoryRepositoryProvider;
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    struct Fixture {
        repos: Arc<InMemoryRepositoryProvider>,
        service: Arc<BookingService>,
        admin: Actor,
        alice: Actor,
        bob: Actor,
        vehicle_id: i32,
    }

    async fn fixture() -> Fixture {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        let mut ids = Vec::new();
        for (name, role) in [
            ("admin", UserRole::Admin),
            ("alice", UserRole::Customer),
            ("bob", UserRole::Customer),
        ] {
            let user = repos
                .users()
                .create(NewUser {
                    name: name.into(),
                    email: format!("{}@example.com", name),
                    password_hash: "x".into(),
                    phone: "555".into(),
                    role,
                })
                .await
                .unwrap();
            ids.push(user.id);
        }
        let vehicle = repos
            .vehicles()
            .create(NewVehicle {
                vehicle_name: "Toyota Corolla".into(),
                vehicle_type: VehicleType::Car,
                registration_number: "ABC-123".into(),
                daily_rent_price: dec!(50),
                availability_status: AvailabilityStatus::Available,
            })
            .await
            .unwrap();

        Fixture {
            service: Arc::new(BookingService::new(repos.clone())),
            repos,
            admin: Actor::admin(ids[0]),
            alice: Actor::customer(ids[1]),
            bob: Actor::customer(ids[2]),
            vehicle_id: vehicle.id,
        }
    }

    impl Fixture {
        fn request(&self, customer: &Actor, start: DateTime<Utc>, end: DateTime<Utc>) -> NewBooking {
            NewBooking {
                customer_id: customer.id,
                vehicle_id: self.vehicle_id,
                rent_start_date: start,
                rent_end_date: end,
            }
        }

        /// Booking starting tomorrow for three days.
        async fn upcoming(&self, customer: &Actor) -> Booking {
            let start = Utc::now() + Duration::days(1);
            let request = self.request(customer, start, start + Duration::days(3));
            self.service
                .create_booking(customer, request)
                .await
                .unwrap()
                .booking
        }

        async fn vehicle_status(&self) -> AvailabilityStatus {
            self.repos
                .vehicles()
                .find_by_id(self.vehicle_id)
                .await
                .unwrap()
                .unwrap()
                .availability_status
        }

        /// booked <=> some active booking references the vehicle
        async fn assert_invariant(&self) {
            let any_active = self
                .repos
                .bookings()
                .find_details(None)
                .await
                .unwrap()
                .iter()
                .any(|d| d.booking.vehicle_id == self.vehicle_id && d.booking.is_active());
            let booked = self.vehicle_status().await == AvailabilityStatus::Booked;
            assert_eq!(booked, any_active);
        }
    }

    #[tokio::test]
    async fn create_prices_whole_days_and_books_vehicle() {
        let fx = fixture().await;
        let start = Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 1, 13, 0, 0, 0).unwrap();

        let created = fx
            .service
            .create_booking(&fx.alice, fx.request(&fx.alice, start, end))
            .await
            .unwrap();

        assert_eq!(created.booking.total_price, dec!(150));
        assert_eq!(created.booking.status, BookingStatus::Active);
        assert_eq!(created.vehicle.availability_status, AvailabilityStatus::Booked);
        assert_eq!(fx.vehicle_status().await, AvailabilityStatus::Booked);
        fx.assert_invariant().await;

        let err = fx
            .service
            .create_booking(&fx.bob, fx.request(&fx.bob, start, end))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(ref m) if m == "Vehicle is not available"));
        fx.assert_invariant().await;
    }

    #[tokio::test]
    async fn create_rejects_bad_requests_before_storage() {
        let fx = fixture().await;
        let start = Utc::now() + Duration::days(1);

        let err = fx
            .service
            .create_booking(&fx.alice, fx.request(&fx.alice, start, start))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = fx
            .service
            .create_booking(&fx.alice, fx.request(&fx.bob, start, start + Duration::days(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));

        let mut missing = fx.request(&fx.alice, start, start + Duration::days(1));
        missing.vehicle_id = 999;
        let err = fx.service.create_booking(&fx.alice, missing).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "Vehicle", .. }));

        assert_eq!(fx.vehicle_status().await, AvailabilityStatus::Available);
    }

    #[tokio::test]
    async fn owner_cancels_once() {
        let fx = fixture().await;
        let booking = fx.upcoming(&fx.alice).await;

        let cancelled = fx
            .service
            .transition_booking(booking.id, "cancelled", &fx.alice)
            .await
            .unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert_eq!(fx.vehicle_status().await, AvailabilityStatus::Available);

        let err = fx
            .service
            .transition_booking(booking.id, "cancelled", &fx.alice)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(ref m) if m == "Booking is not active"));
        fx.assert_invariant().await;
    }

    #[tokio::test]
    async fn stranger_cannot_cancel_but_admin_can() {
        let fx = fixture().await;
        let booking = fx.upcoming(&fx.alice).await;

        let err = fx
            .service
            .transition_booking(booking.id, "cancelled", &fx.bob)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
        assert_eq!(fx.vehicle_status().await, AvailabilityStatus::Booked);

        let cancelled = fx
            .service
            .transition_booking(booking.id, "cancelled", &fx.admin)
            .await
            .unwrap();
        assert_eq!(cancelled.status, BookingStatus::Cancelled);
    }

    #[tokio::test]
    async fn only_admin_returns() {
        let fx = fixture().await;
        let booking = fx.upcoming(&fx.alice).await;

        let err = fx
            .service
            .transition_booking(booking.id, "returned", &fx.alice)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(ref m) if m == "Only admin can mark as returned"));

        let returned = fx
            .service
            .transition_booking(booking.id, "returned", &fx.admin)
            .await
            .unwrap();
        assert_eq!(returned.status, BookingStatus::Returned);
        assert_eq!(fx.vehicle_status().await, AvailabilityStatus::Available);
    }

    #[tokio::test]
    async fn started_booking_cannot_be_cancelled() {
        let fx = fixture().await;
        let start = Utc::now() - Duration::hours(1);
        let booking = fx
            .service
            .create_booking(
                &fx.alice,
                fx.request(&fx.alice, start, start + Duration::days(2)),
            )
            .await
            .unwrap()
            .booking;

        let err = fx
            .service
            .transition_booking(booking.id, "cancelled", &fx.admin)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(ref m) if m == "Cannot cancel booking after start date"));
        fx.assert_invariant().await;
    }

    #[tokio::test]
    async fn unknown_status_and_missing_booking() {
        let fx = fixture().await;
        let booking = fx.upcoming(&fx.alice).await;

        for status in ["active", "completed", ""] {
            let err = fx
                .service
                .transition_booking(booking.id, status, &fx.admin)
                .await
                .unwrap_err();
            assert!(matches!(err, DomainError::Validation(ref m) if m == "Invalid status update"));
        }

        let err = fx
            .service
            .transition_booking(999, "returned", &fx.admin)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "Booking", .. }));
    }

    #[tokio::test]
    async fn concurrent_cancel_and_return_has_one_winner() {
        let fx = fixture().await;
        let booking = fx.upcoming(&fx.alice).await;

        let (cancel, ret) = tokio::join!(
            fx.service.transition_booking(booking.id, "cancelled", &fx.alice),
            fx.service.transition_booking(booking.id, "returned", &fx.admin),
        );

        let outcomes = [cancel, ret];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        let loser = outcomes.iter().find_map(|r| r.as_ref().err()).unwrap();
        assert!(matches!(loser, DomainError::Conflict(m) if m == "Booking is not active"));
        assert_eq!(fx.vehicle_status().await, AvailabilityStatus::Available);
        fx.assert_invariant().await;
    }

    #[tokio::test]
    async fn concurrent_creates_book_the_vehicle_once() {
        let fx = fixture().await;
        let start = Utc::now() + Duration::days(1);
        let end = start + Duration::days(1);

        let handles: Vec<_> = [fx.alice, fx.bob, fx.alice, fx.bob]
            .into_iter()
            .map(|actor| {
                let service = fx.service.clone();
                let request = fx.request(&actor, start, end);
                tokio::spawn(async move { service.create_booking(&actor, request).await })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(e) => assert!(matches!(e, DomainError::Conflict(_))),
            }
        }
        assert_eq!(created, 1);
        fx.assert_invariant().await;
    }

    #[tokio::test]
    async fn expire_requires_overdue() {
        let fx = fixture().await;
        let booking = fx.upcoming(&fx.alice).await;

        let err = fx.service.expire(booking.id, Utc::now()).await.unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        let later = booking.rent_end_date + Duration::seconds(1);
        let expired = fx.service.expire(booking.id, later).await.unwrap();
        assert_eq!(expired.status, BookingStatus::Returned);
        assert_eq!(fx.vehicle_status().await, AvailabilityStatus::Available);
    }

    #[tokio::test]
    async fn visibility_filter() {
        let fx = fixture().await;
        let booking = fx.upcoming(&fx.alice).await;

        assert_eq!(fx.service.list_bookings(&fx.admin).await.unwrap().len(), 1);
        let mine = fx.service.list_bookings(&fx.alice).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].customer.email, "alice@example.com");
        assert!(fx.service.list_bookings(&fx.bob).await.unwrap().is_empty());

        assert!(fx.service.get_booking(&fx.alice, booking.id).await.is_ok());
        assert!(matches!(
            fx.service.get_booking(&fx.bob, booking.id).await,
            Err(DomainError::Forbidden(_))
        ));
    }

    /// Bookings storage works, vehicle reads do not.
    struct VehicleReadsDown {
        inner: Arc<InMemoryRepositoryProvider>,
    }

    #[async_trait::async_trait]
    impl crate::domain::VehicleRepository for VehicleReadsDown {
        async fn create(&self, _: NewVehicle) -> DomainResult<Vehicle> {
            Err(DomainError::Storage("vehicles offline".into()))
        }
        async fn find_by_id(&self, _: i32) -> DomainResult<Option<Vehicle>> {
            Err(DomainError::Storage("vehicles offline".into()))
        }
        async fn find_all(&self) -> DomainResult<Vec<Vehicle>> {
            Err(DomainError::Storage("vehicles offline".into()))
        }
        async fn update(&self, _: i32, _: crate::domain::VehiclePatch) -> DomainResult<Vehicle> {
            Err(DomainError::Storage("vehicles offline".into()))
        }
        async fn delete(&self, _: i32) -> DomainResult<()> {
            Err(DomainError::Storage("vehicles offline".into()))
        }
    }

    impl RepositoryProvider for VehicleReadsDown {
        fn users(&self) -> &dyn crate::domain::UserRepository {
            self.inner.users()
        }
        fn vehicles(&self) -> &dyn crate::domain::VehicleRepository {
            self
        }
        fn bookings(&self) -> &dyn crate::domain::BookingRepository {
            self.inner.bookings()
        }
    }

    #[tokio::test]
    async fn created_booking_carries_the_claimed_vehicle() {
        let fx = fixture().await;
        let service = BookingService::new(Arc::new(VehicleReadsDown {
            inner: fx.repos.clone(),
        }));

        let start = Utc::now() + Duration::days(2);
        let created = service
            .create_booking(&fx.alice, fx.request(&fx.alice, start, start + Duration::days(1)))
            .await
            .unwrap();

        assert_eq!(created.vehicle.id, fx.vehicle_id);
        assert_eq!(created.vehicle.availability_status, AvailabilityStatus::Booked);
        assert_eq!(created.booking.total_price, dec!(50));
        assert_eq!(fx.vehicle_status().await, AvailabilityStatus::Booked);
    }
}
