//! Booking ledger against SeaORM on SQLite with migrations applied.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{Duration, TimeZone, Utc};
use rust_decimal_macros::dec;

use vehicle_rental::application::{BookingService, OverdueSweeper, VehicleService};
use vehicle_rental::domain::{
    Actor, AvailabilityStatus, BookingStatus, DomainError, NewBooking, NewUser, NewVehicle,
    RepositoryProvider, UserRole, VehicleType,
};
use vehicle_rental::{init_database, run_migrations, DatabaseConfig, SeaOrmRepositoryProvider};

struct Harness {
    repos: Arc<dyn RepositoryProvider>,
    bookings: Arc<BookingService>,
    vehicles: VehicleService,
    admin: Actor,
    customer: Actor,
}

async fn harness() -> Harness {
    harness_on(DatabaseConfig::in_memory()).await
}

async fn harness_on(config: DatabaseConfig) -> Harness {
    let db = init_database(&config).await.unwrap();
    run_migrations(&db).await.unwrap();
    let repos: Arc<dyn RepositoryProvider> = Arc::new(SeaOrmRepositoryProvider::new(db));

    let mut actors = Vec::new();
    for (name, role) in [("root", UserRole::Admin), ("dana", UserRole::Customer)] {
        let user = repos
            .users()
            .create(NewUser {
                name: name.into(),
                email: format!("{}@example.com", name),
                password_hash: "not-a-real-hash".into(),
                phone: "555-0100".into(),
                role,
            })
            .await
            .unwrap();
        actors.push(Actor::new(user.id, role));
    }

    Harness {
        bookings: Arc::new(BookingService::new(repos.clone())),
        vehicles: VehicleService::new(repos.clone()),
        repos,
        admin: actors[0],
        customer: actors[1],
    }
}

impl Harness {
    async fn vehicle(&self, registration: &str) -> i32 {
        self.vehicles
            .create_vehicle(
                &self.admin,
                NewVehicle {
                    vehicle_name: "Corolla".into(),
                    vehicle_type: VehicleType::Car,
                    registration_number: registration.into(),
                    daily_rent_price: dec!(50),
                    availability_status: AvailabilityStatus::Available,
                },
            )
            .await
            .unwrap()
            .id
    }

    async fn availability(&self, vehicle_id: i32) -> AvailabilityStatus {
        self.repos
            .vehicles()
            .find_by_id(vehicle_id)
            .await
            .unwrap()
            .unwrap()
            .availability_status
    }

    fn request(&self, vehicle_id: i32, start_in_days: i64, days: i64) -> NewBooking {
        let start = Utc::now() + Duration::days(start_in_days);
        NewBooking {
            customer_id: self.customer.id,
            vehicle_id,
            rent_start_date: start,
            rent_end_date: start + Duration::days(days),
        }
    }
}

#[tokio::test]
async fn booking_freezes_price_and_claims_vehicle() {
    let h = harness().await;
    let vehicle_id = h.vehicle("ABC-123").await;

    let request = NewBooking {
        customer_id: h.customer.id,
        vehicle_id,
        rent_start_date: Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap(),
        rent_end_date: Utc.with_ymd_and_hms(2024, 1, 13, 0, 0, 0).unwrap(),
    };
    let created = h
        .bookings
        .create_booking(&h.customer, request.clone())
        .await
        .unwrap();

    assert_eq!(created.booking.total_price, dec!(150));
    assert_eq!(created.booking.status, BookingStatus::Active);
    assert_eq!(created.vehicle.availability_status, AvailabilityStatus::Booked);

    let again = h.bookings.create_booking(&h.customer, request).await;
    assert!(matches!(again, Err(DomainError::Conflict(msg)) if msg == "Vehicle is not available"));
}

#[tokio::test]
async fn cancel_releases_vehicle_once() {
    let h = harness().await;
    let vehicle_id = h.vehicle("CAN-1").await;
    let created = h
        .bookings
        .create_booking(&h.customer, h.request(vehicle_id, 5, 2))
        .await
        .unwrap();

    let cancelled = h
        .bookings
        .transition_booking(created.booking.id, "cancelled", &h.customer)
        .await
        .unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert_eq!(h.availability(vehicle_id).await, AvailabilityStatus::Available);

    let second = h
        .bookings
        .transition_booking(created.booking.id, "cancelled", &h.customer)
        .await;
    assert!(matches!(second, Err(DomainError::Conflict(msg)) if msg == "Booking is not active"));

    let stored = h
        .repos
        .bookings()
        .find_by_id(created.booking.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, BookingStatus::Cancelled);
}

#[tokio::test]
async fn racing_cancel_and_return_commit_exactly_once() {
    let h = harness().await;
    let vehicle_id = h.vehicle("RACE-1").await;
    let id = h
        .bookings
        .create_booking(&h.customer, h.request(vehicle_id, 3, 2))
        .await
        .unwrap()
        .booking
        .id;

    let (cancel, ret) = tokio::join!(
        h.bookings.transition_booking(id, "cancelled", &h.customer),
        h.bookings.transition_booking(id, "returned", &h.admin),
    );

    let outcomes = [cancel, ret];
    assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(outcomes
        .iter()
        .any(|r| matches!(r, Err(DomainError::Conflict(msg)) if msg == "Booking is not active")));
    assert_eq!(h.availability(vehicle_id).await, AvailabilityStatus::Available);
}

/// A file database with a connection pool, so racing transactions really
/// run on separate connections.
async fn pooled_file_harness(dir: &tempfile::TempDir) -> Harness {
    let path = dir.path().join("ledger.db");
    let config = DatabaseConfig::sqlite(&path.to_string_lossy());
    assert!(config.max_connections > 1);
    harness_on(config).await
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn pooled_race_loser_sees_conflict_not_storage_error() {
    let dir = tempfile::tempdir().unwrap();
    let h = pooled_file_harness(&dir).await;

    for round in 0..20 {
        let vehicle_id = h.vehicle(&format!("POOL-{}", round)).await;
        let id = h
            .bookings
            .create_booking(&h.customer, h.request(vehicle_id, 3, 2))
            .await
            .unwrap()
            .booking
            .id;

        let cancel = {
            let bookings = h.bookings.clone();
            let customer = h.customer;
            tokio::spawn(async move { bookings.transition_booking(id, "cancelled", &customer).await })
        };
        let ret = {
            let bookings = h.bookings.clone();
            let admin = h.admin;
            tokio::spawn(async move { bookings.transition_booking(id, "returned", &admin).await })
        };

        let outcomes = [cancel.await.unwrap(), ret.await.unwrap()];
        assert_eq!(
            outcomes.iter().filter(|r| r.is_ok()).count(),
            1,
            "round {}: {:?}",
            round,
            outcomes
        );
        let loser = outcomes.iter().find(|r| r.is_err()).unwrap();
        assert!(
            matches!(loser, Err(DomainError::Conflict(msg)) if msg == "Booking is not active"),
            "round {}: {:?}",
            round,
            loser
        );
        assert_eq!(h.availability(vehicle_id).await, AvailabilityStatus::Available);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn pooled_concurrent_creates_claim_the_vehicle_once() {
    let dir = tempfile::tempdir().unwrap();
    let h = pooled_file_harness(&dir).await;
    let vehicle_id = h.vehicle("POOL-CLAIM").await;

    let tasks: Vec<_> = (0..6)
        .map(|_| {
            let bookings = h.bookings.clone();
            let customer = h.customer;
            let request = h.request(vehicle_id, 1, 2);
            tokio::spawn(async move { bookings.create_booking(&customer, request).await })
        })
        .collect();

    let mut created = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => created += 1,
            Err(DomainError::Conflict(msg)) => assert_eq!(msg, "Vehicle is not available"),
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }
    assert_eq!(created, 1);
    assert_eq!(h.availability(vehicle_id).await, AvailabilityStatus::Booked);
    assert_eq!(h.bookings.list_bookings(&h.admin).await.unwrap().len(), 1);
}

#[tokio::test]
async fn sweeper_returns_only_overdue_bookings() {
    let h = harness().await;
    let overdue_vehicle = h.vehicle("OLD-1").await;
    let current_vehicle = h.vehicle("NEW-1").await;

    let overdue = h
        .bookings
        .create_booking(&h.customer, h.request(overdue_vehicle, -5, 2))
        .await
        .unwrap()
        .booking;
    let current = h
        .bookings
        .create_booking(&h.customer, h.request(current_vehicle, -1, 5))
        .await
        .unwrap()
        .booking;

    let sweeper = OverdueSweeper::new(
        h.repos.clone(),
        h.bookings.clone(),
        StdDuration::from_secs(3600),
    );
    let report = sweeper.sweep_once(Utc::now()).await;
    assert_eq!(report.returned, 1);
    assert_eq!(report.failed, 0);

    let swept = h.repos.bookings().find_by_id(overdue.id).await.unwrap().unwrap();
    assert_eq!(swept.status, BookingStatus::Returned);
    assert_eq!(h.availability(overdue_vehicle).await, AvailabilityStatus::Available);

    let untouched = h.repos.bookings().find_by_id(current.id).await.unwrap().unwrap();
    assert_eq!(untouched.status, BookingStatus::Active);
    assert_eq!(h.availability(current_vehicle).await, AvailabilityStatus::Booked);
}

#[tokio::test]
async fn vehicle_delete_respects_active_bookings() {
    let h = harness().await;
    let vehicle_id = h.vehicle("DEL-1").await;
    let id = h
        .bookings
        .create_booking(&h.customer, h.request(vehicle_id, 2, 1))
        .await
        .unwrap()
        .booking
        .id;

    let blocked = h.vehicles.delete_vehicle(&h.admin, vehicle_id).await;
    assert!(matches!(blocked, Err(DomainError::Conflict(_))));

    h.bookings
        .transition_booking(id, "returned", &h.admin)
        .await
        .unwrap();
    h.vehicles.delete_vehicle(&h.admin, vehicle_id).await.unwrap();

    assert!(h.repos.vehicles().find_by_id(vehicle_id).await.unwrap().is_none());
    assert!(h.repos.bookings().find_by_id(id).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_registration_is_a_conflict() {
    let h = harness().await;
    h.vehicle("DUP-1").await;

    let duplicate = h
        .vehicles
        .create_vehicle(
            &h.admin,
            NewVehicle {
                vehicle_name: "Golf".into(),
                vehicle_type: VehicleType::Car,
                registration_number: "DUP-1".into(),
                daily_rent_price: dec!(40),
                availability_status: AvailabilityStatus::Available,
            },
        )
        .await;
    assert!(matches!(duplicate, Err(DomainError::Conflict(_))));
}

#[tokio::test]
async fn listing_is_scoped_to_the_customer() {
    let h = harness().await;
    let vehicle_id = h.vehicle("LIST-1").await;
    h.bookings
        .create_booking(&h.customer, h.request(vehicle_id, 1, 1))
        .await
        .unwrap();

    let mine = h.bookings.list_bookings(&h.customer).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].customer.email, "dana@example.com");
    assert_eq!(mine[0].vehicle.registration_number, "LIST-1");

    let admin_view = h.bookings.list_bookings(&h.admin).await.unwrap();
    assert_eq!(admin_view.len(), 1);

    let other = Actor::customer(h.admin.id + 100);
    assert!(h.bookings.list_bookings(&other).await.unwrap().is_empty());
}
