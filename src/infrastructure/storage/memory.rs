//! In-memory repository provider for development and testing
//!
//! All three repositories share one state guarded by a single async mutex,
//! so every operation is serialized exactly like a transaction would be.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::domain::booking::{
    Booking, BookingDetails, BookingRepository, BookingStatus, CreatedBooking, CustomerSummary,
    DecideFn, NewBooking, QuoteFn, VehicleSummary,
};
use crate::domain::user::{NewUser, User, UserPatch, UserRepository};
use crate::domain::vehicle::{AvailabilityStatus, NewVehicle, Vehicle, VehiclePatch, VehicleRepository};
use crate::domain::{DomainError, DomainResult, RepositoryProvider};

#[derive(Default)]
struct MemoryState {
    users: BTreeMap<i32, User>,
    vehicles: BTreeMap<i32, Vehicle>,
    bookings: BTreeMap<i32, Booking>,
    next_user_id: i32,
    next_vehicle_id: i32,
    next_booking_id: i32,
}

impl MemoryState {
    fn next_id(counter: &mut i32) -> i32 {
        *counter += 1;
        *counter
    }

    fn has_active_booking(&self, pred: impl Fn(&Booking) -> bool) -> bool {
        self.bookings.values().any(|b| b.is_active() && pred(b))
    }

    /// Drop non-active bookings matching `pred`.
    fn purge_history(&mut self, pred: impl Fn(&Booking) -> bool) {
        self.bookings.retain(|_, b| b.is_active() || !pred(b));
    }

    fn registration_taken(&self, registration: &str, except: Option<i32>) -> bool {
        self.vehicles
            .values()
            .any(|v| v.registration_number == registration && Some(v.id) != except)
    }

    fn email_taken(&self, email: &str, except: Option<i32>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }
}

type SharedState = Arc<Mutex<MemoryState>>;

pub struct InMemoryUserRepository {
    state: SharedState,
}

pub struct InMemoryVehicleRepository {
    state: SharedState,
}

pub struct InMemoryBookingRepository {
    state: SharedState,
}

/// Repository provider backed by process memory.
pub struct InMemoryRepositoryProvider {
    users: InMemoryUserRepository,
    vehicles: InMemoryVehicleRepository,
    bookings: InMemoryBookingRepository,
}

impl InMemoryRepositoryProvider {
    pub fn new() -> Self {
        let state: SharedState = Arc::new(Mutex::new(MemoryState::default()));
        Self {
            users: InMemoryUserRepository { state: state.clone() },
            vehicles: InMemoryVehicleRepository { state: state.clone() },
            bookings: InMemoryBookingRepository { state },
        }
    }
}

impl Default for InMemoryRepositoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl RepositoryProvider for InMemoryRepositoryProvider {
    fn users(&self) -> &dyn UserRepository {
        &self.users
    }

    fn vehicles(&self) -> &dyn VehicleRepository {
        &self.vehicles
    }

    fn bookings(&self) -> &dyn BookingRepository {
        &self.bookings
    }
}

// ── Users ───────────────────────────────────────────────────────

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: NewUser) -> DomainResult<User> {
        let mut state = self.state.lock().await;
        if state.email_taken(&user.email, None) {
            return Err(DomainError::Conflict("User already exists".into()));
        }
        let id = MemoryState::next_id(&mut state.next_user_id);
        let user = User {
            id,
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            phone: user.phone,
            role: user.role,
        };
        state.users.insert(id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<User>> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_all(&self) -> DomainResult<Vec<User>> {
        Ok(self.state.lock().await.users.values().cloned().collect())
    }

    async fn count(&self) -> DomainResult<u64> {
        Ok(self.state.lock().await.users.len() as u64)
    }

    async fn update(&self, id: i32, patch: UserPatch) -> DomainResult<User> {
        let mut state = self.state.lock().await;
        let mut user = state
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("User", id))?;
        patch.apply_to(&mut user);
        if state.email_taken(&user.email, Some(id)) {
            return Err(DomainError::Conflict("Email already in use".into()));
        }
        state.users.insert(id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: i32) -> DomainResult<()> {
        let mut state = self.state.lock().await;
        if !state.users.contains_key(&id) {
            return Err(DomainError::not_found("User", id));
        }
        if state.has_active_booking(|b| b.customer_id == id) {
            return Err(DomainError::Conflict(
                "Cannot delete user with active bookings".into(),
            ));
        }
        state.purge_history(|b| b.customer_id == id);
        state.users.remove(&id);
        Ok(())
    }
}

// ── Vehicles ────────────────────────────────────────────────────

#[async_trait]
impl VehicleRepository for InMemoryVehicleRepository {
    async fn create(&self, vehicle: NewVehicle) -> DomainResult<Vehicle> {
        let mut state = self.state.lock().await;
        if state.registration_taken(&vehicle.registration_number, None) {
            return Err(DomainError::Conflict(
                "Vehicle with this registration number already exists".into(),
            ));
        }
        let id = MemoryState::next_id(&mut state.next_vehicle_id);
        let vehicle = Vehicle {
            id,
            vehicle_name: vehicle.vehicle_name,
            vehicle_type: vehicle.vehicle_type,
            registration_number: vehicle.registration_number,
            daily_rent_price: vehicle.daily_rent_price,
            availability_status: vehicle.availability_status,
        };
        state.vehicles.insert(id, vehicle.clone());
        Ok(vehicle)
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Vehicle>> {
        Ok(self.state.lock().await.vehicles.get(&id).cloned())
    }

    async fn find_all(&self) -> DomainResult<Vec<Vehicle>> {
        Ok(self.state.lock().await.vehicles.values().cloned().collect())
    }

    async fn update(&self, id: i32, patch: VehiclePatch) -> DomainResult<Vehicle> {
        let mut state = self.state.lock().await;
        let mut vehicle = state
            .vehicles
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("Vehicle", id))?;
        patch.apply_to(&mut vehicle)?;
        if state.registration_taken(&vehicle.registration_number, Some(id)) {
            return Err(DomainError::Conflict(
                "Vehicle with this registration number already exists".into(),
            ));
        }
        state.vehicles.insert(id, vehicle.clone());
        Ok(vehicle)
    }

    async fn delete(&self, id: i32) -> DomainResult<()> {
        let mut state = self.state.lock().await;
        if !state.vehicles.contains_key(&id) {
            return Err(DomainError::not_found("Vehicle", id));
        }
        if state.has_active_booking(|b| b.vehicle_id == id) {
            return Err(DomainError::Conflict(
                "Cannot delete vehicle with active bookings".into(),
            ));
        }
        state.purge_history(|b| b.vehicle_id == id);
        state.vehicles.remove(&id);
        Ok(())
    }
}

// ── Bookings ────────────────────────────────────────────────────

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn open(&self, booking: NewBooking, quote: &QuoteFn) -> DomainResult<CreatedBooking> {
        let mut state = self.state.lock().await;
        if !state.users.contains_key(&booking.customer_id) {
            return Err(DomainError::not_found("User", booking.customer_id));
        }
        let vehicle = state
            .vehicles
            .get(&booking.vehicle_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("Vehicle", booking.vehicle_id))?;

        let total_price = quote(&vehicle)?;

        let id = MemoryState::next_id(&mut state.next_booking_id);
        let booking = booking.into_booking(id, total_price);
        state.bookings.insert(id, booking.clone());
        let vehicle = Vehicle {
            availability_status: AvailabilityStatus::Booked,
            ..vehicle
        };
        state.vehicles.insert(vehicle.id, vehicle.clone());
        Ok(CreatedBooking { booking, vehicle })
    }

    async fn transition(&self, id: i32, decide: &DecideFn) -> DomainResult<Booking> {
        let mut state = self.state.lock().await;
        let current = state
            .bookings
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found("Booking", id))?;

        let target = decide(&current)?;
        if !current.is_active() || target == BookingStatus::Active {
            return Err(DomainError::Conflict("Booking is not active".into()));
        }

        let mut updated = current;
        updated.status = target;
        state.bookings.insert(id, updated.clone());
        if let Some(v) = state.vehicles.get_mut(&updated.vehicle_id) {
            v.availability_status = AvailabilityStatus::Available;
        }
        Ok(updated)
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Booking>> {
        Ok(self.state.lock().await.bookings.get(&id).cloned())
    }

    async fn find_details(&self, customer_id: Option<i32>) -> DomainResult<Vec<BookingDetails>> {
        let state = self.state.lock().await;
        let details = state
            .bookings
            .values()
            .filter(|b| customer_id.map_or(true, |c| b.customer_id == c))
            .filter_map(|b| {
                let customer = state.users.get(&b.customer_id)?;
                let vehicle = state.vehicles.get(&b.vehicle_id)?;
                Some(BookingDetails {
                    booking: b.clone(),
                    customer: CustomerSummary {
                        name: customer.name.clone(),
                        email: customer.email.clone(),
                    },
                    vehicle: VehicleSummary {
                        vehicle_name: vehicle.vehicle_name.clone(),
                        registration_number: vehicle.registration_number.clone(),
                        vehicle_type: vehicle.vehicle_type,
                    },
                })
            })
            .collect();
        Ok(details)
    }

    async fn find_overdue(&self, now: DateTime<Utc>) -> DomainResult<Vec<Booking>> {
        let state = self.state.lock().await;
        Ok(state
            .bookings
            .values()
            .filter(|b| b.is_overdue(now))
            .cloned()
            .collect())
    }
}
