//! SeaORM implementation of VehicleRepository

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use tracing::debug;

use crate::domain::vehicle::{
    AvailabilityStatus, NewVehicle, Vehicle, VehiclePatch, VehicleRepository, VehicleType,
};
use crate::domain::{DomainError, DomainResult};
use crate::infrastructure::database::entities::{booking, vehicle};

use super::lock_row;

pub struct SeaOrmVehicleRepository {
    db: DatabaseConnection,
}

impl SeaOrmVehicleRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

pub(super) fn type_to_domain(t: vehicle::VehicleType) -> VehicleType {
    match t {
        vehicle::VehicleType::Car => VehicleType::Car,
        vehicle::VehicleType::Bike => VehicleType::Bike,
        vehicle::VehicleType::Van => VehicleType::Van,
        vehicle::VehicleType::Suv => VehicleType::Suv,
    }
}

fn type_to_entity(t: VehicleType) -> vehicle::VehicleType {
    match t {
        VehicleType::Car => vehicle::VehicleType::Car,
        VehicleType::Bike => vehicle::VehicleType::Bike,
        VehicleType::Van => vehicle::VehicleType::Van,
        VehicleType::Suv => vehicle::VehicleType::Suv,
    }
}

fn availability_to_domain(s: vehicle::AvailabilityStatus) -> AvailabilityStatus {
    match s {
        vehicle::AvailabilityStatus::Available => AvailabilityStatus::Available,
        vehicle::AvailabilityStatus::Booked => AvailabilityStatus::Booked,
    }
}

fn availability_to_entity(s: AvailabilityStatus) -> vehicle::AvailabilityStatus {
    match s {
        AvailabilityStatus::Available => vehicle::AvailabilityStatus::Available,
        AvailabilityStatus::Booked => vehicle::AvailabilityStatus::Booked,
    }
}

pub(super) fn model_to_domain(m: vehicle::Model) -> Vehicle {
    Vehicle {
        id: m.id,
        vehicle_name: m.vehicle_name,
        vehicle_type: type_to_domain(m.vehicle_type),
        registration_number: m.registration_number,
        daily_rent_price: m.daily_rent_price,
        availability_status: availability_to_domain(m.availability_status),
    }
}

fn duplicate_registration() -> DomainError {
    DomainError::Conflict("Vehicle with this registration number already exists".into())
}

// ── VehicleRepository impl ──────────────────────────────────────

#[async_trait]
impl VehicleRepository for SeaOrmVehicleRepository {
    async fn create(&self, v: NewVehicle) -> DomainResult<Vehicle> {
        debug!(registration = %v.registration_number, "Creating vehicle");

        let txn = self.db.begin().await?;

        let existing = vehicle::Entity::find()
            .filter(vehicle::Column::RegistrationNumber.eq(v.registration_number.as_str()))
            .one(&txn)
            .await?;
        if existing.is_some() {
            return Err(duplicate_registration());
        }

        let model = vehicle::ActiveModel {
            vehicle_name: Set(v.vehicle_name),
            vehicle_type: Set(type_to_entity(v.vehicle_type)),
            registration_number: Set(v.registration_number),
            daily_rent_price: Set(v.daily_rent_price),
            availability_status: Set(availability_to_entity(v.availability_status)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok(model_to_domain(model))
    }

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Vehicle>> {
        let model = vehicle::Entity::find_by_id(id).one(&self.db).await?;
        Ok(model.map(model_to_domain))
    }

    async fn find_all(&self) -> DomainResult<Vec<Vehicle>> {
        let models = vehicle::Entity::find()
            .order_by_asc(vehicle::Column::Id)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(model_to_domain).collect())
    }

    async fn update(&self, id: i32, patch: VehiclePatch) -> DomainResult<Vehicle> {
        debug!(vehicle_id = id, "Updating vehicle");

        let txn = self.db.begin().await?;
        lock_row::<vehicle::Entity>(&txn, vehicle::Column::Id, vehicle::Column::VehicleName, id)
            .await?;

        let Some(existing) = vehicle::Entity::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await?
        else {
            return Err(DomainError::not_found("Vehicle", id));
        };

        let mut updated = model_to_domain(existing.clone());
        patch.apply_to(&mut updated)?;

        if updated.registration_number != existing.registration_number {
            let clash = vehicle::Entity::find()
                .filter(vehicle::Column::RegistrationNumber.eq(updated.registration_number.as_str()))
                .filter(vehicle::Column::Id.ne(id))
                .one(&txn)
                .await?;
            if clash.is_some() {
                return Err(duplicate_registration());
            }
        }

        let mut active: vehicle::ActiveModel = existing.into();
        active.vehicle_name = Set(updated.vehicle_name);
        active.vehicle_type = Set(type_to_entity(updated.vehicle_type));
        active.registration_number = Set(updated.registration_number);
        active.daily_rent_price = Set(updated.daily_rent_price);
        let model = active.update(&txn).await?;

        txn.commit().await?;
        Ok(model_to_domain(model))
    }

    async fn delete(&self, id: i32) -> DomainResult<()> {
        let txn = self.db.begin().await?;
        lock_row::<vehicle::Entity>(&txn, vehicle::Column::Id, vehicle::Column::VehicleName, id)
            .await?;

        if vehicle::Entity::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .is_none()
        {
            return Err(DomainError::not_found("Vehicle", id));
        }

        let active = booking::Entity::find()
            .filter(booking::Column::VehicleId.eq(id))
            .filter(booking::Column::Status.eq(booking::BookingStatus::Active))
            .one(&txn)
            .await?;
        if active.is_some() {
            return Err(DomainError::Conflict(
                "Cannot delete vehicle with active bookings".into(),
            ));
        }

        let purged = booking::Entity::delete_many()
            .filter(booking::Column::VehicleId.eq(id))
            .filter(booking::Column::Status.ne(booking::BookingStatus::Active))
            .exec(&txn)
            .await?;

        vehicle::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        debug!(vehicle_id = id, purged = purged.rows_affected, "Vehicle deleted");
        Ok(())
    }
}
