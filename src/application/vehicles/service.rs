//! Vehicle Directory service
//!
//! Field validation and the admin-only gate for mutations. Availability is
//! never set here; the booking ledger owns it.

use std::sync::Arc;

use tracing::info;

use crate::domain::{
    authorize, Action, Actor, DomainError, DomainResult, NewVehicle, RepositoryProvider, Resource,
    Vehicle, VehiclePatch,
};

pub struct VehicleService {
    repos: Arc<dyn RepositoryProvider>,
}

impl VehicleService {
    pub fn new(repos: Arc<dyn RepositoryProvider>) -> Self {
        Self { repos }
    }

    pub async fn create_vehicle(&self, actor: &Actor, vehicle: NewVehicle) -> DomainResult<Vehicle> {
        authorize(actor, Action::Create, Resource::Vehicle)?;
        vehicle.validate()?;

        let vehicle = self.repos.vehicles().create(vehicle).await?;
        info!(
            vehicle_id = vehicle.id,
            registration = %vehicle.registration_number,
            "Vehicle created"
        );
        Ok(vehicle)
    }

    pub async fn list_vehicles(&self) -> DomainResult<Vec<Vehicle>> {
        self.repos.vehicles().find_all().await
    }

    pub async fn get_vehicle(&self, id: i32) -> DomainResult<Vehicle> {
        self.repos
            .vehicles()
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Vehicle", id))
    }

    pub async fn update_vehicle(
        &self,
        actor: &Actor,
        id: i32,
        patch: VehiclePatch,
    ) -> DomainResult<Vehicle> {
        authorize(actor, Action::Update, Resource::Vehicle)?;
        patch.validate()?;

        let vehicle = self.repos.vehicles().update(id, patch).await?;
        info!(vehicle_id = id, "Vehicle updated");
        Ok(vehicle)
    }

    pub async fn delete_vehicle(&self, actor: &Actor, id: i32) -> DomainResult<()> {
        authorize(actor, Action::Delete, Resource::Vehicle)?;

        self.repos.vehicles().delete(id).await?;
        info!(vehicle_id = id, "Vehicle deleted");
        Ok(())
    }
}
