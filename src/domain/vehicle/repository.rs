//! Vehicle repository interface

use async_trait::async_trait;

use super::model::{NewVehicle, Vehicle, VehiclePatch};
use crate::domain::DomainResult;

#[async_trait]
pub trait VehicleRepository: Send + Sync {
    /// Insert a vehicle. Duplicate registration numbers are a `Conflict`.
    async fn create(&self, vehicle: NewVehicle) -> DomainResult<Vehicle>;

    async fn find_by_id(&self, id: i32) -> DomainResult<Option<Vehicle>>;

    async fn find_all(&self) -> DomainResult<Vec<Vehicle>>;

    /// Read-modify-write through `VehiclePatch::apply_to`, atomically.
    async fn update(&self, id: i32, patch: VehiclePatch) -> DomainResult<Vehicle>;

    /// Delete a vehicle in one transaction: `Conflict` while an active
    /// booking references it, otherwise purge its booking history first.
    async fn delete(&self, id: i32) -> DomainResult<()>;
}
