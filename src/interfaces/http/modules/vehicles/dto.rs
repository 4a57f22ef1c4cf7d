//! Vehicle DTOs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::{
    AvailabilityStatus, DomainResult, NewVehicle, Vehicle, VehiclePatch, VehicleType,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VehicleDto {
    pub id: i32,
    pub vehicle_name: String,
    /// `car`, `bike`, `van` or `SUV`
    #[serde(rename = "type")]
    pub vehicle_type: String,
    pub registration_number: String,
    #[schema(value_type = f64)]
    pub daily_rent_price: Decimal,
    /// `available` or `booked`
    pub availability_status: String,
}

impl From<Vehicle> for VehicleDto {
    fn from(v: Vehicle) -> Self {
        Self {
            id: v.id,
            vehicle_name: v.vehicle_name,
            vehicle_type: v.vehicle_type.as_str().to_string(),
            registration_number: v.registration_number,
            daily_rent_price: v.daily_rent_price,
            availability_status: v.availability_status.as_str().to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateVehicleRequest {
    #[validate(length(min = 1, message = "vehicle_name is required"))]
    pub vehicle_name: String,
    #[serde(rename = "type")]
    pub vehicle_type: String,
    #[validate(length(min = 1, message = "registration_number is required"))]
    pub registration_number: String,
    #[schema(value_type = f64)]
    pub daily_rent_price: Decimal,
    /// Defaults to `available`
    pub availability_status: Option<String>,
}

impl CreateVehicleRequest {
    pub fn into_new_vehicle(self) -> DomainResult<NewVehicle> {
        Ok(NewVehicle {
            vehicle_type: self.vehicle_type.parse::<VehicleType>()?,
            availability_status: parse_availability(self.availability_status.as_deref())?
                .unwrap_or_default(),
            vehicle_name: self.vehicle_name,
            registration_number: self.registration_number,
            daily_rent_price: self.daily_rent_price,
        })
    }
}

/// Omitted fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateVehicleRequest {
    #[validate(length(min = 1, message = "vehicle_name must not be empty"))]
    pub vehicle_name: Option<String>,
    #[serde(rename = "type")]
    pub vehicle_type: Option<String>,
    #[validate(length(min = 1, message = "registration_number must not be empty"))]
    pub registration_number: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub daily_rent_price: Option<Decimal>,
    pub availability_status: Option<String>,
}

impl UpdateVehicleRequest {
    pub fn into_patch(self) -> DomainResult<VehiclePatch> {
        Ok(VehiclePatch {
            vehicle_type: self
                .vehicle_type
                .as_deref()
                .map(str::parse::<VehicleType>)
                .transpose()?,
            availability_status: parse_availability(self.availability_status.as_deref())?,
            vehicle_name: self.vehicle_name,
            registration_number: self.registration_number,
            daily_rent_price: self.daily_rent_price,
        })
    }
}

fn parse_availability(raw: Option<&str>) -> DomainResult<Option<AvailabilityStatus>> {
    raw.map(str::parse::<AvailabilityStatus>).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainError;
    use rust_decimal_macros::dec;

    #[test]
    fn create_request_uses_type_key_and_defaults_availability() {
        let request: CreateVehicleRequest = serde_json::from_str(
            r#"{"vehicle_name":"Tiguan","type":"SUV","registration_number":"SUV-9","daily_rent_price":72.5}"#,
        )
        .unwrap();
        let vehicle = request.into_new_vehicle().unwrap();

        assert_eq!(vehicle.vehicle_type, VehicleType::Suv);
        assert_eq!(vehicle.daily_rent_price, dec!(72.5));
        assert_eq!(vehicle.availability_status, AvailabilityStatus::Available);
    }

    #[test]
    fn unknown_type_is_a_validation_error() {
        let request: CreateVehicleRequest = serde_json::from_str(
            r#"{"vehicle_name":"Actros","type":"truck","registration_number":"T-1","daily_rent_price":200}"#,
        )
        .unwrap();
        assert!(matches!(
            request.into_new_vehicle(),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn patch_carries_only_supplied_fields() {
        let request: UpdateVehicleRequest =
            serde_json::from_str(r#"{"daily_rent_price":55}"#).unwrap();
        let patch = request.into_patch().unwrap();
        assert_eq!(patch.daily_rent_price, Some(dec!(55)));
        assert!(patch.vehicle_type.is_none());
        assert!(patch.availability_status.is_none());
    }

    #[test]
    fn dto_serializes_type_and_status_as_strings() {
        let dto = VehicleDto::from(Vehicle {
            id: 3,
            vehicle_name: "Vespa".into(),
            vehicle_type: VehicleType::Bike,
            registration_number: "B-3".into(),
            daily_rent_price: dec!(15),
            availability_status: AvailabilityStatus::Booked,
        });
        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["type"], "bike");
        assert_eq!(json["availability_status"], "booked");
        assert_eq!(json["daily_rent_price"], 15.0);
    }
}
