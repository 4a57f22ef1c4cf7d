//! Vehicle domain entity

use std::str::FromStr;

use rust_decimal::Decimal;

use crate::domain::booking::pricing::MAX_AMOUNT;
use crate::domain::DomainResult;
use crate::shared::DomainError;

/// Vehicle category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleType {
    Car,
    Bike,
    Van,
    Suv,
}

impl VehicleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Car => "car",
            Self::Bike => "bike",
            Self::Van => "van",
            Self::Suv => "SUV",
        }
    }
}

impl FromStr for VehicleType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "car" => Ok(Self::Car),
            "bike" => Ok(Self::Bike),
            "van" => Ok(Self::Van),
            "SUV" => Ok(Self::Suv),
            _ => Err(DomainError::Validation(
                "Type must be one of: car, bike, van, SUV".into(),
            )),
        }
    }
}

impl std::fmt::Display for VehicleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Availability flag. `Booked` iff an active booking references the vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AvailabilityStatus {
    #[default]
    Available,
    Booked,
}

impl AvailabilityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Booked => "booked",
        }
    }
}

impl FromStr for AvailabilityStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(Self::Available),
            "booked" => Ok(Self::Booked),
            _ => Err(DomainError::Validation(
                "Availability status must be either \"available\" or \"booked\"".into(),
            )),
        }
    }
}

impl std::fmt::Display for AvailabilityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    pub id: i32,
    pub vehicle_name: String,
    pub vehicle_type: VehicleType,
    /// Globally unique
    pub registration_number: String,
    pub daily_rent_price: Decimal,
    pub availability_status: AvailabilityStatus,
}

impl Vehicle {
    pub fn is_available(&self) -> bool {
        self.availability_status == AvailabilityStatus::Available
    }
}

/// Fields for a vehicle that does not exist yet.
#[derive(Debug, Clone)]
pub struct NewVehicle {
    pub vehicle_name: String,
    pub vehicle_type: VehicleType,
    pub registration_number: String,
    pub daily_rent_price: Decimal,
    pub availability_status: AvailabilityStatus,
}

impl NewVehicle {
    pub fn validate(&self) -> DomainResult<()> {
        if self.vehicle_name.trim().is_empty() {
            return Err(DomainError::Validation("Vehicle name is required".into()));
        }
        if self.registration_number.trim().is_empty() {
            return Err(DomainError::Validation(
                "Registration number is required".into(),
            ));
        }
        validate_daily_rate(self.daily_rent_price)?;
        // A fresh vehicle has no bookings, so it cannot start out booked.
        if self.availability_status == AvailabilityStatus::Booked {
            return Err(DomainError::Conflict(
                "A new vehicle cannot be booked without a booking".into(),
            ));
        }
        Ok(())
    }
}

/// Partial update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct VehiclePatch {
    pub vehicle_name: Option<String>,
    pub vehicle_type: Option<VehicleType>,
    pub registration_number: Option<String>,
    pub daily_rent_price: Option<Decimal>,
    pub availability_status: Option<AvailabilityStatus>,
}

impl VehiclePatch {
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(name) = &self.vehicle_name {
            if name.trim().is_empty() {
                return Err(DomainError::Validation("Vehicle name is required".into()));
            }
        }
        if let Some(reg) = &self.registration_number {
            if reg.trim().is_empty() {
                return Err(DomainError::Validation(
                    "Registration number is required".into(),
                ));
            }
        }
        if let Some(price) = self.daily_rent_price {
            validate_daily_rate(price)?;
        }
        Ok(())
    }

    /// Apply the patch to the current record.
    ///
    /// The availability flag belongs to the booking ledger: restating the
    /// current value is accepted, flipping it is a conflict.
    pub fn apply_to(&self, vehicle: &mut Vehicle) -> DomainResult<()> {
        self.validate()?;
        if let Some(status) = self.availability_status {
            if status != vehicle.availability_status {
                return Err(DomainError::Conflict(
                    "Availability status is managed by bookings".into(),
                ));
            }
        }
        if let Some(name) = &self.vehicle_name {
            vehicle.vehicle_name = name.clone();
        }
        if let Some(t) = self.vehicle_type {
            vehicle.vehicle_type = t;
        }
        if let Some(reg) = &self.registration_number {
            vehicle.registration_number = reg.clone();
        }
        if let Some(price) = self.daily_rent_price {
            vehicle.daily_rent_price = price;
        }
        Ok(())
    }
}

fn validate_daily_rate(price: Decimal) -> DomainResult<()> {
    if price <= Decimal::ZERO {
        return Err(DomainError::Validation(
            "Daily rent price must be a positive number".into(),
        ));
    }
    if price > MAX_AMOUNT {
        return Err(DomainError::Validation(format!(
            "Daily rent price must not exceed {}",
            MAX_AMOUNT
        )));
    }
    if price.normalize().scale() > 2 {
        return Err(DomainError::Validation(
            "Daily rent price must have at most two decimal places".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_vehicle() -> Vehicle {
        Vehicle {
            id: 1,
            vehicle_name: "Corolla".into(),
            vehicle_type: VehicleType::Car,
            registration_number: "ABC-123".into(),
            daily_rent_price: dec!(50),
            availability_status: AvailabilityStatus::Available,
        }
    }

    fn sample_new() -> NewVehicle {
        NewVehicle {
            vehicle_name: "Transit".into(),
            vehicle_type: VehicleType::Van,
            registration_number: "VAN-1".into(),
            daily_rent_price: dec!(80.50),
            availability_status: AvailabilityStatus::Available,
        }
    }

    #[test]
    fn vehicle_type_accepts_only_known_categories() {
        assert_eq!("SUV".parse::<VehicleType>().unwrap(), VehicleType::Suv);
        assert_eq!("bike".parse::<VehicleType>().unwrap(), VehicleType::Bike);
        assert!(matches!(
            "suv".parse::<VehicleType>(),
            Err(DomainError::Validation(_))
        ));
        assert!("truck".parse::<VehicleType>().is_err());
    }

    #[test]
    fn availability_status_parsing() {
        assert_eq!(
            "booked".parse::<AvailabilityStatus>().unwrap(),
            AvailabilityStatus::Booked
        );
        assert!("reserved".parse::<AvailabilityStatus>().is_err());
    }

    #[test]
    fn new_vehicle_requires_positive_rate() {
        let mut v = sample_new();
        assert!(v.validate().is_ok());
        v.daily_rent_price = Decimal::ZERO;
        assert!(matches!(v.validate(), Err(DomainError::Validation(_))));
        v.daily_rent_price = dec!(-1);
        assert!(v.validate().is_err());
    }

    #[test]
    fn rate_must_fit_the_money_column() {
        let mut v = sample_new();
        v.daily_rent_price = Decimal::from_i128_with_scale(10_i128.pow(25), 0);
        assert!(matches!(v.validate(), Err(DomainError::Validation(_))));
        v.daily_rent_price = dec!(19.999);
        assert!(matches!(v.validate(), Err(DomainError::Validation(msg)) if msg.contains("two decimal places")));
        v.daily_rent_price = dec!(19.990);
        assert!(v.validate().is_ok());
        v.daily_rent_price = MAX_AMOUNT;
        assert!(v.validate().is_ok());
    }

    #[test]
    fn new_vehicle_cannot_start_booked() {
        let mut v = sample_new();
        v.availability_status = AvailabilityStatus::Booked;
        assert!(matches!(v.validate(), Err(DomainError::Conflict(_))));
    }

    #[test]
    fn patch_updates_only_supplied_fields() {
        let mut vehicle = sample_vehicle();
        let patch = VehiclePatch {
            daily_rent_price: Some(dec!(65)),
            ..Default::default()
        };
        patch.apply_to(&mut vehicle).unwrap();
        assert_eq!(vehicle.daily_rent_price, dec!(65));
        assert_eq!(vehicle.vehicle_name, "Corolla");
        assert_eq!(vehicle.registration_number, "ABC-123");
    }

    #[test]
    fn patch_cannot_flip_availability() {
        let mut vehicle = sample_vehicle();
        let same = VehiclePatch {
            availability_status: Some(AvailabilityStatus::Available),
            ..Default::default()
        };
        assert!(same.apply_to(&mut vehicle).is_ok());

        let flip = VehiclePatch {
            availability_status: Some(AvailabilityStatus::Booked),
            ..Default::default()
        };
        assert!(matches!(
            flip.apply_to(&mut vehicle),
            Err(DomainError::Conflict(_))
        ));
        assert!(vehicle.is_available());
    }

    #[test]
    fn patch_rejects_non_positive_rate() {
        let mut vehicle = sample_vehicle();
        let patch = VehiclePatch {
            daily_rent_price: Some(Decimal::ZERO),
            vehicle_name: Some("Renamed".into()),
            ..Default::default()
        };
        assert!(patch.apply_to(&mut vehicle).is_err());
        assert_eq!(vehicle.vehicle_name, "Corolla");
    }
}
