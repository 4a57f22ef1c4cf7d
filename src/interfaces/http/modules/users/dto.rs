//! User DTOs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::{DomainResult, User, UserPatch, UserRole};

/// User API representation. The password hash never leaves the service.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserDto {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: String,
    /// `admin` or `customer`
    pub role: String,
}

impl From<User> for UserDto {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            phone: u.phone,
            role: u.role.as_str().to_string(),
        }
    }
}

/// Update user request. Omitted fields are left unchanged.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(length(min = 1, message = "phone must not be empty"))]
    pub phone: Option<String>,
    /// Admin only
    pub role: Option<String>,
}

impl UpdateUserRequest {
    pub fn into_patch(self) -> DomainResult<UserPatch> {
        let role = self
            .role
            .as_deref()
            .map(str::parse::<UserRole>)
            .transpose()?;
        Ok(UserPatch {
            name: self.name,
            email: self.email,
            phone: self.phone,
            role,
        })
    }
}
