//! Credential handling: bcrypt password hashes and signed JWT bearer tokens

pub mod jwt;
pub mod password;

pub use jwt::{create_token, verify_token, JwtConfig, TokenClaims};
pub use password::PasswordHasher;
