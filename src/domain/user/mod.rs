//! User aggregate
//!
//! Identity and role records consulted for authorization, and the
//! repository interface of the User Directory.

pub mod model;
pub mod repository;

pub use model::{normalize_email, NewUser, User, UserPatch, UserRole};
pub use repository::UserRepository;
