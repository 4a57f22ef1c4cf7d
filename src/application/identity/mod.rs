//! Identity module: user management & authentication
//!
//! Contains the `UserService` which orchestrates the User Directory
//! use-cases: sign-up, sign-in, profile updates, deletion and seeding of
//! the first administrator.

pub mod service;

pub use service::{AdminSeed, AuthResult, SignUp, UserService};
