//! # Vehicle Rental
//!
//! Booking lifecycle for a vehicle rental service: vehicles, customers and
//! bookings, with vehicle availability kept consistent with active
//! bookings under concurrent access.
//!
//! ## Architecture
//!
//! The project follows Clean Architecture principles:
//!
//! - **domain**: Entities, the booking state machine, pricing, the
//!   authorization gate and repository traits
//! - **application**: Use-case services and the overdue sweeper
//! - **infrastructure**: SeaORM persistence, in-memory storage, crypto
//! - **interfaces**: REST API with Swagger documentation
//! - **shared**: Error taxonomy and shutdown signalling

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interfaces;
pub mod server;
pub mod shared;

pub use config::{default_config_path, AppConfig};

// Re-export database types for easy access
pub use infrastructure::{
    init_database, run_migrations, DatabaseConfig, InMemoryRepositoryProvider,
    SeaOrmRepositoryProvider,
};

// Re-export API router
pub use interfaces::http::{create_api_router, AppServices};
