//! Common library for the Wastewise services
//!
//! This crate provides shared functionality used across the services,
//! including database connectivity, the error taxonomy with its request
//! extractors, settings loading and logging initialisation.
//!
//! ```rust,no_run
//! use common::database::{DatabaseConfig, health_check, init_pool};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabaseConfig::from_env()?;
//!     let pool = init_pool(&config).await?;
//!     let is_healthy = health_check(&pool).await?;
//!     println!("Database health check: {}", is_healthy);
//!     Ok(())
//! }
//! ```

pub mod database;
pub mod error;
pub mod extract;
pub mod settings;
pub mod telemetry;

pub use error::{ServiceError, ServiceResult};
