//! Wastewise API service
//!
//! Collection records, schedules, payments, recycling credits and reports,
//! served over HTTP behind the role policy in the `auth` crate.

pub mod analytics;
pub mod ledgers;
pub mod lifecycle;
pub mod models;
pub mod notify;
pub mod reporting;
pub mod repositories;
pub mod routes;
pub mod schedules;
pub mod state;

pub use state::{AppState, Stores};
