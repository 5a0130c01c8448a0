//! Layered service settings
//!
//! Defaults, then an optional `wastewise.toml` in the working directory, then
//! `WASTEWISE__*` environment variables (e.g. `WASTEWISE__BIND_ADDRESS`).

use anyhow::Result;
use config::{Config, Environment, File};
use serde::Deserialize;

/// Where the services keep their records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// PostgreSQL through `DATABASE_URL`
    Postgres,
    /// Process-local stores, lost on restart
    Memory,
}

/// Service settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Socket address the HTTP server binds to
    pub bind_address: String,
    /// Storage backend
    pub storage: StorageBackend,
    /// Directory rendered report PDFs are archived in
    pub report_dir: String,
}

impl Settings {
    /// Load settings, falling back to `default_bind` for the listen address
    pub fn load(default_bind: &str) -> Result<Self> {
        let settings = Config::builder()
            .set_default("bind_address", default_bind)?
            .set_default("storage", "postgres")?
            .set_default("report_dir", "reports")?
            .add_source(File::with_name("wastewise").required(false))
            .add_source(Environment::with_prefix("WASTEWISE").separator("__"))
            .build()?
            .try_deserialize()?;

        Ok(settings)
    }
}
