use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use api::{AppState, Stores, notify::TracingNotifier, routes::create_router};
use auth::jwt::{JwtConfig, JwtService};
use common::{
    database::{self, DatabaseConfig},
    settings::{Settings, StorageBackend},
};

#[tokio::main]
async fn main() -> Result<()> {
    common::telemetry::init()?;

    info!("Starting API service");

    let settings = Settings::load("0.0.0.0:3001")?;

    let stores = match settings.storage {
        StorageBackend::Postgres => {
            let db_config = DatabaseConfig::from_env()?;
            let pool = database::init_pool(&db_config).await?;

            if database::health_check(&pool).await? {
                info!("Database connection successful");
            } else {
                anyhow::bail!("Failed to connect to database");
            }
            database::run_migrations(&pool).await?;

            info!(report_dir = %settings.report_dir, "Archiving reports on disk");
            Stores::postgres(pool, &settings.report_dir)
        }
        StorageBackend::Memory => {
            info!("Using in-memory stores");
            Stores::memory()
        }
    };

    let jwt_service = JwtService::new(JwtConfig::from_env()?);
    let state = AppState::new(stores, jwt_service, Arc::new(TracingNotifier));

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&settings.bind_address).await?;
    info!("API service listening on {}", settings.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
