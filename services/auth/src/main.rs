use anyhow::Result;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use auth::{
    credentials::CredentialService,
    jwt::{JwtConfig, JwtService},
    repositories::{IdentityStore, MemoryUserRepository, UserRepository},
    routes::{AuthState, create_router},
};
use common::{
    database::{self, DatabaseConfig},
    settings::{Settings, StorageBackend},
};

#[tokio::main]
async fn main() -> Result<()> {
    common::telemetry::init()?;

    info!("Starting authentication service");

    let settings = Settings::load("0.0.0.0:3000")?;

    let users: Arc<dyn IdentityStore> = match settings.storage {
        StorageBackend::Postgres => {
            let db_config = DatabaseConfig::from_env()?;
            let pool = database::init_pool(&db_config).await?;

            if database::health_check(&pool).await? {
                info!("Database connection successful");
            } else {
                anyhow::bail!("Failed to connect to database");
            }
            database::run_migrations(&pool).await?;

            Arc::new(UserRepository::new(pool))
        }
        StorageBackend::Memory => {
            info!("Using in-memory identity store");
            Arc::new(MemoryUserRepository::new())
        }
    };

    let jwt_service = JwtService::new(JwtConfig::from_env()?);
    let state = AuthState::new(CredentialService::new(users, jwt_service));

    let app = create_router(state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&settings.bind_address).await?;
    info!("Authentication service listening on {}", settings.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
