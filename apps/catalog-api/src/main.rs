//! Catalog API - product catalog REST server

use axum_helpers::server::{create_router, health_router, serve};
use core_config::tracing::{init_tracing, install_color_eyre};
use database::RetryConfig;
use database::postgres::{connect_with_retry, run_migrations};
use migration::Migrator;
use tracing::info;

mod api;
mod config;
mod openapi;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    info!(
        max_connections = config.database.max_connections,
        "Connecting to PostgreSQL"
    );
    let db = connect_with_retry(config.database.clone(), RetryConfig::default()).await?;
    info!("Connected to PostgreSQL");

    if config.run_migrations {
        run_migrations::<Migrator>(&db).await?;
    }

    let state = AppState {
        config: config.clone(),
        db,
    };

    let api_routes = api::routes(&state);
    let router = create_router(api_routes, openapi::openapi(config.admin_routes_enabled))?;
    let app = router
        .merge(health_router(config.app))
        .merge(api::health::ready_router(state.clone()));

    info!(
        name = config.app.name,
        version = config.app.version,
        admin_routes = config.admin_routes_enabled,
        "Starting Catalog API on {}",
        config.server.address()
    );

    let db = state.db;
    serve(app, &config.server, async move {
        info!("Closing PostgreSQL pool");
        if let Err(e) = db.close().await {
            tracing::warn!(error = %e, "Error while closing PostgreSQL pool");
        }
    })
    .await?;

    info!("Catalog API shutdown complete");
    Ok(())
}
