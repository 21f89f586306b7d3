//! Nerostack API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod auth;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use nerostack_core::AppError;
use tracing::info;

use crate::api_config::{ApiCommand, ApiConfig};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    api_config::init_tracing();

    let config = ApiConfig::load()?;

    let pool = api_services::connect_database(config.database_url.as_str()).await?;
    api_services::apply_migrations(&pool).await?;
    if config.command == ApiCommand::Migrate {
        info!("database migrations applied");
        return Ok(());
    }

    api_services::seed_admin(&pool, &config).await?;
    if config.command == ApiCommand::Seed {
        return Ok(());
    }

    let session_layer =
        api_services::build_postgres_session_layer(pool.clone(), config.cookie_secure).await?;
    let app_state = api_services::build_app_state(pool, &config)?;
    let app = api_router::build_router(app_state, session_layer)?;

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "nerostack-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}
