//! Binary entry point.
//!
//! Runs the HTTP server by default; `expense-buddy mcp` runs the stdio tool
//! server over the same database instead.

use std::{net::SocketAddr, sync::Arc};

use expense_buddy::{
    api::{self, AppState},
    config::{AppConfig, database},
    errors::Result,
    mcp,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if dotenvy::dotenv().is_ok() {
        info!("Loaded environment from .env");
    }

    let config = AppConfig::load()?;
    let db = database::create_connection(&config.database_url).await?;
    if let Err(err) = database::create_tables(&db).await {
        debug!("Skipping table creation: {err}");
    }

    if std::env::args().nth(1).as_deref() == Some("mcp") {
        return mcp::run_stdio_server(db).await;
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = Arc::new(AppState::new(db, config)?);
    let app = api::router(state);

    info!("Listening on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
