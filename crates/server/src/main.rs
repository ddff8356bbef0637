use anyhow::Context;
use clap::Parser;
use db::DBService;
use server::{Deployment, config::ServerConfig, routes};
use tokio::net::TcpListener;
use tracing::info;
use utils::logging::{DEFAULT_LOG_FILTER, init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = ServerConfig::parse();
    init_tracing(DEFAULT_LOG_FILTER);

    let db = DBService::new(
        &config.database.database_url,
        config.database.db_max_connections,
    )
    .await
    .with_context(|| format!("failed to open {}", config.database.database_url))?;

    let app = routes::router(Deployment::from_db(&db));

    let listener = TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", config.host, config.port))?;
    info!(addr = %listener.local_addr()?, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.pool.close().await;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
