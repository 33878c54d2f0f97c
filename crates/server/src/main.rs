use anyhow::Context;
use db::DBService;
use server::{AppState, app};
use services::services::config::Config;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    utils::logging::init_tracing();

    let config = Config::from_env().context("invalid configuration")?;
    let db = DBService::new(&config.database_url)
        .await
        .context("failed to open database")?;

    let address = config.bind_address();
    let router = app(AppState::new(db, config));
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    info!(address = %address, "Server listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
