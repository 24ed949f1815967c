use dockyard_engine::{ContainerService, DockerEngine};
use dockyard_server::{create_app, AppState, ServerConfig};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "info,dockyard_server=debug,dockyard_engine=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let config = ServerConfig::from_env()?;

    let engine = Arc::new(match &config.docker_host {
        Some(addr) => DockerEngine::with_http(addr.clone()),
        None => DockerEngine::new(),
    });
    // Not fatal: requests reconnect on demand and report the failure themselves
    if let Err(e) = engine.connect().await {
        warn!(error = %e, "Container engine unreachable at startup");
    }

    let service = ContainerService::new(engine, config.image.clone());
    let app = create_app(AppState::new(service), &config);

    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    info!(image = %config.image, "Server started on http://{}", config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
