//! HTTP front end for Dockyard.
//!
//! Five JSON endpoints over [`ContainerService`], plus the index page and the
//! static assets it loads. All request bodies are form encoded.

pub mod config;
pub mod error;
pub mod forms;
pub mod handlers;

use axum::routing::{get, post};
use axum::Router;
use dockyard_engine::ContainerService;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

pub use config::ServerConfig;
pub use error::AppError;

#[derive(Clone)]
pub struct AppState {
    pub service: ContainerService,
}

impl AppState {
    pub fn new(service: ContainerService) -> Self {
        Self { service }
    }
}

pub fn create_app(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        // Container endpoints
        .route(
            "/containers",
            post(handlers::create_container).get(handlers::list_containers),
        )
        .route("/containers/stop", post(handlers::stop_container))
        .route(
            "/containers/:id/resources",
            get(handlers::get_container_resources).put(handlers::update_container_resources),
        )
        // Browser UI
        .route_service("/", ServeFile::new(&config.index_file))
        .nest_service("/static", ServeDir::new(&config.static_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests;
