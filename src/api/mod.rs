mod handlers;

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::store::PostStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PostStore>,
    pub config: AppConfig,
}

pub fn create_router(store: Arc<dyn PostStore>, config: AppConfig) -> Router {
    let api = Router::new()
        .route("/posts", get(handlers::list_nearby))
        .route("/posts", post(handlers::create_post))
        .route("/posts/{id}/like", post(handlers::like_post))
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(AppState { store, config })
}

/// Router with the client app mounted: any path outside `/api` falls through
/// to the SPA entry document.
pub fn create_router_with_assets(
    store: Arc<dyn PostStore>,
    config: AppConfig,
    assets_dir: PathBuf,
) -> Router {
    let index = assets_dir.join("index.html");
    create_router(store, config)
        .fallback_service(ServeDir::new(&assets_dir).fallback(ServeFile::new(index)))
}
