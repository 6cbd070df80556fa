use axum::{
    Router,
    http::HeaderValue,
    routing::{get, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::Store;

mod error;
mod hackers;
mod scans;
mod types;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
}

pub async fn create_app_state_from_config(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    Ok(Arc::new(AppState { store }))
}

pub fn router(state: Arc<AppState>, cors_origins: &[String]) -> Router {
    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .route("/users", get(hackers::list_hackers))
        .route(
            "/users/{id}",
            get(hackers::get_hacker).put(hackers::update_hacker),
        )
        .route("/scan/{badge_code}", put(scans::record_scan))
        .route("/scans", get(scans::aggregate_scans))
        .with_state(state)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}
