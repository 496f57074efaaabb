pub mod routes;

use crate::state::AppState;
use axum::routing::{get, post};
use std::sync::Arc;

/// API routes plus the static dashboard bundle as fallback.
pub fn router(state: Arc<AppState>) -> axum::Router {
    let dashboard = state.config.dashboard_dir.clone();

    axum::Router::new()
        .route("/api/config", get(routes::get_config))
        .route("/api/projection", post(routes::post_projection))
        .route("/api/montecarlo", post(routes::post_montecarlo))
        .route("/api/backtest", get(routes::get_backtest))
        .route("/api/counters", get(routes::get_counters))
        .fallback_service(
            tower_http::services::ServeDir::new(&dashboard)
                .fallback(tower_http::services::ServeFile::new(dashboard.join("index.html"))),
        )
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .with_state(state)
}
