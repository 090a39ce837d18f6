use std::sync::Arc;

use axum::{routing::get, Json, Router};
use tower_http::{
    cors::CorsLayer,
    trace::{TraceLayer, DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, DefaultOnFailure},
};
use tracing::Level;

use common::types::Health;
use service::squirrels::SquirrelStore;

pub mod squirrels;

/// Store handle shared by every request.
pub type SharedStore = Arc<dyn SquirrelStore>;

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

/// Build the application router. Everything except `/health` goes through
/// the squirrel dispatcher, which answers 404 for paths it does not own.
pub fn build_router(store: SharedStore, cors: CorsLayer) -> Router {
    Router::new()
        .route("/health", get(health))
        .fallback(squirrels::dispatch)
        .with_state(store)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(
                    DefaultOnRequest::new()
                        .level(Level::INFO),
                )
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                // 5xx
                .on_failure(
                    DefaultOnFailure::new()
                        .level(Level::ERROR),
                )
        )
}
