use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{self, AppState};

/// Create the API router with all routes
pub fn create_router(app_state: AppState, cors_enabled: bool) -> Router {
    let mut app = Router::new()
        .route("/health", get(handlers::health))
        .route("/search", get(handlers::search))
        .route("/ask", post(handlers::ask))
        .route("/index", post(handlers::index_namespace))
        .route("/upload", post(handlers::upload))
        .route("/ingest/preview", get(handlers::ingest_preview))
        .with_state(app_state);

    if cors_enabled {
        let cors = CorsLayer::new().allow_methods([Method::GET, Method::POST, Method::OPTIONS]).allow_headers(Any).allow_origin(Any);
        app = app.layer(cors);
    }
    app.layer(TraceLayer::new_for_http())
}
