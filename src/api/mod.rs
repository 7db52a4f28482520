//! HTTP layer: router composition for the health, status and WebSocket
//! endpoints.

pub mod handlers;

use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::ws::handler::ws_handler;

/// Builds the HTTP router (everything except `/ws`).
pub fn build_router() -> Router<AppState> {
    Router::new().merge(handlers::system::routes())
}

/// Builds the complete application: HTTP routes, `/ws`, and the tracing
/// and CORS layers.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(build_router())
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
