//! System endpoints: health check and bridge status.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::app_state::AppState;
use crate::domain::Topic;

/// Health check response.
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
}

/// `GET /health`: Service health status.
pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// Live subscription of one topic.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TopicStatus {
    topic: &'static str,
    available: bool,
    subscription_id: Option<u64>,
}

/// Bridge status response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StatusResponse {
    initialized: bool,
    searching: bool,
    search_tokens: usize,
    topics: Vec<TopicStatus>,
}

/// `GET /status`: Init state, search session and live subscriptions.
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let bridge = &state.bridge;
    let broker = bridge.broker();
    let topics = Topic::ALL
        .into_iter()
        .map(|topic| TopicStatus {
            topic: topic.as_str(),
            available: broker.has_topic(topic),
            subscription_id: broker.active_subscription(topic).map(|id| id.get()),
        })
        .collect();

    (
        StatusCode::OK,
        Json(StatusResponse {
            initialized: bridge.is_initialized(),
            searching: bridge.search().is_searching(),
            search_tokens: bridge.search().active_tokens().len(),
            topics,
        }),
    )
}

/// System routes mounted at the root level.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
}
