//! HTTP routes: WebSocket upgrade, liveness and readiness.

use axum::extract::State;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use ragbridge_core::Dispatcher;
use ragbridge_core::config::MessageOrdering;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::ws;

#[derive(Clone)]
pub struct AppState {
    dispatcher: Dispatcher,
    ordering: MessageOrdering,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher, ordering: MessageOrdering) -> Self {
        Self {
            dispatcher,
            ordering,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/ws", get(upgrade))
        .route("/health", get(health))
        .route("/ready", get(ready))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct RootResponse {
    name: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Serialize)]
struct ReadyResponse {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    assistant: Option<String>,
}

/// Clients connecting to the bare host:port get the socket; plain HTTP gets
/// the service name.
async fn root(
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    State(state): State<AppState>,
) -> Response {
    match upgrade {
        Ok(upgrade) => accept(upgrade, state),
        Err(_) => Json(RootResponse {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
        })
        .into_response(),
    }
}

async fn upgrade(upgrade: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    accept(upgrade, state)
}

fn accept(upgrade: WebSocketUpgrade, state: AppState) -> Response {
    upgrade.on_upgrade(move |socket| ws::handle_socket(socket, state.dispatcher, state.ordering))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    match state.dispatcher.gate().assistant() {
        Some(assistant) => (
            StatusCode::OK,
            Json(ReadyResponse {
                status: "ready",
                assistant: Some(assistant.to_string()),
            }),
        ),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyResponse {
                status: "initializing",
                assistant: None,
            }),
        ),
    }
}

#[cfg(test)]
#[path = "app_tests.rs"]
mod tests;
