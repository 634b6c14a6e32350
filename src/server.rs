//! Optional HTTP endpoint exposing the latest cycle.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};

use crate::pipeline::Snapshot;

pub type SharedSnapshot = Arc<RwLock<Option<Snapshot>>>;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    error: String,
}

pub fn router(state: SharedSnapshot) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/lights", get(get_lights))
        .route("/health", get(health))
        .layer(cors)
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: SharedSnapshot) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("Status endpoint on http://{}/lights", listener.local_addr()?);
    axum::serve(listener, router(state)).await
}

async fn get_lights(
    State(state): State<SharedSnapshot>,
) -> Result<Json<Snapshot>, (StatusCode, Json<ErrorResponse>)> {
    match state.read().await.as_ref() {
        Some(snapshot) => Ok(Json(snapshot.clone())),
        None => Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse {
                error: "no cycle has completed yet".to_string(),
            }),
        )),
    }
}

async fn health() -> &'static str {
    "ok"
}
