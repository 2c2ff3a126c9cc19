//! /status, /gc, /daemon/shutdown handlers.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use rendezvous_master::RegistrySnapshot;

use super::{ApiResult, ApiState, Empty};

pub async fn handle_status(State(state): State<ApiState>) -> Json<RegistrySnapshot> {
    Json(state.master.snapshot().await)
}

pub async fn handle_gc(State(state): State<ApiState>) -> ApiResult<Empty> {
    state.master.gc().await?;
    Ok(Json(Empty {}))
}

#[derive(Serialize)]
pub struct ShutdownResponse {
    pub message: String,
}

pub async fn handle_shutdown(State(state): State<ApiState>) -> Json<ShutdownResponse> {
    tracing::info!("shutdown requested via API");
    let _ = state.shutdown_tx.send(());
    Json(ShutdownResponse {
        message: "shutting down".to_string(),
    })
}
