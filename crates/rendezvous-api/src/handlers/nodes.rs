//! /nodes handlers.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use rendezvous_core::{NodeFilter, NodeInfo};

use super::{ApiJson, ApiResult, ApiState, Empty};

pub async fn handle_register_node(
    State(state): State<ApiState>,
    ApiJson(info): ApiJson<NodeInfo>,
) -> ApiResult<NodeInfo> {
    Ok(Json(state.master.register_node(info).await?))
}

pub async fn handle_unregister_node(
    State(state): State<ApiState>,
    ApiJson(info): ApiJson<NodeInfo>,
) -> ApiResult<Empty> {
    state.master.unregister_node(&info).await?;
    Ok(Json(Empty {}))
}

#[derive(Serialize)]
pub struct NodesResponse {
    pub nodes: Vec<NodeInfo>,
}

pub async fn handle_get_nodes(
    State(state): State<ApiState>,
    ApiJson(filter): ApiJson<NodeFilter>,
) -> Json<NodesResponse> {
    Json(NodesResponse {
        nodes: state.master.get_nodes(&filter).await,
    })
}
