//! /clients handlers.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use rendezvous_core::{ClientFilter, ClientInfo};

use super::{ApiJson, ApiResult, ApiState, Empty};

pub async fn handle_register_client(
    State(state): State<ApiState>,
    ApiJson(info): ApiJson<ClientInfo>,
) -> ApiResult<ClientInfo> {
    Ok(Json(state.master.register_client(info).await?))
}

#[derive(Deserialize)]
pub struct UnregisterClientRequest {
    pub client_id: u32,
}

pub async fn handle_unregister_client(
    State(state): State<ApiState>,
    ApiJson(req): ApiJson<UnregisterClientRequest>,
) -> ApiResult<Empty> {
    state.master.unregister_client(req.client_id).await?;
    Ok(Json(Empty {}))
}

#[derive(Serialize)]
pub struct ClientsResponse {
    pub clients: Vec<ClientInfo>,
}

pub async fn handle_list_clients(
    State(state): State<ApiState>,
    ApiJson(filter): ApiJson<ClientFilter>,
) -> Json<ClientsResponse> {
    Json(ClientsResponse {
        clients: state.master.list_clients(&filter).await,
    })
}
