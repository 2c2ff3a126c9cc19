//! /services handlers.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use rendezvous_core::{NodeInfo, ServiceFilter, ServiceSource};

use super::{ApiJson, ApiResult, ApiState, Empty};

#[derive(Deserialize)]
pub struct RegisterServiceServerRequest {
    pub node: NodeInfo,
    pub source: ServiceSource,
}

#[derive(Deserialize)]
pub struct ServiceRequest {
    pub node: NodeInfo,
    pub service: String,
}

#[derive(Serialize)]
pub struct ServicesResponse {
    pub services: Vec<ServiceSource>,
}

pub async fn handle_register_service_server(
    State(state): State<ApiState>,
    ApiJson(req): ApiJson<RegisterServiceServerRequest>,
) -> ApiResult<Empty> {
    state
        .master
        .register_service_server(&req.node, req.source)
        .await?;
    Ok(Json(Empty {}))
}

pub async fn handle_unregister_service_server(
    State(state): State<ApiState>,
    ApiJson(req): ApiJson<ServiceRequest>,
) -> ApiResult<Empty> {
    state
        .master
        .unregister_service_server(&req.node, &req.service)
        .await?;
    Ok(Json(Empty {}))
}

pub async fn handle_register_service_client(
    State(state): State<ApiState>,
    ApiJson(req): ApiJson<ServiceRequest>,
) -> ApiResult<Empty> {
    state
        .master
        .register_service_client(&req.node, &req.service)
        .await?;
    Ok(Json(Empty {}))
}

pub async fn handle_unregister_service_client(
    State(state): State<ApiState>,
    ApiJson(req): ApiJson<ServiceRequest>,
) -> ApiResult<Empty> {
    state
        .master
        .unregister_service_client(&req.node, &req.service)
        .await?;
    Ok(Json(Empty {}))
}

pub async fn handle_list_services(
    State(state): State<ApiState>,
    ApiJson(filter): ApiJson<ServiceFilter>,
) -> Json<ServicesResponse> {
    Json(ServicesResponse {
        services: state.master.list_services(&filter).await,
    })
}
