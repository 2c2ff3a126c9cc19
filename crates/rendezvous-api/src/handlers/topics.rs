//! /topics handlers.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use rendezvous_core::{NodeInfo, TopicFilter, TopicSource};

use super::{ApiJson, ApiResult, ApiState, Empty};

#[derive(Deserialize)]
pub struct PublishTopicRequest {
    pub node: NodeInfo,
    pub source: TopicSource,
}

/// Body shared by unpublish, subscribe, and unsubscribe.
#[derive(Deserialize)]
pub struct TopicRequest {
    pub node: NodeInfo,
    pub topic: String,
}

#[derive(Serialize)]
pub struct TopicsResponse {
    pub topics: Vec<TopicSource>,
}

pub async fn handle_publish_topic(
    State(state): State<ApiState>,
    ApiJson(req): ApiJson<PublishTopicRequest>,
) -> ApiResult<Empty> {
    state.master.publish_topic(&req.node, req.source).await?;
    Ok(Json(Empty {}))
}

pub async fn handle_unpublish_topic(
    State(state): State<ApiState>,
    ApiJson(req): ApiJson<TopicRequest>,
) -> ApiResult<Empty> {
    state.master.unpublish_topic(&req.node, &req.topic).await?;
    Ok(Json(Empty {}))
}

pub async fn handle_subscribe_topic(
    State(state): State<ApiState>,
    ApiJson(req): ApiJson<TopicRequest>,
) -> ApiResult<Empty> {
    state.master.subscribe_topic(&req.node, &req.topic).await?;
    Ok(Json(Empty {}))
}

pub async fn handle_unsubscribe_topic(
    State(state): State<ApiState>,
    ApiJson(req): ApiJson<TopicRequest>,
) -> ApiResult<Empty> {
    state.master.unsubscribe_topic(&req.node, &req.topic).await?;
    Ok(Json(Empty {}))
}

pub async fn handle_list_topics(
    State(state): State<ApiState>,
    ApiJson(filter): ApiJson<TopicFilter>,
) -> Json<TopicsResponse> {
    Json(TopicsResponse {
        topics: state.master.list_topics(&filter).await,
    })
}
