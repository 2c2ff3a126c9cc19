//! HTTP handlers. One route per master operation, JSON in and out.
//!
//! Failures are rendered as the `{code, message}` pair of the underlying
//! `Status`, with an HTTP status chosen from the code.

pub mod clients;
pub mod nodes;
pub mod services;
pub mod status;
pub mod topics;

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use rendezvous_core::{Code, Status};
use rendezvous_master::Master;

#[derive(Clone)]
pub struct ApiState {
    pub master: Master,
    /// Fires the daemon shutdown broadcast.
    pub shutdown_tx: tokio::sync::broadcast::Sender<()>,
}

#[derive(Debug)]
pub struct ApiError(pub Status);

impl From<Status> for ApiError {
    fn from(status: Status) -> Self {
        ApiError(status)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(Status::invalid_argument(rejection.body_text()))
    }
}

/// `Json` request body whose rejections render as an [`ApiError`].
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ApiJson(value))
    }
}

impl ApiError {
    pub fn http_status(&self) -> StatusCode {
        match self.0.code() {
            Code::InvalidArgument => StatusCode::BAD_REQUEST,
            Code::NotFound => StatusCode::NOT_FOUND,
            Code::AlreadyExists | Code::Aborted => StatusCode::CONFLICT,
            Code::NetworkError => StatusCode::BAD_GATEWAY,
            Code::DataLoss => StatusCode::UNPROCESSABLE_ENTITY,
            Code::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            Code::Unimplemented => StatusCode::NOT_IMPLEMENTED,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.http_status(), Json(self.0)).into_response()
    }
}

pub type ApiResult<T> = Result<Json<T>, ApiError>;

/// Body of operations that return nothing.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Empty {}

pub use clients::{handle_list_clients, handle_register_client, handle_unregister_client};
pub use nodes::{handle_get_nodes, handle_register_node, handle_unregister_node};
pub use services::{
    handle_list_services, handle_register_service_client, handle_register_service_server,
    handle_unregister_service_client, handle_unregister_service_server,
};
pub use status::{handle_gc, handle_shutdown, handle_status};
pub use topics::{
    handle_list_topics, handle_publish_topic, handle_subscribe_topic, handle_unpublish_topic,
    handle_unsubscribe_topic,
};

#[cfg(test)]
pub(crate) fn test_state() -> ApiState {
    let (master, _tasks) = Master::new();
    let (shutdown_tx, _) = tokio::sync::broadcast::channel(1);
    ApiState {
        master,
        shutdown_tx,
    }
}
