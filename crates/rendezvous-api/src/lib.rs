pub mod handlers;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

pub use handlers::{ApiError, ApiState};

/// Every control operation, mounted under `/api`.
pub fn router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/status", get(handlers::handle_status))
        .route("/gc", post(handlers::handle_gc))
        .route("/daemon/shutdown", post(handlers::handle_shutdown))
        .route("/clients/register", post(handlers::handle_register_client))
        .route("/clients/unregister", post(handlers::handle_unregister_client))
        .route("/clients/list", post(handlers::handle_list_clients))
        .route("/nodes/register", post(handlers::handle_register_node))
        .route("/nodes/unregister", post(handlers::handle_unregister_node))
        .route("/nodes/list", post(handlers::handle_get_nodes))
        .route("/topics/publish", post(handlers::handle_publish_topic))
        .route("/topics/unpublish", post(handlers::handle_unpublish_topic))
        .route("/topics/subscribe", post(handlers::handle_subscribe_topic))
        .route("/topics/unsubscribe", post(handlers::handle_unsubscribe_topic))
        .route("/topics/list", post(handlers::handle_list_topics))
        .route(
            "/services/server/register",
            post(handlers::handle_register_service_server),
        )
        .route(
            "/services/server/unregister",
            post(handlers::handle_unregister_service_server),
        )
        .route(
            "/services/client/register",
            post(handlers::handle_register_service_client),
        )
        .route(
            "/services/client/unregister",
            post(handlers::handle_unregister_service_client),
        )
        .route("/services/list", post(handlers::handle_list_services))
        .with_state(state);

    Router::new().nest("/api", api_routes).layer(cors)
}

pub async fn serve(state: ApiState, bind_ip: &str, port: u16) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind((bind_ip, port)).await?;
    tracing::info!(bind_ip, port, "API listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
