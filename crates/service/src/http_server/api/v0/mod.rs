use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use http::header::{ACCEPT, CONTENT_TYPE, ORIGIN};
use http::{Method, StatusCode};
use tower_http::cors::{Any, CorsLayer};

pub mod scan;
pub mod setup;

use crate::ServiceState;

pub fn router() -> Router<ServiceState> {
    let cors_layer = CorsLayer::new()
        .allow_methods(vec![Method::GET, Method::POST])
        .allow_headers(vec![ACCEPT, ORIGIN, CONTENT_TYPE])
        .allow_origin(Any)
        .allow_credentials(false);

    Router::new()
        .nest("/setup", setup::router())
        .nest("/scan", scan::router())
        .layer(cors_layer)
}

/// Error bodies share the backend's `{"message": ...}` shape
pub(crate) fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(serde_json::json!({ "message": message }))).into_response()
}
