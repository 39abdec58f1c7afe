use axum::response::{IntoResponse, Response};
use http::StatusCode;

use super::api::v0::error_response;

pub async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "not found".to_string()).into_response()
}
