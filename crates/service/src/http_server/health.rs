use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::prelude::BuildInfo;

use super::api::client::{ApiError, ApiRequest};
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// Whether a scan run is being polled right now
    pub polling: bool,
}

pub fn router() -> Router<ServiceState> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/version", get(version))
}

async fn healthz(State(state): State<ServiceState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        polling: state.monitor().is_polling(),
    })
}

async fn version() -> Json<BuildInfo> {
    Json(BuildInfo::new())
}

/// Ask a running console for its build
#[derive(Debug, Clone, Copy)]
pub struct VersionRequest;

impl ApiRequest for VersionRequest {
    type Response = BuildInfo;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = base_url.join(&format!("{}/version", super::HEALTH_PREFIX))?;
        Ok(client.get(full_url))
    }
}
