use axum::extract::{Json, State};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use crate::http_server::api::client::{ApiError, ApiRequest};
use crate::ServiceState;

use super::ScanSnapshot;

/// Show the current search and the tracked scan run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::Args))]
pub struct StatusRequest {}

pub async fn handler(State(state): State<ServiceState>) -> impl IntoResponse {
    Json(ScanSnapshot::capture(&state))
}

impl ApiRequest for StatusRequest {
    type Response = ScanSnapshot;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = super::endpoint(base_url, "")?;
        Ok(client.get(full_url))
    }
}
