use axum::extract::{Json, State};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use crate::http_server::api::client::{ApiError, ApiRequest};
use crate::search::SearchError;
use crate::ServiceState;

use super::ScanSnapshot;

/// Pick the stored scan run back up and check on it right away
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::Args))]
pub struct ResumeRequest {}

pub async fn handler(
    State(state): State<ServiceState>,
    Json(_req): Json<ResumeRequest>,
) -> Result<impl IntoResponse, SearchError> {
    if state.monitor().resume().await?.is_none() {
        tracing::debug!("no stored scan run to resume");
    }
    Ok(Json(ScanSnapshot::capture(&state)))
}

impl ApiRequest for ResumeRequest {
    type Response = ScanSnapshot;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = super::endpoint(base_url, "resume")?;
        Ok(client.post(full_url).json(&self))
    }
}
