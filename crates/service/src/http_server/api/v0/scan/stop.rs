use axum::extract::{Json, State};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use crate::http_server::api::client::{ApiError, ApiRequest};
use crate::search::SearchError;
use crate::ServiceState;

use super::ScanSnapshot;

/// Stop following the current scan run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::Args))]
pub struct StopRequest {}

pub async fn handler(
    State(state): State<ServiceState>,
    Json(_req): Json<StopRequest>,
) -> Result<impl IntoResponse, SearchError> {
    state.monitor().stop()?;
    Ok(Json(ScanSnapshot::capture(&state)))
}

impl ApiRequest for StopRequest {
    type Response = ScanSnapshot;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = super::endpoint(base_url, "stop")?;
        Ok(client.post(full_url).json(&self))
    }
}
