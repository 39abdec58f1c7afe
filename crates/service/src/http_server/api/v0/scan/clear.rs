use axum::extract::{Json, State};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use crate::http_server::api::client::{ApiError, ApiRequest};
use crate::search::SearchError;
use crate::ServiceState;

use super::ScanSnapshot;

/// Drop the search term and results, keeping storage and mode
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::Args))]
pub struct ClearRequest {}

pub async fn handler(
    State(state): State<ServiceState>,
    Json(_req): Json<ClearRequest>,
) -> Result<impl IntoResponse, SearchError> {
    state.search().clear()?;
    Ok(Json(ScanSnapshot::capture(&state)))
}

impl ApiRequest for ClearRequest {
    type Response = ScanSnapshot;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = super::endpoint(base_url, "clear")?;
        Ok(client.post(full_url).json(&self))
    }
}
