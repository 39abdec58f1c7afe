use axum::extract::{Json, State};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::prelude::{SearchMode, SearchType};

use crate::http_server::api::client::{ApiError, ApiRequest};
use crate::search::SearchError;
use crate::ServiceState;

use super::ScanSnapshot;

/// Switch the searched storage and/or the search mode.
///
/// Changing either abandons the current search and scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::Args))]
pub struct SessionRequest {
    /// Storage to search (azure or aws)
    #[cfg_attr(feature = "clap", arg(long = "type"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_type: Option<SearchType>,
    /// keyword, pattern or scan
    #[cfg_attr(feature = "clap", arg(long = "mode"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_mode: Option<SearchMode>,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Json(req): Json<SessionRequest>,
) -> Result<impl IntoResponse, SearchError> {
    state
        .search()
        .set_session(req.search_type, req.search_mode)?;
    Ok(Json(ScanSnapshot::capture(&state)))
}

impl ApiRequest for SessionRequest {
    type Response = ScanSnapshot;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = super::endpoint(base_url, "session")?;
        Ok(client.post(full_url).json(&self))
    }
}
