use axum::extract::{Json, State};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::prelude::ScanLevel;

use crate::http_server::api::client::{ApiError, ApiRequest};
use crate::search::SearchError;
use crate::ServiceState;

use super::ScanSnapshot;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::Args))]
pub struct SearchRequest {
    /// Keyword, pattern or scan term
    #[cfg_attr(feature = "clap", arg(long))]
    pub term: String,
    /// Scan depth (full or incremental), only used in scan mode
    #[cfg_attr(feature = "clap", arg(long))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scan_level: Option<ScanLevel>,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Json(req): Json<SearchRequest>,
) -> Result<impl IntoResponse, SearchError> {
    state.search().search(&req.term, req.scan_level).await?;
    Ok(Json(ScanSnapshot::capture(&state)))
}

impl ApiRequest for SearchRequest {
    type Response = ScanSnapshot;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = super::endpoint(base_url, "search")?;
        Ok(client.post(full_url).json(&self))
    }
}
