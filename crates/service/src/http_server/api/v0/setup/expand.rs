use axum::extract::{Json, State};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use crate::http_server::api::client::{ApiError, ApiRequest};
use crate::setup_flow::{SetupError, WizardView};
use crate::ServiceState;

/// Start setting up a connector for the cloud that has none yet
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::Args))]
pub struct ExpandRequest {}

pub async fn handler(
    State(state): State<ServiceState>,
    Json(_req): Json<ExpandRequest>,
) -> Result<impl IntoResponse, SetupError> {
    let view = state.setup().add_missing_kind()?;
    Ok(Json(view))
}

impl ApiRequest for ExpandRequest {
    type Response = WizardView;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = super::endpoint(base_url, "expand")?;
        Ok(client.post(full_url).json(&self))
    }
}
