use axum::extract::{Json, State};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use crate::http_server::api::client::{ApiError, ApiRequest};
use crate::setup_flow::{SetupError, WizardView};
use crate::ServiceState;

/// Create a connector for the selected cloud
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::Args))]
pub struct CreateRequest {}

pub async fn handler(
    State(state): State<ServiceState>,
    Json(_req): Json<CreateRequest>,
) -> Result<impl IntoResponse, SetupError> {
    let view = state.setup().create().await?;
    Ok((http::StatusCode::CREATED, Json(view)))
}

impl ApiRequest for CreateRequest {
    type Response = WizardView;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = super::endpoint(base_url, "create")?;
        Ok(client.post(full_url).json(&self))
    }
}
