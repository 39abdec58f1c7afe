use axum::extract::{Json, State};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use crate::http_server::api::client::{ApiError, ApiRequest};
use crate::setup_flow::{SetupError, WizardView};
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::Args))]
pub struct EditRequest {
    /// Id of the connector whose credentials should be replaced
    #[cfg_attr(feature = "clap", arg(long))]
    pub connector_id: String,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Json(req): Json<EditRequest>,
) -> Result<impl IntoResponse, SetupError> {
    let view = state.setup().edit(&req.connector_id)?;
    Ok(Json(view))
}

impl ApiRequest for EditRequest {
    type Response = WizardView;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = super::endpoint(base_url, "edit")?;
        Ok(client.post(full_url).json(&self))
    }
}
