use axum::extract::{Json, State};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use crate::http_server::api::client::{ApiError, ApiRequest};
use crate::setup_flow::{SetupError, WizardView};
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::Args))]
pub struct DeleteRequest {
    /// Id of the connector to delete
    #[cfg_attr(feature = "clap", arg(long))]
    pub connector_id: String,
    /// Deletion is refused unless this is set
    #[cfg_attr(feature = "clap", arg(long))]
    #[serde(default)]
    pub confirm: bool,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Json(req): Json<DeleteRequest>,
) -> Result<impl IntoResponse, SetupError> {
    let view = state.setup().delete(&req.connector_id, req.confirm).await?;
    Ok(Json(view))
}

impl ApiRequest for DeleteRequest {
    type Response = WizardView;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = super::endpoint(base_url, "delete")?;
        Ok(client.post(full_url).json(&self))
    }
}
