use axum::extract::{Json, Query, State};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use crate::http_server::api::client::{ApiError, ApiRequest};
use crate::setup_flow::{SetupError, WizardView};
use crate::ServiceState;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::Args))]
pub struct StatusRequest {
    /// Return the last known view without asking the backend
    #[cfg_attr(feature = "clap", arg(long))]
    #[serde(default)]
    pub cached: bool,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Query(req): Query<StatusRequest>,
) -> Result<impl IntoResponse, SetupError> {
    let view = if req.cached {
        state.setup().view()
    } else {
        state.setup().reconcile().await?
    };
    Ok(Json(view))
}

impl ApiRequest for StatusRequest {
    type Response = WizardView;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = super::endpoint(base_url, "")?;
        Ok(client.get(full_url).query(&self))
    }
}
