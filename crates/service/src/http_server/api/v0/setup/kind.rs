use axum::extract::{Json, State};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::prelude::CloudKind;

use crate::http_server::api::client::{ApiError, ApiRequest};
use crate::setup_flow::{SetupError, WizardView};
use crate::ServiceState;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::Args))]
pub struct KindRequest {
    /// Cloud to set up a connector for (azure or aws)
    #[cfg_attr(feature = "clap", arg(long))]
    pub kind: CloudKind,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Json(req): Json<KindRequest>,
) -> Result<impl IntoResponse, SetupError> {
    let view = state.setup().select_kind(req.kind)?;
    Ok(Json(view))
}

impl ApiRequest for KindRequest {
    type Response = WizardView;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = super::endpoint(base_url, "kind")?;
        Ok(client.post(full_url).json(&self))
    }
}
