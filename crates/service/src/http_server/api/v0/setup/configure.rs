use axum::extract::{Json, State};
use axum::response::IntoResponse;
use reqwest::{Client, RequestBuilder, Url};
use serde::{Deserialize, Serialize};

use common::prelude::CredentialForm;

use crate::http_server::api::client::{ApiError, ApiRequest};
use crate::setup_flow::{SetupError, WizardView};
use crate::ServiceState;

// The form is tagged by connector type, so the CLI assembles it
//  from its own per-cloud arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigureRequest {
    #[serde(flatten)]
    pub form: CredentialForm,
}

pub async fn handler(
    State(state): State<ServiceState>,
    Json(req): Json<ConfigureRequest>,
) -> Result<impl IntoResponse, SetupError> {
    let view = state.setup().configure(req.form).await?;
    Ok(Json(view))
}

impl ApiRequest for ConfigureRequest {
    type Response = WizardView;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let full_url = super::endpoint(base_url, "configure")?;
        Ok(client.post(full_url).json(&self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::prelude::S3Credentials;

    #[test]
    fn test_body_is_tagged_by_connector_type() {
        let req = ConfigureRequest {
            form: CredentialForm::S3(S3Credentials {
                buckets: "a,b".into(),
                aws_access_key_id: "AKIA".into(),
                aws_secret_access_key: "secret".into(),
            }),
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["connectorType"], "s3");
        assert_eq!(value["buckets"], "a,b");

        let back: ConfigureRequest = serde_json::from_value(value).unwrap();
        assert_eq!(back.form, req.form);
    }
}
