use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use http::StatusCode;

use crate::setup_flow::SetupError;
use crate::ServiceState;

use super::error_response;

pub mod configure;
pub mod create;
pub mod delete;
pub mod deploy;
pub mod edit;
pub mod expand;
pub mod kind;
pub mod status;
pub mod sync;

pub use configure::ConfigureRequest;
pub use create::CreateRequest;
pub use delete::DeleteRequest;
pub use deploy::DeployRequest;
pub use edit::EditRequest;
pub use expand::ExpandRequest;
pub use kind::KindRequest;
pub use status::StatusRequest;
pub use sync::SyncRequest;

pub use crate::setup_flow::WizardView;

const SETUP_PATH: &str = "/api/v0/setup";

pub fn router() -> Router<ServiceState> {
    Router::new()
        .route("/", get(status::handler))
        .route("/kind", post(kind::handler))
        .route("/create", post(create::handler))
        .route("/deploy", post(deploy::handler))
        .route("/configure", post(configure::handler))
        .route("/sync", post(sync::handler))
        .route("/expand", post(expand::handler))
        .route("/edit", post(edit::handler))
        .route("/delete", post(delete::handler))
}

fn endpoint(base_url: &url::Url, action: &str) -> Result<url::Url, url::ParseError> {
    if action.is_empty() {
        base_url.join(SETUP_PATH)
    } else {
        base_url.join(&format!("{}/{}", SETUP_PATH, action))
    }
}

impl IntoResponse for SetupError {
    fn into_response(self) -> Response {
        let status = match &self {
            SetupError::Credentials(_)
            | SetupError::ConfirmationRequired(_)
            | SetupError::UnknownConnector(_) => StatusCode::BAD_REQUEST,
            SetupError::InvalidTransition { .. } | SetupError::KindLocked(_) | SetupError::Busy => {
                StatusCode::CONFLICT
            }
            SetupError::Rejected(_) | SetupError::Backend(_) => StatusCode::BAD_GATEWAY,
        };
        error_response(status, self.to_string())
    }
}
