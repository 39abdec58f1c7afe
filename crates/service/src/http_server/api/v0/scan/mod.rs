use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use http::StatusCode;
use serde::{Deserialize, Serialize};

use common::prelude::ScanRun;

use crate::scan_monitor::MonitorError;
use crate::search::{SearchError, SearchView};
use crate::ServiceState;

use super::error_response;

pub mod clear;
pub mod resume;
pub mod search;
pub mod session;
pub mod status;
pub mod stop;

pub use clear::ClearRequest;
pub use resume::ResumeRequest;
pub use search::SearchRequest;
pub use session::SessionRequest;
pub use status::StatusRequest;
pub use stop::StopRequest;

const SCAN_PATH: &str = "/api/v0/scan";

/// What every scan endpoint answers with: the search view next to
///  the run the monitor is tracking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSnapshot {
    pub search: SearchView,
    pub run: ScanRun,
}

impl ScanSnapshot {
    fn capture(state: &ServiceState) -> Self {
        Self {
            search: state.search().view(),
            run: state.monitor().snapshot(),
        }
    }
}

pub fn router() -> Router<ServiceState> {
    Router::new()
        .route("/", get(status::handler))
        .route("/search", post(search::handler))
        .route("/session", post(session::handler))
        .route("/clear", post(clear::handler))
        .route("/stop", post(stop::handler))
        .route("/resume", post(resume::handler))
}

fn endpoint(base_url: &url::Url, action: &str) -> Result<url::Url, url::ParseError> {
    if action.is_empty() {
        base_url.join(SCAN_PATH)
    } else {
        base_url.join(&format!("{}/{}", SCAN_PATH, action))
    }
}

impl IntoResponse for SearchError {
    fn into_response(self) -> Response {
        let status = match &self {
            SearchError::EmptyTerm
            | SearchError::NoConnector(_)
            | SearchError::Monitor(MonitorError::EmptyRunId) => StatusCode::BAD_REQUEST,
            SearchError::Busy => StatusCode::CONFLICT,
            SearchError::MissingRunId | SearchError::Backend(_) => StatusCode::BAD_GATEWAY,
            SearchError::Monitor(MonitorError::Store(_)) | SearchError::Store(_) => {
                tracing::error!("scan state could not be persisted: {}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        error_response(status, self.to_string())
    }
}
