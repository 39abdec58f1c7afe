use axum::Router;

pub mod client;
pub mod v0;

use crate::ServiceState;

pub fn router() -> Router<ServiceState> {
    Router::new().nest("/v0", v0::router())
}
