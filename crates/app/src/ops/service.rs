use clap::Args;

use service::spawn_service;

use crate::state::AppState;

/// Run the console API in the foreground
#[derive(Args, Debug, Clone)]
pub struct Service;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("state error: {0}")]
    StateError(#[from] crate::state::StateError),
}

#[async_trait::async_trait]
impl crate::op::Op for Service {
    type Error = ServiceError;
    type Output = String;

    async fn execute(&self, _ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        // Load state from ~/.dspm
        let state = AppState::load()?;
        let config = state.config.service_config(&state.state_path)?;

        spawn_service(&config).await;
        Ok("service ended".to_string())
    }
}
