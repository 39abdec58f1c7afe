use clap::Args;

use crate::state::{AppConfig, AppState};

#[derive(Args, Debug, Clone)]
pub struct Init {
    /// Console API listen address
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub listen_addr: String,

    /// Dashboard backend holding connectors and scans
    #[arg(long, default_value = service::DEFAULT_BACKEND_URL)]
    pub backend_url: String,

    /// Session cookie forwarded to the backend
    #[arg(long)]
    pub session_id: Option<String>,

    /// Seconds between scan status checks
    #[arg(long, default_value_t = 300)]
    pub poll_interval: u64,

    /// Give up on backend calls after this many seconds
    #[arg(long)]
    pub request_timeout: Option<u64>,
}

#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("init failed: {0}")]
    StateFailed(#[from] crate::state::StateError),
}

#[async_trait::async_trait]
impl crate::op::Op for Init {
    type Error = InitError;
    type Output = String;

    async fn execute(&self, _ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let config = AppConfig {
            listen_addr: self.listen_addr.clone(),
            backend_url: self.backend_url.clone(),
            session_id: self.session_id.clone(),
            poll_interval_secs: self.poll_interval,
            request_timeout_secs: self.request_timeout,
            ..Default::default()
        };

        let state = AppState::init(config)?;

        let output = format!(
            "Initialized dspm directory at: {}\n\
             - State: {}\n\
             - Config: {}\n\
             - Console listen address: {}\n\
             - Backend: {}",
            state.dspm_dir.display(),
            state.state_path.display(),
            state.config_path.display(),
            state.config.listen_addr,
            state.config.backend_url
        );

        Ok(output)
    }
}
