pub use clap::Parser;
use url::Url;

use crate::state::{AppState, StateError};

#[derive(Parser, Debug)]
#[command(name = "dspm")]
#[command(about = "Onboard storage connectors and follow sensitive data scans")]
pub struct Args {
    /// Console API to talk to. Defaults to the address in ~/.dspm/config.toml
    #[arg(long, global = true)]
    pub remote: Option<Url>,

    #[command(subcommand)]
    pub command: crate::Command,
}

impl Args {
    /// Resolve which console the command should talk to
    pub fn remote(&self) -> Result<Url, StateError> {
        if let Some(remote) = &self.remote {
            return Ok(remote.clone());
        }
        match AppState::load() {
            Ok(state) => state.config.console_url(),
            Err(StateError::NotInitialized) => AppState::default_console_url(),
            Err(e) => Err(e),
        }
    }
}
