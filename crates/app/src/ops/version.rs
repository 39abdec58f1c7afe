use clap::Args;

use common::prelude::BuildInfo;
use service::http_server::api::client::ApiError;
use service::http_server::VersionRequest;

/// Print build information for this binary
#[derive(Args, Debug, Clone)]
pub struct Version {
    /// Print the build of the running console as well
    #[arg(long)]
    pub console: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum VersionError {
    #[error("could not reach the console: {0}")]
    Api(#[from] ApiError),
}

#[async_trait::async_trait]
impl crate::op::Op for Version {
    type Error = VersionError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let local = BuildInfo::new();
        if !self.console {
            return Ok(local.to_string());
        }

        let console = ctx.call(VersionRequest).await?;
        Ok(format!(
            "cli:     {}\nconsole: {} at {}",
            local,
            console,
            ctx.console()
        ))
    }
}
