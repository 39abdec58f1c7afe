use std::error::Error;
use std::fmt;

use url::Url;

use service::http_server::api::client::{ApiClient, ApiError, ApiRequest};

/// What a command gets to work with: a handle on the running console.
///
/// Commands never talk to the dashboard backend themselves; setup and
///  scan state live in the console process and are reached over its API.
#[derive(Debug, Clone)]
pub struct OpContext {
    client: ApiClient,
}

impl OpContext {
    pub fn new(console: Url) -> Result<Self, ApiError> {
        Ok(Self {
            client: ApiClient::new(&console)?,
        })
    }

    /// Where the console API is expected to listen
    pub fn console(&self) -> &Url {
        &self.client.remote
    }

    pub async fn call<R: ApiRequest>(&self, request: R) -> Result<R::Response, ApiError> {
        self.client.call(request).await
    }
}

/// A subcommand. Output is printed as-is on success.
#[async_trait::async_trait]
pub trait Op: Send + Sync {
    type Error: Error + Send + Sync + 'static;
    type Output: fmt::Display + Send;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error>;
}

/// Builds a `Command` enum over a set of ops. Running it renders
///  whichever op ran, so nested command groups compose.
#[macro_export]
macro_rules! command_enum {
    ($(($variant:ident, $type:ty)),* $(,)?) => {
        #[derive(Subcommand, Debug, Clone)]
        pub enum Command {
            $($variant($type),)*
        }

        #[derive(Debug, thiserror::Error)]
        pub enum OpError {
            $(
                #[error(transparent)]
                $variant(<$type as $crate::op::Op>::Error),
            )*
        }

        #[async_trait::async_trait]
        impl $crate::op::Op for Command {
            type Output = String;
            type Error = OpError;

            async fn execute(&self, ctx: &$crate::op::OpContext) -> Result<Self::Output, Self::Error> {
                match self {
                    $(
                        Command::$variant(op) => op
                            .execute(ctx)
                            .await
                            .map(|output| output.to_string())
                            .map_err(OpError::$variant),
                    )*
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_console_is_an_api_error() {
        // nothing listens on the discard port
        let console = Url::parse("http://127.0.0.1:9").unwrap();
        let ctx = OpContext::new(console.clone()).unwrap();
        assert_eq!(ctx.console(), &console);

        let result = ctx.call(service::http_server::VersionRequest).await;
        assert!(matches!(result, Err(ApiError::Reqwest(_))));
    }
}
