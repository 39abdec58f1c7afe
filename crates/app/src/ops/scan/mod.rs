use clap::{Args, Subcommand};

mod render;

use service::http_server::api::client::ApiError;
use service::http_server::api::v0::scan::{
    ClearRequest, ResumeRequest, SearchRequest, SessionRequest, StatusRequest, StopRequest,
};

use crate::op::{Op, OpContext};

crate::command_enum! {
    (Status, StatusRequest),
    (Search, SearchRequest),
    (Session, SessionRequest),
    (Clear, ClearRequest),
    (Stop, StopRequest),
    (Resume, ResumeRequest),
}

pub type ScanCommand = Command;

/// Search connected storage and follow scan runs
#[derive(Args, Debug, Clone)]
pub struct Scan {
    #[command(subcommand)]
    pub command: ScanCommand,
}

#[async_trait::async_trait]
impl Op for Scan {
    type Error = OpError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScanOpError {
    #[error("{}", .0.message())]
    Api(#[from] ApiError),
}

macro_rules! snapshot_op {
    ($($request:ty),* $(,)?) => {
        $(
            #[async_trait::async_trait]
            impl Op for $request {
                type Error = ScanOpError;
                type Output = String;

                async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
                    let snapshot = ctx.call(self.clone()).await?;
                    Ok(render::snapshot(&snapshot))
                }
            }
        )*
    };
}

snapshot_op!(
    StatusRequest,
    SearchRequest,
    SessionRequest,
    ClearRequest,
    StopRequest,
    ResumeRequest,
);
