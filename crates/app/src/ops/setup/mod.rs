use clap::{Args, Subcommand};

pub mod configure;
mod render;

use service::http_server::api::client::ApiError;
use service::http_server::api::v0::setup::{
    CreateRequest, DeleteRequest, DeployRequest, EditRequest, ExpandRequest, KindRequest,
    StatusRequest, SyncRequest,
};

use crate::op::{Op, OpContext};

pub use configure::Configure;

crate::command_enum! {
    (Status, StatusRequest),
    (Kind, KindRequest),
    (Create, CreateRequest),
    (Deploy, DeployRequest),
    (Configure, Configure),
    (Sync, SyncRequest),
    (Expand, ExpandRequest),
    (Edit, EditRequest),
    (Delete, DeleteRequest),
}

pub type SetupCommand = Command;

/// Walk through connector onboarding
#[derive(Args, Debug, Clone)]
pub struct Setup {
    #[command(subcommand)]
    pub command: SetupCommand,
}

#[async_trait::async_trait]
impl Op for Setup {
    type Error = OpError;
    type Output = String;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
        self.command.execute(ctx).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SetupOpError {
    #[error("{}", .0.message())]
    Api(#[from] ApiError),
}

// every wizard request answers with the resulting view
macro_rules! wizard_op {
    ($($request:ty),* $(,)?) => {
        $(
            #[async_trait::async_trait]
            impl Op for $request {
                type Error = SetupOpError;
                type Output = String;

                async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error> {
                    let view = ctx.call(self.clone()).await?;
                    Ok(render::wizard(&view))
                }
            }
        )*
    };
}

wizard_op!(
    StatusRequest,
    KindRequest,
    CreateRequest,
    DeployRequest,
    SyncRequest,
    ExpandRequest,
    EditRequest,
    DeleteRequest,
);
