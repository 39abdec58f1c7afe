use clap::{Args, Subcommand};

use common::prelude::{AzureCredentials, CredentialForm, S3Credentials};
use service::http_server::api::v0::setup::ConfigureRequest;

use super::{render, SetupOpError};

/// Submit credentials for the connector being configured
#[derive(Args, Debug, Clone)]
pub struct Configure {
    #[command(subcommand)]
    pub credentials: Credentials,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Credentials {
    /// Access keys for an S3 connector
    S3 {
        /// Comma separated bucket names
        #[arg(long)]
        buckets: String,
        #[arg(long)]
        aws_access_key_id: String,
        #[arg(long)]
        aws_secret_access_key: String,
    },
    /// Account key for an Azure Blob Storage connector
    Azure {
        #[arg(long)]
        account_name: String,
        #[arg(long)]
        account_key: String,
        #[arg(long)]
        blob_endpoint: String,
        /// Comma separated container names
        #[arg(long)]
        containers: String,
    },
}

impl From<&Credentials> for CredentialForm {
    fn from(credentials: &Credentials) -> Self {
        match credentials.clone() {
            Credentials::S3 {
                buckets,
                aws_access_key_id,
                aws_secret_access_key,
            } => CredentialForm::S3(S3Credentials {
                buckets,
                aws_access_key_id,
                aws_secret_access_key,
            }),
            Credentials::Azure {
                account_name,
                account_key,
                blob_endpoint,
                containers,
            } => CredentialForm::AzureBlobStorage(AzureCredentials {
                account_name,
                account_key,
                blob_endpoint,
                containers,
            }),
        }
    }
}

#[async_trait::async_trait]
impl crate::op::Op for Configure {
    type Error = SetupOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let request = ConfigureRequest {
            form: CredentialForm::from(&self.credentials),
        };
        let view = ctx.call(request).await?;
        Ok(render::wizard(&view))
    }
}
