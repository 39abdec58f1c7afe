use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::connector::ConnectorType;

/// Credentials for an S3 connector
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct S3Credentials {
    /// Comma separated bucket names
    pub buckets: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
}

/// Credentials for an Azure Blob Storage connector
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AzureCredentials {
    pub account_name: String,
    pub account_key: String,
    pub blob_endpoint: String,
    /// Comma separated container names
    pub containers: String,
}

impl fmt::Debug for S3Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Credentials")
            .field("buckets", &self.buckets)
            .field("aws_access_key_id", &self.aws_access_key_id)
            .field("aws_secret_access_key", &"<redacted>")
            .finish()
    }
}

impl fmt::Debug for AzureCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureCredentials")
            .field("account_name", &self.account_name)
            .field("account_key", &"<redacted>")
            .field("blob_endpoint", &self.blob_endpoint)
            .field("containers", &self.containers)
            .finish()
    }
}

/// Cloud specific credential form submitted during the configure step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "connectorType", rename_all = "snake_case")]
pub enum CredentialForm {
    S3(S3Credentials),
    AzureBlobStorage(AzureCredentials),
}

/// Body of a connector-configuration call.
///
/// Every credential value is percent-encoded before it leaves the console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigurationBody {
    #[serde(rename = "connectorType")]
    pub connector_type: ConnectorType,
    pub use_text_extraction_service: bool,
    #[serde(flatten)]
    pub fields: BTreeMap<&'static str, String>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("credentials are for {form} but the connector is {connector}")]
    TypeMismatch {
        form: ConnectorType,
        connector: ConnectorType,
    },
}

impl CredentialForm {
    pub fn connector_type(&self) -> ConnectorType {
        match self {
            CredentialForm::S3(_) => ConnectorType::S3,
            CredentialForm::AzureBlobStorage(_) => ConnectorType::AzureBlobStorage,
        }
    }

    fn raw_fields(&self) -> Vec<(&'static str, &str)> {
        match self {
            CredentialForm::S3(c) => vec![
                ("buckets", c.buckets.as_str()),
                ("aws_access_key_id", c.aws_access_key_id.as_str()),
                ("aws_secret_access_key", c.aws_secret_access_key.as_str()),
            ],
            CredentialForm::AzureBlobStorage(c) => vec![
                ("account_name", c.account_name.as_str()),
                ("account_key", c.account_key.as_str()),
                ("blob_endpoint", c.blob_endpoint.as_str()),
                ("containers", c.containers.as_str()),
            ],
        }
    }

    /// Check the form can be submitted for a connector of `target` type.
    ///
    /// Runs before any network call; blank fields are rejected.
    pub fn validate_for(&self, target: ConnectorType) -> Result<(), CredentialError> {
        if self.connector_type() != target {
            return Err(CredentialError::TypeMismatch {
                form: self.connector_type(),
                connector: target,
            });
        }
        for (name, value) in self.raw_fields() {
            if value.trim().is_empty() {
                return Err(CredentialError::MissingField(name));
            }
        }
        Ok(())
    }

    /// Build the wire body with every field percent-encoded
    pub fn encode(&self) -> ConfigurationBody {
        let fields = self
            .raw_fields()
            .into_iter()
            .map(|(name, value)| (name, urlencoding::encode(value).into_owned()))
            .collect();

        ConfigurationBody {
            connector_type: self.connector_type(),
            use_text_extraction_service: true,
            fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s3_form(secret: &str) -> CredentialForm {
        CredentialForm::S3(S3Credentials {
            buckets: "finance-reports, hr docs".to_string(),
            aws_access_key_id: "AKIA&ID=1".to_string(),
            aws_secret_access_key: secret.to_string(),
        })
    }

    #[test]
    fn test_s3_fields_are_encoded_and_recoverable() {
        let form = s3_form("s3cr3t ключ=&+/ü");
        let body = form.encode();

        assert_eq!(body.connector_type, ConnectorType::S3);
        assert!(body.use_text_extraction_service);
        assert_eq!(body.fields.len(), 3);

        let CredentialForm::S3(original) = &form else {
            panic!("expected s3 form");
        };
        let expected = [
            ("buckets", &original.buckets),
            ("aws_access_key_id", &original.aws_access_key_id),
            ("aws_secret_access_key", &original.aws_secret_access_key),
        ];
        for (name, value) in expected {
            let encoded = &body.fields[name];
            assert!(!encoded.contains(' '));
            assert!(!encoded.contains('&'));
            assert!(!encoded.contains('='));
            assert_eq!(&urlencoding::decode(encoded).unwrap().into_owned(), value);
        }
    }

    #[test]
    fn test_body_wire_shape() {
        let form = CredentialForm::AzureBlobStorage(AzureCredentials {
            account_name: "acct".to_string(),
            account_key: "key==".to_string(),
            blob_endpoint: "https://acct.blob.core.windows.net/".to_string(),
            containers: "logs".to_string(),
        });
        let json = serde_json::to_value(form.encode()).unwrap();
        assert_eq!(json["connectorType"], "azure_blob_storage");
        assert_eq!(json["use_text_extraction_service"], true);
        assert_eq!(json["account_key"], "key%3D%3D");
        assert_eq!(
            json["blob_endpoint"],
            "https%3A%2F%2Facct.blob.core.windows.net%2F"
        );
    }

    #[test]
    fn test_blank_field_is_rejected() {
        let form = s3_form("   ");
        assert_eq!(
            form.validate_for(ConnectorType::S3),
            Err(CredentialError::MissingField("aws_secret_access_key"))
        );
    }

    #[test]
    fn test_form_must_match_connector_type() {
        let form = s3_form("secret");
        assert_eq!(
            form.validate_for(ConnectorType::AzureBlobStorage),
            Err(CredentialError::TypeMismatch {
                form: ConnectorType::S3,
                connector: ConnectorType::AzureBlobStorage,
            })
        );
        assert!(form.validate_for(ConnectorType::S3).is_ok());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let rendered = format!("{:?}", s3_form("do-not-print"));
        assert!(!rendered.contains("do-not-print"));
        assert!(rendered.contains("<redacted>"));
    }
}
