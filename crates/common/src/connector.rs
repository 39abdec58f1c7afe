use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Number of connectors at which the console is considered fully configured
///  (one per supported cloud type)
pub const MAX_CONNECTORS: usize = 2;

/// Storage service a connector indexes, as reported by the directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorType {
    S3,
    AzureBlobStorage,
}

impl ConnectorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectorType::S3 => "s3",
            ConnectorType::AzureBlobStorage => "azure_blob_storage",
        }
    }

    /// The cloud a connector of this type lives in
    pub fn kind(&self) -> CloudKind {
        match self {
            ConnectorType::S3 => CloudKind::Aws,
            ConnectorType::AzureBlobStorage => CloudKind::Azure,
        }
    }
}

impl fmt::Display for ConnectorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cloud selection offered when creating a connector.
///
/// Serialized as the display name the create endpoint expects
///  (`"Azure"` / `"AWS"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CloudKind {
    #[default]
    #[serde(rename = "Azure")]
    Azure,
    #[serde(rename = "AWS")]
    Aws,
}

impl CloudKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloudKind::Azure => "Azure",
            CloudKind::Aws => "AWS",
        }
    }

    /// The other supported cloud.
    ///
    /// Only two clouds exist; adding a third makes this ambiguous
    ///  and callers expanding a setup must be revisited.
    pub fn complement(&self) -> CloudKind {
        match self {
            CloudKind::Azure => CloudKind::Aws,
            CloudKind::Aws => CloudKind::Azure,
        }
    }

    pub fn connector_type(&self) -> ConnectorType {
        match self {
            CloudKind::Azure => ConnectorType::AzureBlobStorage,
            CloudKind::Aws => ConnectorType::S3,
        }
    }
}

impl fmt::Display for CloudKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CloudKind {
    type Err = UnknownCloudKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "azure" => Ok(CloudKind::Azure),
            "aws" | "s3" => Ok(CloudKind::Aws),
            _ => Err(UnknownCloudKind(s.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown cloud kind: {0} (expected Azure or AWS)")]
pub struct UnknownCloudKind(pub String);

/// Lifecycle status of a connector as reported by the directory.
///
/// Values this build does not know about are kept verbatim in `Unknown`
///  and count as "not connected".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConnectorStatus {
    Created,
    NeedsConfiguration,
    Configured,
    Error,
    Connected,
    Unknown(String),
}

impl ConnectorStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ConnectorStatus::Created => "created",
            ConnectorStatus::NeedsConfiguration => "needs_configuration",
            ConnectorStatus::Configured => "configured",
            ConnectorStatus::Error => "error",
            ConnectorStatus::Connected => "connected",
            ConnectorStatus::Unknown(raw) => raw,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectorStatus::Connected)
    }
}

impl From<String> for ConnectorStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "created" => ConnectorStatus::Created,
            "needs_configuration" => ConnectorStatus::NeedsConfiguration,
            "configured" => ConnectorStatus::Configured,
            "error" => ConnectorStatus::Error,
            "connected" => ConnectorStatus::Connected,
            _ => ConnectorStatus::Unknown(value),
        }
    }
}

impl From<ConnectorStatus> for String {
    fn from(value: ConnectorStatus) -> Self {
        match value {
            ConnectorStatus::Unknown(raw) => raw,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for ConnectorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A link to one cloud storage account, owned by the connector directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connector {
    pub id: String,
    #[serde(rename = "type")]
    pub connector_type: ConnectorType,
    /// Display name, also the search index name
    pub name: String,
    pub status: ConnectorStatus,
}

impl Connector {
    pub fn kind(&self) -> CloudKind {
        self.connector_type.kind()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connector_wire_format() {
        let json = r#"{"id":"c1","type":"s3","name":"AWS","status":"needs_configuration"}"#;
        let connector: Connector = serde_json::from_str(json).unwrap();
        assert_eq!(connector.id, "c1");
        assert_eq!(connector.connector_type, ConnectorType::S3);
        assert_eq!(connector.status, ConnectorStatus::NeedsConfiguration);
        assert_eq!(connector.kind(), CloudKind::Aws);

        let back = serde_json::to_string(&connector).unwrap();
        assert_eq!(back, json);
    }

    #[test]
    fn test_unknown_status_is_preserved() {
        let json = r#"{"id":"c2","type":"azure_blob_storage","name":"Azure","status":"suspended"}"#;
        let connector: Connector = serde_json::from_str(json).unwrap();
        assert_eq!(
            connector.status,
            ConnectorStatus::Unknown("suspended".to_string())
        );
        assert!(!connector.status.is_connected());
        assert_eq!(connector.status.to_string(), "suspended");
    }

    #[test]
    fn test_cloud_kind_complement_and_parse() {
        assert_eq!(CloudKind::Aws.complement(), CloudKind::Azure);
        assert_eq!(CloudKind::Azure.complement(), CloudKind::Aws);
        assert_eq!("aws".parse::<CloudKind>().unwrap(), CloudKind::Aws);
        assert_eq!("Azure".parse::<CloudKind>().unwrap(), CloudKind::Azure);
        assert!("gcp".parse::<CloudKind>().is_err());
        assert_eq!(
            serde_json::to_string(&CloudKind::Aws).unwrap(),
            r#""AWS""#
        );
    }

    #[test]
    fn test_kind_type_mapping() {
        for kind in [CloudKind::Aws, CloudKind::Azure] {
            assert_eq!(kind.connector_type().kind(), kind);
        }
    }
}
