use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::connector::{CloudKind, ConnectorType};

/// Storage the search view is pointed at
pub type SearchType = CloudKind;

/// How the search term is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Full text search against the connector index
    #[default]
    Keyword,
    /// Regular expression search against the connector index
    Pattern,
    /// Remote classification scan, tracked by the scan monitor
    Scan,
}

impl SearchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchMode::Keyword => "keyword",
            SearchMode::Pattern => "pattern",
            SearchMode::Scan => "scan",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "keyword" => Ok(SearchMode::Keyword),
            "pattern" => Ok(SearchMode::Pattern),
            "scan" => Ok(SearchMode::Scan),
            _ => Err(format!("unknown search mode: {}", s)),
        }
    }
}

/// A document record as the search backend returns it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawHit {
    pub id: String,
    #[serde(default)]
    pub index: Option<String>,
    #[serde(default)]
    pub container: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub size: Option<serde_json::Value>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
}

/// An object found in an S3 bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct S3Object {
    pub id: String,
    pub index: String,
    pub bucket: String,
    pub key: String,
    pub size: Option<u64>,
    pub updated_at: Option<String>,
}

/// A blob found in an Azure storage container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AzureBlob {
    pub id: String,
    pub index: String,
    pub container: String,
    pub name: String,
    pub size: Option<u64>,
    pub content_type: Option<String>,
    pub updated_at: Option<String>,
}

/// One search result, tagged with the storage it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SearchHit {
    S3(S3Object),
    Azure(AzureBlob),
}

/// Sizes arrive either as numbers or numeric strings
fn parse_size(value: &Option<serde_json::Value>) -> Option<u64> {
    match value {
        Some(serde_json::Value::Number(n)) => n.as_u64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

impl SearchHit {
    /// Tag a raw record by the type of connector whose index was queried
    pub fn from_raw(source: ConnectorType, index_name: &str, raw: RawHit) -> Self {
        let size = parse_size(&raw.size);
        let index = raw.index.unwrap_or_else(|| index_name.to_string());
        let container = raw.container.unwrap_or_default();
        let title = raw.title.unwrap_or_else(|| raw.id.clone());

        match source {
            ConnectorType::S3 => SearchHit::S3(S3Object {
                id: raw.id,
                index,
                bucket: container,
                key: title,
                size,
                updated_at: raw.updated_at,
            }),
            ConnectorType::AzureBlobStorage => SearchHit::Azure(AzureBlob {
                id: raw.id,
                index,
                container,
                name: title,
                size,
                content_type: raw.content_type,
                updated_at: raw.updated_at,
            }),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            SearchHit::S3(o) => &o.id,
            SearchHit::Azure(b) => &b.id,
        }
    }

    /// `bucket/key` or `container/name`
    pub fn location(&self) -> String {
        match self {
            SearchHit::S3(o) => format!("s3://{}/{}", o.bucket, o.key),
            SearchHit::Azure(b) => format!("azure://{}/{}", b.container, b.name),
        }
    }
}
