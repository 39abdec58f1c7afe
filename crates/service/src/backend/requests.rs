use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use url::Url;

use common::prelude::{CloudKind, ConfigurationBody, Connector, ConnectorType, RawHit, ScanLevel, ScanStatus};

use crate::http_server::api::client::{ApiError, ApiRequest};

const CONNECTOR_PATH: &str = "/api/dashboard/elasticsearch/connector";
const CONNECTOR_SYNC_PATH: &str = "/api/dashboard/elasticsearch/connector/sync";
const CREATE_CONNECTOR_PATH: &str = "/api/dashboard/elasticsearch/createconnector";
const CONNECTOR_CONFIGURATION_PATH: &str = "/api/dashboard/elasticsearch/connector_configuration";
const DASHBOARD_DATA_PATH: &str = "/api/dashboard/overview/data";
const SEARCH_PATH: &str = "/api/dashboard/search";
const SCAN_STATUS_PATH: &str = "/api/dashboard/scan-status";
const SCAN_RESULT_PATH: &str = "/api/dashboard/scan-result";

fn endpoint(base_url: &Url, path: &str, query: Option<(&str, &str)>) -> Result<Url, ApiError> {
    let mut url = base_url.join(path)?;
    if let Some((key, value)) = query {
        url.query_pairs_mut().append_pair(key, value);
    }
    Ok(url)
}

// connector directory

#[derive(Debug, Clone, Default)]
pub struct ListConnectors;

#[derive(Debug, Clone, Deserialize)]
pub struct ConnectorList {
    #[serde(default)]
    pub data: Vec<Connector>,
}

impl ApiRequest for ListConnectors {
    type Response = ConnectorList;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        Ok(client.get(endpoint(base_url, CONNECTOR_PATH, None)?))
    }
}

/// Probe for aggregate dashboard data; a 404 means there is none yet
#[derive(Debug, Clone, Default)]
pub struct DashboardData;

impl ApiRequest for DashboardData {
    type Response = serde_json::Value;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        Ok(client.get(endpoint(base_url, DASHBOARD_DATA_PATH, None)?))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateConnector {
    pub name: CloudKind,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateConnectorResponse {
    #[serde(default)]
    pub data: Option<CreatedConnector>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedConnector {
    pub id: String,
    #[serde(rename = "type")]
    pub connector_type: ConnectorType,
    #[serde(default)]
    pub name: String,
}

impl ApiRequest for CreateConnector {
    type Response = CreateConnectorResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        Ok(client
            .post(endpoint(base_url, CREATE_CONNECTOR_PATH, None)?)
            .json(&self))
    }
}

#[derive(Debug, Clone)]
pub struct ConfigureConnector {
    pub connector_id: String,
    pub body: ConfigurationBody,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigureResponse {
    #[serde(default)]
    pub data: Option<ConfigureResult>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigureResult {
    #[serde(default)]
    pub result: Option<String>,
}

impl ConfigureResponse {
    pub fn is_updated(&self) -> bool {
        self.data
            .as_ref()
            .and_then(|data| data.result.as_deref())
            == Some("updated")
    }
}

impl ApiRequest for ConfigureConnector {
    type Response = ConfigureResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let url = endpoint(
            base_url,
            CONNECTOR_CONFIGURATION_PATH,
            Some(("connector_id", &self.connector_id)),
        )?;
        Ok(client.post(url).json(&self.body))
    }
}

#[derive(Debug, Clone)]
pub struct SyncConnector {
    pub connector_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncResponse {
    #[serde(default)]
    pub syncstatus: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl SyncResponse {
    pub fn is_completed(&self) -> bool {
        self.syncstatus.as_deref() == Some("completed")
    }
}

impl ApiRequest for SyncConnector {
    type Response = SyncResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let url = endpoint(
            base_url,
            CONNECTOR_SYNC_PATH,
            Some(("connector_id", &self.connector_id)),
        )?;
        Ok(client.get(url))
    }
}

#[derive(Debug, Clone)]
pub struct DeleteConnector {
    pub connector_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteResponse {
    #[serde(default)]
    pub acknowledged: bool,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiRequest for DeleteConnector {
    type Response = DeleteResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let url = endpoint(
            base_url,
            CONNECTOR_PATH,
            Some(("connector_id", &self.connector_id)),
        )?;
        Ok(client.delete(url))
    }
}

// search and scans

/// Query against a connector's search index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "search_type", rename_all = "snake_case")]
pub enum IndexQuery {
    Keyword { keyword: String, index_name: String },
    Pattern { pattern: String, index_name: String },
}

/// Request for a classification scan, answered with a run id
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanQuery {
    pub keyword: String,
    #[serde(rename = "scanLevel")]
    pub scan_level: ScanLevel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SearchQuery {
    Index(IndexQuery),
    Scan(ScanQuery),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub data: Option<SearchData>,
    #[serde(rename = "purviewRunId", default)]
    pub purview_run_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchData {
    #[serde(default)]
    pub data: Option<SearchResults>,
    #[serde(rename = "purviewRunId", default)]
    pub purview_run_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchResults {
    #[serde(default)]
    pub results: Vec<RawHit>,
}

impl SearchResponse {
    /// Run id of a started scan, from either place the backend puts it
    pub fn run_id(&self) -> Option<&str> {
        self.data
            .as_ref()
            .and_then(|data| data.purview_run_id.as_deref())
            .or(self.purview_run_id.as_deref())
            .filter(|id| !id.is_empty())
    }

    pub fn into_hits(self) -> Vec<RawHit> {
        self.data
            .and_then(|data| data.data)
            .map(|results| results.results)
            .unwrap_or_default()
    }
}

impl ApiRequest for SearchQuery {
    type Response = SearchResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        Ok(client.post(endpoint(base_url, SEARCH_PATH, None)?).json(&self))
    }
}

#[derive(Debug, Clone)]
pub struct GetScanStatus {
    pub run_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScanStatusResponse {
    #[serde(default)]
    pub data: Option<ScanStatus>,
}

impl ApiRequest for GetScanStatus {
    type Response = ScanStatusResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        let url = endpoint(base_url, SCAN_STATUS_PATH, Some(("encodedrunId", &self.run_id)))?;
        Ok(client.get(url))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GetScanResults {
    #[serde(rename = "runId")]
    pub run_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScanResultsResponse {
    #[serde(default)]
    pub data: Vec<String>,
}

impl ApiRequest for GetScanResults {
    type Response = ScanResultsResponse;

    fn build_request(self, base_url: &Url, client: &Client) -> Result<RequestBuilder, ApiError> {
        Ok(client
            .post(endpoint(base_url, SCAN_RESULT_PATH, None)?)
            .json(&self))
    }
}
