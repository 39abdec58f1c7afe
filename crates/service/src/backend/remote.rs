use async_trait::async_trait;
use url::Url;

use common::prelude::{CloudKind, ConfigurationBody, Connector, ScanStatus};

use super::requests::*;
use super::{BackendError, ConnectorDirectory, CreateOutcome, ScanBackend};
use crate::http_server::api::client::{ApiClient, ApiError};
use crate::ServiceConfig;

/// Talks to the dashboard backend over HTTP
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: ApiClient,
}

impl HttpBackend {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn from_config(config: &ServiceConfig) -> Result<Self, ApiError> {
        let client = ApiClient::with_options(
            &config.backend_url,
            config.session_id.as_deref(),
            config.request_timeout,
        )?;
        Ok(Self::new(client))
    }

    pub fn remote(&self) -> &Url {
        &self.client.remote
    }
}

#[async_trait]
impl ConnectorDirectory for HttpBackend {
    async fn list_connectors(&self) -> Result<Vec<Connector>, BackendError> {
        Ok(self.client.call(ListConnectors).await?.data)
    }

    async fn dashboard_data_exists(&self) -> Result<bool, BackendError> {
        match self.client.call(DashboardData).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn create_connector(&self, kind: CloudKind) -> Result<CreateOutcome, BackendError> {
        let (status, response) = self
            .client
            .call_with_status(CreateConnector { name: kind })
            .await?;
        Ok(CreateOutcome {
            status,
            connector: response.data,
            message: response.message,
        })
    }

    async fn configure_connector(
        &self,
        connector_id: &str,
        body: &ConfigurationBody,
    ) -> Result<ConfigureResponse, BackendError> {
        let request = ConfigureConnector {
            connector_id: connector_id.to_string(),
            body: body.clone(),
        };
        Ok(self.client.call(request).await?)
    }

    async fn sync_connector(&self, connector_id: &str) -> Result<SyncResponse, BackendError> {
        let request = SyncConnector {
            connector_id: connector_id.to_string(),
        };
        Ok(self.client.call(request).await?)
    }

    async fn delete_connector(&self, connector_id: &str) -> Result<DeleteResponse, BackendError> {
        let request = DeleteConnector {
            connector_id: connector_id.to_string(),
        };
        Ok(self.client.call(request).await?)
    }
}

#[async_trait]
impl ScanBackend for HttpBackend {
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, BackendError> {
        Ok(self.client.call(query.clone()).await?)
    }

    async fn scan_status(&self, run_id: &str) -> Result<ScanStatus, BackendError> {
        let request = GetScanStatus {
            run_id: run_id.to_string(),
        };
        self.client
            .call(request)
            .await?
            .data
            .ok_or_else(|| BackendError::Rejected("scan status response had no status".into()))
    }

    async fn scan_results(&self, run_id: &str) -> Result<Vec<String>, BackendError> {
        let request = GetScanResults {
            run_id: run_id.to_string(),
        };
        Ok(self.client.call(request).await?.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use http::StatusCode;
    use serde_json::{json, Value};
    use std::collections::HashMap;

    use common::prelude::ConnectorType;

    async fn serve(router: Router) -> HttpBackend {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        let remote = Url::parse(&format!("http://{}", addr)).unwrap();
        HttpBackend::new(ApiClient::new(&remote).unwrap())
    }

    #[tokio::test]
    async fn test_directory_over_http() {
        let router = Router::new()
            .route(
                "/api/dashboard/elasticsearch/connector",
                get(|| async {
                    Json(json!({"data": [
                        {"id": "c1", "type": "s3", "name": "AWS", "status": "connected"}
                    ]}))
                }),
            )
            .route(
                "/api/dashboard/overview/data",
                get(|| async { (StatusCode::NOT_FOUND, Json(json!({"message": "no data"}))) }),
            )
            .route(
                "/api/dashboard/elasticsearch/createconnector",
                post(|Json(body): Json<Value>| async move {
                    assert_eq!(body, json!({"name": "Azure"}));
                    (
                        StatusCode::CREATED,
                        Json(json!({"data": {"id": "c2", "type": "azure_blob_storage"}})),
                    )
                }),
            );
        let backend = serve(router).await;

        let connectors = backend.list_connectors().await.unwrap();
        assert_eq!(connectors.len(), 1);
        assert_eq!(connectors[0].connector_type, ConnectorType::S3);

        assert!(!backend.dashboard_data_exists().await.unwrap());

        let outcome = backend.create_connector(CloudKind::Azure).await.unwrap();
        assert_eq!(outcome.status, StatusCode::CREATED);
        assert_eq!(outcome.connector.map(|c| c.id).as_deref(), Some("c2"));
    }

    #[tokio::test]
    async fn test_scan_endpoints_over_http() {
        let router = Router::new()
            .route(
                "/api/dashboard/scan-status",
                get(|Query(query): Query<HashMap<String, String>>| async move {
                    match query.get("encodedrunId").map(String::as_str) {
                        Some("run/1") => Json(json!({"data": "Succeeded"})),
                        _ => Json(json!({})),
                    }
                }),
            )
            .route(
                "/api/dashboard/scan-result",
                post(|| async {
                    (StatusCode::BAD_GATEWAY, Json(json!({"message": "purview unavailable"})))
                }),
            );
        let backend = serve(router).await;

        assert_eq!(
            backend.scan_status("run/1").await.unwrap(),
            ScanStatus::Succeeded
        );
        assert!(matches!(
            backend.scan_status("other").await,
            Err(BackendError::Rejected(_))
        ));
        assert_eq!(
            backend.scan_results("run/1").await,
            Err(BackendError::Rejected("purview unavailable".to_string()))
        );
    }
}
