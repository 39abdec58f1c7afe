use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, COOKIE, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use url::Url;

use common::prelude::BuildInfo;

use super::error::ApiError;
use super::ApiRequest;

#[derive(Debug, Clone)]
pub struct ApiClient {
    pub remote: Url,
    client: Client,
}

impl ApiClient {
    pub fn new(remote: &Url) -> Result<Self, ApiError> {
        Self::with_options(remote, None, None)
    }

    /// Build a client that forwards `session_id` as a cookie on every
    ///  request and, if set, gives up on requests after `timeout`
    pub fn with_options(
        remote: &Url,
        session_id: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<Self, ApiError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&BuildInfo::new().user_agent())?,
        );
        if let Some(session_id) = session_id {
            let mut cookie = HeaderValue::from_str(session_id)?;
            cookie.set_sensitive(true);
            default_headers.insert(COOKIE, cookie);
        }

        let mut builder = Client::builder().default_headers(default_headers);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self {
            remote: remote.clone(),
            client,
        })
    }

    pub async fn call<T: ApiRequest>(&self, request: T) -> Result<T::Response, ApiError> {
        let (_, body) = self.call_with_status(request).await?;
        Ok(body)
    }

    /// Like `call`, but also hands back the success status so callers
    ///  can tell `201 Created` from a plain `200`
    pub async fn call_with_status<T: ApiRequest>(
        &self,
        request: T,
    ) -> Result<(StatusCode, T::Response), ApiError> {
        let request_builder = request.build_request(&self.remote, &self.client)?;
        let response = request_builder.send().await?;
        let status = response.status();
        let body = Self::decode::<T::Response>(response).await?;
        Ok((status, body))
    }

    async fn decode<R: serde::de::DeserializeOwned>(response: Response) -> Result<R, ApiError> {
        if response.status().is_success() {
            Ok(response.json::<R>().await?)
        } else {
            Err(ApiError::HttpStatus(
                response.status(),
                response.text().await?,
            ))
        }
    }
}
