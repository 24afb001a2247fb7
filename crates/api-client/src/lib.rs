pub mod error;
pub mod paths;
mod request;

use common::Config;
use error::{Error, Result};
use faststr::FastStr;
use reqwest::{Client as ReqwestClient, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

pub use request::ApiRequest;
pub use reqwest::Method;

#[inline]
pub fn build_http_client(connect_timeout: Duration, timeout: Duration) -> Result<ReqwestClient> {
    ReqwestClient::builder()
        .connect_timeout(connect_timeout)
        .timeout(timeout)
        .build()
        .map_err(|_| Error::FailedToBuildClient)
}

/// Thin JSON client for the console API. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http:  ReqwestClient,
    root:  FastStr,
    token: Option<FastStr>,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = build_http_client(config.connect_timeout, config.request_timeout)?;
        Ok(Self::with_http(http, config.api_root.clone(), config.api_token.clone()))
    }

    pub fn with_http(http: ReqwestClient, root: impl Into<FastStr>, token: Option<FastStr>) -> Self {
        let root: FastStr = root.into();
        Self {
            http,
            root: root.trim_end_matches('/').to_owned().into(),
            token,
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.root, path.trim_start_matches('/'))
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.execute(ApiRequest::get(path.to_owned())).await
    }

    /// Sends `request` and deserializes a 2xx body into `T`.
    pub async fn execute<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let (url, body) = self.send(request).await?;
        serde_json::from_str(&body).map_err(|source| Error::InvalidResponseData {
            url: url.into(),
            source,
        })
    }

    /// Sends `request` and discards the body.
    pub async fn execute_unit(&self, request: ApiRequest) -> Result<()> {
        self.send(request).await.map(|_| ())
    }

    async fn send(&self, mut request: ApiRequest) -> Result<(String, String)> {
        if let Some(token) = &self.token {
            request.bearer_auth(token.clone());
        }
        let url = self.url(&request.path);
        let method = request.method.clone();
        debug!(%method, %url, "sending request");

        let res = self.request_builder(&url, request).send().await?;
        let status = res.status();
        let body = res.text().await?;
        if !status.is_success() {
            debug!(%method, %url, status = status.as_u16(), "request failed");
            return Err(Error::UnexpectedStatus {
                url: url.into(),
                status: status.as_u16(),
                body: body.into(),
            });
        }
        Ok((url, body))
    }

    fn request_builder(&self, url: &str, request: ApiRequest) -> RequestBuilder {
        let ApiRequest {
            method,
            query,
            headers,
            body,
            ..
        } = request;
        let mut builder = self.http.request(method, url);
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        for (k, v) in headers {
            builder = builder.header(k.as_str(), v.as_str());
        }
        if let Some(body) = body {
            builder = builder.json(&body);
        }
        builder
    }
}
