use std::time::Duration;

use async_trait::async_trait;
use http::Uri;
use tracing::debug;

use crate::config::TransportConfig;
use crate::middleware::{Request, Response, Result, Transport};

/// [`Transport`] sending requests with `reqwest`
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint)
    }

    pub fn with_client(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn from_config(config: &TransportConfig) -> std::result::Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self::with_client(builder.build()?, &config.endpoint))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Absolute URIs are used as is, relative ones are appended to the endpoint
    fn resolve(&self, uri: &Uri) -> String {
        if uri.scheme().is_some() {
            return uri.to_string();
        }
        match uri.path_and_query().map(|pq| pq.as_str()) {
            None | Some("/") | Some("") => self.endpoint.clone(),
            Some(path) => format!(
                "{}/{}",
                self.endpoint.trim_end_matches('/'),
                path.trim_start_matches('/')
            ),
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: Request) -> Result<Response> {
        let (parts, body) = request.into_parts();
        let url = self.resolve(&parts.uri);
        debug!(method = %parts.method, %url, bytes = body.len(), "Sending request");

        let response = self
            .client
            .request(parts.method, &url)
            .headers(parts.headers)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        debug!(%status, bytes = body.len(), "Received response");

        let mut out = Response::new(body);
        *out.status_mut() = status;
        *out.headers_mut() = headers;
        Ok(out)
    }
}
