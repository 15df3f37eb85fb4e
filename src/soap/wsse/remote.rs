use std::time::Duration;

use async_trait::async_trait;
use http::header::CONTENT_TYPE;
use tracing::{debug, warn};

use crate::config::SignerConfig;
use crate::soap::wsse::{ExternalSigner, SignerResult};

pub const TRANSPORT_ERROR: &str = "TransportError";
pub const DECODE_ERROR: &str = "DecodeError";

/// An [`ExternalSigner`] reached over HTTP.
///
/// The envelope is POSTed as `text/xml`; the service answers with a JSON
/// encoded [`SignerResult`]. Transport and decoding problems are reported
/// as failed results so the middleware treats them like any signer failure.
#[derive(Debug, Clone)]
pub struct RemoteSigner {
    client: reqwest::Client,
    url: String,
}

impl RemoteSigner {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), url)
    }

    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn from_config(config: &SignerConfig) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self::with_client(builder.build()?, &config.url))
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ExternalSigner for RemoteSigner {
    async fn sign_xml(&self, xml: &str) -> SignerResult {
        debug!(url = %self.url, bytes = xml.len(), "Sending envelope to remote signer");

        let response = match self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "text/xml; charset=utf-8")
            .body(xml.to_owned())
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
        {
            Ok(response) => response,
            Err(e) => {
                warn!(url = %self.url, "Remote signer unreachable: {e}");
                return SignerResult::failure(TRANSPORT_ERROR, e.to_string());
            }
        };

        match response.json::<SignerResult>().await {
            Ok(result) => result,
            Err(e) => {
                warn!(url = %self.url, "Remote signer sent an undecodable answer: {e}");
                SignerResult::failure(DECODE_ERROR, e.to_string())
            }
        }
    }
}
