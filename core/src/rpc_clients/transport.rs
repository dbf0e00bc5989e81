use std::future::Future;

use reqwest::{
    Url,
    header::{ACCEPT, CONTENT_TYPE},
};
use tracing::{Instrument, debug, debug_span, trace};

use crate::error::AlchemyError;

/// One-shot request/response exchange with the JSON-RPC gateway.
pub trait RpcTransport: Send + Sync {
    fn send(&self, payload: Vec<u8>)
    -> impl Future<Output = Result<Vec<u8>, AlchemyError>> + Send;
}

/// HTTPS transport posting JSON bodies to a single gateway URL
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    url: Url,
}

impl HttpTransport {
    pub fn new(client: reqwest::Client, url: Url) -> Self {
        Self { client, url }
    }

    /// Gateway URL is `base_url` followed by the API key.
    pub fn alchemy(base_url: &str, api_key: &str) -> Result<Self, AlchemyError> {
        let url = Url::parse(&format!("{base_url}{api_key}")).map_err(|e| {
            AlchemyError::validation(format!("Failed to parse gateway URL: {e}"))
        })?;

        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| AlchemyError::validation(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self::new(client, url))
    }

    async fn do_request(&self, payload: Vec<u8>) -> Result<Vec<u8>, AlchemyError> {
        let resp = self
            .client
            .post(self.url.clone())
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Error sending request: {}", e);
                AlchemyError::transport(e)
            })?;

        let status = resp.status();
        debug!(?status, "received response from server");

        let body = resp.bytes().await.map_err(|e| {
            tracing::error!("Error reading response body: {}", e);
            AlchemyError::TransportError {
                message: e.to_string(),
                status: Some(status.as_u16()),
            }
        })?;
        debug!(bytes = body.len(), "retrieved response body");
        trace!(body = ?String::from_utf8_lossy(&body), "response body");

        if !status.is_success() {
            return Err(AlchemyError::TransportError {
                message: String::from_utf8_lossy(&body).into_owned(),
                status: Some(status.as_u16()),
            });
        }

        Ok(body.to_vec())
    }
}

impl RpcTransport for HttpTransport {
    async fn send(&self, payload: Vec<u8>) -> Result<Vec<u8>, AlchemyError> {
        // Only the host goes into the span; the path carries the API key
        let span = debug_span!("HttpTransport", host = ?self.url.host_str());
        self.do_request(payload).instrument(span).await
    }
}
