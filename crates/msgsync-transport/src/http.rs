//! HTTPS transport for the batched RPC endpoint.

use crate::transport::{RpcExchange, RpcTransport, TransportError};
use async_trait::async_trait;
use msgsync_proto::{RpcRequest, RpcResponse};
use reqwest::redirect;
use std::time::Duration;
use url::Url;

/// HTTP transport configuration.
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Base URL of the service; the API endpoint is `{base_url}/api`.
    /// Must be HTTPS.
    pub base_url: String,
    /// Request timeout, bounding how long one batch can stay in flight
    pub timeout: Duration,
}

impl HttpTransportConfig {
    /// Configuration with the default 10 second timeout.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Override the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Transport posting each batch to `{base_url}/api` over TLS.
///
/// Redirects that would leave HTTPS are refused.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpTransport {
    /// Create a new HTTP transport.
    ///
    /// # Errors
    ///
    /// Returns error if the base URL is not valid HTTPS or the HTTP client
    /// cannot be created.
    pub fn new(config: HttpTransportConfig) -> Result<Self, TransportError> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| TransportError::Init(format!("invalid base URL {}: {e}", config.base_url)))?;
        if base.scheme() != "https" {
            return Err(TransportError::HttpsRequired(config.base_url.clone()));
        }

        let endpoint = Url::parse(&format!("{}/api", config.base_url.trim_end_matches('/')))
            .map_err(|e| TransportError::Init(format!("invalid endpoint URL: {e}")))?;

        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(config.timeout)
            .redirect(redirect::Policy::custom(|attempt| {
                if attempt.url().scheme() == "https" {
                    attempt.follow()
                } else {
                    attempt.error("redirect would leave https")
                }
            }))
            .build()
            .map_err(|e| TransportError::Init(e.to_string()))?;

        Ok(Self { client, endpoint })
    }

    /// The resolved API endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn exchange(&self, request: &RpcRequest) -> Result<RpcExchange, TransportError> {
        tracing::debug!(
            endpoint = %self.endpoint,
            commands = request.commands.len(),
            "POST batch"
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok());

        let status = response.status().as_u16();
        if status != 200 {
            return Err(TransportError::Status {
                status,
                retry_after,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;
        let decoded =
            RpcResponse::from_json(&body).map_err(|e| TransportError::Decode(e.to_string()))?;

        Ok(RpcExchange {
            response: decoded,
            retry_after,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default_timeout() {
        let config = HttpTransportConfig::new("https://example.com");
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn https_is_required() {
        let result = HttpTransport::new(HttpTransportConfig::new("http://example.com"));
        assert!(matches!(result, Err(TransportError::HttpsRequired(_))));
    }

    #[test]
    fn invalid_url_is_an_init_error() {
        let result = HttpTransport::new(HttpTransportConfig::new("not a url"));
        assert!(matches!(result, Err(TransportError::Init(_))));
    }

    #[test]
    fn endpoint_is_api_under_base() {
        let transport = HttpTransport::new(HttpTransportConfig::new("https://example.com")).unwrap();
        assert_eq!(transport.endpoint(), "https://example.com/api");

        let transport =
            HttpTransport::new(HttpTransportConfig::new("https://example.com/")).unwrap();
        assert_eq!(transport.endpoint(), "https://example.com/api");
    }
}
