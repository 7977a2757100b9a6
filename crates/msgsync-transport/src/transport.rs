//! Transport abstraction for the batched RPC exchange.

use async_trait::async_trait;
use msgsync_proto::{RpcRequest, RpcResponse};

/// A transport performs one batched exchange with the server.
///
/// Implementations are used exclusively by the background sync loop;
/// batches are strictly sequential, so `exchange` is never called
/// concurrently for one instance.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Send one batch and return the decoded response.
    ///
    /// # Errors
    ///
    /// Any error means the whole batch failed: the caller re-queues every
    /// command unchanged and applies nothing from the response.
    async fn exchange(&self, request: &RpcRequest) -> Result<RpcExchange, TransportError>;
}

#[async_trait]
impl<T: RpcTransport + ?Sized> RpcTransport for std::sync::Arc<T> {
    async fn exchange(&self, request: &RpcRequest) -> Result<RpcExchange, TransportError> {
        (**self).exchange(request).await
    }
}

/// A decoded response plus the transport-level retry hint.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcExchange {
    /// The decoded response body
    pub response: RpcResponse,
    /// `Retry-After` header value in seconds, when the server sent one.
    /// Zero asks the client to retry immediately.
    pub retry_after: Option<u64>,
}

impl RpcExchange {
    /// An exchange with no retry hint.
    #[must_use]
    pub fn new(response: RpcResponse) -> Self {
        Self {
            response,
            retry_after: None,
        }
    }

    /// Attach a `Retry-After` hint in seconds.
    #[must_use]
    pub fn with_retry_after(mut self, seconds: u64) -> Self {
        self.retry_after = Some(seconds);
        self
    }
}

/// Errors that can occur during a batched exchange.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// Transport construction failed
    #[error("transport init error: {0}")]
    Init(String),
    /// The endpoint is not HTTPS
    #[error("https is required for the RPC endpoint: {0}")]
    HttpsRequired(String),
    /// The request never completed
    #[error("request error: {0}")]
    Request(String),
    /// The server answered with a non-200 status
    #[error("server returned status {status}")]
    Status {
        /// HTTP status code
        status: u16,
        /// `Retry-After` header in seconds, when present even on failure
        retry_after: Option<u64>,
    },
    /// The response body is not well-formed per the wire contract
    #[error("response decode error: {0}")]
    Decode(String),
}
