//! # msgsync Transport
//!
//! The network seam of the msgsync client: one batched POST exchange per
//! call, abstracted behind [`RpcTransport`] so the engine can run against
//! the real HTTPS endpoint or a scripted stand-in.
//!
//! - `HttpTransport`: TLS-only `POST {base_url}/api`, JSON body, with
//!   detection of the server's `Retry-After` immediate-retry hint
//! - `MockTransport`: scripted replies plus recorded requests, for tests

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod http;
pub mod mock;
pub mod transport;

pub use http::{HttpTransport, HttpTransportConfig};
pub use mock::MockTransport;
pub use transport::{RpcExchange, RpcTransport, TransportError};
