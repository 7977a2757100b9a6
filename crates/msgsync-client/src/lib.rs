//! # msgsync Client
//!
//! Client-side synchronization engine for the msgsync publish/subscribe
//! service.
//!
//! A [`SyncClient`] keeps a locally materialized, ordered, deduplicated
//! view of each subscribed subject. Mutations (subscribe, unsubscribe,
//! publish) queue commands and return immediately; one background task
//! reconciles the queue with the server in batched round trips, backing
//! off exponentially with jitter and re-issuing commands the server asks
//! to retry.
//!
//! ## Concurrency
//!
//! Two actors share an instance: the caller's threads and the background
//! loop. All shared state sits behind a single mutex held only for short
//! CPU-bound sections; a notify primitive wakes the loop the moment new
//! work or shutdown arrives. The network exchange happens with the lock
//! released, so callers never wait on a round trip.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod backoff;
mod engine;
mod state;

pub mod client;
pub mod config;

pub use client::{ClientCallbacks, ClientError, MessageCallback, SyncClient};
pub use config::{ClientConfig, ConfigError};
pub use state::SyncStats;

pub use msgsync_core::{Message, Subject};
