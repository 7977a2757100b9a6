//! # msgsync Core
//!
//! Data model and local message store for the msgsync client.
//!
//! This crate provides:
//! - `Subject`: named topic with optional read/write principal restrictions
//! - `Message`: a server-ordered message on a subject
//! - `SubscriptionStore`: per-subject ordered, deduplicated message history
//!
//! Everything here is pure data with no I/O; the synchronization engine in
//! `msgsync-client` mutates the store under its instance lock.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod message;
pub mod store;
pub mod subject;

pub use message::Message;
pub use store::{InsertOutcome, Subscription, SubscriptionStore};
pub use subject::Subject;
