//! # msgsync Protocol
//!
//! Wire protocol for the batched RPC exchange.
//!
//! One round trip carries the client's entire pending command queue and
//! returns per-command results plus any server-pushed events:
//!
//! - `Command`: a client intent (`subscribe`, `unsubscribe`, `sendMessage`)
//! - `RpcRequest` / `RpcResponse`: the batch envelope
//! - `CommandResponse`: per-command result, positionally matched to the request
//! - `ServerEvent`: server-pushed event, decoded per entry

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod commands;
pub mod wire;

pub use commands::{Command, SendMessageArgs, SubscribeArgs, UnsubscribeArgs};
pub use wire::{CommandResponse, MessageEvent, ProtoError, RpcRequest, RpcResponse, ServerEvent};
