//! Background reconciliation loop.
//!
//! One task per client instance. Each cycle drains the command queue as a
//! single batch, exchanges it with the server, applies the response to the
//! local store, and re-queues whatever the server did not apply. Between
//! cycles the loop sleeps on the backoff interval, or indefinitely when
//! the queue is empty, until the facade wakes it.

use crate::client::MessageCallback;
use crate::state::{InstanceState, Shared};
use msgsync_core::{InsertOutcome, Message};
use msgsync_proto::{Command, CommandResponse, RpcRequest, ServerEvent};
use msgsync_transport::{RpcExchange, RpcTransport, TransportError};
use std::sync::Arc;
use uuid::Uuid;

pub(crate) struct SyncLoop<T> {
    shared: Arc<Shared>,
    transport: T,
    client_id: String,
    instance_id: Uuid,
    on_message: Option<MessageCallback>,
}

impl<T: RpcTransport> SyncLoop<T> {
    pub fn new(
        shared: Arc<Shared>,
        transport: T,
        client_id: String,
        instance_id: Uuid,
        on_message: Option<MessageCallback>,
    ) -> Self {
        Self {
            shared,
            transport,
            client_id,
            instance_id,
            on_message,
        }
    }

    /// Run until the shutdown flag is observed.
    ///
    /// Commands still queued at shutdown are dropped; the facade documents
    /// that unsent intent does not survive the instance.
    pub async fn run(self) {
        loop {
            let batch = {
                let mut state = self.shared.state.lock();
                if state.shutdown {
                    break;
                }
                if state.queue.is_empty() {
                    None
                } else {
                    let batch = std::mem::take(&mut state.queue);
                    // Grow before the send so a failing server is already
                    // being approached more slowly by the time the failure
                    // is known.
                    state.backoff.advance();
                    Some(batch)
                }
            };

            if let Some(commands) = batch {
                self.run_cycle(commands).await;
            }

            let wait = {
                let state = self.shared.state.lock();
                if state.shutdown {
                    break;
                }
                if state.queue.is_empty() {
                    None
                } else {
                    Some(state.backoff.current())
                }
            };
            match wait {
                // Idle: nothing to send until the facade queues work.
                None => self.shared.wake.notified().await,
                // Waiting: the timer or a wake, whichever first.
                Some(delay) => {
                    tokio::select! {
                        () = self.shared.wake.notified() => {}
                        () = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
        tracing::debug!(client_id = %self.client_id, "sync loop exited");
    }

    /// One batch: send with the lock released, then apply the outcome.
    async fn run_cycle(&self, commands: Vec<Command>) {
        let request = RpcRequest::new(self.client_id.clone(), self.instance_id, commands);
        tracing::debug!(commands = request.commands.len(), "sending batch");

        let outcome = self.transport.exchange(&request).await;
        let delivered = self.apply_outcome(request.commands, outcome);

        // Callbacks run outside the lock so a slow handler cannot stall
        // facade calls.
        if let Some(callback) = &self.on_message {
            for message in &delivered {
                callback(message);
            }
        }
    }

    /// Apply one exchange outcome under the lock.
    ///
    /// Returns the newly stored messages, in arrival order, for callback
    /// delivery outside the lock.
    fn apply_outcome(
        &self,
        commands: Vec<Command>,
        outcome: Result<RpcExchange, TransportError>,
    ) -> Vec<Message> {
        let mut state = self.shared.state.lock();
        state.stats.cycles_completed += 1;

        match outcome {
            Err(error) => {
                tracing::warn!(error = %error, commands = commands.len(), "batch failed; re-queueing");
                let retry_after = match &error {
                    TransportError::Status { retry_after, .. } => *retry_after,
                    _ => None,
                };
                state.stats.last_error = Some(error.to_string());
                state.stats.commands_retried += commands.len() as u64;
                state.queue.extend(commands);
                if let Some(seconds) = retry_after {
                    state.backoff.override_with(seconds.saturating_mul(1000));
                }
                Vec::new()
            }
            Ok(exchange) => {
                state.stats.last_error = None;
                let delivered = apply_response(&mut state, commands, &exchange);
                if let Some(seconds) = exchange.retry_after {
                    state.backoff.override_with(seconds.saturating_mul(1000));
                }
                delivered
            }
        }
    }
}

/// Apply a decoded response: per-command results, profile, events, retry
/// classification. Returns newly stored messages in arrival order.
fn apply_response(
    state: &mut InstanceState,
    commands: Vec<Command>,
    exchange: &RpcExchange,
) -> Vec<Message> {
    let response = &exchange.response;

    let Some(responses) = &response.responses else {
        // Without per-command results nothing in the response can be
        // trusted; put the whole batch back and apply nothing else.
        tracing::warn!("response lacks \"responses\"; re-queueing batch");
        state.stats.commands_retried += commands.len() as u64;
        state.queue.extend(commands);
        return Vec::new();
    };

    match &response.profile {
        Some(profile) => {
            if state.profile.as_deref() != Some(profile.as_str()) {
                tracing::info!(%profile, "profile updated");
                state.profile = Some(profile.clone());
            }
        }
        None => tracing::warn!("response lacks \"profile\""),
    }

    let delivered = apply_events(state, &response.events);

    let total = commands.len() as u64;
    let retries = classify_retries(state, commands, responses);
    let retried = retries.len() as u64;
    state.stats.commands_acknowledged += total - retried;
    state.stats.commands_retried += retried;
    state.queue.extend(retries);

    delivered
}

/// Store each decoded message event.
///
/// Anomalies (unrecognized event type, missing fields, unknown subject)
/// are logged and skipped, never fatal.
fn apply_events(state: &mut InstanceState, events: &[serde_json::Value]) -> Vec<Message> {
    let mut delivered = Vec::new();
    for value in events {
        let event = match ServerEvent::from_value(value) {
            Ok(ServerEvent::Message(event)) => event,
            Err(error) => {
                tracing::warn!(error = %error, "ignoring undecodable event");
                continue;
            }
        };

        let message = event.into_message();
        match state.store.insert_message(message.clone()) {
            InsertOutcome::Inserted => {
                state.stats.messages_stored += 1;
                delivered.push(message);
            }
            InsertOutcome::Duplicate => {
                tracing::debug!(id = message.id, subject = %message.subject, "duplicate message dropped");
            }
            // The store already logged the drop.
            InsertOutcome::UnknownSubject => {}
        }
    }
    delivered
}

/// Split a batch by the server's verdicts, preserving queue order among
/// the survivors.
///
/// A command with no matching response entry, an entry without a result,
/// or an explicit `"retry"` goes back in the queue; any other result is
/// terminal success and the command is dropped.
fn classify_retries(
    state: &InstanceState,
    commands: Vec<Command>,
    responses: &[CommandResponse],
) -> Vec<Command> {
    let mut retries = Vec::new();
    for (index, command) in commands.into_iter().enumerate() {
        let retry = responses
            .get(index)
            .map_or(true, CommandResponse::requests_retry);
        if retry {
            retries.push(shrink_retried_subscribe(state, command));
        }
    }
    retries
}

/// A subscribe retried after messages arrived locally does not need to
/// re-request history the store already holds: drop the bulk replay hint
/// and advance `last_id` to the local high-water mark. Pure bandwidth
/// optimization; which messages eventually arrive is unchanged.
fn shrink_retried_subscribe(state: &InstanceState, command: Command) -> Command {
    match command {
        Command::Subscribe(mut args) => {
            if let Some(last) = state.store.last_message(&args.subject) {
                if last.id > args.last_id.unwrap_or(0) {
                    tracing::debug!(subject = %args.subject, last_id = last.id, "shrinking retried subscribe");
                    args.messages = None;
                    args.last_id = Some(last.id);
                }
            }
            Command::Subscribe(args)
        }
        other => other,
    }
}
