//! Client facade: subscribe, publish, and query the local view.

use crate::config::ClientConfig;
use crate::engine::SyncLoop;
use crate::state::{Shared, SyncStats};
use msgsync_core::{Message, Subject};
use msgsync_proto::Command;
use msgsync_transport::{HttpTransport, HttpTransportConfig, RpcTransport, TransportError};
use std::sync::Arc;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Callback invoked from the sync loop's task for each newly stored
/// message. Keep it quick; the loop does not continue until it returns.
pub type MessageCallback = Box<dyn Fn(&Message) + Send + Sync + 'static>;

/// Hooks into the engine's background activity.
#[derive(Default)]
pub struct ClientCallbacks {
    /// Invoked at most once per distinct message id per subject, after the
    /// message is stored
    pub message: Option<MessageCallback>,
}

impl ClientCallbacks {
    /// No callbacks.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Callbacks with just a message handler.
    #[must_use]
    pub fn on_message(handler: impl Fn(&Message) + Send + Sync + 'static) -> Self {
        Self {
            message: Some(Box::new(handler)),
        }
    }
}

/// Errors surfaced when creating a client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The transport could not be constructed
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Handle to one synchronized client instance.
///
/// Mutations are fire-and-forget: they queue a command, wake the
/// background loop, and return without touching the network. The loop
/// retries silently, indefinitely, until the server applies each command;
/// there is no per-command completion signal. Queries read the locally
/// materialized view.
pub struct SyncClient {
    shared: Arc<Shared>,
    task: Option<JoinHandle<()>>,
}

impl SyncClient {
    /// Connect to the service and start the background sync loop.
    ///
    /// Must be called within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns error if the base URL is not valid HTTPS or the HTTP client
    /// cannot be created.
    pub fn new(config: ClientConfig, callbacks: ClientCallbacks) -> Result<Self, ClientError> {
        let transport = HttpTransport::new(
            HttpTransportConfig::new(config.base_url.clone()).with_timeout(config.timeout),
        )?;
        Ok(Self::with_transport(config, callbacks, transport))
    }

    /// Start a client over a caller-supplied transport.
    pub fn with_transport<T: RpcTransport + 'static>(
        config: ClientConfig,
        callbacks: ClientCallbacks,
        transport: T,
    ) -> Self {
        let shared = Arc::new(Shared::new());
        let instance_id = Uuid::new_v4();
        tracing::debug!(client_id = %config.client_id, %instance_id, "starting sync loop");

        let engine = SyncLoop::new(
            Arc::clone(&shared),
            transport,
            config.client_id,
            instance_id,
            callbacks.message,
        );
        let task = tokio::spawn(engine.run());

        Self {
            shared,
            task: Some(task),
        }
    }

    /// Subscribe to a subject.
    ///
    /// `messages` asks the server to replay that many recent messages;
    /// `last_id` asks for everything after a known id. A structurally
    /// equal subject reuses the existing local subscription, but the
    /// command is queued either way so the server sees every registration.
    pub fn subscribe(&self, subject: &Subject, messages: Option<u64>, last_id: Option<u64>) {
        {
            let mut state = self.shared.state.lock();
            state.store.subscribe(subject);
        }
        self.shared
            .enqueue(Command::subscribe(subject.clone(), messages, last_id));
    }

    /// Drop the subscription for a subject and tell the server.
    ///
    /// Locally cached history for the subject is discarded immediately.
    pub fn unsubscribe(&self, subject: &Subject) {
        {
            let mut state = self.shared.state.lock();
            state.store.unsubscribe(subject);
        }
        self.shared.enqueue(Command::unsubscribe(subject.clone()));
    }

    /// Publish an encoded payload to a subject.
    ///
    /// A fresh sender message id is attached so the server can deduplicate
    /// the publish across retries. Returns once the command is queued.
    pub fn send_message(&self, subject: &Subject, payload: impl Into<String>) {
        self.shared
            .enqueue(Command::send_message(subject.clone(), payload, Uuid::new_v4()));
    }

    /// Local history for a subject, oldest first.
    ///
    /// Empty when the subject has no subscription; that is not an error.
    #[must_use]
    pub fn messages(&self, subject: &Subject) -> Vec<Message> {
        self.shared.state.lock().store.messages(subject)
    }

    /// Highest-id locally stored message for a subject, if any.
    #[must_use]
    pub fn last_message(&self, subject: &Subject) -> Option<Message> {
        self.shared.state.lock().store.last_message(subject)
    }

    /// Server-assigned session identity, once a response has carried one.
    #[must_use]
    pub fn current_profile(&self) -> Option<String> {
        self.shared.state.lock().profile.clone()
    }

    /// Number of commands waiting to be applied by the server.
    #[must_use]
    pub fn pending_commands(&self) -> usize {
        self.shared.state.lock().queue.len()
    }

    /// Engine progress counters.
    #[must_use]
    pub fn stats(&self) -> SyncStats {
        self.shared.state.lock().stats.clone()
    }

    /// Stop the background loop and wait for it to exit.
    ///
    /// Commands still queued are dropped; unsent intent does not survive
    /// the instance.
    pub async fn shutdown(mut self) {
        self.request_shutdown();
        if let Some(task) = self.task.take() {
            if let Err(error) = task.await {
                tracing::warn!(error = %error, "sync loop task failed");
            }
        }
    }

    fn request_shutdown(&self) {
        {
            let mut state = self.shared.state.lock();
            state.shutdown = true;
            state.backoff.reset();
        }
        self.shared.wake.notify_one();
    }
}

impl Drop for SyncClient {
    fn drop(&mut self) {
        // Dropped without an explicit shutdown: still stop the loop so the
        // task does not outlive the handle.
        if self.task.is_some() {
            self.request_shutdown();
        }
    }
}
