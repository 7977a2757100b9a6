//! Shared instance state guarded by a single lock.

use crate::backoff::Backoff;
use msgsync_core::SubscriptionStore;
use msgsync_proto::Command;
use parking_lot::Mutex;
use tokio::sync::Notify;

/// Counters describing the engine's progress.
///
/// The only observable status surface: batch outcomes accumulate here
/// instead of driving connectivity callbacks.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Batches attempted, successful or not
    pub cycles_completed: u64,
    /// Commands terminally acknowledged by the server
    pub commands_acknowledged: u64,
    /// Commands re-queued for another attempt
    pub commands_retried: u64,
    /// Messages newly stored from server events
    pub messages_stored: u64,
    /// Most recent whole-batch failure, cleared by the next success
    pub last_error: Option<String>,
}

/// Everything both actors touch.
///
/// Mutated only through [`Shared::state`], so queue-swap-for-batch and
/// facade mutations are atomic with respect to each other.
#[derive(Debug)]
pub(crate) struct InstanceState {
    /// Server-assigned session identity, written only by the sync loop
    pub profile: Option<String>,
    /// Subscriptions and their message histories
    pub store: SubscriptionStore,
    /// Commands awaiting transmission, in insertion order
    pub queue: Vec<Command>,
    /// Wait interval for the next cycle
    pub backoff: Backoff,
    /// Cooperative shutdown flag; the loop exits at its next wake
    pub shutdown: bool,
    /// Progress counters
    pub stats: SyncStats,
}

impl InstanceState {
    pub fn new() -> Self {
        Self {
            profile: None,
            store: SubscriptionStore::new(),
            queue: Vec::new(),
            backoff: Backoff::new(),
            shutdown: false,
            stats: SyncStats::default(),
        }
    }
}

/// The lock and wake signal shared by the facade and the sync loop.
#[derive(Debug)]
pub(crate) struct Shared {
    pub state: Mutex<InstanceState>,
    pub wake: Notify,
}

impl Shared {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(InstanceState::new()),
            wake: Notify::new(),
        }
    }

    /// Queue a command for the next batch and wake the loop immediately.
    pub fn enqueue(&self, command: Command) {
        {
            let mut state = self.state.lock();
            state.queue.push(command);
            state.backoff.reset();
        }
        self.wake.notify_one();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use msgsync_core::Subject;

    #[test]
    fn enqueue_resets_backoff() {
        let shared = Shared::new();
        shared.state.lock().backoff.advance();

        shared.enqueue(Command::unsubscribe(Subject::new("room1")));

        let state = shared.state.lock();
        assert_eq!(state.queue.len(), 1);
        assert_eq!(state.backoff.current(), std::time::Duration::ZERO);
    }

    #[test]
    fn enqueue_preserves_insertion_order() {
        let shared = Shared::new();
        shared.enqueue(Command::subscribe(Subject::new("a"), None, None));
        shared.enqueue(Command::subscribe(Subject::new("b"), None, None));
        shared.enqueue(Command::unsubscribe(Subject::new("a")));

        let state = shared.state.lock();
        let names: Vec<&str> = state.queue.iter().map(msgsync_proto::Command::name).collect();
        let subjects: Vec<&str> = state
            .queue
            .iter()
            .map(|c| c.subject().name.as_str())
            .collect();
        assert_eq!(names, vec!["subscribe", "subscribe", "unsubscribe"]);
        assert_eq!(subjects, vec!["a", "b", "a"]);
    }
}
