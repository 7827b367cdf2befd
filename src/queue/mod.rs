//! Inter-agent message queue
//!
//! Plain FIFO, unbounded, in-memory. `send` may be called concurrently from
//! task-completion callbacks; `drain`/`clear` assume a single consumer.

use crate::models::AgentMessage;
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Default)]
pub struct MessageQueue {
    inner: Mutex<VecDeque<AgentMessage>>,
}

impl MessageQueue {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(VecDeque::new()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<AgentMessage>> {
        // A poisoned lock only means a sender panicked mid-push; the queue
        // itself is still structurally sound.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Enqueue a message. `metadata.priority` is carried but does not affect
    /// ordering; delivery is strictly FIFO.
    pub fn send(&self, message: AgentMessage) {
        self.lock().push_back(message);
    }

    /// Remove and return every queued message in arrival order.
    pub fn drain(&self) -> Vec<AgentMessage> {
        self.lock().drain(..).collect()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
