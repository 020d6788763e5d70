//! Live subscriptions delivering ordered snapshots.
//!
//! A [`Subscription`] is the stream form: the owner pulls snapshots with
//! `next().await`. [`Subscription::into_callback`] turns it into the callback
//! form, driven by a spawned task and released through a [`SubscriptionHandle`].

use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::task::JoinHandle;

use crate::domain::{Message, PresenceRecord, ValueWatch};

/// Snapshots of a room's messages, ascending by timestamp
pub type MessageSubscription = Subscription<Message>;

/// Snapshots of every presence record
pub type PresenceSubscription = Subscription<PresenceRecord>;

/// Stream of decoded snapshots of one store path
pub struct Subscription<T> {
    label: String,
    watch: ValueWatch,
    decode: fn(Option<Value>) -> Vec<T>,
    cancelled: bool,
}

impl<T> Subscription<T> {
    pub(crate) fn new(
        label: impl Into<String>,
        watch: ValueWatch,
        decode: fn(Option<Value>) -> Vec<T>,
    ) -> Self {
        Self {
            label: label.into(),
            watch,
            decode,
            cancelled: false,
        }
    }

    /// Wait for the next snapshot.
    ///
    /// Returns `None` once cancelled, or when the store closed the watch.
    pub async fn next(&mut self) -> Option<Vec<T>> {
        if self.cancelled {
            return None;
        }
        let value = self.watch.recv().await?;
        Some((self.decode)(value))
    }

    /// Detach from the store. Safe to call any number of times.
    pub fn cancel(&mut self) {
        if self.cancelled {
            return;
        }
        self.cancelled = true;
        self.watch.close();
        tracing::debug!("Subscription to '{}' cancelled", self.label);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Store path this subscription watches
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl<T: Send + 'static> Subscription<T> {
    /// Deliver every snapshot to `on_update` from a background task.
    ///
    /// `on_update` must not cancel its own handle.
    pub fn into_callback<F>(mut self, mut on_update: F) -> SubscriptionHandle
    where
        F: FnMut(Vec<T>) + Send + 'static,
    {
        let active = Arc::new(Mutex::new(true));
        let gate = Arc::clone(&active);
        let label = self.label.clone();

        let task = tokio::spawn(async move {
            while let Some(snapshot) = self.next().await {
                let active = gate.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                if !*active {
                    break;
                }
                on_update(snapshot);
            }
            self.cancel();
        });

        SubscriptionHandle {
            label,
            active,
            task,
        }
    }
}

/// Cancellation handle of a callback subscription
pub struct SubscriptionHandle {
    label: String,
    active: Arc<Mutex<bool>>,
    task: JoinHandle<()>,
}

impl SubscriptionHandle {
    /// Stop callbacks. No callback starts after this returns; safe to call
    /// any number of times.
    pub fn cancel(&self) {
        let mut active = self
            .active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if *active {
            *active = false;
            self.task.abort();
            tracing::debug!("Callback subscription to '{}' cancelled", self.label);
        }
    }

    pub fn is_active(&self) -> bool {
        *self
            .active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}
