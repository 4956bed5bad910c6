// MIT License - Copyright (c) 2026 The kb-link Authors

use std::collections::BTreeMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::error;

use crate::protocol::StatusVector;

/// Events emitted by a panel controller.
///
/// Users subscribe via `panel.subscribe()` to receive a
/// `tokio::sync::broadcast::Receiver<PanelEvent>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelEvent {
    /// The panel reported its full status vector
    StatusSynced(StatusVector),
    /// A card was presented to the reader
    CardScanned { card_id: String },
    /// The read task stopped; the controller no longer receives anything
    LinkDown { reason: String },
}

/// Type alias for the broadcast sender.
pub type EventSender = tokio::sync::broadcast::Sender<PanelEvent>;

/// Type alias for the broadcast receiver.
pub type EventReceiver = tokio::sync::broadcast::Receiver<PanelEvent>;

/// Create a new event channel with the given capacity.
pub fn event_channel(capacity: usize) -> (EventSender, EventReceiver) {
    tokio::sync::broadcast::channel(capacity)
}

/// Card-scan callback. Runs on the panel's read task and must return quickly.
pub type Listener = Arc<dyn Fn(&str) + Send + Sync>;

/// Handle returned by listener registration, used to remove it again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

/// Set of card-scan listeners, de-duplicated by `Arc` identity.
#[derive(Default)]
pub struct ListenerRegistry {
    next_id: AtomicU64,
    listeners: Mutex<BTreeMap<ListenerId, Listener>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Registering the same `Arc` again returns the
    /// existing id and does not add a second entry.
    pub fn add(&self, listener: Listener) -> ListenerId {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((id, _)) = listeners
            .iter()
            .find(|(_, existing)| Arc::ptr_eq(existing, &listener))
        {
            return *id;
        }
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        listeners.insert(id, listener);
        id
    }

    /// Returns true if a listener was removed.
    pub fn remove(&self, id: ListenerId) -> bool {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Call every registered listener with `card_id`.
    ///
    /// The set is copied before dispatch so a listener may register or
    /// remove listeners without deadlocking. A listener that panics is
    /// logged and skipped; the remaining listeners still run.
    pub fn dispatch(&self, card_id: &str) {
        let snapshot: Vec<Listener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        for listener in snapshot {
            if catch_unwind(AssertUnwindSafe(|| listener(card_id))).is_err() {
                error!("Card listener panicked while handling {}", card_id);
            }
        }
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.len())
            .finish()
    }
}
