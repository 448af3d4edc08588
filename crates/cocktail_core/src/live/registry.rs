//! Channel-backed subscriber registry.
//!
//! Each subscriber owns a one-slot channel. A subscriber that stops reading
//! holds at most the newest unread snapshot; publishing replaces the stale one.

use crossbeam::channel::{bounded, Receiver, Sender, TrySendError};
use log::debug;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

/// Registry-unique subscription identifier.
pub type SubscriptionId = u64;

struct RegistryState<T> {
    next_id: SubscriptionId,
    slots: BTreeMap<SubscriptionId, Slot<T>>,
}

/// Write side of one subscriber's single-snapshot channel.
///
/// `stale` shares the subscriber's queue so a publish can evict an unread
/// snapshot before sending the new one.
struct Slot<T> {
    sender: Sender<T>,
    stale: Receiver<T>,
}

impl<T> Slot<T> {
    /// Replaces any unread snapshot with `snapshot`.
    fn replace(&self, mut snapshot: T) -> bool {
        loop {
            match self.sender.try_send(snapshot) {
                Ok(()) => return true,
                Err(TrySendError::Full(rejected)) => {
                    // Empty if the subscriber read it first; the slot is free either way.
                    let _ = self.stale.try_recv();
                    snapshot = rejected;
                }
                Err(TrySendError::Disconnected(_)) => return false,
            }
        }
    }
}

/// Active subscribers of one query shape.
///
/// Subscriptions only hold a weak reference back to the registry; once the
/// registry is dropped every pending `recv` returns `None`.
pub struct SubscriberRegistry<T> {
    query: &'static str,
    state: Arc<Mutex<RegistryState<T>>>,
}

impl<T: Clone> SubscriberRegistry<T> {
    /// Creates an empty registry. `query` names the shape in log events.
    pub fn new(query: &'static str) -> Self {
        Self {
            query,
            state: Arc::new(Mutex::new(RegistryState {
                next_id: 0,
                slots: BTreeMap::new(),
            })),
        }
    }

    /// Registers a subscriber and queues `initial` as its first snapshot.
    pub fn subscribe(&self, initial: T) -> Subscription<T> {
        let (sender, receiver) = bounded(1);
        let slot = Slot {
            sender,
            stale: receiver.clone(),
        };
        slot.replace(initial);

        let mut state = self.state.lock();
        state.next_id += 1;
        let id = state.next_id;
        state.slots.insert(id, slot);
        debug!(
            "event=live_subscribe module=live status=ok query={} subscription_id={} subscribers={}",
            self.query,
            id,
            state.slots.len()
        );

        Subscription {
            id,
            query: self.query,
            receiver,
            registry: Arc::downgrade(&self.state),
        }
    }

    /// Sends `snapshot` to every subscriber, replacing any snapshot it has
    /// not read yet.
    ///
    /// Returns the number of subscribers that received it.
    pub fn publish(&self, snapshot: T) -> usize {
        let mut state = self.state.lock();
        state
            .slots
            .retain(|_, slot| slot.replace(snapshot.clone()));
        state.slots.len()
    }
}

impl<T> SubscriberRegistry<T> {
    pub fn len(&self) -> usize {
        self.state.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().slots.is_empty()
    }
}

/// Receiving side of a live query.
///
/// Holds at most one pending snapshot, always the newest published one.
/// Intermediate snapshots are skipped when the reader falls behind. The
/// subscription ends when dropped or when [`Subscription::unsubscribe`] is
/// called.
pub struct Subscription<T> {
    id: SubscriptionId,
    query: &'static str,
    receiver: Receiver<T>,
    registry: Weak<Mutex<RegistryState<T>>>,
}

impl<T> Subscription<T> {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Blocks until the next snapshot.
    ///
    /// Returns `None` once the owning store is gone and the queue is drained.
    pub fn recv(&self) -> Option<T> {
        self.receiver.recv().ok()
    }

    /// Returns the pending snapshot without blocking.
    pub fn try_recv(&self) -> Option<T> {
        self.receiver.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<T> {
        self.receiver.recv_timeout(timeout).ok()
    }

    /// Drains the pending snapshot, if any.
    pub fn latest(&self) -> Option<T> {
        self.receiver.try_iter().last()
    }

    /// Detaches from the registry.
    pub fn unsubscribe(self) {}
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        let Some(state) = self.registry.upgrade() else {
            return;
        };
        let mut state = state.lock();
        state.slots.remove(&self.id);
        debug!(
            "event=live_unsubscribe module=live status=ok query={} subscription_id={} subscribers={}",
            self.query,
            self.id,
            state.slots.len()
        );
    }
}
