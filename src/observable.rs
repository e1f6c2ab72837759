//! Publish/subscribe subjects for session state.
//!
//! DESIGN
//! ======
//! A `Subject` fans every published value out to one unbounded channel per
//! subscriber, so each subscriber observes values in publish order. Two
//! behaviors compose on top of that:
//!
//! - `replay_last`: a new subscriber immediately receives the latest value.
//! - `distinct_until_changed`: a value equal to the last one delivered to a
//!   given subscriber is not delivered to it again.
//!
//! Subscribers whose receiving half was dropped are pruned on the next publish.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;

#[cfg(test)]
#[path = "observable_test.rs"]
mod tests;

// =============================================================================
// SUBJECT
// =============================================================================

pub struct Subject<T> {
    replay: bool,
    distinct: bool,
    inner: Mutex<Inner<T>>,
}

struct Inner<T> {
    latest: Option<T>,
    subscribers: Vec<Slot<T>>,
}

struct Slot<T> {
    tx: mpsc::UnboundedSender<T>,
    /// Only tracked for distinct subjects.
    last_delivered: Option<T>,
}

impl<T: Clone + PartialEq> Slot<T> {
    /// Returns `false` once the subscriber has gone away.
    fn deliver(&mut self, value: &T, distinct: bool) -> bool {
        if distinct && self.last_delivered.as_ref() == Some(value) {
            return !self.tx.is_closed();
        }
        if self.tx.send(value.clone()).is_err() {
            return false;
        }
        if distinct {
            self.last_delivered = Some(value.clone());
        }
        true
    }
}

impl<T: Clone + PartialEq> Subject<T> {
    /// Subject with no value until the first publish.
    #[must_use]
    pub fn new() -> Self {
        Self::from_latest(None)
    }

    /// Subject whose latest value starts as `value`.
    #[must_use]
    pub fn with_initial(value: T) -> Self {
        Self::from_latest(Some(value))
    }

    fn from_latest(latest: Option<T>) -> Self {
        Self { replay: false, distinct: false, inner: Mutex::new(Inner { latest, subscribers: Vec::new() }) }
    }

    /// Hand the latest value to every new subscriber.
    #[must_use]
    pub fn replay_last(mut self) -> Self {
        self.replay = true;
        self
    }

    /// Suppress consecutive duplicates per subscriber.
    #[must_use]
    pub fn distinct_until_changed(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Publish `value` to all live subscribers and record it as the latest.
    pub fn publish(&self, value: T) {
        let distinct = self.distinct;
        let mut inner = self.lock();
        inner
            .subscribers
            .retain_mut(|slot| slot.deliver(&value, distinct));
        inner.latest = Some(value);
    }

    pub fn subscribe(&self) -> Subscription<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut slot = Slot { tx, last_delivered: None };
        let mut inner = self.lock();
        if self.replay {
            if let Some(latest) = inner.latest.clone() {
                slot.deliver(&latest, self.distinct);
            }
        }
        inner.subscribers.push(slot);
        Subscription { rx }
    }

    /// Latest published (or initial) value, without subscribing.
    #[must_use]
    pub fn latest(&self) -> Option<T> {
        self.lock().latest.clone()
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        let mut inner = self.lock();
        inner.subscribers.retain(|slot| !slot.tx.is_closed());
        inner.subscribers.len()
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone + PartialEq> Default for Subject<T> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// SUBSCRIPTION
// =============================================================================

/// Receiving end of a [`Subject`]. Dropping it unsubscribes.
pub struct Subscription<T> {
    rx: mpsc::UnboundedReceiver<T>,
}

impl<T> Subscription<T> {
    /// Wait for the next value. Returns `None` once the subject is dropped.
    pub async fn next(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Next already-published value, if any.
    pub fn try_next(&mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }

    /// All values published since the last read.
    pub fn drain(&mut self) -> Vec<T> {
        let mut values = Vec::new();
        while let Some(value) = self.try_next() {
            values.push(value);
        }
        values
    }
}
