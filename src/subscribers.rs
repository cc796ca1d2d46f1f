//! Multicast subscriber lists.
//!
//! Each channel owns a few of these: a list of callbacks invoked in
//! subscription order when the channel fires. A panicking subscriber is
//! isolated — it is reported and the remaining subscribers still run.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// Handle identifying one subscription within a [`SubscriberSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback<A> = Arc<dyn Fn(&A) + Send + Sync>;

/// An ordered multicast list of callbacks taking `&A`.
pub struct SubscriberSet<A> {
    entries: RwLock<Vec<(SubscriptionId, Callback<A>)>>,
    next_id: AtomicU64,
}

impl<A> Default for SubscriberSet<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> SubscriberSet<A> {
    /// Create an empty set.
    pub fn new() -> Self {
        SubscriberSet {
            entries: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Append a subscriber; it fires on every subsequent [`notify`].
    ///
    /// [`notify`]: SubscriberSet::notify
    pub fn subscribe(&self, callback: impl Fn(&A) + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries
            .write()
            .expect("subscriber set lock poisoned")
            .push((id, Arc::new(callback)));
        id
    }

    /// Remove a subscriber. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.entries
            .write()
            .expect("subscriber set lock poisoned")
            .retain(|(entry_id, _)| *entry_id != id);
    }

    /// Number of live subscriptions.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .expect("subscriber set lock poisoned")
            .len()
    }

    /// Whether the set has no subscribers.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke every subscriber with `arg`, isolating per-subscriber panics.
    ///
    /// The callback list is cloned out of the lock first, so subscribers may
    /// themselves subscribe or unsubscribe without deadlocking.
    pub fn notify(&self, arg: &A) {
        let callbacks: Vec<Callback<A>> = self
            .entries
            .read()
            .expect("subscriber set lock poisoned")
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();

        for callback in callbacks {
            if catch_unwind(AssertUnwindSafe(|| callback(arg))).is_err() {
                tracing::warn!("subscriber panicked; remaining subscribers still fire");
            }
        }
    }
}

impl<A> std::fmt::Debug for SubscriberSet<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriberSet")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn notifies_in_subscription_order() {
        let set: SubscriberSet<i32> = SubscriberSet::new();
        let log = Arc::new(RwLock::new(Vec::new()));

        for label in ["a", "b"] {
            let log = Arc::clone(&log);
            set.subscribe(move |v: &i32| log.write().unwrap().push(format!("{label}:{v}")));
        }

        set.notify(&1);
        assert_eq!(*log.read().unwrap(), vec!["a:1", "b:1"]);
    }

    #[test]
    fn unsubscribe_removes_only_that_entry() {
        let set: SubscriberSet<()> = SubscriberSet::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let hits_a = Arc::clone(&hits);
        let a = set.subscribe(move |_| {
            hits_a.fetch_add(1, Ordering::SeqCst);
        });
        let hits_b = Arc::clone(&hits);
        set.subscribe(move |_| {
            hits_b.fetch_add(10, Ordering::SeqCst);
        });

        set.unsubscribe(a);
        set.notify(&());
        assert_eq!(hits.load(Ordering::SeqCst), 10);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn panicking_subscriber_does_not_stop_the_rest() {
        let set: SubscriberSet<()> = SubscriberSet::new();
        let hits = Arc::new(AtomicUsize::new(0));

        set.subscribe(|_| panic!("boom"));
        let hits_clone = Arc::clone(&hits);
        set.subscribe(move |_| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });

        set.notify(&());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
