//! Change notifier
//!
//! Ordered, synchronous observer list. Registration order is delivery
//! order. Unsubscription tombstones the slot and compacts lazily, so it
//! stays amortized O(1) without disturbing the order of the survivors.
//! A panicking observer is caught and logged; the rest of the pass still
//! runs.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use ahash::AHashMap;

use crate::eventing::ChangeEvent;

/// Handle returned by `subscribe`, used to unsubscribe
pub type ObserverId = u64;

type Callback = Arc<dyn Fn(&ChangeEvent) + Send + Sync + 'static>;

#[derive(Default)]
struct Observers {
    /// One slot per registration, `None` once unsubscribed
    slots: Vec<(ObserverId, Option<Callback>)>,
    /// Observer id to slot index
    index: AHashMap<ObserverId, usize>,
    /// Tombstoned slot count
    dead: usize,
}

impl Observers {
    /// Drop tombstones and rebuild the index. Slot order is preserved.
    fn compact(&mut self) {
        self.slots.retain(|(_, callback)| callback.is_some());
        self.index.clear();
        for (slot, (id, _)) in self.slots.iter().enumerate() {
            self.index.insert(*id, slot);
        }
        self.dead = 0;
    }
}

/// Synchronous publish/subscribe list for store changes
pub struct ChangeNotifier {
    observers: Mutex<Observers>,
    next_id: AtomicU64,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self {
            observers: Mutex::new(Observers::default()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register an observer. Observers are notified in registration
    /// order, starting with the next publish.
    pub fn subscribe(
        &self,
        callback: impl Fn(&ChangeEvent) + Send + Sync + 'static,
    ) -> ObserverId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut observers = self.lock();
        let slot = observers.slots.len();
        observers.slots.push((id, Some(Arc::new(callback))));
        observers.index.insert(id, slot);
        id
    }

    /// Remove an observer. Returns whether it was registered. Compacts
    /// once tombstones outnumber live slots.
    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        let mut observers = self.lock();
        let Some(slot) = observers.index.remove(&id) else {
            return false;
        };
        observers.slots[slot].1 = None;
        observers.dead += 1;
        if observers.dead * 2 > observers.slots.len() {
            observers.compact();
        }
        true
    }

    /// Live observer count
    pub fn observer_count(&self) -> usize {
        let observers = self.lock();
        observers.slots.len() - observers.dead
    }

    /// Notify every observer on the calling thread.
    ///
    /// The pass runs over a snapshot of the list, so callbacks may
    /// subscribe or unsubscribe freely. Additions take effect from the
    /// next publish; removals take effect at once, so an observer
    /// unsubscribed mid-pass is not invoked for the rest of the pass.
    pub fn publish(&self, event: &ChangeEvent) {
        let snapshot: Vec<(ObserverId, Callback)> = {
            let observers = self.lock();
            observers
                .slots
                .iter()
                .filter_map(|(id, callback)| callback.clone().map(|cb| (*id, cb)))
                .collect()
        };

        for (id, callback) in snapshot {
            // Re-check liveness: an earlier callback in this pass may
            // have unsubscribed this one.
            if !self.lock().index.contains_key(&id) {
                continue;
            }
            if catch_unwind(AssertUnwindSafe(|| callback(event))).is_err() {
                tracing::error!("observer {} panicked during {} event", id, event.kind());
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Observers> {
        self.observers.lock().expect("observer list poisoned")
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("observers", &self.observer_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ids::BusId;

    fn removed_event(id: &str) -> ChangeEvent {
        ChangeEvent::BusRemoved(BusId::new(id))
    }

    #[test]
    fn test_observers_run_in_registration_order() {
        let notifier = ChangeNotifier::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let seen = seen.clone();
            notifier.subscribe(move |_| {
                seen.lock().expect("seen").push(tag);
            });
        }
        notifier.publish(&removed_event("bus-001"));
        assert_eq!(*seen.lock().expect("seen"), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_unsubscribe_stops_delivery_and_keeps_order() {
        let notifier = ChangeNotifier::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut ids = Vec::new();
        for tag in ["a", "b", "c"] {
            let seen = seen.clone();
            ids.push(notifier.subscribe(move |_| {
                seen.lock().expect("seen").push(tag);
            }));
        }
        assert!(notifier.unsubscribe(ids[1]));
        assert!(!notifier.unsubscribe(ids[1]), "second removal is a no-op");
        notifier.publish(&removed_event("bus-001"));
        assert_eq!(*seen.lock().expect("seen"), vec!["a", "c"]);
        assert_eq!(notifier.observer_count(), 2);
    }

    #[test]
    fn test_panicking_observer_does_not_break_the_pass() {
        let notifier = ChangeNotifier::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        {
            let seen = seen.clone();
            notifier.subscribe(move |_| {
                seen.lock().expect("seen").push("before");
            });
        }
        notifier.subscribe(|_| panic!("observer bug"));
        {
            let seen = seen.clone();
            notifier.subscribe(move |_| {
                seen.lock().expect("seen").push("after");
            });
        }
        notifier.publish(&removed_event("bus-001"));
        assert_eq!(*seen.lock().expect("seen"), vec!["before", "after"]);
    }

    #[test]
    fn test_subscribing_during_publish_defers_to_next_pass() {
        let notifier = Arc::new(ChangeNotifier::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let reentrant = notifier.clone();
        let seen_outer = seen.clone();
        notifier.subscribe(move |_| {
            seen_outer.lock().expect("seen").push("outer");
            let seen_inner = seen_outer.clone();
            reentrant.subscribe(move |_| {
                seen_inner.lock().expect("seen").push("inner");
            });
        });
        notifier.publish(&removed_event("bus-001"));
        assert_eq!(*seen.lock().expect("seen"), vec!["outer"]);
        seen.lock().expect("seen").clear();
        notifier.publish(&removed_event("bus-002"));
        assert_eq!(*seen.lock().expect("seen"), vec!["outer", "inner"]);
    }

    #[test]
    fn test_unsubscribing_during_publish_takes_effect_at_once() {
        let notifier = Arc::new(ChangeNotifier::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let victim = Arc::new(Mutex::new(None));

        let reentrant = notifier.clone();
        let seen_first = seen.clone();
        let victim_slot = victim.clone();
        notifier.subscribe(move |_| {
            seen_first.lock().expect("seen").push("first");
            if let Some(id) = victim_slot.lock().expect("victim").take() {
                reentrant.unsubscribe(id);
            }
        });
        let seen_second = seen.clone();
        let second = notifier.subscribe(move |_| {
            seen_second.lock().expect("seen").push("second");
        });
        *victim.lock().expect("victim") = Some(second);

        // The second observer is removed while the pass that would have
        // reached it is still running
        notifier.publish(&removed_event("bus-001"));
        assert_eq!(*seen.lock().expect("seen"), vec!["first"]);
        assert_eq!(notifier.observer_count(), 1);

        notifier.publish(&removed_event("bus-002"));
        assert_eq!(*seen.lock().expect("seen"), vec!["first", "first"]);
    }

    #[test]
    fn test_compaction_preserves_survivor_order() {
        let notifier = ChangeNotifier::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut ids = Vec::new();
        for tag in ["a", "b", "c", "d", "e"] {
            let seen = seen.clone();
            ids.push(notifier.subscribe(move |_| {
                seen.lock().expect("seen").push(tag);
            }));
        }
        // Enough removals to trip compaction
        assert!(notifier.unsubscribe(ids[0]));
        assert!(notifier.unsubscribe(ids[2]));
        assert!(notifier.unsubscribe(ids[3]));
        assert_eq!(notifier.observer_count(), 2);
        notifier.publish(&removed_event("bus-001"));
        assert_eq!(*seen.lock().expect("seen"), vec!["b", "e"]);
    }
}
