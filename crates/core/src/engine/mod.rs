//! Synchronous, ordered, fault-isolating event dispatch.
//!
//! Listeners register per [`EventCategory`]. `dispatch` snapshots the
//! listeners of the event's category under the registry lock, releases the
//! lock, then calls each listener in registration order on the calling
//! thread. A listener that returns an error or panics is logged and skipped;
//! the remaining listeners still receive the event.
//!
//! Registration changes made while a dispatch is in flight do not affect
//! that dispatch: a listener removed concurrently may still receive the one
//! event whose snapshot already included it.

use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error};

use crate::domain::events::{Event, EventCategory, EventKind};
use crate::domain::source::EventSource;

/// Something that wants to hear about events.
pub trait Listener: Send + Sync {
    fn on_event(&self, event: &Event) -> anyhow::Result<()>;
}

impl<F> Listener for F
where
    F: Fn(&Event) -> anyhow::Result<()> + Send + Sync,
{
    fn on_event(&self, event: &Event) -> anyhow::Result<()> {
        self(event)
    }
}

/// Handle returned by registration, used to unregister
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl std::fmt::Display for ListenerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

struct Registration {
    id: ListenerId,
    listener: Arc<dyn Listener>,
}

/// What happened during one dispatch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub faults: usize,
}

/// Listener table plus an identity index so registration is a lookup
#[derive(Default)]
struct Registry {
    categories: HashMap<EventCategory, Vec<Registration>>,
    /// `Arc` data address of each registered listener
    by_address: HashMap<usize, ListenerId>,
    handles: HashMap<ListenerId, Handle>,
}

struct Handle {
    address: usize,
    categories: HashSet<EventCategory>,
}

impl Registry {
    fn insert(
        &mut self,
        category: EventCategory,
        listener: Arc<dyn Listener>,
        new_id: impl FnOnce() -> ListenerId,
    ) -> ListenerId {
        let address = listener_address(&listener);
        let id = match self.by_address.get(&address) {
            Some(&id) => id,
            None => {
                let id = new_id();
                self.by_address.insert(address, id);
                self.handles.insert(
                    id,
                    Handle {
                        address,
                        categories: HashSet::new(),
                    },
                );
                id
            }
        };

        let newly_added = self
            .handles
            .get_mut(&id)
            .is_some_and(|handle| handle.categories.insert(category));
        if newly_added {
            self.categories
                .entry(category)
                .or_default()
                .push(Registration { id, listener });
        }
        id
    }

    fn remove(&mut self, category: EventCategory, id: ListenerId) -> bool {
        let removed = self
            .handles
            .get_mut(&id)
            .is_some_and(|handle| handle.categories.remove(&category));
        if !removed {
            return false;
        }

        if let Some(entries) = self.categories.get_mut(&category) {
            entries.retain(|r| r.id != id);
            if entries.is_empty() {
                self.categories.remove(&category);
            }
        }
        self.forget_if_unused(id);
        true
    }

    fn remove_all(&mut self, id: ListenerId) -> usize {
        let categories: Vec<EventCategory> = match self.handles.get(&id) {
            Some(handle) => handle.categories.iter().copied().collect(),
            None => return 0,
        };
        categories
            .into_iter()
            .filter(|&category| self.remove(category, id))
            .count()
    }

    fn forget_if_unused(&mut self, id: ListenerId) {
        let unused = self
            .handles
            .get(&id)
            .is_some_and(|handle| handle.categories.is_empty());
        if unused {
            if let Some(handle) = self.handles.remove(&id) {
                self.by_address.remove(&handle.address);
            }
        }
    }
}

#[derive(Default)]
pub struct EventEngine {
    registry: Mutex<Registry>,
    next_id: AtomicU64,
    faults: AtomicU64,
}

impl EventEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for `category`.
    ///
    /// Registering the same listener (by identity) twice for a category does
    /// not double-deliver; the existing handle is returned instead.
    pub fn register(&self, category: EventCategory, listener: Arc<dyn Listener>) -> ListenerId {
        let id = self.registry().insert(category, listener, || {
            ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed))
        });
        debug!("Registered {} for {:?}", id, category);
        id
    }

    /// Register one listener for several categories under a single handle.
    pub fn register_all(
        &self,
        categories: &[EventCategory],
        listener: Arc<dyn Listener>,
    ) -> Option<ListenerId> {
        let mut id = None;
        for &category in categories {
            id = Some(self.register(category, listener.clone()));
        }
        id
    }

    /// Remove the listener from one category. Returns whether it was registered.
    pub fn unregister(&self, category: EventCategory, id: ListenerId) -> bool {
        self.registry().remove(category, id)
    }

    /// Remove the listener from every category. Returns how many it left.
    pub fn unregister_all(&self, id: ListenerId) -> usize {
        self.registry().remove_all(id)
    }

    pub fn listener_count(&self, category: EventCategory) -> usize {
        self.registry().categories.get(&category).map_or(0, Vec::len)
    }

    /// Total listener faults seen since the engine was created.
    pub fn fault_count(&self) -> u64 {
        self.faults.load(Ordering::Relaxed)
    }

    /// Build an event from `source` and `kind` and dispatch it.
    pub fn fire(&self, source: &EventSource, kind: EventKind) -> DispatchReport {
        self.dispatch(Event::new(source.clone(), kind))
    }

    /// Deliver `event` to every listener of its category, in registration
    /// order, on the calling thread.
    pub fn dispatch(&self, event: Event) -> DispatchReport {
        let category = event.category();
        let snapshot: Vec<(ListenerId, Arc<dyn Listener>)> = self
            .registry()
            .categories
            .get(&category)
            .map(|entries| {
                entries
                    .iter()
                    .map(|r| (r.id, r.listener.clone()))
                    .collect()
            })
            .unwrap_or_default();

        let mut report = DispatchReport::default();
        for (id, listener) in snapshot {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| listener.on_event(&event)));
            match outcome {
                Ok(Ok(())) => report.delivered += 1,
                Ok(Err(e)) => {
                    error!("{} failed handling {:?} event: {:#}", id, category, e);
                    report.faults += 1;
                }
                Err(payload) => {
                    error!(
                        "{} panicked handling {:?} event: {}",
                        id,
                        category,
                        panic_message(payload.as_ref())
                    );
                    report.faults += 1;
                }
            }
        }

        if report.faults > 0 {
            self.faults
                .fetch_add(report.faults as u64, Ordering::Relaxed);
        }
        report
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        // Listener code never runs under this lock, so a poisoned registry
        // still holds consistent data.
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn listener_address(listener: &Arc<dyn Listener>) -> usize {
    Arc::as_ptr(listener) as *const () as usize
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
