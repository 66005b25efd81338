//! Publish/subscribe registry.
//!
//! Listeners are addressed by the [`ListenerId`] handle returned from
//! `subscribe`; the handle is the unsubscribe capability. Emission takes a
//! snapshot of the persistent listeners and re-checks each one for
//! continued registration right before invoking it, so a handler may
//! subscribe or unsubscribe anything (itself included) mid-emission:
//! removed siblings are suppressed, additions fire from the next publish.
//! Once-listeners are drained from the registry as a batch before any of
//! them runs.
//!
//! A listener that fails is reported through the log and never aborts the
//! emission or the surrounding tick.

use std::cell::RefCell;
use std::rc::Rc;

use log::{error, warn};
use rustc_hash::FxHashMap;

use crate::events::EventData;

/// Handle identifying one subscription on one event. Returned by
/// [`EventBus::subscribe`] and consumed by [`EventBus::unsubscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Callback = Rc<RefCell<dyn FnMut(&EventData) -> Result<(), String>>>;

struct Listener {
    id: ListenerId,
    callback: Callback,
}

#[derive(Default)]
struct Registry {
    listeners: FxHashMap<String, Vec<Listener>>,
    once: FxHashMap<String, Vec<Listener>>,
    next_id: u64,
}

impl Registry {
    fn issue_id(&mut self) -> ListenerId {
        self.next_id += 1;
        ListenerId(self.next_id)
    }

    fn contains(&self, event: &str, id: ListenerId) -> bool {
        self.listeners
            .get(event)
            .is_some_and(|list| list.iter().any(|l| l.id == id))
    }
}

/// Process-local publish/subscribe bus. Shared as `Rc<EventBus>` and
/// injected into every consumer; interior mutability keeps `subscribe`
/// callable from inside a running handler.
pub struct EventBus {
    registry: RefCell<Registry>,
}

impl EventBus {
    pub fn new() -> Self {
        EventBus {
            registry: RefCell::new(Registry::default()),
        }
    }

    /// Register a persistent listener for `event`. Each call registers one
    /// listener; the returned handle removes exactly that registration.
    pub fn subscribe<F>(&self, event: impl Into<String>, callback: F) -> ListenerId
    where
        F: FnMut(&EventData) -> Result<(), String> + 'static,
    {
        let mut registry = self.registry.borrow_mut();
        let id = registry.issue_id();
        registry.listeners.entry(event.into()).or_default().push(Listener {
            id,
            callback: Rc::new(RefCell::new(callback)),
        });
        id
    }

    /// Register a listener that fires on the first publish of `event` only.
    pub fn subscribe_once<F>(&self, event: impl Into<String>, callback: F) -> ListenerId
    where
        F: FnMut(&EventData) -> Result<(), String> + 'static,
    {
        let mut registry = self.registry.borrow_mut();
        let id = registry.issue_id();
        registry.once.entry(event.into()).or_default().push(Listener {
            id,
            callback: Rc::new(RefCell::new(callback)),
        });
        id
    }

    /// Remove a listener from both the persistent and once registries for
    /// `event`. Returns whether anything was removed; absent ids are a no-op.
    pub fn unsubscribe(&self, event: &str, id: ListenerId) -> bool {
        let mut registry = self.registry.borrow_mut();
        let registry = &mut *registry;
        let mut removed = false;
        for map in [&mut registry.listeners, &mut registry.once] {
            if let Some(list) = map.get_mut(event) {
                let before = list.len();
                list.retain(|l| l.id != id);
                removed |= list.len() != before;
            }
        }
        removed
    }

    /// Deliver `data` to every currently-subscribed listener for `event`:
    /// persistent listeners first, then the once set exactly once.
    pub fn publish(&self, event: &str, data: &EventData) {
        let snapshot: Vec<(ListenerId, Callback)> = {
            let registry = self.registry.borrow();
            registry
                .listeners
                .get(event)
                .map(|list| {
                    list.iter()
                        .map(|l| (l.id, Rc::clone(&l.callback)))
                        .collect()
                })
                .unwrap_or_default()
        };
        for (id, callback) in snapshot {
            // A handler earlier in this emission may have unsubscribed it.
            if !self.registry.borrow().contains(event, id) {
                continue;
            }
            Self::invoke(event, id, &callback, data);
        }

        // Drained as a whole: every once-listener is out of the registry
        // before the first of them runs.
        let drained: Vec<Listener> = self
            .registry
            .borrow_mut()
            .once
            .remove(event)
            .unwrap_or_default();
        for listener in drained {
            Self::invoke(event, listener.id, &listener.callback, data);
        }
    }

    fn invoke(event: &str, id: ListenerId, callback: &Callback, data: &EventData) {
        match callback.try_borrow_mut() {
            Ok(mut f) => {
                if let Err(e) = f(data) {
                    error!("listener {:?} for `{}` failed: {}", id, event, e);
                }
            }
            // The callback is already running further up the stack.
            Err(_) => warn!("skipped re-entrant listener {:?} for `{}`", id, event),
        }
    }

    /// Remove all listeners for one event.
    pub fn clear(&self, event: &str) {
        let mut registry = self.registry.borrow_mut();
        registry.listeners.remove(event);
        registry.once.remove(event);
    }

    /// Remove all listeners for all events.
    pub fn clear_all(&self) {
        let mut registry = self.registry.borrow_mut();
        registry.listeners.clear();
        registry.once.clear();
    }

    /// Number of listeners (persistent + once) registered for `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        let registry = self.registry.borrow();
        registry.listeners.get(event).map_or(0, Vec::len)
            + registry.once.get(event).map_or(0, Vec::len)
    }

    pub fn has_listeners(&self, event: &str) -> bool {
        self.listener_count(event) > 0
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
