//! Dispatch endpoints and the single/collection target variant.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::trace;
use uuid::Uuid;

use crate::error::HandlerError;
use crate::types::Event;

/// Listener callback, invoked synchronously for every matching
/// dispatch. The first `Err` aborts the rest of that dispatch.
pub type Callback = Arc<dyn Fn(&Event) -> Result<(), HandlerError> + Send + Sync>;

struct ListenerEntry {
    callback: Callback,
    capture: bool,
}

struct TargetInner {
    id: Uuid,
    listeners: Mutex<HashMap<String, Vec<ListenerEntry>>>,
}

/// An addressable dispatch endpoint owning its listener registry.
///
/// Handles are cheap clones sharing the same registry. The bus's
/// shared channel is one of these, owned by the bus itself; every
/// other target is owned by the surrounding application.
#[derive(Clone)]
pub struct EventTarget {
    inner: Arc<TargetInner>,
}

impl EventTarget {
    /// Create a fresh endpoint with an empty registry.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(TargetInner {
                id: Uuid::new_v4(),
                listeners: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Stable identity of this endpoint, shared by all clones.
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Register a listener for `event_name`.
    ///
    /// Registrations are not de-duplicated: adding the same
    /// (name, callback, capture) triple twice means two invocations
    /// per matching dispatch. There is no removal handle.
    pub fn add_listener(&self, event_name: impl Into<String>, callback: Callback, capture: bool) {
        let event_name = event_name.into();
        trace!(target_id = %self.inner.id, event = %event_name, capture, "listener attached");
        self.lock_listeners()
            .entry(event_name)
            .or_default()
            .push(ListenerEntry { callback, capture });
    }

    /// Number of listeners currently registered, across all names.
    pub fn listener_count(&self) -> usize {
        self.lock_listeners().values().map(Vec::len).sum()
    }

    /// Dispatch `event` to this endpoint's matching listeners.
    ///
    /// The registration list is snapshotted first, so the registry
    /// lock is never held across a callback and a listener attached
    /// mid-dispatch does not see the in-flight event. Listeners run in
    /// registration order; the first error skips the rest and
    /// propagates to the caller unmodified.
    pub fn dispatch(&self, event: &Event) -> Result<(), HandlerError> {
        let snapshot: Vec<(Callback, bool)> = self
            .lock_listeners()
            .get(&event.name)
            .map(|entries| {
                entries
                    .iter()
                    .map(|entry| (Arc::clone(&entry.callback), entry.capture))
                    .collect()
            })
            .unwrap_or_default();

        for (callback, capture) in snapshot {
            trace!(target_id = %self.inner.id, event = %event.name, capture, "invoking listener");
            callback(event)?;
        }

        Ok(())
    }

    fn lock_listeners(&self) -> MutexGuard<'_, HashMap<String, Vec<ListenerEntry>>> {
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for EventTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for EventTarget {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for EventTarget {}

impl std::fmt::Debug for EventTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventTarget")
            .field("id", &self.inner.id)
            .field("listener_count", &self.listener_count())
            .finish()
    }
}

/// Where an `emit_to`/`attach_to` call is aimed: one endpoint or an
/// ordered collection, decided explicitly at the call site.
#[derive(Debug, Clone)]
pub enum Target {
    /// A single endpoint; payloads pass through untouched.
    Single(EventTarget),
    /// An ordered collection; dispatch fans out once per element.
    Many(Vec<EventTarget>),
}

impl From<EventTarget> for Target {
    fn from(target: EventTarget) -> Self {
        Self::Single(target)
    }
}

impl From<&EventTarget> for Target {
    fn from(target: &EventTarget) -> Self {
        Self::Single(target.clone())
    }
}

impl From<Vec<EventTarget>> for Target {
    fn from(targets: Vec<EventTarget>) -> Self {
        Self::Many(targets)
    }
}

impl From<&[EventTarget]> for Target {
    fn from(targets: &[EventTarget]) -> Self {
        Self::Many(targets.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Detail;

    fn counting_callback() -> (Arc<Mutex<Vec<Event>>>, Callback) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let callback: Callback = Arc::new(move |event: &Event| {
            sink.lock().unwrap().push(event.clone());
            Ok(())
        });
        (seen, callback)
    }

    #[test]
    fn test_dispatch_only_matching_name() {
        let target = EventTarget::new();
        let (seen, callback) = counting_callback();
        target.add_listener("open", callback, false);

        target.dispatch(&Event::new("close", Detail::new())).unwrap();
        assert!(seen.lock().unwrap().is_empty());

        target.dispatch(&Event::new("open", Detail::new())).unwrap();
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_listener_count() {
        let target = EventTarget::new();
        assert_eq!(target.listener_count(), 0);

        let (_, callback) = counting_callback();
        target.add_listener("open", Arc::clone(&callback), false);
        target.add_listener("close", callback, true);

        assert_eq!(target.listener_count(), 2);
    }

    #[test]
    fn test_clone_shares_registry() {
        let target = EventTarget::new();
        let alias = target.clone();
        assert_eq!(target, alias);
        assert_eq!(target.id(), alias.id());
        assert_ne!(target, EventTarget::new());

        let (seen, callback) = counting_callback();
        alias.add_listener("open", callback, false);

        target.dispatch(&Event::new("open", Detail::new())).unwrap();
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_attach_during_dispatch_skips_inflight_event() {
        let target = EventTarget::new();
        let (seen, late) = counting_callback();

        let registry = target.clone();
        let appender: Callback = Arc::new(move |_: &Event| {
            registry.add_listener("grow", Arc::clone(&late), false);
            Ok(())
        });
        target.add_listener("grow", appender, false);

        target.dispatch(&Event::new("grow", Detail::new())).unwrap();
        assert!(seen.lock().unwrap().is_empty());

        target.dispatch(&Event::new("grow", Detail::new())).unwrap();
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_error_skips_remaining_listeners() {
        let target = EventTarget::new();
        let failing: Callback = Arc::new(|_: &Event| Err(HandlerError::msg("boom")));
        let (seen, recording) = counting_callback();
        target.add_listener("open", failing, false);
        target.add_listener("open", recording, false);

        let result = target.dispatch(&Event::new("open", Detail::new()));

        assert_eq!(result.unwrap_err().to_string(), "boom");
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_target_from_conversions() {
        let single = EventTarget::new();
        assert!(matches!(Target::from(&single), Target::Single(_)));

        let many = vec![EventTarget::new(), EventTarget::new()];
        match Target::from(many.clone()) {
            Target::Many(targets) => assert_eq!(targets.len(), 2),
            Target::Single(_) => panic!("expected a collection"),
        }
    }
}
