//! Event bus implementation: a shared channel plus targeted dispatch.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::error::HandlerError;
use crate::target::{Callback, EventTarget, Target};
use crate::types::{Detail, Event};

/// Shared-channel event bus.
///
/// Construct one and hand clones to whoever needs to emit or listen;
/// clones share the channel and the counters. There is no implicit
/// global instance.
#[derive(Clone)]
pub struct EventBus {
    channel: EventTarget,
    /// Number of dispatches performed (for monitoring)
    event_count: Arc<AtomicUsize>,
}

impl EventBus {
    /// Create a new bus with an empty shared channel.
    pub fn new() -> Self {
        Self {
            channel: EventTarget::new(),
            event_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Dispatch a named event on the shared channel.
    ///
    /// Listeners attached via [`attach`](Self::attach) with a matching
    /// name run synchronously on the calling thread, in attachment
    /// order. The first listener error aborts the remaining listeners
    /// of this dispatch and propagates unmodified.
    pub fn emit(&self, event_name: &str, detail: Detail) -> Result<(), HandlerError> {
        debug!(event = %event_name, "emit on shared channel");
        self.event_count.fetch_add(1, Ordering::Relaxed);
        self.channel.dispatch(&Event::new(event_name, detail))
    }

    /// Dispatch a named event directly on `target`.
    ///
    /// A [`Target::Single`] gets `detail` untouched. A
    /// [`Target::Many`] gets one dispatch per element, in collection
    /// order, each payload carrying `element` (that element's id) and
    /// `elementSet` (all ids) with the caller's keys winning on
    /// collision. A listener error halts the fan-out at that element;
    /// later elements are not dispatched to.
    pub fn emit_to(
        &self,
        target: impl Into<Target>,
        event_name: &str,
        detail: Detail,
    ) -> Result<(), HandlerError> {
        match target.into() {
            Target::Single(endpoint) => {
                debug!(event = %event_name, target_id = %endpoint.id(), "emit on target");
                self.event_count.fetch_add(1, Ordering::Relaxed);
                endpoint.dispatch(&Event::new(event_name, detail))
            }
            Target::Many(endpoints) => {
                debug!(event = %event_name, targets = endpoints.len(), "emit on collection");
                for endpoint in &endpoints {
                    self.event_count.fetch_add(1, Ordering::Relaxed);
                    let event = Event::for_element(event_name, endpoint, &endpoints, &detail);
                    endpoint.dispatch(&event)?;
                }
                Ok(())
            }
        }
    }

    /// Attach a listener to the shared channel.
    ///
    /// No de-duplication and no removal handle: the same
    /// (name, callback, capture) triple attached twice is invoked
    /// twice per matching emit.
    pub fn attach(&self, event_name: &str, callback: Callback, capture: bool) {
        self.channel.add_listener(event_name, callback, capture);
    }

    /// Attach a listener to a single target, or to every element of a
    /// collection (one registration per element).
    pub fn attach_to(
        &self,
        target: impl Into<Target>,
        event_name: &str,
        callback: Callback,
        capture: bool,
    ) {
        match target.into() {
            Target::Single(endpoint) => endpoint.add_listener(event_name, callback, capture),
            Target::Many(endpoints) => {
                for endpoint in &endpoints {
                    endpoint.add_listener(event_name, Arc::clone(&callback), capture);
                }
            }
        }
    }

    /// The shared channel endpoint.
    pub fn channel(&self) -> &EventTarget {
        &self.channel
    }

    /// Listeners currently attached to the shared channel.
    pub fn listener_count(&self) -> usize {
        self.channel.listener_count()
    }

    /// Total dispatches performed by this bus. Collection fan-out
    /// counts once per element.
    pub fn event_count(&self) -> usize {
        self.event_count.load(Ordering::Relaxed)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("listener_count", &self.listener_count())
            .field("event_count", &self.event_count())
            .finish()
    }
}
