//! Event and payload types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::target::EventTarget;

/// Open key-value payload attached to a dispatched event.
pub type Detail = Map<String, Value>;

/// Payload key carrying the per-element target id during collection
/// fan-out.
pub const ELEMENT_KEY: &str = "element";

/// Payload key carrying the ids of the whole collection, in order,
/// during collection fan-out.
pub const ELEMENT_SET_KEY: &str = "elementSet";

/// A named signal with an attached payload.
///
/// Built fresh for every dispatch; carries no identity and is never
/// stored by the bus. The timestamp records when the dispatch happened
/// and plays no part in routing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Case-sensitive event name; semantics belong to the application.
    pub name: String,
    /// Open key-value payload.
    pub detail: Detail,
    /// When the dispatch happened.
    pub timestamp: DateTime<Utc>,
}

impl Event {
    /// Create an event with the dispatch timestamp stamped now.
    pub fn new(name: impl Into<String>, detail: Detail) -> Self {
        Self {
            name: name.into(),
            detail,
            timestamp: Utc::now(),
        }
    }

    /// Build the per-element payload for a collection fan-out.
    ///
    /// `element` and `elementSet` are inserted first, the caller's
    /// detail second; on a key collision the later write wins, so the
    /// caller's value survives.
    pub(crate) fn for_element(
        name: &str,
        element: &EventTarget,
        set: &[EventTarget],
        detail: &Detail,
    ) -> Self {
        let mut merged = Detail::new();
        merged.insert(
            ELEMENT_KEY.to_string(),
            Value::String(element.id().to_string()),
        );
        merged.insert(
            ELEMENT_SET_KEY.to_string(),
            Value::Array(
                set.iter()
                    .map(|target| Value::String(target.id().to_string()))
                    .collect(),
            ),
        );
        for (key, value) in detail {
            merged.insert(key.clone(), value.clone());
        }
        Self::new(name, merged)
    }
}
