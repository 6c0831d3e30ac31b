//! Synchronous event emission for in-process components.
//!
//! This crate provides a shared-channel [`EventBus`] plus targeted
//! dispatch on application-owned [`EventTarget`] endpoints. Dispatch is
//! fully synchronous on the calling thread; the library owns no
//! scheduler and no queues.

mod bus;
mod error;
mod target;
mod types;

pub use bus::EventBus;
pub use error::HandlerError;
pub use target::{Callback, EventTarget, Target};
pub use types::{Detail, Event, ELEMENT_KEY, ELEMENT_SET_KEY};
