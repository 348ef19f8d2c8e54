//! Prelude module - commonly used types for convenient import.
//!
//! Use `use arbor_events::prelude::*;` to import all essential types.

pub use crate::{
    EventReceiver, InvalidationBus, InvalidationEvent, InvalidationReason, InvalidationSubscriber,
    Scope,
};
