//! Arbor Events - process-wide invalidation bus.
//!
//! Every successful mutation of the remote namespace publishes one
//! [`InvalidationEvent`] scoped to the directory whose listing changed. The
//! tree cache and the listing view subscribe and reload only what the scope
//! names.
//!
//! # Architecture
//!
//! There are two ways to subscribe:
//!
//! 1. **Async receivers**: `bus.subscribe()` returns an [`EventReceiver`]
//!    backed by a broadcast channel.
//! 2. **Synchronous subscribers**: implementations of
//!    [`InvalidationSubscriber`] registered with the bus registry run inline
//!    during `publish`, before it returns.
//!
//! Delivery reaches subscribers registered at publish time. Later
//! subscribers do not see past events; they are expected to fetch fresh
//! state when they register.
//!
//! # Example
//!
//! ```rust
//! use arbor_core::NsPath;
//! use arbor_events::{InvalidationBus, InvalidationEvent, InvalidationReason};
//!
//! # async fn example() {
//! let bus = InvalidationBus::new();
//! let mut receiver = bus.subscribe();
//!
//! let docs = NsPath::parse("docs").unwrap();
//! bus.publish(InvalidationEvent::path(docs.clone(), InvalidationReason::Created));
//!
//! let event = receiver.recv().await.unwrap();
//! assert!(event.affects(&docs));
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod bus;
mod event;
mod subscriber;

pub use bus::{DEFAULT_CHANNEL_CAPACITY, EventReceiver, InvalidationBus};
pub use event::{EventMetadata, InvalidationEvent, InvalidationReason, Scope};
pub use subscriber::{InvalidationSubscriber, SubscriberId, SubscriberRegistry};
