//! Arbor Tree - lazily materialized mirror of the remote namespace.
//!
//! This crate provides:
//! - [`TreeCache`]: path-keyed nodes, loaded on demand with at most one
//!   in-flight listing per path, invalidated by scope
//! - [`ExpansionController`]: sequential ancestor walks toward a target path
//!   and the resulting [`ExpansionState`]
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use arbor_core::{NamespaceClient, NsPath};
//! use arbor_events::InvalidationBus;
//! use arbor_tree::{ExpansionController, TreeCache};
//!
//! # async fn example(client: Arc<dyn NamespaceClient>) -> arbor_core::NamespaceResult<()> {
//! let bus = InvalidationBus::new();
//! let cache = TreeCache::new(client);
//! cache.attach(&bus);
//!
//! let expansion = ExpansionController::new(Arc::clone(&cache));
//! expansion.navigate(&NsPath::parse("a/b/c")?).await?;
//! assert!(expansion.expansion().is_expanded(&NsPath::parse("a/b")?));
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod cache;
mod expansion;
mod node;

pub use cache::TreeCache;
pub use expansion::{ExpansionController, ExpansionState, RefreshReport, WalkOutcome};
pub use node::{LoadState, Node};
