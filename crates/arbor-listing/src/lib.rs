//! Arbor Listing - flat, single-level listing of the current directory.
//!
//! The listing fetches through the [`NamespaceClient`](arbor_core::NamespaceClient)
//! directly and never through the tree cache. It only shares the
//! invalidation bus and path identity with the tree.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use arbor_core::{NamespaceClient, NsPath};
//! use arbor_events::InvalidationBus;
//! use arbor_listing::{ListingSort, ListingView};
//!
//! # async fn example(client: Arc<dyn NamespaceClient>) -> arbor_core::NamespaceResult<()> {
//! let bus = InvalidationBus::new();
//! let view = Arc::new(ListingView::new(client));
//! let _watcher = Arc::clone(&view).watch(bus.subscribe());
//!
//! view.navigate(NsPath::parse("docs")?).await?;
//! for entry in view.sorted(ListingSort::Size).unwrap_or_default() {
//!     println!("{} {:?}", entry.name, entry.size);
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod sort;
mod view;

pub use sort::{ListingSort, sort_entries};
pub use view::{ListingSnapshot, ListingState, ListingView};
