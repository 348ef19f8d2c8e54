//! Wiring of client, bus, cache and views for one CLI invocation.

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use arbor_client::{HttpClientOptions, HttpNamespaceClient, Mutator};
use arbor_config::Config;
use arbor_core::{NamespaceClient, NamespaceResult, NsPath};
use arbor_events::InvalidationBus;
use arbor_listing::{ListingSnapshot, ListingView};
use arbor_tree::{ExpansionController, TreeCache};
use tracing::debug;

/// Everything a command needs to talk to the server.
pub(crate) struct Context {
    pub(crate) client: Arc<HttpNamespaceClient>,
    pub(crate) bus: InvalidationBus,
    pub(crate) cache: Arc<TreeCache>,
    pub(crate) expansion: ExpansionController,
    pub(crate) listing: ListingView,
    pub(crate) mutator: Mutator,
}

impl Context {
    /// Build the stack described by `config`.
    pub(crate) fn new(config: &Config) -> Result<Self> {
        let options = HttpClientOptions::default()
            .with_timeout(config.server.timeout())
            .with_user_agent(config.server.user_agent.clone());
        let client = Arc::new(
            HttpNamespaceClient::with_options(&config.server.base_url, options)
                .with_context(|| format!("cannot use server {}", config.server.base_url))?,
        );
        let namespace: Arc<dyn NamespaceClient> = client.clone();

        let bus = InvalidationBus::with_capacity(config.bus.capacity);
        let cache = TreeCache::new(Arc::clone(&namespace));
        cache.attach(&bus);

        debug!(base_url = client.base_url(), "client ready");
        Ok(Self {
            expansion: ExpansionController::new(Arc::clone(&cache)),
            listing: ListingView::new(Arc::clone(&namespace)),
            mutator: Mutator::new(namespace, bus.clone()).with_transfer(client.clone()),
            client,
            bus,
            cache,
        })
    }

    /// Show `parent` in the listing, run `mutation`, then feed the published
    /// invalidations to the listing and return what it shows afterwards.
    pub(crate) async fn mutate_and_show<T>(
        &self,
        parent: &NsPath,
        mutation: impl Future<Output = NamespaceResult<T>>,
    ) -> Result<(T, ListingSnapshot)> {
        if let Err(err) = self.listing.navigate(parent.clone()).await {
            debug!(path = %parent, error = %err, "listing before mutation failed");
        }
        let mut events = self.bus.subscribe();

        let value = mutation.await?;

        let mut refreshed = false;
        while let Some(event) = events.try_recv() {
            refreshed |= self.listing.apply(&event).await;
        }
        if !refreshed {
            debug!(path = %parent, "mutation did not touch the shown listing");
        }
        Ok((value, self.listing.snapshot()))
    }
}
