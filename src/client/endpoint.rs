//! One connection and its lazily created native APIs.
//!
//! An [`Endpoint`] is what [`EndpointContext::connect`](crate::EndpointContext::connect)
//! returns. It owns the connection's [`EventDispatcher`] and creates the
//! Thread, Store and Inbox APIs on first use; concurrent first uses share a
//! single creation.
//!
//! # Example
//!
//! ```ignore
//! let endpoint = context.connect(config).await?;
//!
//! let contexts = endpoint.list_contexts(0, ListOptions::default()).await?;
//! let threads = endpoint.threads()?;
//! let thread_id = threads.create_thread(payload).await?;
//!
//! endpoint.on(EventType::LibDisconnected, |_| eprintln!("connection lost"));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::{Arc, Weak};

use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::context::ListOptions;
use crate::dispatch::{ChannelListeners, EventDispatcher, Registration};
use crate::error::{Error, Result};
use crate::identifiers::ConnectionId;
use crate::protocol::{Channel, Context, Event, EventType, PagingList};
use crate::transport::ConnectionRegistry;
use crate::transport::native::{ConnectionApi, EndpointFactory, InboxApi, StoreApi, ThreadApi};

use super::ConnectionType;
use super::inbox::{InboxClient, Inboxes};
use super::store::{StoreClient, Stores};
use super::thread::{ThreadClient, Threads};

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for an endpoint.
struct EndpointInner {
    /// Native library entry point, used to create per-connection APIs.
    factory: Arc<dyn EndpointFactory>,

    /// Native connection.
    connection: Arc<dyn ConnectionApi>,

    /// ID stamped on this connection's events.
    connection_id: ConnectionId,

    /// Registry key.
    label: String,

    /// User or guest.
    connection_type: ConnectionType,

    /// Listeners and subscriptions of this connection.
    dispatcher: EventDispatcher,

    /// Owning registry; gone once the context is dropped.
    registry: Weak<ConnectionRegistry>,

    thread_api: OnceCell<Arc<dyn ThreadApi>>,
    store_api: OnceCell<Arc<dyn StoreApi>>,
    inbox_api: OnceCell<Arc<dyn InboxApi>>,
}

// ============================================================================
// Endpoint
// ============================================================================

/// Handle to one live connection.
///
/// Cheap to clone; clones share the dispatcher and the native APIs.
#[derive(Clone)]
pub struct Endpoint {
    inner: Arc<EndpointInner>,
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("connection_id", &self.inner.connection_id)
            .field("label", &self.inner.label)
            .field("connection_type", &self.inner.connection_type)
            .finish_non_exhaustive()
    }
}

impl Endpoint {
    /// Wraps a native connection.
    pub(crate) fn new(
        factory: Arc<dyn EndpointFactory>,
        connection: Arc<dyn ConnectionApi>,
        connection_id: ConnectionId,
        label: String,
        connection_type: ConnectionType,
        registry: Weak<ConnectionRegistry>,
    ) -> Self {
        Self {
            inner: Arc::new(EndpointInner {
                factory,
                connection,
                connection_id,
                label,
                connection_type,
                dispatcher: EventDispatcher::new(),
                registry,
                thread_api: OnceCell::new(),
                store_api: OnceCell::new(),
                inbox_api: OnceCell::new(),
            }),
        }
    }
}

// ============================================================================
// Endpoint - Accessors
// ============================================================================

impl Endpoint {
    /// Returns the connection ID.
    #[inline]
    #[must_use]
    pub fn connection_id(&self) -> &ConnectionId {
        &self.inner.connection_id
    }

    /// Returns the registry label.
    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        &self.inner.label
    }

    /// Returns whether this is a user or a guest connection.
    #[inline]
    #[must_use]
    pub fn connection_type(&self) -> ConnectionType {
        self.inner.connection_type
    }

    /// Returns this connection's event dispatcher.
    #[inline]
    #[must_use]
    pub fn dispatcher(&self) -> &EventDispatcher {
        &self.inner.dispatcher
    }

    fn require_user(&self, operation: &str) -> Result<()> {
        match self.inner.connection_type {
            ConnectionType::User => Ok(()),
            ConnectionType::Public => Err(Error::public_connection_access(operation)),
        }
    }
}

// ============================================================================
// Endpoint - Entity Clients
// ============================================================================

impl Endpoint {
    /// Returns the context-level Thread client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PublicConnectionAccess`] on a guest connection.
    pub fn threads(&self) -> Result<Threads> {
        self.require_user("threads")?;
        Ok(Threads::new(self.clone()))
    }

    /// Returns a client for one Thread.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PublicConnectionAccess`] on a guest connection.
    pub fn thread(&self, thread_id: impl Into<String>) -> Result<ThreadClient> {
        self.require_user("thread")?;
        Ok(ThreadClient::new(self.clone(), thread_id.into()))
    }

    /// Returns the context-level Store client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PublicConnectionAccess`] on a guest connection.
    pub fn stores(&self) -> Result<Stores> {
        self.require_user("stores")?;
        Ok(Stores::new(self.clone()))
    }

    /// Returns a client for one Store.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PublicConnectionAccess`] on a guest connection.
    pub fn store(&self, store_id: impl Into<String>) -> Result<StoreClient> {
        self.require_user("store")?;
        Ok(StoreClient::new(self.clone(), store_id.into()))
    }

    /// Returns the context-level Inbox client.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PublicConnectionAccess`] on a guest connection.
    pub fn inboxes(&self) -> Result<Inboxes> {
        self.require_user("inboxes")?;
        Ok(Inboxes::new(self.clone()))
    }

    /// Returns a client for one Inbox.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PublicConnectionAccess`] on a guest connection.
    pub fn inbox(&self, inbox_id: impl Into<String>) -> Result<InboxClient> {
        self.require_user("inbox")?;
        Ok(InboxClient::new(self.clone(), inbox_id.into()))
    }
}

// ============================================================================
// Endpoint - Native APIs
// ============================================================================

impl Endpoint {
    /// Returns the Thread API, creating it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Endpoint`] if the native library fails to create it;
    /// the next call retries.
    pub async fn thread_api(&self) -> Result<Arc<dyn ThreadApi>> {
        let api = self
            .inner
            .thread_api
            .get_or_try_init(|| async {
                debug!(connection_id = %self.inner.connection_id, "Creating Thread API");
                self.inner.factory.create_thread_api(&self.inner.connection).await
            })
            .await?;
        Ok(Arc::clone(api))
    }

    /// Returns the Store API, creating it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Endpoint`] if the native library fails to create it.
    pub async fn store_api(&self) -> Result<Arc<dyn StoreApi>> {
        let api = self
            .inner
            .store_api
            .get_or_try_init(|| async {
                debug!(connection_id = %self.inner.connection_id, "Creating Store API");
                self.inner.factory.create_store_api(&self.inner.connection).await
            })
            .await?;
        Ok(Arc::clone(api))
    }

    /// Returns the Inbox API, creating it (and the Thread and Store APIs it
    /// builds on) on first use.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Endpoint`] if any of the three APIs cannot be created.
    pub async fn inbox_api(&self) -> Result<Arc<dyn InboxApi>> {
        let api = self
            .inner
            .inbox_api
            .get_or_try_init(|| async {
                let (thread_api, store_api) = tokio::try_join!(self.thread_api(), self.store_api())?;
                debug!(connection_id = %self.inner.connection_id, "Creating Inbox API");
                self.inner
                    .factory
                    .create_inbox_api(&self.inner.connection, &thread_api, &store_api)
                    .await
            })
            .await?;
        Ok(Arc::clone(api))
    }
}

// ============================================================================
// Endpoint - Connection
// ============================================================================

impl Endpoint {
    /// Lists the Contexts the user belongs to.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Endpoint`] if the native call fails.
    pub async fn list_contexts(
        &self,
        page_index: u64,
        options: ListOptions,
    ) -> Result<PagingList<Context>> {
        self.inner
            .connection
            .list_contexts(options.to_query(page_index))
            .await
    }

    /// Registers a listener for connection events (`libConnected`,
    /// `libDisconnected`, `libPlatformDisconnected`).
    ///
    /// The connection channel needs no subscription.
    pub fn on<F>(&self, event_type: EventType, callback: F) -> Registration
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        ChannelListeners::new(self.inner.dispatcher.clone(), Channel::Connection)
            .on(event_type, callback)
    }

    /// Disconnects and removes this connection from its context.
    ///
    /// Listeners are cleared first so nothing fires during teardown.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Endpoint`] if the native disconnect fails; the
    /// registry entry is kept in that case.
    pub async fn disconnect(&self) -> Result<()> {
        self.inner.dispatcher.remove_all_listeners();
        self.inner.connection.disconnect().await?;

        if let Some(registry) = self.inner.registry.upgrade() {
            registry.remove(&self.inner.label, &self.inner.connection_id);
        }

        info!(
            connection_id = %self.inner.connection_id,
            label = %self.inner.label,
            "Disconnected"
        );
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
