//! Process-scoped endpoint context.
//!
//! [`EndpointContext`] owns everything that is global to one process: the
//! native factory, the connection registry with its default label, the
//! shared event queue, the event loop polling it and the crypto helpers. Tests create isolated
//! contexts; applications usually keep one.
//!
//! # Example
//!
//! ```ignore
//! use privmx_endpoint::{ConnectionConfig, EndpointContext, EventLoopOptions};
//!
//! let context = EndpointContext::new(native_factory);
//! let endpoint = context
//!     .connect(
//!         ConnectionConfig::builder()
//!             .bridge_url("https://bridge.example.com")
//!             .solution_id(SOLUTION_ID)
//!             .private_key(USER_KEY)
//!             .build()?,
//!     )
//!     .await?;
//!
//! context.start_event_loop(EventLoopOptions::default()).await?;
//!
//! // Later, anywhere: the default label resolves to the first connection.
//! let same = context.connection(None)?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::client::{ConnectionType, Endpoint, PrivmxCrypto, PublicConnection};
use crate::error::{
    CODE_NO_PUBLIC_CONNECTION, CODE_NO_USER_CONNECTION, CODE_PUBLIC_AS_USER, CODE_USER_AS_PUBLIC,
    Error, Result,
};
use crate::transport::native::{ConnectionApi, EndpointFactory, EventQueue};
use crate::transport::{ConnectionRegistry, EventLoop};

use super::builder::ConnectionConfig;
use super::options::EventLoopOptions;

// ============================================================================
// Types
// ============================================================================

/// Internal shared state for the context.
struct ContextInner {
    /// Native library entry point.
    factory: Arc<dyn EndpointFactory>,

    /// Live connections by label.
    registry: Arc<ConnectionRegistry>,

    /// Shared event queue, fetched on first use.
    event_queue: OnceCell<Arc<dyn EventQueue>>,

    /// Polling task.
    event_loop: EventLoop,

    /// Crypto helpers, shared by every clone.
    crypto: PrivmxCrypto,
}

// ============================================================================
// EndpointContext
// ============================================================================

/// Process-scoped owner of connections and the event loop.
///
/// Cheap to clone; clones share state.
#[derive(Clone)]
pub struct EndpointContext {
    inner: Arc<ContextInner>,
}

impl fmt::Debug for EndpointContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointContext")
            .field("connection_count", &self.connection_count())
            .field("default_connection_id", &self.default_connection_id())
            .field("event_loop_running", &self.is_event_loop_running())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// EndpointContext - Constructor
// ============================================================================

impl EndpointContext {
    /// Creates a context over a native factory.
    #[must_use]
    pub fn new(factory: Arc<dyn EndpointFactory>) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                crypto: PrivmxCrypto::new(Arc::clone(&factory)),
                factory,
                registry: Arc::new(ConnectionRegistry::new()),
                event_queue: OnceCell::new(),
                event_loop: EventLoop::new(),
            }),
        }
    }
}

// ============================================================================
// EndpointContext - Connecting
// ============================================================================

impl EndpointContext {
    /// Connects as a user.
    ///
    /// Without a label the connection ID becomes the label and the default
    /// label; with a label the default is left untouched.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] / [`Error::Url`] if `config` is invalid
    /// - [`Error::Endpoint`] if the native connect fails
    pub async fn connect(&self, config: ConnectionConfig) -> Result<Endpoint> {
        config.validate()?;
        let private_key = config.user_private_key()?;

        let connection = self
            .inner
            .factory
            .connect(private_key, &config.solution_id, &config.bridge_url)
            .await?;

        let endpoint = self
            .register(connection, config.label, ConnectionType::User)
            .await?;

        info!(
            connection_id = %endpoint.connection_id(),
            label = %endpoint.label(),
            "Connected"
        );
        Ok(endpoint)
    }

    /// Connects as a guest.
    ///
    /// # Errors
    ///
    /// Same as [`connect`](Self::connect), minus the private key check.
    pub async fn connect_public(&self, config: ConnectionConfig) -> Result<PublicConnection> {
        config.validate()?;

        let connection = self
            .inner
            .factory
            .connect_public(&config.solution_id, &config.bridge_url)
            .await?;

        let endpoint = self
            .register(connection, config.label, ConnectionType::Public)
            .await?;

        info!(
            connection_id = %endpoint.connection_id(),
            label = %endpoint.label(),
            "Connected publicly"
        );
        Ok(PublicConnection::new(endpoint))
    }

    async fn register(
        &self,
        connection: Arc<dyn ConnectionApi>,
        label: Option<String>,
        connection_type: ConnectionType,
    ) -> Result<Endpoint> {
        let connection_id = connection.connection_id().await?;

        let label = match label {
            Some(label) => label,
            None => {
                let label = connection_id.to_string();
                self.inner.registry.set_default_label(label.clone());
                label
            }
        };

        let endpoint = Endpoint::new(
            Arc::clone(&self.inner.factory),
            connection,
            connection_id,
            label,
            connection_type,
            Arc::downgrade(&self.inner.registry),
        );
        self.inner.registry.insert(endpoint.clone());

        Ok(endpoint)
    }
}

// ============================================================================
// EndpointContext - Lookup
// ============================================================================

impl EndpointContext {
    /// Returns the user connection under `label`, or under the default label.
    ///
    /// # Errors
    ///
    /// - [`Error::NoActiveConnection`] (code 1) if nothing is registered
    /// - [`Error::WrongConnectionType`] (code 2) for a public connection
    pub fn connection(&self, label: Option<&str>) -> Result<Endpoint> {
        let label = self.inner.registry.resolve_label(label);
        let endpoint = self
            .inner
            .registry
            .get(&label)
            .ok_or_else(|| Error::no_active_connection(&label, CODE_NO_USER_CONNECTION))?;

        if endpoint.connection_type() == ConnectionType::Public {
            return Err(Error::wrong_connection_type(
                label,
                ConnectionType::Public,
                CODE_PUBLIC_AS_USER,
            ));
        }
        Ok(endpoint)
    }

    /// Returns the public connection under `label`, or under the default label.
    ///
    /// # Errors
    ///
    /// - [`Error::NoActiveConnection`] (code 3) if nothing is registered
    /// - [`Error::WrongConnectionType`] (code 4) for a user connection
    pub fn public_connection(&self, label: Option<&str>) -> Result<PublicConnection> {
        let label = self.inner.registry.resolve_label(label);
        let endpoint = self
            .inner
            .registry
            .get(&label)
            .ok_or_else(|| Error::no_active_connection(&label, CODE_NO_PUBLIC_CONNECTION))?;

        if endpoint.connection_type() == ConnectionType::User {
            return Err(Error::wrong_connection_type(
                label,
                ConnectionType::User,
                CODE_USER_AS_PUBLIC,
            ));
        }
        Ok(PublicConnection::new(endpoint))
    }

    /// Returns the label used when none is passed.
    #[inline]
    #[must_use]
    pub fn default_connection_id(&self) -> String {
        self.inner.registry.default_label()
    }

    /// Sets the label used when none is passed.
    pub fn set_default_connection_id(&self, id: impl Into<String>) {
        self.inner.registry.set_default_label(id);
    }

    /// Returns the number of registered connections.
    #[inline]
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.inner.registry.connection_count()
    }

    /// Returns the crypto helpers; no connection is needed.
    #[inline]
    #[must_use]
    pub fn crypto(&self) -> PrivmxCrypto {
        self.inner.crypto.clone()
    }
}

// ============================================================================
// EndpointContext - Event Loop
// ============================================================================

impl EndpointContext {
    /// Starts the global event loop. Does nothing if it already runs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Endpoint`] if the event queue cannot be obtained.
    pub async fn start_event_loop(&self, options: EventLoopOptions) -> Result<()> {
        let queue = self.event_queue().await?;
        self.inner
            .event_loop
            .start(queue, Arc::clone(&self.inner.registry), options)
            .await;
        Ok(())
    }

    /// Stops the global event loop and clears every listener.
    ///
    /// Does nothing if the loop is not running.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Endpoint`] if the break event cannot be emitted.
    pub async fn stop_event_loop(&self) -> Result<()> {
        self.inner.event_loop.stop(&self.inner.registry).await
    }

    /// Returns `true` while the event loop runs.
    #[inline]
    #[must_use]
    pub fn is_event_loop_running(&self) -> bool {
        self.inner.event_loop.is_running()
    }

    async fn event_queue(&self) -> Result<Arc<dyn EventQueue>> {
        let queue = self
            .inner
            .event_queue
            .get_or_try_init(|| async {
                debug!("Fetching shared event queue");
                self.inner.factory.event_queue().await
            })
            .await?;
        Ok(Arc::clone(queue))
    }
}

// ============================================================================
// EndpointContext - Lifecycle
// ============================================================================

impl EndpointContext {
    /// Disconnects every registered connection.
    ///
    /// Every connection is attempted; the first failure is returned.
    pub async fn disconnect_all(&self) -> Result<()> {
        let endpoints = self.inner.registry.snapshot();
        info!(count = endpoints.len(), "Disconnecting all connections");

        let mut first_error = None;
        for endpoint in endpoints {
            if let Err(e) = endpoint.disconnect().await {
                warn!(label = %endpoint.label(), error = %e, "Disconnect failed");
                self.inner
                    .registry
                    .remove(endpoint.label(), endpoint.connection_id());
                first_error.get_or_insert(e);
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Stops the event loop, disconnects everything and clears the default
    /// label, returning the context to its initial state.
    pub async fn reset(&self) -> Result<()> {
        let stopped = self.stop_event_loop().await;
        let disconnected = self.disconnect_all().await;
        self.inner.registry.clear();
        debug!("Context reset");
        stopped.and(disconnected)
    }
}

// ============================================================================
// Tests
// ============================================================================
