//! PrivMX Endpoint - typed client SDK over the native endpoint library.
//!
//! The native library owns encryption, storage and the bridge transport.
//! This crate sits on top of it and provides connection bookkeeping, event
//! routing and chunked file transfer.
//!
//! # Architecture
//!
//! - **One context per process**: [`EndpointContext`] owns the connection
//!   registry, the default label and the single event loop.
//! - **One dispatcher per connection**: the event loop polls the shared
//!   native queue and hands each event to the [`EventDispatcher`] of every
//!   connection whose ID matches.
//! - **Channels**: events are routed by `(channel, event type)`; entity
//!   clients subscribe a channel once and return a binder for listeners.
//! - **Chunked transfer**: file content moves in 1 MiB chunks through
//!   native handles ([`transfer`]).
//!
//! # Quick Start
//!
//! ```ignore
//! use privmx_endpoint::{
//!     ConnectionConfig, EndpointContext, EventLoopOptions, EventType, MessagePayload, Result,
//! };
//!
//! async fn run(factory: std::sync::Arc<dyn privmx_endpoint::EndpointFactory>) -> Result<()> {
//!     let context = EndpointContext::new(factory);
//!     let endpoint = context
//!         .connect(
//!             ConnectionConfig::builder()
//!                 .bridge_url("https://bridge.example.com")
//!                 .solution_id("solution-id")
//!                 .private_key("L3nX...WIF")
//!                 .build()?,
//!         )
//!         .await?;
//!
//!     context.start_event_loop(EventLoopOptions::default()).await?;
//!
//!     let thread = endpoint.thread("thread-id")?;
//!     thread
//!         .subscribe_for_message_events()
//!         .await?
//!         .on(EventType::ThreadNewMessage, |event| println!("{event:?}"));
//!
//!     thread
//!         .send_message(MessagePayload { data: b"hi".to_vec(), ..Default::default() })
//!         .await?;
//!
//!     context.reset().await
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | [`Endpoint`], [`PublicConnection`], entity clients, [`PrivmxCrypto`] |
//! | [`context`] | [`EndpointContext`] and configuration |
//! | [`dispatch`] | Event dispatcher, channel binders, subscriptions |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Connection ID and native handle newtypes |
//! | [`protocol`] | Channels, events and wire types |
//! | [`transfer`] | Chunked upload and download |
//! | [`transport`] | Native surface, registry and event loop |
//! | [`utils`] | JSON helpers for metadata bytes |

// ============================================================================
// Modules
// ============================================================================

/// Connection handles and entity clients.
pub mod client;

/// Process-scoped context and configuration.
///
/// Use [`EndpointContext::new`] with a native factory to get started.
pub mod context;

/// Event dispatcher and subscription lifecycle.
pub mod dispatch;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// Channels, events and wire types exchanged with the native library.
pub mod protocol;

/// Chunked transfer protocol.
pub mod transfer;

/// Native surface, connection registry and event loop.
pub mod transport;

/// Serialization helpers.
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use client::{
    ConnectionType, Endpoint, InboxClient, Inboxes, PrivmxCrypto, PublicConnection, StoreClient,
    Stores, ThreadClient, Threads,
};

// Context types
pub use context::{
    ConnectionConfig, ConnectionConfigBuilder, DEFAULT_PAGE_SIZE, EndpointContext,
    EventLoopOptions, ListOptions,
};

// Dispatch types
pub use dispatch::{ChannelListeners, EventDispatcher, ListenerHandle, Registration};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{ConnectionId, FileHandle, InboxHandle};

// Protocol types
pub use protocol::{
    Channel, ChannelFamily, Context, CreateContainerPayload, Event, EventKind, EventType,
    FilesConfig, Inbox, InboxEntry, InboxEntryPayload, InboxFilePayload, InboxPublicView, Message,
    MessagePayload, PagingList, PagingQuery, PrivmxFile, RawEvent, SortOrder, Store,
    StoreFilePayload, Thread, UpdateContainerPayload, UserWithPubKey,
};

// Transfer types
pub use transfer::{InboxFileUploader, MAX_CHUNK_SIZE, StoreUploader, StreamReader};

// Native surface
pub use transport::native::{
    ConnectionApi, CryptoApi, EndpointFactory, EventQueue, FileReadApi, InboxApi, StoreApi,
    ThreadApi,
};

// Helpers
pub use utils::{deserialize_object, serialize_object};
