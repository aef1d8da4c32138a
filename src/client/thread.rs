//! Thread clients.
//!
//! | Type | Scope | Event channel |
//! |------|-------|---------------|
//! | [`Threads`] | Every Thread of the connection | `thread` |
//! | [`ThreadClient`] | One Thread and its messages | `thread/{id}/messages` |
//!
//! # Example
//!
//! ```ignore
//! let threads = endpoint.threads()?;
//! let thread_id = threads
//!     .create_thread(CreateContainerPayload {
//!         context_id: context_id.clone(),
//!         users: vec![me.clone()],
//!         managers: vec![me],
//!         ..Default::default()
//!     })
//!     .await?;
//!
//! let thread = endpoint.thread(&thread_id)?;
//! thread
//!     .subscribe_for_message_events()
//!     .await?
//!     .on(EventType::ThreadNewMessage, |event| println!("{event:?}"));
//!
//! thread.send_message(MessagePayload { data: b"hi".to_vec(), ..Default::default() }).await?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use tracing::debug;

use crate::context::ListOptions;
use crate::dispatch::subscription::{subscribe_channel, unsubscribe_channel};
use crate::dispatch::{ChannelListeners, Registration};
use crate::error::Result;
use crate::protocol::{
    Channel, CreateContainerPayload, Event, EventType, Message, MessagePayload, PagingList, Thread,
    UpdateContainerPayload,
};
use crate::transport::native::ThreadApi;

use super::endpoint::Endpoint;

// ============================================================================
// Threads
// ============================================================================

/// Context-level Thread operations.
#[derive(Debug, Clone)]
pub struct Threads {
    endpoint: Endpoint,
}

impl Threads {
    pub(crate) fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }

    async fn api(&self) -> Result<Arc<dyn ThreadApi>> {
        self.endpoint.thread_api().await
    }

    /// Returns a client for one Thread.
    #[inline]
    #[must_use]
    pub fn thread(&self, thread_id: impl Into<String>) -> ThreadClient {
        ThreadClient::new(self.endpoint.clone(), thread_id.into())
    }

    /// Creates a Thread and returns its ID.
    pub async fn create_thread(&self, payload: CreateContainerPayload) -> Result<String> {
        let api = self.api().await?;
        let thread_id = api.create_thread(&payload).await?;
        debug!(thread_id = %thread_id, context_id = %payload.context_id, "Thread created");
        Ok(thread_id)
    }

    /// Lists the Threads of a Context.
    pub async fn list_threads(
        &self,
        context_id: &str,
        page_index: u64,
        options: ListOptions,
    ) -> Result<PagingList<Thread>> {
        let api = self.api().await?;
        api.list_threads(context_id, options.to_query(page_index)).await
    }

    /// Fetches one message by ID.
    pub async fn get_message(&self, message_id: &str) -> Result<Message> {
        self.api().await?.get_message(message_id).await
    }

    /// Deletes one message by ID.
    pub async fn delete_message(&self, message_id: &str) -> Result<()> {
        self.api().await?.delete_message(message_id).await
    }

    /// Subscribes to Thread lifecycle events (`threadCreated`,
    /// `threadUpdated`, `threadDeleted`, `threadStatsChanged`).
    pub async fn subscribe_for_thread_events(&self) -> Result<ChannelListeners> {
        let api = self.api().await?;
        subscribe_channel(self.endpoint.dispatcher(), Channel::Thread, move || async move {
            api.subscribe_for_thread_events().await
        })
        .await
    }

    /// Unsubscribes from Thread lifecycle events. No-op when not subscribed.
    pub async fn unsubscribe_from_thread_events(&self) -> Result<()> {
        let endpoint = self.endpoint.clone();
        unsubscribe_channel(self.endpoint.dispatcher(), Channel::Thread, move || async move {
            endpoint.thread_api().await?.unsubscribe_from_thread_events().await
        })
        .await
    }

    /// Registers a listener on the `thread` channel.
    pub fn on<F>(&self, event_type: EventType, callback: F) -> Registration
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        ChannelListeners::new(self.endpoint.dispatcher().clone(), Channel::Thread)
            .on(event_type, callback)
    }
}

// ============================================================================
// ThreadClient
// ============================================================================

/// Operations on one Thread.
#[derive(Debug, Clone)]
pub struct ThreadClient {
    endpoint: Endpoint,
    thread_id: String,
}

impl ThreadClient {
    pub(crate) fn new(endpoint: Endpoint, thread_id: String) -> Self {
        Self {
            endpoint,
            thread_id,
        }
    }

    async fn api(&self) -> Result<Arc<dyn ThreadApi>> {
        self.endpoint.thread_api().await
    }

    fn channel(&self) -> Channel {
        Channel::thread_messages(self.thread_id.clone())
    }

    /// Returns the Thread ID.
    #[inline]
    #[must_use]
    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }
}

// ============================================================================
// ThreadClient - Thread
// ============================================================================

impl ThreadClient {
    /// Fetches the Thread.
    pub async fn info(&self) -> Result<Thread> {
        self.api().await?.get_thread(&self.thread_id).await
    }

    /// Replaces the Thread's users, managers and metadata.
    ///
    /// The server rejects the update unless `payload.version` matches, or
    /// `payload.force` is set.
    pub async fn update(&self, payload: UpdateContainerPayload) -> Result<()> {
        self.api().await?.update_thread(&self.thread_id, &payload).await
    }

    /// Deletes the Thread.
    pub async fn delete(&self) -> Result<()> {
        self.api().await?.delete_thread(&self.thread_id).await
    }
}

// ============================================================================
// ThreadClient - Messages
// ============================================================================

impl ThreadClient {
    /// Sends a message and returns its ID.
    pub async fn send_message(&self, payload: MessagePayload) -> Result<String> {
        let api = self.api().await?;
        api.send_message(
            &self.thread_id,
            &payload.public_meta,
            &payload.private_meta,
            &payload.data,
        )
        .await
    }

    /// Lists messages of this Thread.
    pub async fn list_messages(
        &self,
        page_index: u64,
        options: ListOptions,
    ) -> Result<PagingList<Message>> {
        let api = self.api().await?;
        api.list_messages(&self.thread_id, options.to_query(page_index))
            .await
    }

    /// Replaces a message's content and metadata.
    pub async fn update_message(&self, message_id: &str, payload: MessagePayload) -> Result<()> {
        let api = self.api().await?;
        api.update_message(
            message_id,
            &payload.public_meta,
            &payload.private_meta,
            &payload.data,
        )
        .await
    }
}

// ============================================================================
// ThreadClient - Events
// ============================================================================

impl ThreadClient {
    /// Subscribes to message events (`threadNewMessage`,
    /// `threadMessageUpdated`, `threadMessageDeleted`) of this Thread.
    pub async fn subscribe_for_message_events(&self) -> Result<ChannelListeners> {
        let api = self.api().await?;
        let thread_id = self.thread_id.clone();
        subscribe_channel(self.endpoint.dispatcher(), self.channel(), move || async move {
            api.subscribe_for_message_events(&thread_id).await
        })
        .await
    }

    /// Unsubscribes from message events. No-op when not subscribed.
    pub async fn unsubscribe_from_message_events(&self) -> Result<()> {
        let endpoint = self.endpoint.clone();
        let thread_id = self.thread_id.clone();
        unsubscribe_channel(self.endpoint.dispatcher(), self.channel(), move || async move {
            endpoint
                .thread_api()
                .await?
                .unsubscribe_from_message_events(&thread_id)
                .await
        })
        .await
    }

    /// Registers a listener on this Thread's message channel.
    pub fn on<F>(&self, event_type: EventType, callback: F) -> Registration
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        ChannelListeners::new(self.endpoint.dispatcher().clone(), self.channel())
            .on(event_type, callback)
    }
}

// ============================================================================
// Tests
// ============================================================================
