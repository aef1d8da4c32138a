//! Inbox clients.
//!
//! | Type | Scope | Event channel |
//! |------|-------|---------------|
//! | [`Inboxes`] | Every Inbox of the connection, entries by ID | `inbox` |
//! | [`InboxClient`] | One Inbox and its entries | `inbox/{id}/entries` |
//!
//! Sending an entry is a three step protocol: one file handle per attached
//! file, then `prepare_entry` binding the handles to the entry, then every
//! file uploaded (concurrently) before `send_entry` commits it.
//!
//! # Example
//!
//! ```ignore
//! endpoint
//!     .inbox(&inbox_id)?
//!     .send_data(InboxEntryPayload {
//!         data: b"form answers".to_vec(),
//!         files: vec![InboxFilePayload { data: scan, ..Default::default() }],
//!     })
//!     .await?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use futures_util::future::try_join_all;
use tracing::debug;

use crate::context::ListOptions;
use crate::dispatch::subscription::{subscribe_channel, unsubscribe_channel};
use crate::dispatch::{ChannelListeners, EventDispatcher, Registration};
use crate::error::Result;
use crate::protocol::{
    Channel, CreateContainerPayload, Event, EventType, FilesConfig, Inbox, InboxEntry,
    InboxEntryPayload, InboxPublicView, PagingList, UpdateContainerPayload,
};
use crate::transfer::{InboxFileSink, InboxFileUploader, StreamReader};
use crate::transport::native::{FileReadApi, InboxApi};

use super::endpoint::Endpoint;

// ============================================================================
// Inboxes
// ============================================================================

/// Context-level Inbox operations and entry access by ID.
#[derive(Debug, Clone)]
pub struct Inboxes {
    endpoint: Endpoint,
}

impl Inboxes {
    pub(crate) fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }

    async fn api(&self) -> Result<Arc<dyn InboxApi>> {
        self.endpoint.inbox_api().await
    }

    /// Returns a client for one Inbox.
    #[inline]
    #[must_use]
    pub fn inbox(&self, inbox_id: impl Into<String>) -> InboxClient {
        InboxClient::new(self.endpoint.clone(), inbox_id.into())
    }

    /// Creates an Inbox and returns its ID.
    pub async fn create_inbox(
        &self,
        payload: CreateContainerPayload,
        files_config: Option<FilesConfig>,
    ) -> Result<String> {
        let api = self.api().await?;
        let inbox_id = api.create_inbox(&payload, files_config).await?;
        debug!(inbox_id = %inbox_id, context_id = %payload.context_id, "Inbox created");
        Ok(inbox_id)
    }

    /// Lists the Inboxes of a Context.
    pub async fn list_inboxes(
        &self,
        context_id: &str,
        page_index: u64,
        options: ListOptions,
    ) -> Result<PagingList<Inbox>> {
        let api = self.api().await?;
        api.list_inboxes(context_id, options.to_query(page_index))
            .await
    }

    /// Fetches one entry by ID.
    pub async fn get_entry(&self, entry_id: &str) -> Result<InboxEntry> {
        self.api().await?.read_entry(entry_id).await
    }

    /// Deletes one entry by ID.
    pub async fn delete_entry(&self, entry_id: &str) -> Result<()> {
        self.api().await?.delete_entry(entry_id).await
    }

    /// Opens an entry file for chunked reading.
    ///
    /// Entry files carry no size lookup, so the reader's progress stays `0`.
    pub async fn stream_read(&self, file_id: &str) -> Result<StreamReader> {
        let api: Arc<dyn FileReadApi> = self.api().await?;
        StreamReader::open(api, file_id, 0).await
    }

    /// Downloads an entry file's whole content.
    pub async fn get_file_contents(&self, file_id: &str) -> Result<Vec<u8>> {
        self.get_file_contents_with_progress(file_id, |_| {}).await
    }

    /// Downloads an entry file, calling `on_progress` after each chunk.
    pub async fn get_file_contents_with_progress<F>(
        &self,
        file_id: &str,
        on_progress: F,
    ) -> Result<Vec<u8>>
    where
        F: FnMut(f64) + Send,
    {
        let mut reader = self.stream_read(file_id).await?;
        reader.read_all(on_progress).await?;
        reader.close().await
    }

    /// Subscribes to Inbox lifecycle events (`inboxCreated`, `inboxUpdated`,
    /// `inboxDeleted`).
    pub async fn subscribe_for_inbox_events(&self) -> Result<ChannelListeners> {
        let api = self.api().await?;
        subscribe_channel(self.endpoint.dispatcher(), Channel::Inbox, move || async move {
            api.subscribe_for_inbox_events().await
        })
        .await
    }

    /// Unsubscribes from Inbox lifecycle events. No-op when not subscribed.
    pub async fn unsubscribe_from_inbox_events(&self) -> Result<()> {
        let endpoint = self.endpoint.clone();
        unsubscribe_channel(self.endpoint.dispatcher(), Channel::Inbox, move || async move {
            endpoint.inbox_api().await?.unsubscribe_from_inbox_events().await
        })
        .await
    }

    /// Registers a listener on the `inbox` channel.
    pub fn on<F>(&self, event_type: EventType, callback: F) -> Registration
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        ChannelListeners::new(self.endpoint.dispatcher().clone(), Channel::Inbox)
            .on(event_type, callback)
    }
}

// ============================================================================
// InboxClient
// ============================================================================

/// Operations on one Inbox.
#[derive(Debug, Clone)]
pub struct InboxClient {
    endpoint: Endpoint,
    inbox_id: String,
    dispatcher: EventDispatcher,
}

impl InboxClient {
    pub(crate) fn new(endpoint: Endpoint, inbox_id: String) -> Self {
        let dispatcher = endpoint.dispatcher().clone();
        Self::with_dispatcher(endpoint, inbox_id, dispatcher)
    }

    /// Creates a client whose subscriptions live in `dispatcher` instead of
    /// the endpoint's.
    pub(crate) fn with_dispatcher(
        endpoint: Endpoint,
        inbox_id: String,
        dispatcher: EventDispatcher,
    ) -> Self {
        Self {
            endpoint,
            inbox_id,
            dispatcher,
        }
    }

    async fn api(&self) -> Result<Arc<dyn InboxApi>> {
        self.endpoint.inbox_api().await
    }

    fn channel(&self) -> Channel {
        Channel::inbox_entries(self.inbox_id.clone())
    }

    /// Returns the Inbox ID.
    #[inline]
    #[must_use]
    pub fn inbox_id(&self) -> &str {
        &self.inbox_id
    }
}

// ============================================================================
// InboxClient - Inbox
// ============================================================================

impl InboxClient {
    /// Fetches the Inbox.
    pub async fn info(&self) -> Result<Inbox> {
        self.api().await?.get_inbox(&self.inbox_id).await
    }

    /// Fetches the part of the Inbox visible to anonymous senders.
    pub async fn public_view(&self) -> Result<InboxPublicView> {
        self.api().await?.get_inbox_public_view(&self.inbox_id).await
    }

    /// Replaces the Inbox's users, managers, metadata and file limits.
    pub async fn update(
        &self,
        payload: UpdateContainerPayload,
        files_config: Option<FilesConfig>,
    ) -> Result<()> {
        let api = self.api().await?;
        api.update_inbox(&self.inbox_id, &payload, files_config)
            .await
    }

    /// Deletes the Inbox.
    pub async fn delete(&self) -> Result<()> {
        self.api().await?.delete_inbox(&self.inbox_id).await
    }

    /// Lists the Inbox's entries.
    pub async fn list_entries(
        &self,
        page_index: u64,
        options: ListOptions,
    ) -> Result<PagingList<InboxEntry>> {
        let api = self.api().await?;
        api.list_entries(&self.inbox_id, options.to_query(page_index))
            .await
    }

    /// Sends an entry with its attached files.
    ///
    /// # Errors
    ///
    /// Fails on the first failing step; the entry is only sent once every
    /// file has been written.
    pub async fn send_data(&self, entry: InboxEntryPayload) -> Result<()> {
        let api = self.api().await?;
        send_entry(api, &self.inbox_id, entry).await
    }
}

// ============================================================================
// InboxClient - Events
// ============================================================================

impl InboxClient {
    /// Subscribes to entry events (`inboxEntryCreated`, `inboxEntryDeleted`)
    /// of this Inbox.
    pub async fn subscribe_for_entry_events(&self) -> Result<ChannelListeners> {
        let api = self.api().await?;
        let inbox_id = self.inbox_id.clone();
        subscribe_channel(&self.dispatcher, self.channel(), move || async move {
            api.subscribe_for_entry_events(&inbox_id).await
        })
        .await
    }

    /// Unsubscribes from entry events. No-op when not subscribed.
    pub async fn unsubscribe_from_entry_events(&self) -> Result<()> {
        let endpoint = self.endpoint.clone();
        let inbox_id = self.inbox_id.clone();
        unsubscribe_channel(&self.dispatcher, self.channel(), move || async move {
            endpoint
                .inbox_api()
                .await?
                .unsubscribe_from_entry_events(&inbox_id)
                .await
        })
        .await
    }

    /// Registers a listener on this Inbox's entry channel.
    pub fn on<F>(&self, event_type: EventType, callback: F) -> Registration
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        ChannelListeners::new(self.dispatcher.clone(), self.channel()).on(event_type, callback)
    }
}

// ============================================================================
// Entry Sending
// ============================================================================

/// Creates the file handles, prepares the entry, uploads every file
/// concurrently and sends the entry.
pub(crate) async fn send_entry(
    api: Arc<dyn InboxApi>,
    inbox_id: &str,
    entry: InboxEntryPayload,
) -> Result<()> {
    let file_handles = try_join_all(entry.files.iter().map(|file| {
        api.create_file_handle(
            &file.public_meta,
            &file.private_meta,
            file.data.len() as u64,
        )
    }))
    .await?;

    let inbox_handle = api
        .prepare_entry(inbox_id, &entry.data, &file_handles, None)
        .await?;
    debug!(
        inbox_id = %inbox_id,
        inbox_handle = %inbox_handle,
        files = file_handles.len(),
        "Entry prepared"
    );

    let uploads = entry
        .files
        .into_iter()
        .zip(file_handles)
        .map(|(file, file_handle)| {
            let sink = InboxFileSink::new(Arc::clone(&api), inbox_handle, file_handle);
            let mut uploader = InboxFileUploader::new(sink, file.data);
            async move { uploader.send_all(|_| {}).await }
        });
    try_join_all(uploads).await?;

    api.send_entry(inbox_handle).await?;
    debug!(inbox_id = %inbox_id, "Entry sent");
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
