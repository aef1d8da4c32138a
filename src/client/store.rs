//! Store clients.
//!
//! | Type | Scope | Event channel |
//! |------|-------|---------------|
//! | [`Stores`] | Every Store of the connection, files by ID | `store` |
//! | [`StoreClient`] | One Store and its files | `store/{id}/files` |
//!
//! Uploads and downloads go through the chunked transfer objects in
//! [`crate::transfer`]. The convenience methods here drive them to
//! completion; the `stream_*` methods hand them out for manual driving.
//!
//! # Example
//!
//! ```ignore
//! let store = endpoint.store(&store_id)?;
//!
//! let file_id = store
//!     .upload_data_with_progress(
//!         StoreFilePayload { data: bytes, ..Default::default() },
//!         |percent| println!("{percent:.0}%"),
//!     )
//!     .await?;
//!
//! let content = endpoint.stores()?.get_file_contents(&file_id).await?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use tokio::io::AsyncRead;
use tracing::{debug, warn};

use crate::context::ListOptions;
use crate::dispatch::subscription::{subscribe_channel, unsubscribe_channel};
use crate::dispatch::{ChannelListeners, Registration};
use crate::error::{Error, Result};
use crate::protocol::{
    Channel, CreateContainerPayload, Event, EventType, PagingList, PrivmxFile, Store,
    StoreFilePayload, UpdateContainerPayload,
};
use crate::transfer::{StoreFileSink, StoreUploader, StreamReader};
use crate::transport::native::{FileReadApi, StoreApi};

use super::endpoint::Endpoint;

// ============================================================================
// Stores
// ============================================================================

/// Context-level Store operations and file access by ID.
#[derive(Debug, Clone)]
pub struct Stores {
    endpoint: Endpoint,
}

impl Stores {
    pub(crate) fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }

    async fn api(&self) -> Result<Arc<dyn StoreApi>> {
        self.endpoint.store_api().await
    }

    /// Returns a client for one Store.
    #[inline]
    #[must_use]
    pub fn store(&self, store_id: impl Into<String>) -> StoreClient {
        StoreClient::new(self.endpoint.clone(), store_id.into())
    }

    /// Creates a Store and returns its ID.
    pub async fn create_store(&self, payload: CreateContainerPayload) -> Result<String> {
        let api = self.api().await?;
        let store_id = api.create_store(&payload).await?;
        debug!(store_id = %store_id, context_id = %payload.context_id, "Store created");
        Ok(store_id)
    }

    /// Lists the Stores of a Context.
    pub async fn list_stores(
        &self,
        context_id: &str,
        page_index: u64,
        options: ListOptions,
    ) -> Result<PagingList<Store>> {
        let api = self.api().await?;
        api.list_stores(context_id, options.to_query(page_index)).await
    }
}

// ============================================================================
// Stores - Files
// ============================================================================

impl Stores {
    /// Fetches a file's metadata.
    pub async fn get_file(&self, file_id: &str) -> Result<PrivmxFile> {
        self.api().await?.get_file(file_id).await
    }

    /// Replaces a file's metadata, leaving its content untouched.
    pub async fn update_file_meta(
        &self,
        file_id: &str,
        public_meta: &[u8],
        private_meta: &[u8],
    ) -> Result<()> {
        let api = self.api().await?;
        api.update_file_meta(file_id, public_meta, private_meta).await
    }

    /// Deletes a file.
    pub async fn delete_file(&self, file_id: &str) -> Result<()> {
        self.api().await?.delete_file(file_id).await
    }

    /// Opens a file for chunked reading.
    ///
    /// The file's size is fetched first so the reader reports progress.
    pub async fn stream_read(&self, file_id: &str) -> Result<StreamReader> {
        let api = self.api().await?;
        let size = api.get_file(file_id).await?.size;
        let reader_api: Arc<dyn FileReadApi> = api;
        StreamReader::open(reader_api, file_id, size).await
    }

    /// Downloads a file's whole content.
    pub async fn get_file_contents(&self, file_id: &str) -> Result<Vec<u8>> {
        self.get_file_contents_with_progress(file_id, |_| {}).await
    }

    /// Downloads a file's whole content, reporting progress after each chunk.
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

    /// Writes `data[offset..]` after the file's current content.
    ///
    /// Returns the file ID.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `offset` is past the end of
    /// `data`; nothing is opened in that case.
    pub async fn update_file(&self, file_id: &str, data: Vec<u8>, offset: u64) -> Result<String> {
        self.update_file_with_progress(file_id, data, offset, |_| {})
            .await
    }

    /// [`update_file`](Self::update_file) with a progress callback.
    pub async fn update_file_with_progress<F>(
        &self,
        file_id: &str,
        data: Vec<u8>,
        offset: u64,
        on_progress: F,
    ) -> Result<String>
    where
        F: FnMut(f64) + Send,
    {
        if offset > data.len() as u64 {
            return Err(Error::invalid_argument(format!(
                "offset {offset} is past the end of a {}-byte payload",
                data.len()
            )));
        }

        let api = self.api().await?;
        let handle = api.open_file(file_id).await?;
        debug!(file_id = %file_id, offset, len = data.len(), "Updating file content");

        let uploader = StoreUploader::new(StoreFileSink::new(api, handle), data).starting_at(offset)?;
        drive_to_close(uploader, on_progress).await
    }

    /// Replaces a file's content and metadata. Returns the file ID.
    pub async fn override_file(&self, file_id: &str, payload: StoreFilePayload) -> Result<String> {
        self.override_file_with_progress(file_id, payload, |_| {})
            .await
    }

    /// [`override_file`](Self::override_file) with a progress callback.
    pub async fn override_file_with_progress<F>(
        &self,
        file_id: &str,
        payload: StoreFilePayload,
        on_progress: F,
    ) -> Result<String>
    where
        F: FnMut(f64) + Send,
    {
        let api = self.api().await?;
        let handle = api
            .update_file(
                file_id,
                &payload.public_meta,
                &payload.private_meta,
                payload.data.len() as u64,
            )
            .await?;
        debug!(file_id = %file_id, size = payload.data.len(), "Overriding file");

        let uploader = StoreUploader::new(StoreFileSink::new(api, handle), payload.data);
        drive_to_close(uploader, on_progress).await
    }
}

// ============================================================================
// Stores - Events
// ============================================================================

impl Stores {
    /// Subscribes to Store lifecycle events (`storeCreated`, `storeUpdated`,
    /// `storeDeleted`, `storeStatsChanged`).
    pub async fn subscribe_for_store_events(&self) -> Result<ChannelListeners> {
        let api = self.api().await?;
        subscribe_channel(self.endpoint.dispatcher(), Channel::Store, move || async move {
            api.subscribe_for_store_events().await
        })
        .await
    }

    /// Unsubscribes from Store lifecycle events. No-op when not subscribed.
    pub async fn unsubscribe_from_store_events(&self) -> Result<()> {
        let endpoint = self.endpoint.clone();
        unsubscribe_channel(self.endpoint.dispatcher(), Channel::Store, move || async move {
            endpoint.store_api().await?.unsubscribe_from_store_events().await
        })
        .await
    }

    /// Registers a listener on the `store` channel.
    pub fn on<F>(&self, event_type: EventType, callback: F) -> Registration
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        ChannelListeners::new(self.endpoint.dispatcher().clone(), Channel::Store)
            .on(event_type, callback)
    }
}

// ============================================================================
// StoreClient
// ============================================================================

/// Operations on one Store.
#[derive(Debug, Clone)]
pub struct StoreClient {
    endpoint: Endpoint,
    store_id: String,
}

impl StoreClient {
    pub(crate) fn new(endpoint: Endpoint, store_id: String) -> Self {
        Self { endpoint, store_id }
    }

    async fn api(&self) -> Result<Arc<dyn StoreApi>> {
        self.endpoint.store_api().await
    }

    fn channel(&self) -> Channel {
        Channel::store_files(self.store_id.clone())
    }

    /// Returns the Store ID.
    #[inline]
    #[must_use]
    pub fn store_id(&self) -> &str {
        &self.store_id
    }

    /// Fetches the Store.
    pub async fn info(&self) -> Result<Store> {
        self.api().await?.get_store(&self.store_id).await
    }

    /// Replaces the Store's users, managers and metadata.
    pub async fn update(&self, payload: UpdateContainerPayload) -> Result<()> {
        self.api().await?.update_store(&self.store_id, &payload).await
    }

    /// Deletes the Store.
    pub async fn delete(&self) -> Result<()> {
        self.api().await?.delete_store(&self.store_id).await
    }

    /// Lists the Store's files.
    pub async fn list_files(
        &self,
        page_index: u64,
        options: ListOptions,
    ) -> Result<PagingList<PrivmxFile>> {
        let api = self.api().await?;
        api.list_files(&self.store_id, options.to_query(page_index))
            .await
    }
}

// ============================================================================
// StoreClient - Uploads
// ============================================================================

impl StoreClient {
    /// Creates a file and returns an uploader for its in-memory content.
    pub async fn stream_data(&self, payload: StoreFilePayload) -> Result<StoreUploader> {
        let api = self.api().await?;
        let handle = api
            .create_file(
                &self.store_id,
                &payload.public_meta,
                &payload.private_meta,
                payload.data.len() as u64,
            )
            .await?;
        debug!(store_id = %self.store_id, handle = %handle, size = payload.data.len(), "File created");

        Ok(StoreUploader::new(StoreFileSink::new(api, handle), payload.data))
    }

    /// Creates a file of `size` bytes and returns an uploader reading them
    /// from `reader`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyFile`] if `size` is zero; no file is created.
    pub async fn stream_file<R>(
        &self,
        reader: R,
        size: u64,
        public_meta: &[u8],
        private_meta: &[u8],
    ) -> Result<StoreUploader>
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        if size == 0 {
            return Err(Error::EmptyFile);
        }

        let api = self.api().await?;
        let handle = api
            .create_file(&self.store_id, public_meta, private_meta, size)
            .await?;
        debug!(store_id = %self.store_id, handle = %handle, size, "Streamed file created");

        StoreUploader::from_stream(StoreFileSink::new(api, handle), reader, size)
    }

    /// Uploads a new file and returns its ID.
    pub async fn upload_data(&self, payload: StoreFilePayload) -> Result<String> {
        self.upload_data_with_progress(payload, |_| {}).await
    }

    /// Uploads a new file, reporting progress after each chunk.
    ///
    /// A failed upload is aborted so no partial file is left behind.
    pub async fn upload_data_with_progress<F>(
        &self,
        payload: StoreFilePayload,
        on_progress: F,
    ) -> Result<String>
    where
        F: FnMut(f64) + Send,
    {
        let uploader = self.stream_data(payload).await?;
        drive_or_abort(uploader, on_progress).await
    }

    /// Uploads `size` bytes from `reader` as a new file and returns its ID.
    pub async fn upload_file<R, F>(
        &self,
        reader: R,
        size: u64,
        public_meta: &[u8],
        private_meta: &[u8],
        on_progress: F,
    ) -> Result<String>
    where
        R: AsyncRead + Send + Unpin + 'static,
        F: FnMut(f64) + Send,
    {
        let uploader = self
            .stream_file(reader, size, public_meta, private_meta)
            .await?;
        drive_or_abort(uploader, on_progress).await
    }
}

// ============================================================================
// StoreClient - Events
// ============================================================================

impl StoreClient {
    /// Subscribes to file events (`storeFileCreated`, `storeFileUpdated`,
    /// `storeFileDeleted`) of this Store.
    pub async fn subscribe_for_file_events(&self) -> Result<ChannelListeners> {
        let api = self.api().await?;
        let store_id = self.store_id.clone();
        subscribe_channel(self.endpoint.dispatcher(), self.channel(), move || async move {
            api.subscribe_for_file_events(&store_id).await
        })
        .await
    }

    /// Unsubscribes from file events. No-op when not subscribed.
    pub async fn unsubscribe_from_file_events(&self) -> Result<()> {
        let endpoint = self.endpoint.clone();
        let store_id = self.store_id.clone();
        unsubscribe_channel(self.endpoint.dispatcher(), self.channel(), move || async move {
            endpoint
                .store_api()
                .await?
                .unsubscribe_from_file_events(&store_id)
                .await
        })
        .await
    }

    /// Registers a listener on this Store's file channel.
    pub fn on<F>(&self, event_type: EventType, callback: F) -> Registration
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        ChannelListeners::new(self.endpoint.dispatcher().clone(), self.channel())
            .on(event_type, callback)
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Sends every chunk and closes the handle.
async fn drive_to_close<F>(mut uploader: StoreUploader, on_progress: F) -> Result<String>
where
    F: FnMut(f64) + Send,
{
    uploader.send_all(on_progress).await?;
    uploader.close().await
}

/// Sends every chunk and closes the handle; aborts the new file on failure.
async fn drive_or_abort<F>(mut uploader: StoreUploader, on_progress: F) -> Result<String>
where
    F: FnMut(f64) + Send,
{
    if let Err(e) = uploader.send_all(on_progress).await {
        warn!(handle = %uploader.handle(), error = %e, "Upload failed, aborting");
        if let Err(abort_error) = uploader.abort().await {
            warn!(error = %abort_error, "Abort after failed upload also failed");
        }
        return Err(e);
    }
    uploader.close().await
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use crate::context::ConnectionConfig;
    use crate::protocol::{EventKind, RawEvent};
    use crate::testing::{MockEndpoint, mock_context};
    use crate::transfer::MAX_CHUNK_SIZE;

    const M: usize = MAX_CHUNK_SIZE;

    async fn connected() -> (Endpoint, MockEndpoint) {
        let (context, mock) = mock_context();
        let config = ConnectionConfig::builder()
            .bridge_url("http://localhost:9111")
            .solution_id("solution")
            .private_key("L1key")
            .build()
            .expect("config");
        let endpoint = context.connect(config).await.expect("connect");
        (endpoint, mock)
    }

    fn payload(data: Vec<u8>) -> StoreFilePayload {
        StoreFilePayload {
            data,
            ..StoreFilePayload::default()
        }
    }

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[tokio::test]
    async fn test_upload_three_and_a_half_chunks() {
        let (endpoint, mock) = connected().await;
        let store = endpoint.store("S1").expect("store");
        let data = pattern(3 * M + M / 2);
        let mut reported = Vec::new();

        let file_id = store
            .upload_data_with_progress(payload(data.clone()), |p| reported.push(p))
            .await
            .expect("upload");

        assert_eq!(mock.writes(), vec![M, M, M, M / 2]);
        assert_eq!(mock.content(&file_id), Some(data));
        assert_eq!(reported.len(), 4);
        assert!(reported.windows(2).all(|w| w[0] <= w[1]));
        assert!((reported[3] - 100.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_stream_data_manual_driving() {
        let (endpoint, mock) = connected().await;
        let store = endpoint.store("S1").expect("store");

        let mut uploader = store.stream_data(payload(pattern(M + 1))).await.expect("stream");
        assert!(uploader.send_next_chunk().await.expect("first"));
        assert!(!uploader.send_next_chunk().await.expect("second"));
        let file_id = uploader.close().await.expect("close");

        assert_eq!(mock.content(&file_id).map(|c| c.len()), Some(M + 1));
        assert_eq!(mock.open_handles(), 0);
    }

    #[tokio::test]
    async fn test_failed_upload_aborts() {
        let (endpoint, mock) = connected().await;
        let store = endpoint.store("S1").expect("store");
        mock.fail_next("write_to_file");

        let err = store.upload_data(payload(pattern(10))).await.expect_err("write fails");

        assert!(matches!(err, Error::Endpoint { .. }));
        assert_eq!(mock.count("delete_file"), 1);
        assert_eq!(mock.open_handles(), 0);
    }

    #[tokio::test]
    async fn test_stream_file_from_tempfile() {
        let (endpoint, mock) = connected().await;
        let store = endpoint.store("S1").expect("store");
        let data = pattern(2 * M + 7);

        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(&data).expect("write");
        let reader = tokio::fs::File::open(file.path()).await.expect("open");

        let file_id = store
            .upload_file(reader, data.len() as u64, b"pub", b"priv", |_| {})
            .await
            .expect("upload");

        assert_eq!(mock.content(&file_id), Some(data));
    }

    #[tokio::test]
    async fn test_stream_file_empty_is_rejected_before_create() {
        let (endpoint, mock) = connected().await;
        let store = endpoint.store("S1").expect("store");

        let err = store
            .stream_file(tokio::io::empty(), 0, b"", b"")
            .await
            .expect_err("empty");

        assert!(matches!(err, Error::EmptyFile));
        assert_eq!(mock.count("create_file"), 0);
    }

    #[tokio::test]
    async fn test_get_file_contents() {
        let (endpoint, mock) = connected().await;
        let data = pattern(2 * M + M / 2);
        let file_id = mock.put_file("S1", data.clone());
        let mut reported = Vec::new();

        let content = endpoint
            .stores()
            .expect("stores")
            .get_file_contents_with_progress(&file_id, |p| reported.push(p))
            .await
            .expect("download");

        assert_eq!(content, data);
        assert_eq!(mock.count("read_from_file"), 3);
        assert!((reported[2] - 100.0).abs() < f64::EPSILON);
        assert_eq!(mock.open_handles(), 0);
    }

    #[tokio::test]
    async fn test_stream_read_exact_multiple() {
        let (endpoint, mock) = connected().await;
        let file_id = mock.put_file("S1", pattern(2 * M));

        let mut reader = endpoint
            .stores()
            .expect("stores")
            .stream_read(&file_id)
            .await
            .expect("open");
        assert_eq!(reader.size(), (2 * M) as u64);
        assert!(reader.read_next_chunk().await.expect("1"));
        assert!(reader.read_next_chunk().await.expect("2"));
        assert!(!reader.read_next_chunk().await.expect("eof"));

        assert_eq!(reader.close().await.expect("close").len(), 2 * M);
    }

    #[tokio::test]
    async fn test_update_file_appends_from_offset() {
        let (endpoint, mock) = connected().await;
        let file_id = mock.put_file("S1", b"abc".to_vec());
        let stores = endpoint.stores().expect("stores");

        let returned = stores
            .update_file(&file_id, b"xyzdef".to_vec(), 3)
            .await
            .expect("update");

        assert_eq!(returned, file_id);
        assert_eq!(mock.content(&file_id), Some(b"abcdef".to_vec()));
    }

    #[tokio::test]
    async fn test_update_file_rejects_offset_past_end() {
        let (endpoint, mock) = connected().await;
        let file_id = mock.put_file("S1", b"abc".to_vec());

        let err = endpoint
            .stores()
            .expect("stores")
            .update_file(&file_id, b"xy".to_vec(), 3)
            .await
            .expect_err("bad offset");

        assert!(matches!(err, Error::InvalidArgument { .. }));
        assert_eq!(mock.count("open_file"), 0);
    }

    #[tokio::test]
    async fn test_override_file_replaces_content() {
        let (endpoint, mock) = connected().await;
        let file_id = mock.put_file("S1", pattern(M + 5));

        endpoint
            .stores()
            .expect("stores")
            .override_file(&file_id, payload(b"short".to_vec()))
            .await
            .expect("override");

        assert_eq!(mock.content(&file_id), Some(b"short".to_vec()));
    }

    #[tokio::test]
    async fn test_file_meta_and_delete() {
        let (endpoint, mock) = connected().await;
        let file_id = mock.put_file("S1", b"x".to_vec());
        let stores = endpoint.stores().expect("stores");

        stores
            .update_file_meta(&file_id, b"public", b"private")
            .await
            .expect("meta");
        let file = stores.get_file(&file_id).await.expect("get");
        assert_eq!(file.public_meta, b"public");
        assert_eq!(file.size, 1);

        stores.delete_file(&file_id).await.expect("delete");
        assert!(mock.is_deleted(&file_id));
    }

    #[tokio::test]
    async fn test_store_crud_and_listing() {
        let (endpoint, mock) = connected().await;
        let stores = endpoint.stores().expect("stores");

        let store_id = stores
            .create_store(CreateContainerPayload {
                context_id: "ctx-1".to_string(),
                ..CreateContainerPayload::default()
            })
            .await
            .expect("create");
        let store = stores.store(&store_id);
        assert_eq!(store.info().await.expect("info").store_id, store_id);

        store.upload_data(payload(b"one".to_vec())).await.expect("upload");
        let files = store.list_files(0, ListOptions::default()).await.expect("files");
        assert_eq!(files.total_available, 1);

        let page = stores
            .list_stores("ctx-1", 0, ListOptions::default())
            .await
            .expect("list");
        assert_eq!(page.read_items.len(), 1);
        assert_eq!(mock.queries().len(), 2);

        store.delete().await.expect("delete");
        assert!(store.info().await.is_err());
    }

    #[tokio::test]
    async fn test_file_events_subscription() {
        let (endpoint, mock) = connected().await;
        let store = endpoint.store("S1").expect("store");
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);

        store
            .subscribe_for_file_events()
            .await
            .expect("subscribe")
            .on(EventType::StoreFileDeleted, move |event| {
                assert!(matches!(&event.kind, EventKind::StoreFileDeleted(d) if d.file_id == "F1"));
                counter.fetch_add(1, Ordering::SeqCst);
            });

        let event = RawEvent::new(
            "storeFileDeleted",
            "store/S1/files",
            json!({ "contextId": "C", "storeId": "S1", "fileId": "F1" }),
            endpoint.connection_id().clone(),
        )
        .parse()
        .expect("event");
        endpoint.dispatcher().dispatch_event(&event);
        assert_eq!(count.load(Ordering::SeqCst), 1);

        store.unsubscribe_from_file_events().await.expect("unsubscribe");
        store.unsubscribe_from_file_events().await.expect("second unsubscribe");
        endpoint.dispatcher().dispatch_event(&event);

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(mock.count("subscribe_for_file_events"), 1);
        assert_eq!(mock.count("unsubscribe_from_file_events"), 1);
    }

    #[tokio::test]
    async fn test_store_events_unsubscribe_without_subscribe() {
        let (endpoint, mock) = connected().await;
        let stores = endpoint.stores().expect("stores");
        stores.on(EventType::StoreCreated, |_| {});

        stores.unsubscribe_from_store_events().await.expect("noop");

        assert_eq!(mock.count("unsubscribe_from_store_events"), 0);
        assert_eq!(
            endpoint.dispatcher().listener_count(&Channel::Store, EventType::StoreCreated),
            1
        );
    }
}
