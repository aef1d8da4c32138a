//! In-memory native endpoint for unit tests.
//!
//! [`MockEndpoint`] implements every native trait. It keeps entities and
//! file contents in memory, records each RPC by name, can be told to fail
//! the next calls of a given name, and feeds the event queue through an
//! unbounded tokio channel.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::mpsc;

use crate::context::EndpointContext;
use crate::error::{Error, Result};
use crate::identifiers::{ConnectionId, FileHandle, InboxHandle};
use crate::protocol::{
    Context, CreateContainerPayload, FilesConfig, Inbox, InboxEntry, InboxPublicView, Message,
    PagingList, PagingQuery, PrivmxFile, RawEvent, ServerFileInfo, ServerMessageInfo, Store,
    Thread, UpdateContainerPayload,
};
use crate::transport::native::{
    ConnectionApi, CryptoApi, EndpointFactory, EventQueue, FileReadApi, InboxApi, StoreApi,
    ThreadApi,
};

// ============================================================================
// Helpers
// ============================================================================

/// Installs a test subscriber honoring `RUST_LOG`. Safe to call repeatedly.
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Builds a context over a fresh mock.
pub(crate) fn mock_context() -> (EndpointContext, MockEndpoint) {
    init_tracing();
    let mock = MockEndpoint::new();
    let context = EndpointContext::new(Arc::new(mock.clone()));
    (context, mock)
}

/// Applies a paging query to an in-memory list.
fn page<T: Clone>(items: &[T], query: &PagingQuery) -> PagingList<T> {
    let skip = usize::try_from(query.skip).unwrap_or(usize::MAX);
    let limit = usize::try_from(query.limit).unwrap_or(usize::MAX);
    PagingList {
        total_available: items.len() as u64,
        read_items: items.iter().skip(skip).take(limit).cloned().collect(),
    }
}

// ============================================================================
// State
// ============================================================================

/// Open server-side file cursor.
#[derive(Debug, Clone, Default)]
struct OpenFile {
    file_id: String,
    store_id: String,
    position: usize,
    content: Vec<u8>,
    written: bool,
}

/// Entry prepared but not yet sent.
#[derive(Debug, Clone)]
struct PreparedEntry {
    inbox_id: String,
    data: Vec<u8>,
    files: Vec<FileHandle>,
}

#[derive(Default)]
struct Storage {
    threads: Vec<Thread>,
    messages: Vec<Message>,
    stores: Vec<Store>,
    inboxes: Vec<Inbox>,
    entries: Vec<InboxEntry>,
    files: FxHashMap<String, PrivmxFile>,
    contents: FxHashMap<String, Vec<u8>>,
    open: FxHashMap<u64, OpenFile>,
    prepared: FxHashMap<u64, PreparedEntry>,
}

struct MockState {
    next_id: AtomicU64,
    calls: Mutex<Vec<String>>,
    writes: Mutex<Vec<usize>>,
    queries: Mutex<Vec<PagingQuery>>,
    failing: Mutex<FxHashMap<String, usize>>,
    storage: Mutex<Storage>,
    event_tx: Mutex<Option<mpsc::UnboundedSender<RawEvent>>>,
    event_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<RawEvent>>,
}

// ============================================================================
// MockEndpoint
// ============================================================================

/// In-memory implementation of every native trait.
#[derive(Clone)]
pub(crate) struct MockEndpoint {
    state: Arc<MockState>,
}

impl MockEndpoint {
    pub(crate) fn new() -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        Self {
            state: Arc::new(MockState {
                next_id: AtomicU64::new(1),
                calls: Mutex::new(Vec::new()),
                writes: Mutex::new(Vec::new()),
                queries: Mutex::new(Vec::new()),
                failing: Mutex::new(FxHashMap::default()),
                storage: Mutex::new(Storage::default()),
                event_tx: Mutex::new(Some(event_tx)),
                event_rx: tokio::sync::Mutex::new(event_rx),
            }),
        }
    }

    /// Queues an event for `wait_event`.
    pub(crate) fn push_event(&self, event: RawEvent) {
        if let Some(tx) = self.state.event_tx.lock().as_ref() {
            let _ = tx.send(event);
        }
    }

    /// Drops the queue sender; pending and future waits fail.
    pub(crate) fn close_queue(&self) {
        self.state.event_tx.lock().take();
    }

    /// Makes the next call named `op` fail.
    pub(crate) fn fail_next(&self, op: &str) {
        self.fail_times(op, 1);
    }

    /// Makes the next `times` calls named `op` fail.
    pub(crate) fn fail_times(&self, op: &str, times: usize) {
        self.state.failing.lock().insert(op.to_string(), times);
    }

    /// Number of recorded calls named `op`.
    pub(crate) fn count(&self, op: &str) -> usize {
        self.state.calls.lock().iter().filter(|call| *call == op).count()
    }

    /// All recorded call names, in order.
    pub(crate) fn calls(&self) -> Vec<String> {
        self.state.calls.lock().clone()
    }

    /// Lengths of every chunk written, in order.
    pub(crate) fn writes(&self) -> Vec<usize> {
        self.state.writes.lock().clone()
    }

    /// Paging queries received by list calls, in order.
    pub(crate) fn queries(&self) -> Vec<PagingQuery> {
        self.state.queries.lock().clone()
    }

    /// Stored content of a file.
    pub(crate) fn content(&self, file_id: &str) -> Option<Vec<u8>> {
        self.state.storage.lock().contents.get(file_id).cloned()
    }

    /// Stores a file directly, bypassing the handle protocol.
    pub(crate) fn put_file(&self, store_id: &str, content: Vec<u8>) -> String {
        let file_id = self.next("file");
        let mut storage = self.state.storage.lock();
        storage
            .files
            .insert(file_id.clone(), file_meta(store_id, &file_id, content.len()));
        storage.contents.insert(file_id.clone(), content);
        file_id
    }

    /// Returns true if no file with `file_id` exists.
    pub(crate) fn is_deleted(&self, file_id: &str) -> bool {
        !self.state.storage.lock().files.contains_key(file_id)
    }

    /// Number of handles still open.
    pub(crate) fn open_handles(&self) -> usize {
        self.state.storage.lock().open.len()
    }

    /// Sent Inbox entries.
    pub(crate) fn entries(&self) -> Vec<InboxEntry> {
        self.state.storage.lock().entries.clone()
    }

    fn record(&self, op: &str) -> Result<()> {
        self.state.calls.lock().push(op.to_string());
        let mut failing = self.state.failing.lock();
        match failing.get_mut(op) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                if *remaining == 0 {
                    failing.remove(op);
                }
                Err(Error::endpoint(format!("{op} failed")))
            }
            _ => Ok(()),
        }
    }

    fn record_query(&self, op: &str, query: PagingQuery) -> Result<PagingQuery> {
        self.record(op)?;
        self.state.queries.lock().push(query.clone());
        Ok(query)
    }

    fn raw_id(&self) -> u64 {
        self.state.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn next(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.raw_id())
    }

    fn open_handle(&self, file: OpenFile) -> FileHandle {
        let raw = self.raw_id();
        self.state.storage.lock().open.insert(raw, file);
        FileHandle::new(raw)
    }

    fn append(&self, handle: FileHandle, chunk: &[u8]) -> Result<()> {
        let mut storage = self.state.storage.lock();
        let file = storage
            .open
            .get_mut(&handle.as_u64())
            .ok_or_else(|| Error::endpoint(format!("unknown handle {handle}")))?;
        file.content.extend_from_slice(chunk);
        file.written = true;
        self.state.writes.lock().push(chunk.len());
        Ok(())
    }
}

fn file_meta(store_id: &str, file_id: &str, size: usize) -> PrivmxFile {
    PrivmxFile {
        info: ServerFileInfo {
            store_id: store_id.to_string(),
            file_id: file_id.to_string(),
            create_date: 0,
            author: "mock".to_string(),
        },
        size: size as u64,
        ..PrivmxFile::default()
    }
}

// ============================================================================
// EndpointFactory
// ============================================================================

#[async_trait]
impl EndpointFactory for MockEndpoint {
    async fn connect(
        &self,
        _private_key: &str,
        _solution_id: &str,
        _bridge_url: &str,
    ) -> Result<Arc<dyn ConnectionApi>> {
        self.record("connect")?;
        Ok(Arc::new(MockConnection {
            id: ConnectionId::new(self.next("conn")),
            endpoint: self.clone(),
        }))
    }

    async fn connect_public(
        &self,
        _solution_id: &str,
        _bridge_url: &str,
    ) -> Result<Arc<dyn ConnectionApi>> {
        self.record("connect_public")?;
        Ok(Arc::new(MockConnection {
            id: ConnectionId::new(self.next("public")),
            endpoint: self.clone(),
        }))
    }

    async fn create_thread_api(
        &self,
        _connection: &Arc<dyn ConnectionApi>,
    ) -> Result<Arc<dyn ThreadApi>> {
        self.record("create_thread_api")?;
        Ok(Arc::new(self.clone()))
    }

    async fn create_store_api(
        &self,
        _connection: &Arc<dyn ConnectionApi>,
    ) -> Result<Arc<dyn StoreApi>> {
        self.record("create_store_api")?;
        Ok(Arc::new(self.clone()))
    }

    async fn create_inbox_api(
        &self,
        _connection: &Arc<dyn ConnectionApi>,
        _thread_api: &Arc<dyn ThreadApi>,
        _store_api: &Arc<dyn StoreApi>,
    ) -> Result<Arc<dyn InboxApi>> {
        self.record("create_inbox_api")?;
        Ok(Arc::new(self.clone()))
    }

    async fn event_queue(&self) -> Result<Arc<dyn EventQueue>> {
        self.record("event_queue")?;
        Ok(Arc::new(self.clone()))
    }

    async fn create_crypto_api(&self) -> Result<Arc<dyn CryptoApi>> {
        self.record("create_crypto_api")?;
        Ok(Arc::new(self.clone()))
    }
}

// ============================================================================
// CryptoApi
// ============================================================================

/// Stand-in primitives: keys are tagged strings, ciphers are XOR.
#[async_trait]
impl CryptoApi for MockEndpoint {
    async fn sign_data(&self, data: &[u8], private_key: &str) -> Result<Vec<u8>> {
        self.record("sign_data")?;
        Ok(mock_signature(data, private_key))
    }

    async fn verify_signature(
        &self,
        data: &[u8],
        signature: &[u8],
        public_key: &str,
    ) -> Result<bool> {
        self.record("verify_signature")?;
        Ok(public_key
            .strip_prefix("pub-")
            .is_some_and(|private_key| mock_signature(data, private_key) == signature))
    }

    async fn encrypt_data_symmetric(&self, data: &[u8], key: &[u8]) -> Result<Vec<u8>> {
        self.record("encrypt_data_symmetric")?;
        xor(data, key)
    }

    async fn decrypt_data_symmetric(&self, data: &[u8], key: &[u8]) -> Result<Vec<u8>> {
        self.record("decrypt_data_symmetric")?;
        xor(data, key)
    }

    async fn generate_private_key(&self, random_seed: Option<&str>) -> Result<String> {
        self.record("generate_private_key")?;
        Ok(random_seed.map_or_else(|| self.next("wif"), |seed| format!("wif-{seed}")))
    }

    async fn derive_private_key(&self, password: &str, salt: &str) -> Result<String> {
        self.record("derive_private_key")?;
        Ok(format!("wif-{salt}-{password}"))
    }

    async fn derive_public_key(&self, private_key: &str) -> Result<String> {
        self.record("derive_public_key")?;
        Ok(format!("pub-{private_key}"))
    }

    async fn generate_key_symmetric(&self) -> Result<Vec<u8>> {
        self.record("generate_key_symmetric")?;
        let base = self.raw_id();
        Ok((0..32u64).map(|i| (base.wrapping_add(i) as u8) | 1).collect())
    }

    async fn derive_key_symmetric(&self, password: &str, salt: &str) -> Result<Vec<u8>> {
        self.record("derive_key_symmetric")?;
        let seed = format!("{salt}:{password}");
        Ok(seed.bytes().cycle().take(32).collect())
    }

    async fn convert_pem_key_to_wif_key(&self, pem_key: &str) -> Result<String> {
        self.record("convert_pem_key_to_wif_key")?;
        if !pem_key.starts_with("-----BEGIN") {
            return Err(Error::invalid_argument("not a PEM key"));
        }
        let body: String = pem_key
            .lines()
            .filter(|line| !line.starts_with("-----"))
            .collect();
        Ok(format!("wif-{body}"))
    }
}

fn mock_signature(data: &[u8], private_key: &str) -> Vec<u8> {
    let mut signature = format!("sig:{private_key}:").into_bytes();
    signature.extend_from_slice(data);
    signature
}

fn xor(data: &[u8], key: &[u8]) -> Result<Vec<u8>> {
    if key.is_empty() {
        return Err(Error::invalid_argument("empty symmetric key"));
    }
    Ok(data
        .iter()
        .zip(key.iter().cycle())
        .map(|(byte, k)| byte ^ k)
        .collect())
}

// ============================================================================
// MockConnection
// ============================================================================

struct MockConnection {
    id: ConnectionId,
    endpoint: MockEndpoint,
}

#[async_trait]
impl ConnectionApi for MockConnection {
    async fn connection_id(&self) -> Result<ConnectionId> {
        Ok(self.id.clone())
    }

    async fn list_contexts(&self, query: PagingQuery) -> Result<PagingList<Context>> {
        let query = self.endpoint.record_query("list_contexts", query)?;
        let contexts = [Context {
            user_id: "alice".to_string(),
            context_id: "ctx-1".to_string(),
        }];
        Ok(page(&contexts, &query))
    }

    async fn disconnect(&self) -> Result<()> {
        self.endpoint.record("disconnect")
    }
}

// ============================================================================
// EventQueue
// ============================================================================

#[async_trait]
impl EventQueue for MockEndpoint {
    async fn wait_event(&self) -> Result<RawEvent> {
        self.record("wait_event")?;
        let mut rx = self.state.event_rx.lock().await;
        rx.recv().await.ok_or(Error::EventQueueClosed)
    }

    async fn emit_break_event(&self) -> Result<()> {
        self.record("emit_break_event")?;
        self.push_event(RawEvent::break_event());
        Ok(())
    }
}

// ============================================================================
// FileReadApi
// ============================================================================

#[async_trait]
impl FileReadApi for MockEndpoint {
    async fn open_file(&self, file_id: &str) -> Result<FileHandle> {
        self.record("open_file")?;
        let (store_id, content) = {
            let storage = self.state.storage.lock();
            let meta = storage
                .files
                .get(file_id)
                .ok_or_else(|| Error::endpoint(format!("no file {file_id}")))?;
            let content = storage.contents.get(file_id).cloned().unwrap_or_default();
            (meta.info.store_id.clone(), content)
        };
        Ok(self.open_handle(OpenFile {
            file_id: file_id.to_string(),
            store_id,
            position: 0,
            content,
            written: false,
        }))
    }

    async fn read_from_file(&self, handle: FileHandle, length: u64) -> Result<Vec<u8>> {
        self.record("read_from_file")?;
        let mut storage = self.state.storage.lock();
        let file = storage
            .open
            .get_mut(&handle.as_u64())
            .ok_or_else(|| Error::endpoint(format!("unknown handle {handle}")))?;
        let start = file.position.min(file.content.len());
        let end = start
            .saturating_add(usize::try_from(length).unwrap_or(usize::MAX))
            .min(file.content.len());
        file.position = end;
        Ok(file.content[start..end].to_vec())
    }

    async fn seek_in_file(&self, handle: FileHandle, position: u64) -> Result<()> {
        self.record("seek_in_file")?;
        let mut storage = self.state.storage.lock();
        let file = storage
            .open
            .get_mut(&handle.as_u64())
            .ok_or_else(|| Error::endpoint(format!("unknown handle {handle}")))?;
        file.position = usize::try_from(position).unwrap_or(usize::MAX);
        Ok(())
    }

    async fn close_file(&self, handle: FileHandle) -> Result<String> {
        self.record("close_file")?;
        let mut storage = self.state.storage.lock();
        let file = storage
            .open
            .remove(&handle.as_u64())
            .ok_or_else(|| Error::endpoint(format!("unknown handle {handle}")))?;
        if file.written && !file.store_id.is_empty() {
            storage.files.insert(
                file.file_id.clone(),
                file_meta(&file.store_id, &file.file_id, file.content.len()),
            );
            storage.contents.insert(file.file_id.clone(), file.content);
        }
        Ok(file.file_id)
    }
}

// ============================================================================
// ThreadApi
// ============================================================================

#[async_trait]
impl ThreadApi for MockEndpoint {
    async fn create_thread(&self, payload: &CreateContainerPayload) -> Result<String> {
        self.record("create_thread")?;
        let thread_id = self.next("thread");
        self.state.storage.lock().threads.push(Thread {
            thread_id: thread_id.clone(),
            context_id: payload.context_id.clone(),
            public_meta: payload.public_meta.clone(),
            private_meta: payload.private_meta.clone(),
            users: payload.users.iter().map(|u| u.user_id.clone()).collect(),
            managers: payload.managers.iter().map(|u| u.user_id.clone()).collect(),
            ..Thread::default()
        });
        Ok(thread_id)
    }

    async fn update_thread(
        &self,
        thread_id: &str,
        payload: &UpdateContainerPayload,
    ) -> Result<()> {
        self.record("update_thread")?;
        let mut storage = self.state.storage.lock();
        let thread = storage
            .threads
            .iter_mut()
            .find(|t| t.thread_id == thread_id)
            .ok_or_else(|| Error::endpoint("no thread"))?;
        thread.public_meta = payload.public_meta.clone();
        thread.private_meta = payload.private_meta.clone();
        thread.version = payload.version + 1;
        Ok(())
    }

    async fn delete_thread(&self, thread_id: &str) -> Result<()> {
        self.record("delete_thread")?;
        self.state
            .storage
            .lock()
            .threads
            .retain(|t| t.thread_id != thread_id);
        Ok(())
    }

    async fn get_thread(&self, thread_id: &str) -> Result<Thread> {
        self.record("get_thread")?;
        self.state
            .storage
            .lock()
            .threads
            .iter()
            .find(|t| t.thread_id == thread_id)
            .cloned()
            .ok_or_else(|| Error::endpoint("no thread"))
    }

    async fn list_threads(
        &self,
        context_id: &str,
        query: PagingQuery,
    ) -> Result<PagingList<Thread>> {
        let query = self.record_query("list_threads", query)?;
        let threads: Vec<_> = self
            .state
            .storage
            .lock()
            .threads
            .iter()
            .filter(|t| t.context_id == context_id)
            .cloned()
            .collect();
        Ok(page(&threads, &query))
    }

    async fn send_message(
        &self,
        thread_id: &str,
        public_meta: &[u8],
        private_meta: &[u8],
        data: &[u8],
    ) -> Result<String> {
        self.record("send_message")?;
        let message_id = self.next("msg");
        self.state.storage.lock().messages.push(Message {
            info: ServerMessageInfo {
                thread_id: thread_id.to_string(),
                message_id: message_id.clone(),
                create_date: 0,
                author: "alice".to_string(),
            },
            public_meta: public_meta.to_vec(),
            private_meta: private_meta.to_vec(),
            data: data.to_vec(),
            ..Message::default()
        });
        Ok(message_id)
    }

    async fn delete_message(&self, message_id: &str) -> Result<()> {
        self.record("delete_message")?;
        self.state
            .storage
            .lock()
            .messages
            .retain(|m| m.info.message_id != message_id);
        Ok(())
    }

    async fn list_messages(
        &self,
        thread_id: &str,
        query: PagingQuery,
    ) -> Result<PagingList<Message>> {
        let query = self.record_query("list_messages", query)?;
        let messages: Vec<_> = self
            .state
            .storage
            .lock()
            .messages
            .iter()
            .filter(|m| m.info.thread_id == thread_id)
            .cloned()
            .collect();
        Ok(page(&messages, &query))
    }

    async fn get_message(&self, message_id: &str) -> Result<Message> {
        self.record("get_message")?;
        self.state
            .storage
            .lock()
            .messages
            .iter()
            .find(|m| m.info.message_id == message_id)
            .cloned()
            .ok_or_else(|| Error::endpoint("no message"))
    }

    async fn update_message(
        &self,
        message_id: &str,
        public_meta: &[u8],
        private_meta: &[u8],
        data: &[u8],
    ) -> Result<()> {
        self.record("update_message")?;
        let mut storage = self.state.storage.lock();
        let message = storage
            .messages
            .iter_mut()
            .find(|m| m.info.message_id == message_id)
            .ok_or_else(|| Error::endpoint("no message"))?;
        message.public_meta = public_meta.to_vec();
        message.private_meta = private_meta.to_vec();
        message.data = data.to_vec();
        Ok(())
    }

    async fn subscribe_for_thread_events(&self) -> Result<()> {
        self.record("subscribe_for_thread_events")
    }

    async fn unsubscribe_from_thread_events(&self) -> Result<()> {
        self.record("unsubscribe_from_thread_events")
    }

    async fn subscribe_for_message_events(&self, _thread_id: &str) -> Result<()> {
        self.record("subscribe_for_message_events")
    }

    async fn unsubscribe_from_message_events(&self, _thread_id: &str) -> Result<()> {
        self.record("unsubscribe_from_message_events")
    }
}

// ============================================================================
// StoreApi
// ============================================================================

#[async_trait]
impl StoreApi for MockEndpoint {
    async fn create_store(&self, payload: &CreateContainerPayload) -> Result<String> {
        self.record("create_store")?;
        let store_id = self.next("store");
        self.state.storage.lock().stores.push(Store {
            store_id: store_id.clone(),
            context_id: payload.context_id.clone(),
            public_meta: payload.public_meta.clone(),
            private_meta: payload.private_meta.clone(),
            ..Store::default()
        });
        Ok(store_id)
    }

    async fn update_store(&self, store_id: &str, payload: &UpdateContainerPayload) -> Result<()> {
        self.record("update_store")?;
        let mut storage = self.state.storage.lock();
        let store = storage
            .stores
            .iter_mut()
            .find(|s| s.store_id == store_id)
            .ok_or_else(|| Error::endpoint("no store"))?;
        store.public_meta = payload.public_meta.clone();
        store.version = payload.version + 1;
        Ok(())
    }

    async fn delete_store(&self, store_id: &str) -> Result<()> {
        self.record("delete_store")?;
        self.state
            .storage
            .lock()
            .stores
            .retain(|s| s.store_id != store_id);
        Ok(())
    }

    async fn get_store(&self, store_id: &str) -> Result<Store> {
        self.record("get_store")?;
        self.state
            .storage
            .lock()
            .stores
            .iter()
            .find(|s| s.store_id == store_id)
            .cloned()
            .ok_or_else(|| Error::endpoint("no store"))
    }

    async fn list_stores(&self, context_id: &str, query: PagingQuery) -> Result<PagingList<Store>> {
        let query = self.record_query("list_stores", query)?;
        let stores: Vec<_> = self
            .state
            .storage
            .lock()
            .stores
            .iter()
            .filter(|s| s.context_id == context_id)
            .cloned()
            .collect();
        Ok(page(&stores, &query))
    }

    async fn create_file(
        &self,
        store_id: &str,
        _public_meta: &[u8],
        _private_meta: &[u8],
        _size: u64,
    ) -> Result<FileHandle> {
        self.record("create_file")?;
        let file_id = self.next("file");
        Ok(self.open_handle(OpenFile {
            file_id,
            store_id: store_id.to_string(),
            ..OpenFile::default()
        }))
    }

    async fn update_file(
        &self,
        file_id: &str,
        _public_meta: &[u8],
        _private_meta: &[u8],
        _size: u64,
    ) -> Result<FileHandle> {
        self.record("update_file")?;
        let store_id = self
            .state
            .storage
            .lock()
            .files
            .get(file_id)
            .map(|f| f.info.store_id.clone())
            .ok_or_else(|| Error::endpoint(format!("no file {file_id}")))?;
        Ok(self.open_handle(OpenFile {
            file_id: file_id.to_string(),
            store_id,
            ..OpenFile::default()
        }))
    }

    async fn update_file_meta(
        &self,
        file_id: &str,
        public_meta: &[u8],
        private_meta: &[u8],
    ) -> Result<()> {
        self.record("update_file_meta")?;
        let mut storage = self.state.storage.lock();
        let file = storage
            .files
            .get_mut(file_id)
            .ok_or_else(|| Error::endpoint(format!("no file {file_id}")))?;
        file.public_meta = public_meta.to_vec();
        file.private_meta = private_meta.to_vec();
        Ok(())
    }

    async fn write_to_file(&self, handle: FileHandle, data: &[u8]) -> Result<()> {
        self.record("write_to_file")?;
        self.append(handle, data)
    }

    async fn delete_file(&self, file_id: &str) -> Result<()> {
        self.record("delete_file")?;
        let mut storage = self.state.storage.lock();
        storage.files.remove(file_id);
        storage.contents.remove(file_id);
        Ok(())
    }

    async fn get_file(&self, file_id: &str) -> Result<PrivmxFile> {
        self.record("get_file")?;
        self.state
            .storage
            .lock()
            .files
            .get(file_id)
            .cloned()
            .ok_or_else(|| Error::endpoint(format!("no file {file_id}")))
    }

    async fn list_files(
        &self,
        store_id: &str,
        query: PagingQuery,
    ) -> Result<PagingList<PrivmxFile>> {
        let query = self.record_query("list_files", query)?;
        let mut files: Vec<_> = self
            .state
            .storage
            .lock()
            .files
            .values()
            .filter(|f| f.info.store_id == store_id)
            .cloned()
            .collect();
        files.sort_by(|a, b| a.info.file_id.cmp(&b.info.file_id));
        Ok(page(&files, &query))
    }

    async fn subscribe_for_store_events(&self) -> Result<()> {
        self.record("subscribe_for_store_events")
    }

    async fn unsubscribe_from_store_events(&self) -> Result<()> {
        self.record("unsubscribe_from_store_events")
    }

    async fn subscribe_for_file_events(&self, _store_id: &str) -> Result<()> {
        self.record("subscribe_for_file_events")
    }

    async fn unsubscribe_from_file_events(&self, _store_id: &str) -> Result<()> {
        self.record("unsubscribe_from_file_events")
    }
}

// ============================================================================
// InboxApi
// ============================================================================

#[async_trait]
impl InboxApi for MockEndpoint {
    async fn create_inbox(
        &self,
        payload: &CreateContainerPayload,
        files_config: Option<FilesConfig>,
    ) -> Result<String> {
        self.record("create_inbox")?;
        let inbox_id = self.next("inbox");
        self.state.storage.lock().inboxes.push(Inbox {
            inbox_id: inbox_id.clone(),
            context_id: payload.context_id.clone(),
            public_meta: payload.public_meta.clone(),
            private_meta: payload.private_meta.clone(),
            files_config,
            ..Inbox::default()
        });
        Ok(inbox_id)
    }

    async fn update_inbox(
        &self,
        inbox_id: &str,
        payload: &UpdateContainerPayload,
        files_config: Option<FilesConfig>,
    ) -> Result<()> {
        self.record("update_inbox")?;
        let mut storage = self.state.storage.lock();
        let inbox = storage
            .inboxes
            .iter_mut()
            .find(|i| i.inbox_id == inbox_id)
            .ok_or_else(|| Error::endpoint("no inbox"))?;
        inbox.public_meta = payload.public_meta.clone();
        inbox.files_config = files_config;
        inbox.version = payload.version + 1;
        Ok(())
    }

    async fn get_inbox(&self, inbox_id: &str) -> Result<Inbox> {
        self.record("get_inbox")?;
        self.state
            .storage
            .lock()
            .inboxes
            .iter()
            .find(|i| i.inbox_id == inbox_id)
            .cloned()
            .ok_or_else(|| Error::endpoint("no inbox"))
    }

    async fn list_inboxes(&self, context_id: &str, query: PagingQuery) -> Result<PagingList<Inbox>> {
        let query = self.record_query("list_inboxes", query)?;
        let inboxes: Vec<_> = self
            .state
            .storage
            .lock()
            .inboxes
            .iter()
            .filter(|i| i.context_id == context_id)
            .cloned()
            .collect();
        Ok(page(&inboxes, &query))
    }

    async fn get_inbox_public_view(&self, inbox_id: &str) -> Result<InboxPublicView> {
        self.record("get_inbox_public_view")?;
        let storage = self.state.storage.lock();
        let inbox = storage
            .inboxes
            .iter()
            .find(|i| i.inbox_id == inbox_id)
            .ok_or_else(|| Error::endpoint("no inbox"))?;
        Ok(InboxPublicView {
            inbox_id: inbox.inbox_id.clone(),
            version: inbox.version,
            public_meta: inbox.public_meta.clone(),
        })
    }

    async fn delete_inbox(&self, inbox_id: &str) -> Result<()> {
        self.record("delete_inbox")?;
        self.state
            .storage
            .lock()
            .inboxes
            .retain(|i| i.inbox_id != inbox_id);
        Ok(())
    }

    async fn prepare_entry(
        &self,
        inbox_id: &str,
        data: &[u8],
        file_handles: &[FileHandle],
        _user_private_key: Option<&str>,
    ) -> Result<InboxHandle> {
        self.record("prepare_entry")?;
        let raw = self.raw_id();
        self.state.storage.lock().prepared.insert(
            raw,
            PreparedEntry {
                inbox_id: inbox_id.to_string(),
                data: data.to_vec(),
                files: file_handles.to_vec(),
            },
        );
        Ok(InboxHandle::new(raw))
    }

    async fn send_entry(&self, inbox_handle: InboxHandle) -> Result<()> {
        self.record("send_entry")?;
        let entry_id = self.next("entry");
        let mut storage = self.state.storage.lock();
        let prepared = storage
            .prepared
            .remove(&inbox_handle.as_u64())
            .ok_or_else(|| Error::endpoint("unknown inbox handle"))?;

        let mut files = Vec::with_capacity(prepared.files.len());
        for handle in &prepared.files {
            let file = storage
                .open
                .remove(&handle.as_u64())
                .ok_or_else(|| Error::endpoint(format!("unknown handle {handle}")))?;
            let meta = file_meta("", &file.file_id, file.content.len());
            storage.files.insert(file.file_id.clone(), meta.clone());
            storage.contents.insert(file.file_id, file.content);
            files.push(meta);
        }

        storage.entries.push(InboxEntry {
            entry_id,
            inbox_id: prepared.inbox_id,
            data: prepared.data,
            files,
            ..InboxEntry::default()
        });
        Ok(())
    }

    async fn read_entry(&self, entry_id: &str) -> Result<InboxEntry> {
        self.record("read_entry")?;
        self.state
            .storage
            .lock()
            .entries
            .iter()
            .find(|e| e.entry_id == entry_id)
            .cloned()
            .ok_or_else(|| Error::endpoint("no entry"))
    }

    async fn list_entries(
        &self,
        inbox_id: &str,
        query: PagingQuery,
    ) -> Result<PagingList<InboxEntry>> {
        let query = self.record_query("list_entries", query)?;
        let entries: Vec<_> = self
            .state
            .storage
            .lock()
            .entries
            .iter()
            .filter(|e| e.inbox_id == inbox_id)
            .cloned()
            .collect();
        Ok(page(&entries, &query))
    }

    async fn delete_entry(&self, entry_id: &str) -> Result<()> {
        self.record("delete_entry")?;
        self.state
            .storage
            .lock()
            .entries
            .retain(|e| e.entry_id != entry_id);
        Ok(())
    }

    async fn create_file_handle(
        &self,
        _public_meta: &[u8],
        _private_meta: &[u8],
        _size: u64,
    ) -> Result<FileHandle> {
        self.record("create_file_handle")?;
        let file_id = self.next("file");
        Ok(self.open_handle(OpenFile {
            file_id,
            ..OpenFile::default()
        }))
    }

    async fn write_to_file(
        &self,
        inbox_handle: InboxHandle,
        file_handle: FileHandle,
        chunk: &[u8],
    ) -> Result<()> {
        self.record("inbox_write_to_file")?;
        if !self
            .state
            .storage
            .lock()
            .prepared
            .contains_key(&inbox_handle.as_u64())
        {
            return Err(Error::endpoint("unknown inbox handle"));
        }
        self.append(file_handle, chunk)
    }

    async fn subscribe_for_inbox_events(&self) -> Result<()> {
        self.record("subscribe_for_inbox_events")
    }

    async fn unsubscribe_from_inbox_events(&self) -> Result<()> {
        self.record("unsubscribe_from_inbox_events")
    }

    async fn subscribe_for_entry_events(&self, _inbox_id: &str) -> Result<()> {
        self.record("subscribe_for_entry_events")
    }

    async fn unsubscribe_from_entry_events(&self, _inbox_id: &str) -> Result<()> {
        self.record("unsubscribe_from_entry_events")
    }
}
