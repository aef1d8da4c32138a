//! Native endpoint surface.
//!
//! The SDK never talks to the bridge itself: encryption, storage and the
//! wire transport live in the native library. These traits describe the RPC
//! surface that library exposes; every call is a suspension point.
//!
//! | Trait | Scope |
//! |-------|-------|
//! | [`EndpointFactory`] | Connecting and creating per-connection APIs |
//! | [`ConnectionApi`] | One live connection |
//! | [`ThreadApi`] | Threads and messages |
//! | [`StoreApi`] | Stores and files |
//! | [`InboxApi`] | Inboxes, entries and entry files |
//! | [`FileReadApi`] | Read handles shared by Stores and Inboxes |
//! | [`EventQueue`] | The one process-wide event queue |
//! | [`CryptoApi`] | Keys, signatures and symmetric encryption |
//!
//! Handles are opaque: a [`FileHandle`] stays valid from creation until it
//! is closed exactly once.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::identifiers::{ConnectionId, FileHandle, InboxHandle};
use crate::protocol::{
    Context, CreateContainerPayload, FilesConfig, Inbox, InboxEntry, InboxPublicView, Message,
    PagingList, PagingQuery, PrivmxFile, RawEvent, Store, Thread, UpdateContainerPayload,
};

// ============================================================================
// EndpointFactory
// ============================================================================

/// Entry point of the native library.
#[async_trait]
pub trait EndpointFactory: Send + Sync {
    /// Opens a user connection authenticated with `private_key`.
    async fn connect(
        &self,
        private_key: &str,
        solution_id: &str,
        bridge_url: &str,
    ) -> Result<Arc<dyn ConnectionApi>>;

    /// Opens an anonymous connection.
    async fn connect_public(
        &self,
        solution_id: &str,
        bridge_url: &str,
    ) -> Result<Arc<dyn ConnectionApi>>;

    async fn create_thread_api(
        &self,
        connection: &Arc<dyn ConnectionApi>,
    ) -> Result<Arc<dyn ThreadApi>>;

    async fn create_store_api(
        &self,
        connection: &Arc<dyn ConnectionApi>,
    ) -> Result<Arc<dyn StoreApi>>;

    /// Creates the Inbox API, which builds on the Thread and Store APIs.
    async fn create_inbox_api(
        &self,
        connection: &Arc<dyn ConnectionApi>,
        thread_api: &Arc<dyn ThreadApi>,
        store_api: &Arc<dyn StoreApi>,
    ) -> Result<Arc<dyn InboxApi>>;

    /// Returns the process-wide event queue.
    async fn event_queue(&self) -> Result<Arc<dyn EventQueue>>;

    /// Creates the connection-independent crypto API.
    async fn create_crypto_api(&self) -> Result<Arc<dyn CryptoApi>>;
}

// ============================================================================
// ConnectionApi
// ============================================================================

/// One live connection to the bridge.
#[async_trait]
pub trait ConnectionApi: Send + Sync {
    /// ID the queue stamps on every event for this connection.
    async fn connection_id(&self) -> Result<ConnectionId>;

    async fn list_contexts(&self, query: PagingQuery) -> Result<PagingList<Context>>;

    async fn disconnect(&self) -> Result<()>;
}

// ============================================================================
// EventQueue
// ============================================================================

/// The shared event queue.
#[async_trait]
pub trait EventQueue: Send + Sync {
    /// Suspends until the next event is available.
    ///
    /// Returns [`crate::Error::EventQueueClosed`] once no further events can
    /// arrive.
    async fn wait_event(&self) -> Result<RawEvent>;

    /// Injects a `libBreak` event to unblock a pending [`wait_event`](Self::wait_event).
    async fn emit_break_event(&self) -> Result<()>;
}

// ============================================================================
// FileReadApi
// ============================================================================

/// Read-side handle operations shared by Stores and Inboxes.
#[async_trait]
pub trait FileReadApi: Send + Sync {
    async fn open_file(&self, file_id: &str) -> Result<FileHandle>;

    /// Reads up to `length` bytes. A shorter result means end of file.
    async fn read_from_file(&self, handle: FileHandle, length: u64) -> Result<Vec<u8>>;

    async fn seek_in_file(&self, handle: FileHandle, position: u64) -> Result<()>;

    /// Closes the handle and returns the file ID.
    async fn close_file(&self, handle: FileHandle) -> Result<String>;
}

// ============================================================================
// ThreadApi
// ============================================================================

#[async_trait]
pub trait ThreadApi: Send + Sync {
    async fn create_thread(&self, payload: &CreateContainerPayload) -> Result<String>;

    async fn update_thread(&self, thread_id: &str, payload: &UpdateContainerPayload)
    -> Result<()>;

    async fn delete_thread(&self, thread_id: &str) -> Result<()>;

    async fn get_thread(&self, thread_id: &str) -> Result<Thread>;

    async fn list_threads(&self, context_id: &str, query: PagingQuery)
    -> Result<PagingList<Thread>>;

    async fn send_message(
        &self,
        thread_id: &str,
        public_meta: &[u8],
        private_meta: &[u8],
        data: &[u8],
    ) -> Result<String>;

    async fn delete_message(&self, message_id: &str) -> Result<()>;

    async fn list_messages(
        &self,
        thread_id: &str,
        query: PagingQuery,
    ) -> Result<PagingList<Message>>;

    async fn get_message(&self, message_id: &str) -> Result<Message>;

    async fn update_message(
        &self,
        message_id: &str,
        public_meta: &[u8],
        private_meta: &[u8],
        data: &[u8],
    ) -> Result<()>;

    async fn subscribe_for_thread_events(&self) -> Result<()>;

    async fn unsubscribe_from_thread_events(&self) -> Result<()>;

    async fn subscribe_for_message_events(&self, thread_id: &str) -> Result<()>;

    async fn unsubscribe_from_message_events(&self, thread_id: &str) -> Result<()>;
}

// ============================================================================
// StoreApi
// ============================================================================

#[async_trait]
pub trait StoreApi: FileReadApi {
    async fn create_store(&self, payload: &CreateContainerPayload) -> Result<String>;

    async fn update_store(&self, store_id: &str, payload: &UpdateContainerPayload) -> Result<()>;

    async fn delete_store(&self, store_id: &str) -> Result<()>;

    async fn get_store(&self, store_id: &str) -> Result<Store>;

    async fn list_stores(&self, context_id: &str, query: PagingQuery)
    -> Result<PagingList<Store>>;

    /// Creates a file of `size` bytes and returns a write handle.
    async fn create_file(
        &self,
        store_id: &str,
        public_meta: &[u8],
        private_meta: &[u8],
        size: u64,
    ) -> Result<FileHandle>;

    /// Replaces a file's content with `size` new bytes; returns a write handle.
    async fn update_file(
        &self,
        file_id: &str,
        public_meta: &[u8],
        private_meta: &[u8],
        size: u64,
    ) -> Result<FileHandle>;

    async fn update_file_meta(
        &self,
        file_id: &str,
        public_meta: &[u8],
        private_meta: &[u8],
    ) -> Result<()>;

    async fn write_to_file(&self, handle: FileHandle, data: &[u8]) -> Result<()>;

    async fn delete_file(&self, file_id: &str) -> Result<()>;

    async fn get_file(&self, file_id: &str) -> Result<PrivmxFile>;

    async fn list_files(&self, store_id: &str, query: PagingQuery)
    -> Result<PagingList<PrivmxFile>>;

    async fn subscribe_for_store_events(&self) -> Result<()>;

    async fn unsubscribe_from_store_events(&self) -> Result<()>;

    async fn subscribe_for_file_events(&self, store_id: &str) -> Result<()>;

    async fn unsubscribe_from_file_events(&self, store_id: &str) -> Result<()>;
}

// ============================================================================
// InboxApi
// ============================================================================

#[async_trait]
pub trait InboxApi: FileReadApi {
    async fn create_inbox(
        &self,
        payload: &CreateContainerPayload,
        files_config: Option<FilesConfig>,
    ) -> Result<String>;

    async fn update_inbox(
        &self,
        inbox_id: &str,
        payload: &UpdateContainerPayload,
        files_config: Option<FilesConfig>,
    ) -> Result<()>;

    async fn get_inbox(&self, inbox_id: &str) -> Result<Inbox>;

    async fn list_inboxes(&self, context_id: &str, query: PagingQuery)
    -> Result<PagingList<Inbox>>;

    async fn get_inbox_public_view(&self, inbox_id: &str) -> Result<InboxPublicView>;

    async fn delete_inbox(&self, inbox_id: &str) -> Result<()>;

    /// Prepares an entry carrying `data` and the given file handles.
    async fn prepare_entry(
        &self,
        inbox_id: &str,
        data: &[u8],
        file_handles: &[FileHandle],
        user_private_key: Option<&str>,
    ) -> Result<InboxHandle>;

    /// Sends a prepared entry once all its files are written.
    async fn send_entry(&self, inbox_handle: InboxHandle) -> Result<()>;

    async fn read_entry(&self, entry_id: &str) -> Result<InboxEntry>;

    async fn list_entries(&self, inbox_id: &str, query: PagingQuery)
    -> Result<PagingList<InboxEntry>>;

    async fn delete_entry(&self, entry_id: &str) -> Result<()>;

    /// Creates a write handle for a file of `size` bytes attached to an entry.
    async fn create_file_handle(
        &self,
        public_meta: &[u8],
        private_meta: &[u8],
        size: u64,
    ) -> Result<FileHandle>;

    async fn write_to_file(
        &self,
        inbox_handle: InboxHandle,
        file_handle: FileHandle,
        chunk: &[u8],
    ) -> Result<()>;

    async fn subscribe_for_inbox_events(&self) -> Result<()>;

    async fn unsubscribe_from_inbox_events(&self) -> Result<()>;

    async fn subscribe_for_entry_events(&self, inbox_id: &str) -> Result<()>;

    async fn unsubscribe_from_entry_events(&self, inbox_id: &str) -> Result<()>;
}

// ============================================================================
// CryptoApi
// ============================================================================

/// Crypto primitives of the native library.
///
/// Private keys are WIF strings, public keys are BASE58DER strings.
#[async_trait]
pub trait CryptoApi: Send + Sync {
    async fn sign_data(&self, data: &[u8], private_key: &str) -> Result<Vec<u8>>;

    async fn verify_signature(&self, data: &[u8], signature: &[u8], public_key: &str)
    -> Result<bool>;

    /// Encrypts with AES under `key`.
    async fn encrypt_data_symmetric(&self, data: &[u8], key: &[u8]) -> Result<Vec<u8>>;

    async fn decrypt_data_symmetric(&self, data: &[u8], key: &[u8]) -> Result<Vec<u8>>;

    /// Generates an ECC private key, optionally seeded.
    async fn generate_private_key(&self, random_seed: Option<&str>) -> Result<String>;

    /// Derives an ECC private key from a password with PBKDF2.
    async fn derive_private_key(&self, password: &str, salt: &str) -> Result<String>;

    async fn derive_public_key(&self, private_key: &str) -> Result<String>;

    async fn generate_key_symmetric(&self) -> Result<Vec<u8>>;

    async fn derive_key_symmetric(&self, password: &str, salt: &str) -> Result<Vec<u8>>;

    async fn convert_pem_key_to_wif_key(&self, pem_key: &str) -> Result<String>;
}
