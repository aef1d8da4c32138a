//! Wire types exchanged with the native endpoint.
//!
//! All structs use the camelCase field names emitted by the native library.
//! Binary fields (`public_meta`, `private_meta`, `data`) are raw bytes; use
//! [`crate::utils::serialize_object`] and [`crate::utils::deserialize_object`]
//! to store JSON inside them.
//!
//! # Groups
//!
//! | Group | Types |
//! |-------|-------|
//! | Paging | [`SortOrder`], [`PagingQuery`], [`PagingList`] |
//! | Core | [`Context`], [`UserWithPubKey`] |
//! | Containers | [`CreateContainerPayload`], [`UpdateContainerPayload`] |
//! | Threads | [`Thread`], [`Message`], [`ServerMessageInfo`], [`MessagePayload`] |
//! | Stores | [`Store`], [`PrivmxFile`], [`ServerFileInfo`], [`StoreFilePayload`] |
//! | Inboxes | [`Inbox`], [`FilesConfig`], [`InboxEntry`], [`InboxPublicView`], [`InboxEntryPayload`], [`InboxFilePayload`] |
//! | Event payloads | [`ThreadDeletedEventData`], [`StoreStatsChangedEventData`], ... |

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

// ============================================================================
// Paging
// ============================================================================

/// Sort direction of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Oldest first.
    Asc,
    /// Newest first.
    #[default]
    Desc,
}

/// Page request sent to every `list*` RPC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagingQuery {
    /// Number of items to skip.
    pub skip: u64,
    /// Maximum number of items to return.
    pub limit: u64,
    /// Sort direction.
    pub sort_order: SortOrder,
    /// ID of the last item of the previous page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_id: Option<String>,
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PagingList<T> {
    /// Total number of items available on the server.
    pub total_available: u64,
    /// Items of this page.
    pub read_items: Vec<T>,
}

impl<T> Default for PagingList<T> {
    fn default() -> Self {
        Self {
            total_available: 0,
            read_items: Vec::new(),
        }
    }
}

// ============================================================================
// Core
// ============================================================================

/// Context the connected user belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Context {
    /// User ID inside the context.
    pub user_id: String,
    /// Context ID.
    pub context_id: String,
}

/// User identity paired with its public key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserWithPubKey {
    /// User ID.
    pub user_id: String,
    /// Base58 public key.
    pub pub_key: String,
}

impl UserWithPubKey {
    /// Creates a user entry.
    #[inline]
    #[must_use]
    pub fn new(user_id: impl Into<String>, pub_key: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            pub_key: pub_key.into(),
        }
    }
}

// ============================================================================
// Container Payloads
// ============================================================================

/// Input for creating a Thread, Store or Inbox.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CreateContainerPayload {
    /// Context the container is created in.
    pub context_id: String,
    /// Users with access.
    pub users: Vec<UserWithPubKey>,
    /// Users with management rights.
    pub managers: Vec<UserWithPubKey>,
    /// Unencrypted metadata.
    pub public_meta: Vec<u8>,
    /// Encrypted metadata.
    pub private_meta: Vec<u8>,
}

/// Input for updating a Thread, Store or Inbox.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpdateContainerPayload {
    /// New user list.
    pub users: Vec<UserWithPubKey>,
    /// New manager list.
    pub managers: Vec<UserWithPubKey>,
    /// New unencrypted metadata.
    pub public_meta: Vec<u8>,
    /// New encrypted metadata.
    pub private_meta: Vec<u8>,
    /// Version the update is based on.
    pub version: i64,
    /// Overwrite even if the version does not match.
    pub force: bool,
    /// Rotate the container key.
    pub force_generate_new_key: bool,
}

// ============================================================================
// Threads
// ============================================================================

/// Thread container.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Thread {
    pub context_id: String,
    pub thread_id: String,
    pub create_date: i64,
    pub creator: String,
    pub last_modification_date: i64,
    pub last_modifier: String,
    pub users: Vec<String>,
    pub managers: Vec<String>,
    pub version: i64,
    pub last_msg_date: i64,
    pub public_meta: Vec<u8>,
    pub private_meta: Vec<u8>,
    pub messages_count: u64,
    pub status_code: i64,
}

/// Server-assigned part of a message.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerMessageInfo {
    pub thread_id: String,
    pub message_id: String,
    pub create_date: i64,
    pub author: String,
}

/// Thread message.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Message {
    pub info: ServerMessageInfo,
    pub public_meta: Vec<u8>,
    pub private_meta: Vec<u8>,
    pub data: Vec<u8>,
    pub author_pub_key: String,
    pub status_code: i64,
}

/// Outgoing message content.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MessagePayload {
    pub data: Vec<u8>,
    pub public_meta: Vec<u8>,
    pub private_meta: Vec<u8>,
}

// ============================================================================
// Stores
// ============================================================================

/// Store container.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Store {
    pub store_id: String,
    pub context_id: String,
    pub create_date: i64,
    pub creator: String,
    pub last_modification_date: i64,
    pub last_file_date: i64,
    pub last_modifier: String,
    pub users: Vec<String>,
    pub managers: Vec<String>,
    pub version: i64,
    pub public_meta: Vec<u8>,
    pub private_meta: Vec<u8>,
    pub files_count: u64,
    pub status_code: i64,
}

/// Server-assigned part of a file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerFileInfo {
    pub store_id: String,
    pub file_id: String,
    pub create_date: i64,
    pub author: String,
}

/// File kept in a Store or attached to an Inbox entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PrivmxFile {
    pub info: ServerFileInfo,
    pub public_meta: Vec<u8>,
    pub private_meta: Vec<u8>,
    /// Content size in bytes.
    pub size: u64,
    pub author_pub_key: String,
    pub status_code: i64,
}

/// New Store file content and metadata.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StoreFilePayload {
    /// File content.
    pub data: Vec<u8>,
    pub public_meta: Vec<u8>,
    pub private_meta: Vec<u8>,
}

// ============================================================================
// Inboxes
// ============================================================================

/// Limits on files attached to Inbox entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilesConfig {
    pub min_count: u64,
    pub max_count: u64,
    pub max_file_size: u64,
    pub max_whole_upload_size: u64,
}

/// Inbox container.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Inbox {
    pub inbox_id: String,
    pub context_id: String,
    pub create_date: i64,
    pub creator: String,
    pub last_modification_date: i64,
    pub last_modifier: String,
    pub users: Vec<String>,
    pub managers: Vec<String>,
    pub version: i64,
    pub public_meta: Vec<u8>,
    pub private_meta: Vec<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files_config: Option<FilesConfig>,
    pub status_code: i64,
}

/// Part of an Inbox visible to anonymous senders.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InboxPublicView {
    pub inbox_id: String,
    pub version: i64,
    pub public_meta: Vec<u8>,
}

/// Entry submitted to an Inbox.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InboxEntry {
    pub entry_id: String,
    pub inbox_id: String,
    pub data: Vec<u8>,
    pub files: Vec<PrivmxFile>,
    pub author_pub_key: String,
    pub create_date: i64,
    pub status_code: i64,
}

/// File attached to an outgoing Inbox entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InboxFilePayload {
    pub public_meta: Vec<u8>,
    pub private_meta: Vec<u8>,
    /// File content.
    pub data: Vec<u8>,
}

/// Outgoing Inbox entry: entry data plus any attached files.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InboxEntryPayload {
    /// Entry data.
    pub data: Vec<u8>,
    /// Attached files, uploaded concurrently.
    pub files: Vec<InboxFilePayload>,
}

// ============================================================================
// Event Payloads
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThreadDeletedEventData {
    pub thread_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThreadDeletedMessageEventData {
    pub thread_id: String,
    pub message_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThreadStatsEventData {
    pub thread_id: String,
    pub last_msg_date: i64,
    pub messages_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreDeletedEventData {
    pub store_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreStatsChangedEventData {
    pub context_id: String,
    pub store_id: String,
    pub last_file_date: i64,
    pub files: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreFileDeletedEventData {
    pub context_id: String,
    pub store_id: String,
    pub file_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InboxDeletedEventData {
    pub inbox_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InboxEntryDeletedEventData {
    pub inbox_id: String,
    pub entry_id: String,
}

// ============================================================================
// Tests
// ============================================================================
