//! Native endpoint message types.
//!
//! This module defines the data exchanged with the native library: event
//! channels, queue events and the entity/paging wire types.
//!
//! # Event Flow
//!
//! | Stage | Type | Produced by |
//! |-------|------|-------------|
//! | Queue | [`RawEvent`] | `EventQueue::wait_event` |
//! | Typed | [`Event`] | [`RawEvent::parse`] |
//! | Routed | [`Channel`] + [`EventType`] | dispatcher lookup key |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `channel` | Channel keys and families |
//! | `event` | Raw and typed events |
//! | `types` | Entities, paging and event payloads |

// ============================================================================
// Submodules
// ============================================================================

/// Channel keys and families.
pub mod channel;

/// Raw and typed event types.
pub mod event;

/// Entity, paging and event payload types.
pub mod types;

// ============================================================================
// Re-exports
// ============================================================================

pub use channel::{Channel, ChannelFamily};
pub use event::{Event, EventKind, EventType, RawEvent};
pub use types::{
    Context, CreateContainerPayload, FilesConfig, Inbox, InboxDeletedEventData, InboxEntry,
    InboxEntryDeletedEventData, InboxEntryPayload, InboxFilePayload, InboxPublicView, Message,
    MessagePayload, PagingList, PagingQuery, PrivmxFile, ServerFileInfo, ServerMessageInfo,
    SortOrder, Store, StoreDeletedEventData, StoreFileDeletedEventData, StoreFilePayload,
    StoreStatsChangedEventData, Thread, ThreadDeletedEventData, ThreadDeletedMessageEventData,
    ThreadStatsEventData, UpdateContainerPayload, UserWithPubKey,
};
