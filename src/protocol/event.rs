//! Event message types.
//!
//! The shared event queue yields [`RawEvent`]s: a type string, a channel
//! string, an untyped JSON payload and the ID of the connection the event
//! was sent to. [`RawEvent::parse`] turns one into a typed [`Event`] whose
//! [`EventKind`] carries the concrete payload.
//!
//! # Event Types
//!
//! | Family | Events |
//! |--------|--------|
//! | `thread` | `threadCreated`, `threadUpdated`, `threadDeleted`, `threadStatsChanged` |
//! | `thread/{id}/messages` | `threadNewMessage`, `threadMessageUpdated`, `threadMessageDeleted` |
//! | `store` | `storeCreated`, `storeUpdated`, `storeDeleted`, `storeStatsChanged` |
//! | `store/{id}/files` | `storeFileCreated`, `storeFileUpdated`, `storeFileDeleted` |
//! | `inbox` | `inboxCreated`, `inboxUpdated`, `inboxDeleted` |
//! | `inbox/{id}/entries` | `inboxEntryCreated`, `inboxEntryDeleted` |
//! | `connection` | `libConnected`, `libDisconnected`, `libPlatformDisconnected` |
//! | (control) | `libBreak` |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::identifiers::ConnectionId;

use super::channel::{Channel, ChannelFamily};
use super::types::{
    Inbox, InboxDeletedEventData, InboxEntry, InboxEntryDeletedEventData, Message, PrivmxFile,
    Store, StoreDeletedEventData, StoreFileDeletedEventData, StoreStatsChangedEventData, Thread,
    ThreadDeletedEventData, ThreadDeletedMessageEventData, ThreadStatsEventData,
};

// ============================================================================
// EventType
// ============================================================================

/// Closed set of event types the native library emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    ThreadCreated,
    ThreadUpdated,
    ThreadDeleted,
    ThreadStatsChanged,
    ThreadNewMessage,
    ThreadMessageUpdated,
    ThreadMessageDeleted,
    StoreCreated,
    StoreUpdated,
    StoreDeleted,
    StoreStatsChanged,
    StoreFileCreated,
    StoreFileUpdated,
    StoreFileDeleted,
    InboxCreated,
    InboxUpdated,
    InboxDeleted,
    InboxEntryCreated,
    InboxEntryDeleted,
    LibConnected,
    LibDisconnected,
    LibPlatformDisconnected,
    /// Sentinel injected by `emit_break_event` to unblock a pending wait.
    LibBreak,
}

impl EventType {
    /// Every event type, in declaration order.
    pub const ALL: [Self; 23] = [
        Self::ThreadCreated,
        Self::ThreadUpdated,
        Self::ThreadDeleted,
        Self::ThreadStatsChanged,
        Self::ThreadNewMessage,
        Self::ThreadMessageUpdated,
        Self::ThreadMessageDeleted,
        Self::StoreCreated,
        Self::StoreUpdated,
        Self::StoreDeleted,
        Self::StoreStatsChanged,
        Self::StoreFileCreated,
        Self::StoreFileUpdated,
        Self::StoreFileDeleted,
        Self::InboxCreated,
        Self::InboxUpdated,
        Self::InboxDeleted,
        Self::InboxEntryCreated,
        Self::InboxEntryDeleted,
        Self::LibConnected,
        Self::LibDisconnected,
        Self::LibPlatformDisconnected,
        Self::LibBreak,
    ];

    /// Returns the wire name of the event type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ThreadCreated => "threadCreated",
            Self::ThreadUpdated => "threadUpdated",
            Self::ThreadDeleted => "threadDeleted",
            Self::ThreadStatsChanged => "threadStatsChanged",
            Self::ThreadNewMessage => "threadNewMessage",
            Self::ThreadMessageUpdated => "threadMessageUpdated",
            Self::ThreadMessageDeleted => "threadMessageDeleted",
            Self::StoreCreated => "storeCreated",
            Self::StoreUpdated => "storeUpdated",
            Self::StoreDeleted => "storeDeleted",
            Self::StoreStatsChanged => "storeStatsChanged",
            Self::StoreFileCreated => "storeFileCreated",
            Self::StoreFileUpdated => "storeFileUpdated",
            Self::StoreFileDeleted => "storeFileDeleted",
            Self::InboxCreated => "inboxCreated",
            Self::InboxUpdated => "inboxUpdated",
            Self::InboxDeleted => "inboxDeleted",
            Self::InboxEntryCreated => "inboxEntryCreated",
            Self::InboxEntryDeleted => "inboxEntryDeleted",
            Self::LibConnected => "libConnected",
            Self::LibDisconnected => "libDisconnected",
            Self::LibPlatformDisconnected => "libPlatformDisconnected",
            Self::LibBreak => "libBreak",
        }
    }

    /// Returns the channel family this type is delivered on.
    ///
    /// `None` for [`EventType::LibBreak`], which is control-only.
    #[must_use]
    pub const fn family(&self) -> Option<ChannelFamily> {
        match self {
            Self::ThreadCreated
            | Self::ThreadUpdated
            | Self::ThreadDeleted
            | Self::ThreadStatsChanged => Some(ChannelFamily::Thread),
            Self::ThreadNewMessage | Self::ThreadMessageUpdated | Self::ThreadMessageDeleted => {
                Some(ChannelFamily::ThreadMessages)
            }
            Self::StoreCreated
            | Self::StoreUpdated
            | Self::StoreDeleted
            | Self::StoreStatsChanged => Some(ChannelFamily::Store),
            Self::StoreFileCreated | Self::StoreFileUpdated | Self::StoreFileDeleted => {
                Some(ChannelFamily::StoreFiles)
            }
            Self::InboxCreated | Self::InboxUpdated | Self::InboxDeleted => {
                Some(ChannelFamily::Inbox)
            }
            Self::InboxEntryCreated | Self::InboxEntryDeleted => Some(ChannelFamily::InboxEntries),
            Self::LibConnected | Self::LibDisconnected | Self::LibPlatformDisconnected => {
                Some(ChannelFamily::Connection)
            }
            Self::LibBreak => None,
        }
    }

    /// Returns `true` for connection-state events, which always travel on
    /// the `connection` channel.
    #[inline]
    #[must_use]
    pub const fn is_connection_event(&self) -> bool {
        matches!(
            self,
            Self::LibConnected | Self::LibDisconnected | Self::LibPlatformDisconnected
        )
    }

    /// Returns `true` if the event ends its connection.
    #[inline]
    #[must_use]
    pub const fn is_disconnect(&self) -> bool {
        matches!(self, Self::LibDisconnected | Self::LibPlatformDisconnected)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .find(|event_type| event_type.as_str() == s)
            .copied()
            .ok_or_else(|| Error::unknown_event_type(s))
    }
}

// ============================================================================
// RawEvent
// ============================================================================

/// Event exactly as the queue yields it.
///
/// # Format
///
/// ```json
/// {
///   "type": "threadCreated",
///   "channel": "thread",
///   "data": { ... },
///   "connectionId": "42"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    /// Event type name.
    #[serde(rename = "type")]
    pub event_type: String,

    /// Channel string; may be wrong or empty for connection events.
    #[serde(default)]
    pub channel: String,

    /// Type-specific payload.
    #[serde(default)]
    pub data: Value,

    /// Connection the event was sent to.
    #[serde(default)]
    pub connection_id: ConnectionId,
}

impl RawEvent {
    /// Creates a raw event.
    #[must_use]
    pub fn new(
        event_type: impl Into<String>,
        channel: impl Into<String>,
        data: Value,
        connection_id: impl Into<ConnectionId>,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            channel: channel.into(),
            data,
            connection_id: connection_id.into(),
        }
    }

    /// Creates the break sentinel.
    #[must_use]
    pub fn break_event() -> Self {
        Self::new(EventType::LibBreak.as_str(), "", Value::Null, "")
    }

    /// Parses the event into its typed form.
    ///
    /// Connection events are moved onto the `connection` channel regardless
    /// of the channel the queue reported.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownEventType`] if the type is not recognized
    /// - [`Error::InvalidEvent`] if the payload does not match the type
    pub fn parse(&self) -> Result<Event> {
        let event_type: EventType = self.event_type.parse()?;

        let channel = if event_type.is_connection_event() {
            Channel::Connection
        } else {
            Channel::parse(&self.channel)
        };

        Ok(Event {
            channel,
            connection_id: self.connection_id.clone(),
            kind: self.parse_kind(event_type)?,
        })
    }

    fn parse_kind(&self, event_type: EventType) -> Result<EventKind> {
        let kind = match event_type {
            EventType::ThreadCreated => EventKind::ThreadCreated(self.payload()?),
            EventType::ThreadUpdated => EventKind::ThreadUpdated(self.payload()?),
            EventType::ThreadDeleted => EventKind::ThreadDeleted(self.payload()?),
            EventType::ThreadStatsChanged => EventKind::ThreadStatsChanged(self.payload()?),
            EventType::ThreadNewMessage => EventKind::ThreadNewMessage(self.payload()?),
            EventType::ThreadMessageUpdated => EventKind::ThreadMessageUpdated(self.payload()?),
            EventType::ThreadMessageDeleted => EventKind::ThreadMessageDeleted(self.payload()?),
            EventType::StoreCreated => EventKind::StoreCreated(self.payload()?),
            EventType::StoreUpdated => EventKind::StoreUpdated(self.payload()?),
            EventType::StoreDeleted => EventKind::StoreDeleted(self.payload()?),
            EventType::StoreStatsChanged => EventKind::StoreStatsChanged(self.payload()?),
            EventType::StoreFileCreated => EventKind::StoreFileCreated(self.payload()?),
            EventType::StoreFileUpdated => EventKind::StoreFileUpdated(self.payload()?),
            EventType::StoreFileDeleted => EventKind::StoreFileDeleted(self.payload()?),
            EventType::InboxCreated => EventKind::InboxCreated(self.payload()?),
            EventType::InboxUpdated => EventKind::InboxUpdated(self.payload()?),
            EventType::InboxDeleted => EventKind::InboxDeleted(self.payload()?),
            EventType::InboxEntryCreated => EventKind::InboxEntryCreated(self.payload()?),
            EventType::InboxEntryDeleted => EventKind::InboxEntryDeleted(self.payload()?),
            EventType::LibConnected => EventKind::LibConnected,
            EventType::LibDisconnected => EventKind::LibDisconnected,
            EventType::LibPlatformDisconnected => EventKind::LibPlatformDisconnected,
            EventType::LibBreak => EventKind::LibBreak,
        };
        Ok(kind)
    }

    /// Decodes the payload.
    #[inline]
    fn payload<T: DeserializeOwned>(&self) -> Result<T> {
        T::deserialize(&self.data)
            .map_err(|e| Error::invalid_event(self.event_type.as_str(), e.to_string()))
    }
}

// ============================================================================
// Event
// ============================================================================

/// Typed event delivered to listeners.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Channel the event was delivered on.
    pub channel: Channel,

    /// Connection the event was sent to.
    pub connection_id: ConnectionId,

    /// Type and payload.
    pub kind: EventKind,
}

impl Event {
    /// Returns the event type.
    #[inline]
    #[must_use]
    pub fn event_type(&self) -> EventType {
        self.kind.event_type()
    }

    /// Returns `true` if the event ends its connection.
    #[inline]
    #[must_use]
    pub fn is_disconnect(&self) -> bool {
        self.event_type().is_disconnect()
    }

    /// Returns `true` for the break sentinel.
    #[inline]
    #[must_use]
    pub fn is_break(&self) -> bool {
        matches!(self.kind, EventKind::LibBreak)
    }
}

// ============================================================================
// EventKind
// ============================================================================

/// Event type together with its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    ThreadCreated(Thread),
    ThreadUpdated(Thread),
    ThreadDeleted(ThreadDeletedEventData),
    ThreadStatsChanged(ThreadStatsEventData),
    ThreadNewMessage(Message),
    ThreadMessageUpdated(Message),
    ThreadMessageDeleted(ThreadDeletedMessageEventData),
    StoreCreated(Store),
    StoreUpdated(Store),
    StoreDeleted(StoreDeletedEventData),
    StoreStatsChanged(StoreStatsChangedEventData),
    StoreFileCreated(PrivmxFile),
    StoreFileUpdated(PrivmxFile),
    StoreFileDeleted(StoreFileDeletedEventData),
    InboxCreated(Inbox),
    InboxUpdated(Inbox),
    InboxDeleted(InboxDeletedEventData),
    InboxEntryCreated(InboxEntry),
    InboxEntryDeleted(InboxEntryDeletedEventData),
    LibConnected,
    LibDisconnected,
    LibPlatformDisconnected,
    LibBreak,
}

impl EventKind {
    /// Returns the type tag of this payload.
    #[must_use]
    pub const fn event_type(&self) -> EventType {
        match self {
            Self::ThreadCreated(_) => EventType::ThreadCreated,
            Self::ThreadUpdated(_) => EventType::ThreadUpdated,
            Self::ThreadDeleted(_) => EventType::ThreadDeleted,
            Self::ThreadStatsChanged(_) => EventType::ThreadStatsChanged,
            Self::ThreadNewMessage(_) => EventType::ThreadNewMessage,
            Self::ThreadMessageUpdated(_) => EventType::ThreadMessageUpdated,
            Self::ThreadMessageDeleted(_) => EventType::ThreadMessageDeleted,
            Self::StoreCreated(_) => EventType::StoreCreated,
            Self::StoreUpdated(_) => EventType::StoreUpdated,
            Self::StoreDeleted(_) => EventType::StoreDeleted,
            Self::StoreStatsChanged(_) => EventType::StoreStatsChanged,
            Self::StoreFileCreated(_) => EventType::StoreFileCreated,
            Self::StoreFileUpdated(_) => EventType::StoreFileUpdated,
            Self::StoreFileDeleted(_) => EventType::StoreFileDeleted,
            Self::InboxCreated(_) => EventType::InboxCreated,
            Self::InboxUpdated(_) => EventType::InboxUpdated,
            Self::InboxDeleted(_) => EventType::InboxDeleted,
            Self::InboxEntryCreated(_) => EventType::InboxEntryCreated,
            Self::InboxEntryDeleted(_) => EventType::InboxEntryDeleted,
            Self::LibConnected => EventType::LibConnected,
            Self::LibDisconnected => EventType::LibDisconnected,
            Self::LibPlatformDisconnected => EventType::LibPlatformDisconnected,
            Self::LibBreak => EventType::LibBreak,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
