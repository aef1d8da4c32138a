//! Event channels.
//!
//! A channel is the string key partitioning the event stream space. There
//! are four fixed top-level channels and three parameterized sub-channels
//! that interpolate an entity ID:
//!
//! | Channel | String form | Family |
//! |---------|-------------|--------|
//! | [`Channel::Thread`] | `thread` | [`ChannelFamily::Thread`] |
//! | [`Channel::ThreadMessages`] | `thread/{id}/messages` | [`ChannelFamily::ThreadMessages`] |
//! | [`Channel::Store`] | `store` | [`ChannelFamily::Store`] |
//! | [`Channel::StoreFiles`] | `store/{id}/files` | [`ChannelFamily::StoreFiles`] |
//! | [`Channel::Inbox`] | `inbox` | [`ChannelFamily::Inbox`] |
//! | [`Channel::InboxEntries`] | `inbox/{id}/entries` | [`ChannelFamily::InboxEntries`] |
//! | [`Channel::Connection`] | `connection` | [`ChannelFamily::Connection`] |
//!
//! Equality is equality of the string form: [`Channel::parse`] always maps a
//! recognized string to its typed variant, so two channels compare equal iff
//! they render to the same string.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ============================================================================
// Constants
// ============================================================================

/// Matches `{entity}/{id}/{resource}` sub-channels.
static SUB_CHANNEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(thread|store|inbox)/(.+)/(messages|files|entries)$")
        .unwrap_or_else(|e| unreachable!("static sub-channel regex is valid: {e}"))
});

// ============================================================================
// ChannelFamily
// ============================================================================

/// Group of channels sharing one set of event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelFamily {
    /// Thread lifecycle events.
    Thread,
    /// Messages of one Thread.
    ThreadMessages,
    /// Store lifecycle events.
    Store,
    /// Files of one Store.
    StoreFiles,
    /// Inbox lifecycle events.
    Inbox,
    /// Entries of one Inbox.
    InboxEntries,
    /// Connection state events.
    Connection,
}

impl fmt::Display for ChannelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Thread => "thread",
            Self::ThreadMessages => "threadMessages",
            Self::Store => "store",
            Self::StoreFiles => "storeFiles",
            Self::Inbox => "inbox",
            Self::InboxEntries => "inboxEntries",
            Self::Connection => "connection",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Channel
// ============================================================================

/// String key identifying an event stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Channel {
    /// `thread`
    Thread,
    /// `thread/{threadId}/messages`
    ThreadMessages(String),
    /// `store`
    Store,
    /// `store/{storeId}/files`
    StoreFiles(String),
    /// `inbox`
    Inbox,
    /// `inbox/{inboxId}/entries`
    InboxEntries(String),
    /// `connection`
    Connection,
    /// Any string the SDK does not recognize. Only produced by [`Channel::parse`].
    Other(String),
}

impl Channel {
    /// Channel carrying message events of one Thread.
    #[inline]
    #[must_use]
    pub fn thread_messages(thread_id: impl Into<String>) -> Self {
        Self::ThreadMessages(thread_id.into())
    }

    /// Channel carrying file events of one Store.
    #[inline]
    #[must_use]
    pub fn store_files(store_id: impl Into<String>) -> Self {
        Self::StoreFiles(store_id.into())
    }

    /// Channel carrying entry events of one Inbox.
    #[inline]
    #[must_use]
    pub fn inbox_entries(inbox_id: impl Into<String>) -> Self {
        Self::InboxEntries(inbox_id.into())
    }

    /// Parses the string form of a channel.
    ///
    /// Never fails: unrecognized strings become [`Channel::Other`].
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "thread" => return Self::Thread,
            "store" => return Self::Store,
            "inbox" => return Self::Inbox,
            "connection" => return Self::Connection,
            _ => {}
        }

        if let Some(captures) = SUB_CHANNEL.captures(raw) {
            let id = captures[2].to_string();
            match (&captures[1], &captures[3]) {
                ("thread", "messages") => return Self::ThreadMessages(id),
                ("store", "files") => return Self::StoreFiles(id),
                ("inbox", "entries") => return Self::InboxEntries(id),
                _ => {}
            }
        }

        Self::Other(raw.to_string())
    }

    /// Returns the family this channel belongs to, if recognized.
    #[inline]
    #[must_use]
    pub fn family(&self) -> Option<ChannelFamily> {
        match self {
            Self::Thread => Some(ChannelFamily::Thread),
            Self::ThreadMessages(_) => Some(ChannelFamily::ThreadMessages),
            Self::Store => Some(ChannelFamily::Store),
            Self::StoreFiles(_) => Some(ChannelFamily::StoreFiles),
            Self::Inbox => Some(ChannelFamily::Inbox),
            Self::InboxEntries(_) => Some(ChannelFamily::InboxEntries),
            Self::Connection => Some(ChannelFamily::Connection),
            Self::Other(_) => None,
        }
    }

    /// Returns the top-level channel a sub-channel belongs to.
    ///
    /// Top-level and unrecognized channels are their own parent.
    #[must_use]
    pub fn parent(&self) -> Self {
        match self {
            Self::ThreadMessages(_) => Self::Thread,
            Self::StoreFiles(_) => Self::Store,
            Self::InboxEntries(_) => Self::Inbox,
            other => other.clone(),
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Thread => f.write_str("thread"),
            Self::ThreadMessages(id) => write!(f, "thread/{id}/messages"),
            Self::Store => f.write_str("store"),
            Self::StoreFiles(id) => write!(f, "store/{id}/files"),
            Self::Inbox => f.write_str("inbox"),
            Self::InboxEntries(id) => write!(f, "inbox/{id}/entries"),
            Self::Connection => f.write_str("connection"),
            Self::Other(raw) => f.write_str(raw),
        }
    }
}

impl Serialize for Channel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Channel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

// ============================================================================
// Tests
// ============================================================================
