//! Connection handles and entity clients.
//!
//! Every client is a cheap, cloneable view over an [`Endpoint`]: it borrows
//! the endpoint's lazily created native APIs and its event dispatcher.
//!
//! # Hierarchy
//!
//! | Type | Scope | Obtained from |
//! |------|-------|---------------|
//! | [`Endpoint`] | One user connection | `EndpointContext::connect` |
//! | [`PublicConnection`] | One guest connection | `EndpointContext::connect_public` |
//! | [`Threads`] / [`ThreadClient`] | All Threads / one Thread | [`Endpoint::threads`] / [`Endpoint::thread`] |
//! | [`Stores`] / [`StoreClient`] | All Stores / one Store | [`Endpoint::stores`] / [`Endpoint::store`] |
//! | [`Inboxes`] / [`InboxClient`] | All Inboxes / one Inbox | [`Endpoint::inboxes`] / [`Endpoint::inbox`] |
//! | [`PrivmxCrypto`] | Process, no connection | `EndpointContext::crypto` |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

// ============================================================================
// Submodules
// ============================================================================

/// Connection-independent crypto helpers.
pub mod crypto;

/// One connection and its lazily created APIs.
pub mod endpoint;

/// Inbox clients.
pub mod inbox;

/// Guest connection wrapper.
pub mod public;

/// Store clients.
pub mod store;

/// Thread clients.
pub mod thread;

// ============================================================================
// Re-exports
// ============================================================================

pub use crypto::PrivmxCrypto;
pub use endpoint::Endpoint;
pub use inbox::{InboxClient, Inboxes};
pub use public::PublicConnection;
pub use store::{StoreClient, Stores};
pub use thread::{ThreadClient, Threads};

// ============================================================================
// ConnectionType
// ============================================================================

/// Kind of connection an [`Endpoint`] wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionType {
    /// Authenticated with a user's private key.
    User,
    /// Anonymous guest connection.
    Public,
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Public => f.write_str("public"),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
