//! Process-scoped connection registry.
//!
//! Maps labels to live [`Endpoint`]s and remembers the default label used
//! when `connection(None)` is called.
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │            ConnectionRegistry            │
//! │  ┌────────────────────────────────────┐  │
//! │  │ "conn-1" → Endpoint (conn-1) *     │  │
//! │  │ "admin"  → Endpoint (conn-2)       │  │
//! │  │ "guest"  → Endpoint (conn-3)       │  │
//! │  └────────────────────────────────────┘  │
//! │  * default label                         │
//! └──────────────────────────────────────────┘
//! ```
//!
//! Entries are added on connect and removed on `disconnect()` or when the
//! event loop sees a disconnect-class event for the entry's connection ID.

// ============================================================================
// Imports
// ============================================================================

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::client::Endpoint;
use crate::identifiers::ConnectionId;

// ============================================================================
// ConnectionRegistry
// ============================================================================

/// Label-keyed map of live connections.
///
/// Thread-safe; the event loop and explicit connect/disconnect calls share
/// it. Callers iterate over [`snapshot`](Self::snapshot) or
/// [`matching`](Self::matching) copies, never over the live map.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    /// Live connections by label.
    connections: RwLock<FxHashMap<String, Endpoint>>,

    /// Label used when no label is passed.
    default_label: RwLock<String>,
}

// ============================================================================
// ConnectionRegistry - Public API
// ============================================================================

impl ConnectionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of registered connections.
    #[inline]
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.connections.read().len()
    }

    /// Returns the default label (empty if never set).
    #[must_use]
    pub fn default_label(&self) -> String {
        self.default_label.read().clone()
    }

    /// Sets the default label.
    pub fn set_default_label(&self, label: impl Into<String>) {
        let label = label.into();
        debug!(label = %label, "Default connection label set");
        *self.default_label.write() = label;
    }

    /// Resolves an optional label against the default.
    #[must_use]
    pub fn resolve_label(&self, label: Option<&str>) -> String {
        match label {
            Some(label) => label.to_string(),
            None => self.default_label(),
        }
    }

    /// Returns the connection registered under `label`.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<Endpoint> {
        self.connections.read().get(label).cloned()
    }

    /// Returns copies of every connection with `connection_id`.
    #[must_use]
    pub fn matching(&self, connection_id: &ConnectionId) -> Vec<Endpoint> {
        self.connections
            .read()
            .values()
            .filter(|endpoint| endpoint.connection_id() == connection_id)
            .cloned()
            .collect()
    }

    /// Returns copies of every registered connection.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Endpoint> {
        self.connections.read().values().cloned().collect()
    }
}

// ============================================================================
// ConnectionRegistry - Lifecycle
// ============================================================================

impl ConnectionRegistry {
    /// Registers `endpoint` under its label, replacing any previous entry.
    pub fn insert(&self, endpoint: Endpoint) {
        let label = endpoint.label().to_string();
        let replaced = self.connections.write().insert(label.clone(), endpoint);

        if let Some(previous) = replaced {
            warn!(
                label = %label,
                previous = %previous.connection_id(),
                "Connection label reused, previous entry replaced"
            );
        } else {
            debug!(label = %label, "Connection registered");
        }
    }

    /// Removes the entry under `label` if it still holds `connection_id`.
    ///
    /// A label reused by a newer connection is left alone.
    pub fn remove(&self, label: &str, connection_id: &ConnectionId) -> Option<Endpoint> {
        let mut connections = self.connections.write();
        if connections
            .get(label)
            .is_none_or(|endpoint| endpoint.connection_id() != connection_id)
        {
            return None;
        }

        let removed = connections.remove(label);
        debug!(label = %label, connection_id = %connection_id, "Connection removed");
        removed
    }

    /// Removes every entry with `connection_id`; returns how many were removed.
    pub fn remove_connection_id(&self, connection_id: &ConnectionId) -> usize {
        let mut connections = self.connections.write();
        let before = connections.len();
        connections.retain(|_, endpoint| endpoint.connection_id() != connection_id);
        let removed = before - connections.len();

        if removed > 0 {
            debug!(connection_id = %connection_id, removed, "Disconnected connection removed");
        }
        removed
    }

    /// Removes and returns every entry. The default label is kept.
    pub fn drain(&self) -> Vec<Endpoint> {
        self.connections
            .write()
            .drain()
            .map(|(_, endpoint)| endpoint)
            .collect()
    }

    /// Removes every entry and clears the default label.
    pub fn clear(&self) {
        self.connections.write().clear();
        self.default_label.write().clear();
    }
}

// ============================================================================
// Tests
// ============================================================================
