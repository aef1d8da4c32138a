//! Event dispatch.
//!
//! | Module | Description |
//! |--------|-------------|
//! | `dispatcher` | Per-connection listener and subscription registry |
//! | `binder` | Channel-bound `on(...)` chaining |
//! | `subscription` | Subscribe/unsubscribe lifecycle shared by entity clients |

// ============================================================================
// Submodules
// ============================================================================

/// Channel-bound listener registration.
pub mod binder;

/// Per-connection event dispatcher.
pub mod dispatcher;

/// Subscribe/unsubscribe lifecycle.
pub(crate) mod subscription;

// ============================================================================
// Re-exports
// ============================================================================

pub use binder::{ChannelListeners, Registration};
pub use dispatcher::{EventDispatcher, Listener, ListenerHandle};
