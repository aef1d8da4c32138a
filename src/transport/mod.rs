//! Native transport layer.
//!
//! The SDK sits on top of a native endpoint library that owns encryption,
//! storage and the bridge connection. This module describes that library's
//! surface and runs the one loop that drains its event queue.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐                      ┌──────────────────────┐
//! │  EndpointContext     │                      │  Native library      │
//! │                      │   async trait calls  │                      │
//! │  ConnectionRegistry  │◄────────────────────►│  ConnectionApi       │
//! │  EventLoop task ─────┼──── wait_event() ───►│  EventQueue          │
//! │    └─► dispatchers   │                      │  Thread/Store/Inbox  │
//! │                      │                      │  CryptoApi           │
//! └──────────────────────┘                      └──────────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `native` | Traits implemented by the native library |
//! | `registry` | Label-keyed registry of live connections |
//! | `event_loop` | Global polling task |

// ============================================================================
// Submodules
// ============================================================================

/// Global event loop.
pub mod event_loop;

/// Native endpoint traits.
pub mod native;

/// Connection registry.
pub mod registry;

// ============================================================================
// Re-exports
// ============================================================================

pub use event_loop::EventLoop;
pub use native::{
    ConnectionApi, CryptoApi, EndpointFactory, EventQueue, FileReadApi, InboxApi, StoreApi,
    ThreadApi,
};
pub use registry::ConnectionRegistry;
