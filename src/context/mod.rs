//! Endpoint context and configuration.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`EndpointContext`] | Process-scoped owner of connections and the event loop |
//! | [`ConnectionConfig`] | Validated connection settings |
//! | [`ConnectionConfigBuilder`] | Fluent configuration builder |
//! | [`EventLoopOptions`] | Event loop options |
//! | [`ListOptions`] | Paging options for `list*` calls |

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder for connection configuration.
pub mod builder;

/// Process-scoped context.
pub mod core;

/// Event loop and listing options.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::{ConnectionConfig, ConnectionConfigBuilder};
pub use core::EndpointContext;
pub use options::{DEFAULT_PAGE_SIZE, EventLoopOptions, ListOptions};
