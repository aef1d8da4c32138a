//! Error types for the PrivMX Endpoint SDK.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use privmx_endpoint::{Error, Result};
//!
//! async fn example(context: &EndpointContext) -> Result<()> {
//!     let endpoint = context.connection(None)?;
//!     endpoint.threads()?.subscribe_for_thread_events().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::InvalidArgument`] |
//! | Connection | [`Error::NoActiveConnection`], [`Error::WrongConnectionType`], [`Error::PublicConnectionAccess`] |
//! | Native | [`Error::Endpoint`] |
//! | Transfer | [`Error::EmptyFile`], [`Error::Endpoint`] |
//! | Events | [`Error::UnknownEventType`], [`Error::InvalidEvent`], [`Error::EventQueueClosed`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::Url`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;

use crate::client::ConnectionType;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Connection Error Codes
// ============================================================================

/// No active connection for the label passed to `connection()`.
pub const CODE_NO_USER_CONNECTION: u32 = 1;

/// `connection()` called for a public connection.
pub const CODE_PUBLIC_AS_USER: u32 = 2;

/// No active connection for the label passed to `public_connection()`.
pub const CODE_NO_PUBLIC_CONNECTION: u32 = 3;

/// `public_connection()` called for a user connection.
pub const CODE_USER_AS_PUBLIC: u32 = 4;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when a connection configuration is incomplete or malformed.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Invalid argument passed to an operation.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// No connection is registered under the requested label.
    #[error("No active connection for label '{label}' (code {code})")]
    NoActiveConnection {
        /// Label that was looked up.
        label: String,
        /// Distinguishing error code (1 or 3).
        code: u32,
    },

    /// The connection exists but has the wrong type for the accessor used.
    #[error("Connection '{label}' is a {actual} connection, use the {actual} accessor (code {code})")]
    WrongConnectionType {
        /// Label of the connection.
        label: String,
        /// Actual type of the registered connection.
        actual: ConnectionType,
        /// Distinguishing error code (2 or 4).
        code: u32,
    },

    /// An entity accessor was used on a public (guest) connection.
    #[error("Public connections only expose the public connection API: {operation}")]
    PublicConnectionAccess {
        /// Accessor that was called.
        operation: String,
    },

    // ========================================================================
    // Native Errors
    // ========================================================================
    /// The native endpoint rejected or failed an RPC call.
    #[error("Endpoint error: {message}")]
    Endpoint {
        /// Native error code, if the library supplied one.
        code: Option<i64>,
        /// Error message from the native library.
        message: String,
    },

    // ========================================================================
    // Transfer Errors
    // ========================================================================
    /// A stream uploader was created for an empty file.
    #[error("Cannot upload an empty file")]
    EmptyFile,

    // ========================================================================
    // Event Errors
    // ========================================================================
    /// The event queue yielded an event type this SDK does not know.
    #[error("Unknown event type: {event_type}")]
    UnknownEventType {
        /// Raw event type string.
        event_type: String,
    },

    /// The event payload did not match its declared type.
    #[error("Invalid payload for event {event_type}: {message}")]
    InvalidEvent {
        /// Event type whose payload failed to decode.
        event_type: String,
        /// Decoder message.
        message: String,
    },

    /// The shared event queue is gone; no further events will arrive.
    #[error("Event queue closed")]
    EventQueueClosed,

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parse error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a no active connection error.
    #[inline]
    pub fn no_active_connection(label: impl Into<String>, code: u32) -> Self {
        Self::NoActiveConnection {
            label: label.into(),
            code,
        }
    }

    /// Creates a wrong connection type error.
    #[inline]
    pub fn wrong_connection_type(label: impl Into<String>, actual: ConnectionType, code: u32) -> Self {
        Self::WrongConnectionType {
            label: label.into(),
            actual,
            code,
        }
    }

    /// Creates a public connection access error.
    #[inline]
    pub fn public_connection_access(operation: impl Into<String>) -> Self {
        Self::PublicConnectionAccess {
            operation: operation.into(),
        }
    }

    /// Creates a native endpoint error without a code.
    #[inline]
    pub fn endpoint(message: impl Into<String>) -> Self {
        Self::Endpoint {
            code: None,
            message: message.into(),
        }
    }

    /// Creates a native endpoint error with the library's error code.
    #[inline]
    pub fn endpoint_with_code(code: i64, message: impl Into<String>) -> Self {
        Self::Endpoint {
            code: Some(code),
            message: message.into(),
        }
    }

    /// Creates an unknown event type error.
    #[inline]
    pub fn unknown_event_type(event_type: impl Into<String>) -> Self {
        Self::UnknownEventType {
            event_type: event_type.into(),
        }
    }

    /// Creates an invalid event payload error.
    #[inline]
    pub fn invalid_event(event_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidEvent {
            event_type: event_type.into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns the distinguishing code of connection errors.
    #[inline]
    #[must_use]
    pub fn code(&self) -> Option<u32> {
        match self {
            Self::NoActiveConnection { code, .. } | Self::WrongConnectionType { code, .. } => {
                Some(*code)
            }
            _ => None,
        }
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::NoActiveConnection { .. }
                | Self::WrongConnectionType { .. }
                | Self::PublicConnectionAccess { .. }
        )
    }

    /// Returns `true` if this error came out of a chunk transfer.
    #[inline]
    #[must_use]
    pub fn is_transfer_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyFile | Self::Endpoint { .. } | Self::Io(_)
        )
    }

    /// Returns `true` if this error originates from event decoding.
    #[inline]
    #[must_use]
    pub fn is_event_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownEventType { .. } | Self::InvalidEvent { .. } | Self::EventQueueClosed
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
