//! Guest connection wrapper.
//!
//! A [`PublicConnection`] is what
//! [`EndpointContext::connect_public`](crate::EndpointContext::connect_public)
//! returns. Guests can only look at an Inbox's public view and send entries
//! to it; every other client is reserved for user connections.
//!
//! ```ignore
//! let guest = context.connect_public(config).await?;
//! let view = guest.get_inbox_public_view(&inbox_id).await?;
//! guest
//!     .send_data_to_inbox(&inbox_id, InboxEntryPayload { data, files: vec![] })
//!     .await?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use crate::dispatch::EventDispatcher;
use crate::error::Result;
use crate::identifiers::ConnectionId;
use crate::protocol::{InboxEntryPayload, InboxPublicView};

use super::endpoint::Endpoint;
use super::inbox::InboxClient;

// ============================================================================
// PublicConnection
// ============================================================================

/// Limited handle to a guest connection.
#[derive(Debug, Clone)]
pub struct PublicConnection {
    endpoint: Endpoint,
}

impl PublicConnection {
    pub(crate) fn new(endpoint: Endpoint) -> Self {
        Self { endpoint }
    }

    /// Returns the wrapped endpoint.
    #[cfg(test)]
    pub(crate) fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Returns the connection ID.
    #[inline]
    #[must_use]
    pub fn connection_id(&self) -> &ConnectionId {
        self.endpoint.connection_id()
    }

    /// Returns the registry label.
    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        self.endpoint.label()
    }

    /// Sends an entry, with any attached files, to an Inbox.
    pub async fn send_data_to_inbox(&self, inbox_id: &str, entry: InboxEntryPayload) -> Result<()> {
        self.inbox(inbox_id).send_data(entry).await
    }

    /// Fetches the public part of an Inbox.
    pub async fn get_inbox_public_view(&self, inbox_id: &str) -> Result<InboxPublicView> {
        self.inbox(inbox_id).public_view().await
    }

    /// Disconnects and removes this connection from its context.
    pub async fn disconnect(&self) -> Result<()> {
        self.endpoint.disconnect().await
    }

    /// Inbox client over a throwaway dispatcher; guests never subscribe.
    fn inbox(&self, inbox_id: &str) -> InboxClient {
        InboxClient::with_dispatcher(
            self.endpoint.clone(),
            inbox_id.to_string(),
            EventDispatcher::new(),
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
