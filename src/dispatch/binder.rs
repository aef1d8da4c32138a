//! Channel-scoped listener binders.
//!
//! A [`ChannelListeners`] is what every `subscribe*` call returns: a
//! dispatcher bound to one channel. Its [`on`](ChannelListeners::on)
//! registers a listener and returns a [`Registration`] that can remove it or
//! chain another registration on the same channel:
//!
//! ```ignore
//! let listeners = endpoint.threads()?.subscribe_for_thread_events().await?;
//! let created = listeners
//!     .on(EventType::ThreadCreated, |event| println!("created {event:?}"))
//!     .on(EventType::ThreadDeleted, |event| println!("deleted {event:?}"));
//!
//! created.remove_event_listener();
//! ```
//!
//! [`ChannelListeners::parent`] widens a sub-channel binder to its top-level
//! channel (`store/{id}/files` to `store`).

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use tracing::warn;

use crate::protocol::{Channel, Event, EventType};

use super::dispatcher::{EventDispatcher, ListenerHandle};

// ============================================================================
// ChannelListeners
// ============================================================================

/// Dispatcher bound to one channel.
#[derive(Debug, Clone)]
pub struct ChannelListeners {
    dispatcher: EventDispatcher,
    channel: Channel,
}

impl ChannelListeners {
    /// Binds `dispatcher` to `channel`.
    #[must_use]
    pub fn new(dispatcher: EventDispatcher, channel: Channel) -> Self {
        Self {
            dispatcher,
            channel,
        }
    }

    /// Returns the bound channel.
    #[inline]
    #[must_use]
    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Returns `true` if the bound channel is currently subscribed.
    #[inline]
    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.dispatcher.is_subscribed_to_channel(&self.channel)
    }

    /// Returns a binder for the top-level channel of this one.
    #[must_use]
    pub fn parent(&self) -> Self {
        Self::new(self.dispatcher.clone(), self.channel.parent())
    }

    /// Registers `callback` for `event_type` on the bound channel.
    ///
    /// Logs an advisory warning if the channel is not subscribed or the event
    /// type is never delivered on this channel's family. The listener is
    /// registered either way, so a later subscribe still delivers to it.
    /// The `connection` channel is always delivered and never warns about
    /// subscription.
    pub fn on<F>(&self, event_type: EventType, callback: F) -> Registration
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        if self.channel != Channel::Connection && !self.is_subscribed() {
            warn!(
                channel = %self.channel,
                event_type = %event_type,
                "Registered an event listener on a channel that is not subscribed"
            );
        }
        if event_type.family() != self.channel.family() {
            warn!(
                channel = %self.channel,
                event_type = %event_type,
                "Event type is not delivered on this channel"
            );
        }

        self.register(event_type, callback)
    }

    /// Registers without advisory checks.
    fn register<F>(&self, event_type: EventType, callback: F) -> Registration
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let handle =
            self.dispatcher
                .add_event_listener(self.channel.clone(), event_type, Arc::new(callback));

        Registration {
            listeners: self.clone(),
            handle,
        }
    }
}

// ============================================================================
// Registration
// ============================================================================

/// Result of [`ChannelListeners::on`].
#[derive(Debug, Clone)]
pub struct Registration {
    listeners: ChannelListeners,
    handle: ListenerHandle,
}

impl Registration {
    /// Registers another listener on the same channel.
    ///
    /// Chained registrations skip the advisory checks of the first `on`.
    pub fn on<F>(&self, event_type: EventType, callback: F) -> Registration
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.listeners.register(event_type, callback)
    }

    /// Removes the listener this registration added. Idempotent.
    pub fn remove_event_listener(&self) {
        self.handle.remove();
    }

    /// Returns the handle of the listener this registration added.
    #[inline]
    #[must_use]
    pub fn handle(&self) -> &ListenerHandle {
        &self.handle
    }

    /// Returns the binder this registration was made on.
    #[inline]
    #[must_use]
    pub fn listeners(&self) -> &ChannelListeners {
        &self.listeners
    }
}

// ============================================================================
// Tests
// ============================================================================
