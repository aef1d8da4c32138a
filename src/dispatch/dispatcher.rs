//! Per-connection event dispatcher.
//!
//! Every connection owns one [`EventDispatcher`]. It keeps two independent
//! pieces of state:
//!
//! | State | Shape | Purpose |
//! |-------|-------|---------|
//! | listeners | `Channel -> EventType -> [Listener]` | dispatch lookup |
//! | channels | `{Channel}` | subscription membership |
//!
//! Listeners for one `(channel, type)` pair run in registration order.
//! Registering the same listener twice yields two invocations. Dispatch runs
//! on a snapshot of the listener list, so a listener may add or remove
//! listeners (itself included) without affecting the in-flight dispatch.
//! A panicking listener is logged and skipped; the rest still run.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use privmx_endpoint::{Channel, EventDispatcher, EventType};
//!
//! let dispatcher = EventDispatcher::new();
//! let handle = dispatcher.add_event_listener(
//!     Channel::Thread,
//!     EventType::ThreadCreated,
//!     Arc::new(|event| println!("{:?}", event.kind)),
//! );
//!
//! // Later
//! handle.remove();
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{error, trace};

use crate::protocol::{Channel, Event, EventType};

// ============================================================================
// Types
// ============================================================================

/// Event listener callback.
///
/// Identity is the `Arc` allocation: removal compares pointers, not values.
pub type Listener = Arc<dyn Fn(&Event) + Send + Sync>;

/// Listener lists by channel, then event type.
type ListenerMap = FxHashMap<Channel, FxHashMap<EventType, Vec<Listener>>>;

/// Mutable dispatcher state.
#[derive(Default)]
struct DispatcherState {
    listeners: ListenerMap,
    channels: FxHashSet<Channel>,
}

impl DispatcherState {
    fn remove_listener(&mut self, channel: &Channel, event_type: EventType, listener: &Listener) {
        let Some(by_type) = self.listeners.get_mut(channel) else {
            return;
        };
        if let Some(list) = by_type.get_mut(&event_type) {
            list.retain(|existing| !same_listener(existing, listener));
        }
    }
}

/// Compares listeners by allocation, ignoring vtable pointers.
#[inline]
fn same_listener(a: &Listener, b: &Listener) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

// ============================================================================
// EventDispatcher
// ============================================================================

/// In-process pub/sub keyed by `(channel, event type)`.
///
/// Cheap to clone; clones share state.
#[derive(Clone, Default)]
pub struct EventDispatcher {
    inner: Arc<Mutex<DispatcherState>>,
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("EventDispatcher")
            .field("channels", &state.channels.len())
            .field("listener_channels", &state.listeners.len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// EventDispatcher - Listeners
// ============================================================================

impl EventDispatcher {
    /// Creates an empty dispatcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `listener` to the list for `(channel, event_type)`.
    ///
    /// Returns a handle whose [`ListenerHandle::remove`] removes exactly this
    /// listener from exactly this list.
    pub fn add_event_listener(
        &self,
        channel: Channel,
        event_type: EventType,
        listener: Listener,
    ) -> ListenerHandle {
        trace!(channel = %channel, event_type = %event_type, "Adding event listener");

        self.inner
            .lock()
            .listeners
            .entry(channel.clone())
            .or_default()
            .entry(event_type)
            .or_default()
            .push(Arc::clone(&listener));

        ListenerHandle {
            state: Arc::downgrade(&self.inner),
            channel,
            event_type,
            listener,
        }
    }

    /// Removes `listener` from the list for `(channel, event_type)`.
    ///
    /// No-op if the channel, type or listener is not registered.
    pub fn remove_event_listener(
        &self,
        channel: &Channel,
        event_type: EventType,
        listener: &Listener,
    ) {
        self.inner
            .lock()
            .remove_listener(channel, event_type, listener);
    }

    /// Invokes every listener registered for the event's channel and type.
    ///
    /// Returns the number of listeners invoked, panicking ones included.
    pub fn dispatch_event(&self, event: &Event) -> usize {
        let snapshot: Vec<Listener> = {
            let state = self.inner.lock();
            state
                .listeners
                .get(&event.channel)
                .and_then(|by_type| by_type.get(&event.event_type()))
                .cloned()
                .unwrap_or_default()
        };

        for listener in &snapshot {
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| listener(event))) {
                error!(
                    channel = %event.channel,
                    event_type = %event.event_type(),
                    panic = %panic_message(panic.as_ref()),
                    "Event listener panicked"
                );
            }
        }

        snapshot.len()
    }

    /// Deletes every listener registered under `channel`.
    pub fn remove_channel_events(&self, channel: &Channel) {
        self.inner.lock().listeners.remove(channel);
    }

    /// Clears all listeners and all channel subscriptions.
    pub fn remove_all_listeners(&self) {
        let mut state = self.inner.lock();
        state.listeners.clear();
        state.channels.clear();
    }

    /// Returns the number of listeners for `(channel, event_type)`.
    #[must_use]
    pub fn listener_count(&self, channel: &Channel, event_type: EventType) -> usize {
        self.inner
            .lock()
            .listeners
            .get(channel)
            .and_then(|by_type| by_type.get(&event_type))
            .map_or(0, Vec::len)
    }
}

// ============================================================================
// EventDispatcher - Subscriptions
// ============================================================================

impl EventDispatcher {
    /// Returns `true` if `channel` is in the subscription set.
    #[inline]
    #[must_use]
    pub fn is_subscribed_to_channel(&self, channel: &Channel) -> bool {
        self.inner.lock().channels.contains(channel)
    }

    /// Adds `channel` to the subscription set.
    ///
    /// Returns `true` if the channel was not already subscribed. The check and
    /// the insert happen under one lock, so of two concurrent callers exactly
    /// one sees `true`.
    pub fn add_channel_subscription(&self, channel: Channel) -> bool {
        self.inner.lock().channels.insert(channel)
    }

    /// Removes `channel` from the subscription set and drops its listeners.
    ///
    /// Returns `true` if the channel was subscribed.
    pub fn remove_channel_subscription(&self, channel: &Channel) -> bool {
        let mut state = self.inner.lock();
        let was_subscribed = state.channels.remove(channel);
        state.listeners.remove(channel);
        was_subscribed
    }

    /// Drops `channel` from the subscription set, keeping its listeners.
    pub(crate) fn release_channel_subscription(&self, channel: &Channel) {
        self.inner.lock().channels.remove(channel);
    }

    /// Returns the subscribed channels.
    #[must_use]
    pub fn subscribed_channels(&self) -> Vec<Channel> {
        self.inner.lock().channels.iter().cloned().collect()
    }
}

// ============================================================================
// ListenerHandle
// ============================================================================

/// Removes one registered listener.
///
/// Holds only a weak reference to the dispatcher, so an outstanding handle
/// does not keep a disconnected connection's listeners alive.
#[derive(Clone)]
pub struct ListenerHandle {
    state: Weak<Mutex<DispatcherState>>,
    channel: Channel,
    event_type: EventType,
    listener: Listener,
}

impl fmt::Debug for ListenerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerHandle")
            .field("channel", &self.channel)
            .field("event_type", &self.event_type)
            .finish_non_exhaustive()
    }
}

impl ListenerHandle {
    /// Channel the listener is registered on.
    #[inline]
    #[must_use]
    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Event type the listener is registered for.
    #[inline]
    #[must_use]
    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    /// Removes the listener. Idempotent.
    pub fn remove(&self) {
        if let Some(state) = self.state.upgrade() {
            state
                .lock()
                .remove_listener(&self.channel, self.event_type, &self.listener);
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Extracts a printable message from a panic payload.
fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================
