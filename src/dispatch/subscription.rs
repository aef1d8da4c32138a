//! Channel subscription lifecycle.
//!
//! Every entity client subscribes the same way:
//!
//! 1. Claim the channel in the dispatcher's subscription set.
//! 2. Only if the claim is new, issue the native subscribe RPC.
//!
//! and unsubscribes as the mirror image: release the channel (dropping its
//! listeners) and, only if it was subscribed, issue the native unsubscribe
//! RPC. Unsubscribing from a channel that is not subscribed does nothing.

// ============================================================================
// Imports
// ============================================================================

use std::future::Future;

use tracing::{debug, trace, warn};

use crate::error::Result;
use crate::protocol::Channel;

use super::binder::ChannelListeners;
use super::dispatcher::EventDispatcher;

// ============================================================================
// Subscribe
// ============================================================================

/// Subscribes `dispatcher` to `channel`, calling `rpc` on first subscribe.
///
/// If the RPC fails the channel is released again so a retry re-issues it;
/// listeners already registered on the channel are kept.
pub(crate) async fn subscribe_channel<F, Fut>(
    dispatcher: &EventDispatcher,
    channel: Channel,
    rpc: F,
) -> Result<ChannelListeners>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<()>>,
{
    if dispatcher.add_channel_subscription(channel.clone()) {
        debug!(channel = %channel, "Subscribing to channel");

        if let Err(e) = rpc().await {
            warn!(channel = %channel, error = %e, "Subscribe RPC failed");
            dispatcher.release_channel_subscription(&channel);
            return Err(e);
        }
    } else {
        trace!(channel = %channel, "Already subscribed");
    }

    Ok(ChannelListeners::new(dispatcher.clone(), channel))
}

// ============================================================================
// Unsubscribe
// ============================================================================

/// Unsubscribes `dispatcher` from `channel`, calling `rpc` only if it was
/// subscribed.
pub(crate) async fn unsubscribe_channel<F, Fut>(
    dispatcher: &EventDispatcher,
    channel: Channel,
    rpc: F,
) -> Result<()>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<()>>,
{
    if !dispatcher.remove_channel_subscription(&channel) {
        trace!(channel = %channel, "Not subscribed, nothing to unsubscribe");
        return Ok(());
    }

    debug!(channel = %channel, "Unsubscribing from channel");
    rpc().await
}

// ============================================================================
// Tests
// ============================================================================
