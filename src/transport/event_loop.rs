//! Global event loop.
//!
//! One tokio task drains the shared [`EventQueue`] and fans each event out
//! to the dispatchers of the matching connections.
//!
//! # Iteration
//!
//! 1. Await `wait_event()` (the only suspension point besides step 6).
//! 2. Parse the raw event; connection events land on the `connection` channel.
//! 3. Dispatch to every registered connection with the event's connection ID.
//! 4. On `libDisconnected`/`libPlatformDisconnected`, drop those connections.
//! 5. On `libBreak`, mark the loop stopped and exit.
//! 6. Yield to the runtime before the next wait.
//!
//! A failure while handling one event (bad payload, panicking listener) is
//! logged and the loop moves on. A panicking listener never prevents the
//! registry cleanup of step 4. Queue errors back off from
//! [`QUEUE_RETRY_MIN`] up to [`QUEUE_RETRY_MAX`] before the next wait.
//!
//! # Lifecycle
//!
//! ```text
//! STOPPED ──start()──► RUNNING ──libBreak / stop()──► STOPPED
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::context::EventLoopOptions;
use crate::error::{Error, Result};
use crate::protocol::RawEvent;

use super::native::EventQueue;
use super::registry::ConnectionRegistry;

// ============================================================================
// Constants
// ============================================================================

/// First delay after a failed queue wait.
pub const QUEUE_RETRY_MIN: Duration = Duration::from_millis(10);

/// Longest delay between failed queue waits.
pub const QUEUE_RETRY_MAX: Duration = Duration::from_secs(1);

// ============================================================================
// EventLoop
// ============================================================================

/// Handle to the process-wide polling task.
///
/// Start and stop are serialized: a `start()` issued while a `stop()` is in
/// flight waits for the old task to exit, so the break sentinel is always
/// consumed by the task it was meant for.
pub struct EventLoop {
    /// Running flag, shared with the task.
    running: Arc<AtomicBool>,

    /// Queue of the running task.
    queue: parking_lot::Mutex<Option<Arc<dyn EventQueue>>>,

    /// Task handle; the async lock serializes start and stop.
    task: AsyncMutex<Option<JoinHandle<()>>>,
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLoop")
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// EventLoop - Public API
// ============================================================================

impl EventLoop {
    /// Creates a stopped loop.
    #[must_use]
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
            queue: parking_lot::Mutex::new(None),
            task: AsyncMutex::new(None),
        }
    }

    /// Returns `true` while the polling task runs.
    #[inline]
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Spawns the polling task unless it already runs.
    ///
    /// Returns `true` if a task was spawned.
    pub async fn start(
        &self,
        queue: Arc<dyn EventQueue>,
        registry: Arc<ConnectionRegistry>,
        options: EventLoopOptions,
    ) -> bool {
        let mut task = self.task.lock().await;

        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Event loop already running");
            return false;
        }

        if let Some(previous) = task.take()
            && let Err(e) = previous.await
        {
            warn!(error = %e, "Previous event loop task ended abnormally");
        }

        *self.queue.lock() = Some(Arc::clone(&queue));
        *task = Some(tokio::spawn(run_event_loop(
            queue,
            registry,
            Arc::clone(&self.running),
            options,
        )));

        info!(debug = options.debug, "Event loop started");
        true
    }

    /// Stops the polling task.
    ///
    /// Does nothing unless running. Otherwise injects the break sentinel,
    /// marks the loop stopped, clears every listener and subscription of
    /// every registered connection, and waits for the task to exit.
    pub async fn stop(&self, registry: &ConnectionRegistry) -> Result<()> {
        let mut task = self.task.lock().await;

        if !self.is_running() {
            debug!("Event loop not running, nothing to stop");
            return Ok(());
        }

        let queue = self.queue.lock().clone();
        if let Some(queue) = queue {
            queue.emit_break_event().await?;
        }

        self.running.store(false, Ordering::SeqCst);

        for endpoint in registry.snapshot() {
            endpoint.dispatcher().remove_all_listeners();
        }

        if let Some(handle) = task.take()
            && let Err(e) = handle.await
        {
            warn!(error = %e, "Event loop task ended abnormally");
        }

        info!("Event loop stopped");
        Ok(())
    }
}

// ============================================================================
// Event Loop Task
// ============================================================================

/// What the loop does after handling one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Break,
}

/// Body of the polling task.
async fn run_event_loop(
    queue: Arc<dyn EventQueue>,
    registry: Arc<ConnectionRegistry>,
    running: Arc<AtomicBool>,
    options: EventLoopOptions,
) {
    let mut retry_delay = QUEUE_RETRY_MIN;

    loop {
        let raw = match queue.wait_event().await {
            Ok(raw) => {
                retry_delay = QUEUE_RETRY_MIN;
                raw
            }
            Err(Error::EventQueueClosed) => {
                warn!("Event queue closed, event loop exiting");
                break;
            }
            Err(e) => {
                error!(error = %e, retry_in_ms = retry_delay.as_millis(), "Failed to wait for event");
                tokio::time::sleep(retry_delay).await;
                retry_delay = (retry_delay * 2).min(QUEUE_RETRY_MAX);
                continue;
            }
        };

        if options.debug {
            info!(
                event_type = %raw.event_type,
                channel = %raw.channel,
                connection_id = %raw.connection_id,
                data = %raw.data,
                "Caught event"
            );
        }

        let flow = match handle_event(&raw, &registry) {
            Ok(flow) => flow,
            Err(e) => {
                error!(event_type = %raw.event_type, error = %e, "Failed to handle event");
                Flow::Continue
            }
        };

        if flow == Flow::Break {
            break;
        }

        tokio::task::yield_now().await;
    }

    running.store(false, Ordering::SeqCst);
    debug!("Event loop task exited");
}

/// Parses, dispatches and applies registry side effects for one event.
///
/// Listener panics are contained by the dispatcher, so the registry update
/// and the break check always run once the event parses.
fn handle_event(raw: &RawEvent, registry: &ConnectionRegistry) -> Result<Flow> {
    let event = raw.parse()?;

    let mut delivered = 0;
    for endpoint in registry.matching(&event.connection_id) {
        delivered += endpoint.dispatcher().dispatch_event(&event);
    }

    if event.is_disconnect() {
        registry.remove_connection_id(&event.connection_id);
    }

    if event.is_break() {
        debug!("Break event received");
        return Ok(Flow::Break);
    }

    debug!(
        event_type = %event.event_type(),
        channel = %event.channel,
        delivered,
        "Event dispatched"
    );
    Ok(Flow::Continue)
}

// ============================================================================
// Tests
// ============================================================================
