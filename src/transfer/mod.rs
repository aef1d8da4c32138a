//! Chunked transfer protocol.
//!
//! Byte payloads move through native file handles one bounded chunk at a
//! time. Uploads call [`send_next_chunk`](Uploader::send_next_chunk) until it
//! returns `false`, downloads call
//! [`read_next_chunk`](StreamReader::read_next_chunk) the same way.
//!
//! | Type | Direction | Finalized by |
//! |------|-----------|--------------|
//! | [`StoreUploader`] | Store file write handle | `close()` / `abort()` |
//! | [`InboxFileUploader`] | Inbox entry file handle | `InboxApi::send_entry` |
//! | [`StreamReader`] | Any read handle | `close()` / `abort()` |
//!
//! ```ignore
//! let mut uploader = store.stream_data(payload).await?;
//! while uploader.send_next_chunk().await? {
//!     println!("{:.0}%", uploader.progress());
//! }
//! let file_id = uploader.close().await?;
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Download state machine.
pub mod reader;

/// Upload state machines and chunk sinks.
pub mod upload;

// ============================================================================
// Re-exports
// ============================================================================

pub use reader::StreamReader;
pub use upload::{
    ChunkSink, InboxFileSink, InboxFileUploader, StoreFileSink, StoreUploader, UploadSource,
    Uploader,
};

// ============================================================================
// Constants
// ============================================================================

/// Largest chunk moved in one read or write RPC (1 MiB).
pub const MAX_CHUNK_SIZE: usize = 1_048_576;

/// Largest block pulled from a stream source per outer read (4 MiB).
pub const STREAM_READ_BLOCK_SIZE: usize = 4 * MAX_CHUNK_SIZE;

// ============================================================================
// Progress
// ============================================================================

/// Percentage of `size` covered by `offset`, clamped to `[0, 100]`.
///
/// Returns `0.0` when `size` is zero or unknown.
#[inline]
#[must_use]
pub fn progress(offset: u64, size: u64) -> f64 {
    if size == 0 {
        return 0.0;
    }
    (offset as f64 / size as f64 * 100.0).clamp(0.0, 100.0)
}

// ============================================================================
// Tests
// ============================================================================
