//! Upload state machines.
//!
//! An [`Uploader`] pairs an [`UploadSource`] (bytes in memory or an async
//! reader) with a [`ChunkSink`] (where the chunks are written). The sink
//! decides which native RPC a chunk goes through:
//!
//! | Sink | RPC | Alias |
//! |------|-----|-------|
//! | [`StoreFileSink`] | `StoreApi::write_to_file(handle, chunk)` | [`StoreUploader`] |
//! | [`InboxFileSink`] | `InboxApi::write_to_file(inbox, file, chunk)` | [`InboxFileUploader`] |
//!
//! Chunks for one handle are strictly sequential: `send_next_chunk` takes
//! `&mut self`.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::identifiers::{FileHandle, InboxHandle};
use crate::transport::native::{InboxApi, StoreApi};

use super::{MAX_CHUNK_SIZE, STREAM_READ_BLOCK_SIZE, progress};

// ============================================================================
// Types
// ============================================================================

/// Uploader writing into a Store file handle.
pub type StoreUploader = Uploader<StoreFileSink>;

/// Uploader writing a file attached to a prepared Inbox entry.
pub type InboxFileUploader = Uploader<InboxFileSink>;

// ============================================================================
// ChunkSink
// ============================================================================

/// Destination of uploaded chunks.
#[async_trait]
pub trait ChunkSink: Send + Sync {
    /// Writes one chunk of at most [`MAX_CHUNK_SIZE`] bytes.
    async fn write_chunk(&self, chunk: &[u8]) -> Result<()>;
}

/// Sink for a Store file write handle.
pub struct StoreFileSink {
    api: Arc<dyn StoreApi>,
    handle: FileHandle,
}

impl StoreFileSink {
    /// Creates a sink writing through `handle`.
    #[must_use]
    pub fn new(api: Arc<dyn StoreApi>, handle: FileHandle) -> Self {
        Self { api, handle }
    }
}

impl fmt::Debug for StoreFileSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreFileSink")
            .field("handle", &self.handle)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ChunkSink for StoreFileSink {
    async fn write_chunk(&self, chunk: &[u8]) -> Result<()> {
        self.api.write_to_file(self.handle, chunk).await
    }
}

/// Sink for a file handle of a prepared Inbox entry.
pub struct InboxFileSink {
    api: Arc<dyn InboxApi>,
    inbox_handle: InboxHandle,
    file_handle: FileHandle,
}

impl InboxFileSink {
    /// Creates a sink writing `file_handle` of the entry `inbox_handle`.
    #[must_use]
    pub fn new(api: Arc<dyn InboxApi>, inbox_handle: InboxHandle, file_handle: FileHandle) -> Self {
        Self {
            api,
            inbox_handle,
            file_handle,
        }
    }
}

impl fmt::Debug for InboxFileSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InboxFileSink")
            .field("inbox_handle", &self.inbox_handle)
            .field("file_handle", &self.file_handle)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ChunkSink for InboxFileSink {
    async fn write_chunk(&self, chunk: &[u8]) -> Result<()> {
        self.api
            .write_to_file(self.inbox_handle, self.file_handle, chunk)
            .await
    }
}

// ============================================================================
// UploadSource
// ============================================================================

/// Where uploaded bytes come from.
pub enum UploadSource {
    /// Payload held in memory.
    Bytes(Vec<u8>),
    /// Async reader, pulled in blocks of up to [`STREAM_READ_BLOCK_SIZE`].
    Stream(Box<dyn AsyncRead + Send + Unpin>),
}

impl fmt::Debug for UploadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes(data) => f.debug_tuple("Bytes").field(&data.len()).finish(),
            Self::Stream(_) => f.write_str("Stream"),
        }
    }
}

// ============================================================================
// Uploader
// ============================================================================

/// Upload of a known number of bytes through a [`ChunkSink`].
#[derive(Debug)]
pub struct Uploader<S> {
    sink: S,
    source: UploadSource,
    offset: u64,
    size: u64,
}

impl<S: ChunkSink> Uploader<S> {
    /// Creates an uploader for an in-memory payload.
    #[must_use]
    pub fn new(sink: S, data: impl Into<Vec<u8>>) -> Self {
        let data = data.into();
        Self {
            sink,
            size: data.len() as u64,
            source: UploadSource::Bytes(data),
            offset: 0,
        }
    }

    /// Creates an uploader pulling `size` bytes from `reader`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyFile`] if `size` is zero.
    pub fn from_stream<R>(sink: S, reader: R, size: u64) -> Result<Self>
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        if size == 0 {
            return Err(Error::EmptyFile);
        }

        Ok(Self {
            sink,
            source: UploadSource::Stream(Box::new(reader)),
            offset: 0,
            size,
        })
    }

    /// Skips the first `offset` bytes of an in-memory payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for stream sources or if `offset`
    /// exceeds the payload size.
    pub fn starting_at(mut self, offset: u64) -> Result<Self> {
        if matches!(self.source, UploadSource::Stream(_)) {
            return Err(Error::invalid_argument(
                "stream uploads cannot start at an offset",
            ));
        }
        if offset > self.size {
            return Err(Error::invalid_argument(format!(
                "offset {offset} is past the end of a {}-byte payload",
                self.size
            )));
        }

        self.offset = offset;
        Ok(self)
    }

    /// Writes the next chunk.
    ///
    /// Returns `true` while bytes remain and `false` once the payload (or the
    /// stream) is exhausted.
    ///
    /// # Errors
    ///
    /// Propagates the sink's RPC error or a stream read error.
    pub async fn send_next_chunk(&mut self) -> Result<bool> {
        let remaining = self.size.saturating_sub(self.offset);
        if remaining == 0 {
            return Ok(false);
        }

        match &mut self.source {
            UploadSource::Bytes(data) => {
                let start = usize::try_from(self.offset)
                    .map_err(|_| Error::invalid_argument("offset exceeds address space"))?;
                let len = remaining.min(MAX_CHUNK_SIZE as u64) as usize;
                self.sink.write_chunk(&data[start..start + len]).await?;
                self.offset += len as u64;
            }
            UploadSource::Stream(reader) => {
                let want = remaining.min(STREAM_READ_BLOCK_SIZE as u64);
                let mut block = Vec::with_capacity(want as usize);
                AsyncReadExt::take(reader.as_mut(), want)
                    .read_to_end(&mut block)
                    .await?;

                if block.is_empty() {
                    debug!(
                        offset = self.offset,
                        size = self.size,
                        "Stream ended before declared size"
                    );
                    return Ok(false);
                }

                for chunk in block.chunks(MAX_CHUNK_SIZE) {
                    self.sink.write_chunk(chunk).await?;
                    self.offset += chunk.len() as u64;
                }
            }
        }

        trace!(offset = self.offset, size = self.size, "Chunk sent");
        Ok(self.offset < self.size)
    }

    /// Sends every remaining chunk, reporting progress after each one.
    ///
    /// # Errors
    ///
    /// Stops at the first failing chunk.
    pub async fn send_all<F>(&mut self, mut on_progress: F) -> Result<()>
    where
        F: FnMut(f64) + Send,
    {
        loop {
            let more = self.send_next_chunk().await?;
            on_progress(self.progress());
            if !more {
                return Ok(());
            }
        }
    }

    /// Bytes sent so far, including any skipped prefix.
    #[inline]
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Total bytes to send.
    #[inline]
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Percentage sent, in `[0, 100]`.
    #[inline]
    #[must_use]
    pub fn progress(&self) -> f64 {
        progress(self.offset, self.size)
    }
}

// ============================================================================
// StoreUploader
// ============================================================================

impl Uploader<StoreFileSink> {
    /// Returns the native write handle.
    #[inline]
    #[must_use]
    pub fn handle(&self) -> FileHandle {
        self.sink.handle
    }

    /// Closes the handle and returns the ID of the written file.
    pub async fn close(self) -> Result<String> {
        let file_id = self.sink.api.close_file(self.sink.handle).await?;
        debug!(file_id = %file_id, size = self.size, "Store upload closed");
        Ok(file_id)
    }

    /// Closes the handle and deletes the partially written file.
    pub async fn abort(self) -> Result<()> {
        let file_id = self.sink.api.close_file(self.sink.handle).await?;
        debug!(file_id = %file_id, offset = self.offset, "Store upload aborted");
        self.sink.api.delete_file(&file_id).await
    }
}

// ============================================================================
// InboxFileUploader
// ============================================================================

impl Uploader<InboxFileSink> {
    /// Returns the native file handle.
    #[inline]
    #[must_use]
    pub fn file_handle(&self) -> FileHandle {
        self.sink.file_handle
    }
}

// ============================================================================
// Tests
// ============================================================================
