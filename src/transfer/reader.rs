//! Download state machine.
//!
//! A [`StreamReader`] pulls [`MAX_CHUNK_SIZE`] bytes per RPC and accumulates
//! them. A chunk shorter than [`MAX_CHUNK_SIZE`] marks the end of the file,
//! so a file whose size is an exact multiple of the chunk size costs one
//! extra, empty read.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::Result;
use crate::identifiers::FileHandle;
use crate::transport::native::FileReadApi;

use super::{MAX_CHUNK_SIZE, progress};

// ============================================================================
// StreamReader
// ============================================================================

/// Sequential reader over a native file handle.
pub struct StreamReader {
    api: Arc<dyn FileReadApi>,
    handle: FileHandle,
    offset: u64,
    size: u64,
    data: Vec<u8>,
}

impl fmt::Debug for StreamReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamReader")
            .field("handle", &self.handle)
            .field("offset", &self.offset)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl StreamReader {
    /// Wraps an already opened read handle.
    ///
    /// `size` only feeds [`progress`](Self::progress); pass `0` if unknown.
    #[must_use]
    pub fn new(api: Arc<dyn FileReadApi>, handle: FileHandle, size: u64) -> Self {
        Self {
            api,
            handle,
            offset: 0,
            size,
            data: Vec::new(),
        }
    }

    /// Opens `file_id` for reading.
    pub async fn open(api: Arc<dyn FileReadApi>, file_id: &str, size: u64) -> Result<Self> {
        let handle = api.open_file(file_id).await?;
        debug!(file_id = %file_id, handle = %handle, size, "File opened for reading");
        Ok(Self::new(api, handle, size))
    }

    /// Reads the next chunk into the buffer.
    ///
    /// Returns `false` once a short read signals the end of the file.
    pub async fn read_next_chunk(&mut self) -> Result<bool> {
        let chunk = self
            .api
            .read_from_file(self.handle, MAX_CHUNK_SIZE as u64)
            .await?;
        let len = chunk.len();

        self.data.extend_from_slice(&chunk);
        self.offset += len as u64;

        trace!(handle = %self.handle, len, offset = self.offset, "Chunk read");
        Ok(len >= MAX_CHUNK_SIZE)
    }

    /// Reads until the end of the file, reporting progress after each chunk.
    pub async fn read_all<F>(&mut self, mut on_progress: F) -> Result<()>
    where
        F: FnMut(f64) + Send,
    {
        loop {
            let more = self.read_next_chunk().await?;
            on_progress(self.progress());
            if !more {
                return Ok(());
            }
        }
    }

    /// Moves the read position to `position`.
    ///
    /// Bytes already buffered are kept.
    pub async fn seek(&mut self, position: u64) -> Result<()> {
        self.api.seek_in_file(self.handle, position).await?;
        self.offset = position;
        Ok(())
    }

    /// Bytes read so far.
    #[inline]
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Moves the buffered bytes out, leaving the buffer empty.
    #[must_use]
    pub fn take_data(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.data)
    }

    /// Returns the native read handle.
    #[inline]
    #[must_use]
    pub fn handle(&self) -> FileHandle {
        self.handle
    }

    /// Current read position.
    #[inline]
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Declared size, `0` if unknown.
    #[inline]
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Percentage read; stays `0.0` when the size is unknown.
    #[inline]
    #[must_use]
    pub fn progress(&self) -> f64 {
        progress(self.offset, self.size)
    }

    /// Closes the handle and returns the buffered bytes.
    pub async fn close(self) -> Result<Vec<u8>> {
        self.api.close_file(self.handle).await?;
        debug!(handle = %self.handle, read = self.offset, "Read handle closed");
        Ok(self.data)
    }

    /// Closes the handle, discarding the buffer.
    pub async fn abort(self) -> Result<()> {
        self.api.close_file(self.handle).await?;
        debug!(handle = %self.handle, "Read handle aborted");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::testing::MockEndpoint;

    fn payload(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7 % 256) as u8).collect()
    }

    async fn reader_for(mock: &MockEndpoint, data: Vec<u8>) -> StreamReader {
        let size = data.len() as u64;
        let file_id = mock.put_file("store-1", data);
        let api: Arc<dyn FileReadApi> = Arc::new(mock.clone());
        StreamReader::open(api, &file_id, size).await.expect("open")
    }

    #[tokio::test]
    async fn test_short_file_single_read() {
        let mock = MockEndpoint::new();
        let mut reader = reader_for(&mock, payload(100)).await;

        assert!(!reader.read_next_chunk().await.expect("read"));
        assert_eq!(reader.data(), payload(100).as_slice());
        assert_eq!(reader.progress(), 100.0);
    }

    #[tokio::test]
    async fn test_read_all_reports_progress() {
        let mock = MockEndpoint::new();
        let data = payload(MAX_CHUNK_SIZE * 3 / 2);
        let mut reader = reader_for(&mock, data.clone()).await;

        let mut reported = Vec::new();
        reader.read_all(|p| reported.push(p)).await.expect("read all");

        assert_eq!(reported.len(), 2);
        assert!(reported[0] < reported[1]);
        assert_eq!(reported[1], 100.0);
        assert_eq!(reader.close().await.expect("close"), data);
        assert_eq!(mock.open_handles(), 0);
    }

    #[tokio::test]
    async fn test_unknown_size_progress_stays_zero() {
        let mock = MockEndpoint::new();
        let file_id = mock.put_file("store-1", payload(10));
        let api: Arc<dyn FileReadApi> = Arc::new(mock.clone());
        let mut reader = StreamReader::open(api, &file_id, 0).await.expect("open");

        reader.read_all(|_| {}).await.expect("read");
        assert_eq!(reader.progress(), 0.0);
        assert_eq!(reader.data().len(), 10);
    }

    #[tokio::test]
    async fn test_seek_then_read() {
        let mock = MockEndpoint::new();
        let mut reader = reader_for(&mock, b"hello world".to_vec()).await;

        reader.seek(6).await.expect("seek");
        reader.read_next_chunk().await.expect("read");

        assert_eq!(reader.take_data(), b"world".to_vec());
        assert!(reader.data().is_empty());
        assert_eq!(reader.offset(), 11);
    }

    #[tokio::test]
    async fn test_abort_releases_handle() {
        let mock = MockEndpoint::new();
        let reader = reader_for(&mock, payload(5)).await;
        let other = reader_for(&mock, payload(5)).await;
        assert_ne!(reader.handle(), other.handle());
        assert_eq!(mock.open_handles(), 2);

        reader.abort().await.expect("abort");
        other.abort().await.expect("abort other");
        assert_eq!(mock.open_handles(), 0);
        assert_eq!(mock.count("delete_file"), 0);
    }

    #[tokio::test]
    async fn test_read_failure_propagates() {
        let mock = MockEndpoint::new();
        let mut reader = reader_for(&mock, payload(5)).await;

        mock.fail_next("read_from_file");
        assert!(reader.read_next_chunk().await.is_err());
        assert_eq!(reader.offset(), 0);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(8))]

            #[test]
            fn exact_multiple_costs_one_extra_read(k in 0usize..4) {
                let mock = MockEndpoint::new();
                let data = payload(k * MAX_CHUNK_SIZE);

                let read = tokio_test::block_on(async {
                    let mut reader = reader_for(&mock, data.clone()).await;
                    while reader.read_next_chunk().await.expect("read") {}
                    reader.close().await.expect("close")
                });

                prop_assert_eq!(mock.count("read_from_file"), k + 1);
                prop_assert_eq!(read.len(), k * MAX_CHUNK_SIZE);
                prop_assert_eq!(read, data);
            }
        }
    }
}
