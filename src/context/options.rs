//! Event loop and listing options.
//!
//! # Example
//!
//! ```ignore
//! use privmx_endpoint::{EventLoopOptions, ListOptions, SortOrder};
//!
//! context.start_event_loop(EventLoopOptions::new().with_debug()).await?;
//!
//! let options = ListOptions::new().with_page_size(20).with_sort(SortOrder::Asc);
//! let page = threads.list_threads(2, options).await?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use crate::protocol::{PagingQuery, SortOrder};

// ============================================================================
// Constants
// ============================================================================

/// Default number of items per page.
pub const DEFAULT_PAGE_SIZE: u64 = 100;

// ============================================================================
// EventLoopOptions
// ============================================================================

/// Options for [`EndpointContext::start_event_loop`](super::EndpointContext::start_event_loop).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventLoopOptions {
    /// Log every caught event at `info` level.
    pub debug: bool,
}

impl EventLoopOptions {
    /// Creates options with debug logging off.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { debug: false }
    }

    /// Enables logging of every caught event.
    #[inline]
    #[must_use]
    pub const fn with_debug(mut self) -> Self {
        self.debug = true;
        self
    }
}

// ============================================================================
// ListOptions
// ============================================================================

/// Paging options accepted by every `list*` operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOptions {
    /// Items per page.
    pub page_size: u64,

    /// Sort direction.
    pub sort: SortOrder,

    /// ID of the last item of the previous page.
    pub last_id: Option<String>,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl ListOptions {
    /// Creates options with page size 100, newest first.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            sort: SortOrder::Desc,
            last_id: None,
        }
    }

    /// Sets the page size.
    #[inline]
    #[must_use]
    pub const fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size;
        self
    }

    /// Sets the sort direction.
    #[inline]
    #[must_use]
    pub const fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    /// Continues after the item with `last_id`.
    #[inline]
    #[must_use]
    pub fn with_last_id(mut self, last_id: impl Into<String>) -> Self {
        self.last_id = Some(last_id.into());
        self
    }

    /// Builds the query for page `page_index` (zero-based).
    #[must_use]
    pub fn to_query(&self, page_index: u64) -> PagingQuery {
        PagingQuery {
            skip: page_index.saturating_mul(self.page_size),
            limit: self.page_size,
            sort_order: self.sort,
            last_id: self.last_id.clone(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
