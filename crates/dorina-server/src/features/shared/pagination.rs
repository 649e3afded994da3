//! Offset pagination over stored lists
//!
//! Result lists are paged by row offset rather than page number: a page
//! covers `[offset, offset + page_size - 1]` and the next page starts at
//! `offset + page_size`.

use serde::{Deserialize, Serialize};

/// Offset request parameter (`?offset=N`)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct OffsetParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
}

impl OffsetParams {
    pub fn offset(&self) -> usize {
        self.offset.unwrap_or(0)
    }
}

/// One page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetPage {
    pub offset: usize,
    pub page_size: usize,
}

impl OffsetPage {
    pub fn new(offset: usize, page_size: usize) -> Self {
        Self {
            offset,
            page_size: page_size.max(1),
        }
    }

    /// Inclusive store range for this page.
    ///
    /// Offsets past `isize::MAX` are clamped; no list is that long, so the
    /// page is simply empty.
    pub fn range(&self) -> (isize, isize) {
        let start = isize::try_from(self.offset).unwrap_or(isize::MAX);
        let len = isize::try_from(self.page_size).unwrap_or(isize::MAX);
        (start, start.saturating_add(len - 1))
    }

    pub fn next_offset(&self) -> usize {
        self.offset.saturating_add(self.page_size)
    }

    /// Whether rows remain past this page
    pub fn has_more(&self, total: usize) -> bool {
        total > self.next_offset()
    }
}
