//! Page arithmetic for list views.

use crate::api::types::Page;

/// Default number of items per page.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Page sizes offered to users.
pub const PAGE_SIZE_OPTIONS: [u32; 4] = [10, 20, 50, 100];

/// Current position within a paginated listing.
///
/// Pages are 1-based. `total` counts items across all pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub size: u32,
    pub total: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Pagination {
    /// Start at page 1 with no items.
    pub fn new(size: u32) -> Self {
        Self {
            page: 1,
            size: size.max(1),
            total: 0,
        }
    }

    /// Number of pages, never less than 1.
    pub fn total_pages(&self) -> u32 {
        let size = u64::from(self.size.max(1));
        let pages = self.total.div_ceil(size).max(1);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    /// 1-based index of the first item on this page, clamped to `total`.
    pub fn start_index(&self) -> u64 {
        let start = u64::from(self.page.saturating_sub(1)) * u64::from(self.size) + 1;
        start.min(self.total)
    }

    /// 1-based index of the last item on this page, clamped to `total`.
    pub fn end_index(&self) -> u64 {
        (u64::from(self.page) * u64::from(self.size)).min(self.total)
    }

    /// Set the page without bounds checks.
    ///
    /// Used when the caller is about to fetch and let the server decide.
    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    /// Move to `page` if it exists. Returns whether the page changed.
    pub fn go_to(&mut self, page: u32) -> bool {
        if page >= 1 && page <= self.total_pages() && page != self.page {
            self.page = page;
            true
        } else {
            false
        }
    }

    /// Change the page size and return to the first page.
    pub fn set_size(&mut self, size: u32) {
        self.size = size.max(1);
        self.page = 1;
    }

    pub fn next(&mut self) -> bool {
        self.has_next() && self.go_to(self.page + 1)
    }

    pub fn prev(&mut self) -> bool {
        self.has_prev() && self.go_to(self.page - 1)
    }

    pub fn first(&mut self) {
        self.page = 1;
    }

    pub fn last(&mut self) {
        self.page = self.total_pages();
    }

    /// Adopt the position reported by a server response.
    pub fn apply<T>(&mut self, page: &Page<T>) {
        self.total = page.total;
        self.page = page.page.max(1);
        self.size = page.size.max(1);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
