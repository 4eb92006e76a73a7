//! # Pagination Controller
//!
//! Slices the filtered+sorted sequence into fixed-size, 1-based pages.
//!
//! An out-of-range page yields an empty slice rather than an error; the
//! stepping controls clamp into `1..=total_pages`.

use crate::primitives::MAX_PAGE_SIZE;
use crate::{GridError, PaginationState};
use serde::{Deserialize, Serialize};

/// Summary of the current page for rendering controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_rows: usize,
    pub can_previous: bool,
    pub can_next: bool,
}

/// `ceil(total / page_size)`; 0 when there are no rows.
#[must_use]
pub fn total_pages(total: usize, page_size: usize) -> usize {
    total.div_ceil(page_size.max(1))
}

/// Index range of `page` within a sequence of `total` items.
#[must_use]
pub fn page_range(total: usize, state: PaginationState) -> std::ops::Range<usize> {
    let size = state.page_size.max(1);
    let start = state.page.saturating_sub(1).saturating_mul(size).min(total);
    let end = start.saturating_add(size).min(total);
    start..end
}

/// The slice of `items` shown on the current page.
#[must_use]
pub fn page_slice<T>(items: &[T], state: PaginationState) -> &[T] {
    &items[page_range(items.len(), state)]
}

impl PaginationState {
    /// Last reachable page, never below 1.
    #[must_use]
    pub fn last_page(&self, total: usize) -> usize {
        total_pages(total, self.page_size).max(1)
    }

    #[must_use]
    pub fn can_previous(&self) -> bool {
        self.page > 1
    }

    #[must_use]
    pub fn can_next(&self, total: usize) -> bool {
        self.page < total_pages(total, self.page_size)
    }

    pub fn first(&mut self) {
        self.page = 1;
    }

    pub fn previous(&mut self) {
        self.page = self.page.saturating_sub(1).max(1);
    }

    pub fn next(&mut self, total: usize) {
        self.page = self.page.saturating_add(1).min(self.last_page(total));
    }

    pub fn last(&mut self, total: usize) {
        self.page = self.last_page(total);
    }

    /// Jump to `page`, clamped into `1..=last_page`.
    pub fn goto(&mut self, page: usize, total: usize) {
        self.page = page.clamp(1, self.last_page(total));
    }

    /// Clamp the current page after the row count changed.
    pub fn clamp(&mut self, total: usize) {
        self.goto(self.page, total);
    }

    /// Change the page size and return to page 1.
    pub fn set_page_size(&mut self, page_size: usize) -> Result<(), GridError> {
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(GridError::InvalidPageSize(page_size));
        }
        self.page_size = page_size;
        self.page = 1;
        Ok(())
    }

    /// Control summary for `total` rows.
    #[must_use]
    pub fn info(&self, total: usize) -> PageInfo {
        PageInfo {
            page: self.page,
            page_size: self.page_size,
            total_pages: total_pages(total, self.page_size),
            total_rows: total,
            can_previous: self.can_previous(),
            can_next: self.can_next(total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(page: usize, page_size: usize) -> PaginationState {
        PaginationState { page, page_size }
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
    }

    #[test]
    fn slices_and_out_of_range_is_empty() {
        let items: Vec<u32> = (1..=25).collect();
        assert_eq!(page_slice(&items, state(1, 10)), &items[0..10]);
        assert_eq!(page_slice(&items, state(3, 10)), &[21, 22, 23, 24, 25]);
        assert!(page_slice(&items, state(4, 10)).is_empty());
        assert!(page_slice(&items, state(usize::MAX, 10)).is_empty());
    }

    #[test]
    fn stepping_clamps_at_bounds() {
        let mut p = state(1, 10);
        assert!(!p.can_previous());
        p.previous();
        assert_eq!(p.page, 1);

        p.last(25);
        assert_eq!(p.page, 3);
        assert!(!p.can_next(25));
        p.next(25);
        assert_eq!(p.page, 3);

        p.goto(99, 25);
        assert_eq!(p.page, 3);
        p.goto(0, 25);
        assert_eq!(p.page, 1);
    }

    #[test]
    fn empty_set_stays_on_page_one() {
        let mut p = state(4, 10);
        p.clamp(0);
        assert_eq!(p.page, 1);
        let info = p.info(0);
        assert_eq!(info.total_pages, 0);
        assert!(!info.can_next && !info.can_previous);
    }

    #[test]
    fn page_size_change_resets_page() {
        let mut p = state(3, 10);
        p.set_page_size(25).expect("valid size");
        assert_eq!(p, state(1, 25));
        assert!(matches!(p.set_page_size(0), Err(GridError::InvalidPageSize(0))));
        assert_eq!(p, state(1, 25));
    }
}
