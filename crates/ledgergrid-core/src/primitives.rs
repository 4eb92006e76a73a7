//! # Grid Primitives
//!
//! Fixed constants of the grid engine.

/// Narrowest width a column can be resized to.
///
/// Keeps the resize handle itself reachable.
pub const MIN_COLUMN_WIDTH: u32 = 40;

/// Width used when a column definition does not say otherwise.
pub const DEFAULT_COLUMN_WIDTH: u32 = 150;

/// Rows per page when a grid does not configure one.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Page sizes offered by the page-size selector.
pub const PAGE_SIZE_OPTIONS: [usize; 5] = [10, 25, 50, 100, 200];

/// Upper bound for a page size.
pub const MAX_PAGE_SIZE: usize = 1000;

/// Sentinel condition name meaning "no condition constraint".
pub const ALL_CONDITIONS: &str = "ALL";

/// Storage key suffix for the column layout blob.
pub const COLUMNS_KEY_SUFFIX: &str = ":columns";

/// Storage key suffix for the filter/sort/page-size blob.
pub const STATE_KEY_SUFFIX: &str = ":state";

// =============================================================================
// RESPONSIVE BREAKPOINTS (px)
// =============================================================================

pub const BREAKPOINT_SM: u32 = 640;
pub const BREAKPOINT_MD: u32 = 768;
pub const BREAKPOINT_LG: u32 = 1024;
pub const BREAKPOINT_XL: u32 = 1280;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_page_size_is_offered() {
        assert!(PAGE_SIZE_OPTIONS.contains(&DEFAULT_PAGE_SIZE));
        assert!(PAGE_SIZE_OPTIONS.iter().all(|&s| s > 0 && s <= MAX_PAGE_SIZE));
    }

    #[test]
    fn min_width_below_default() {
        assert!(MIN_COLUMN_WIDTH < DEFAULT_COLUMN_WIDTH);
    }
}
