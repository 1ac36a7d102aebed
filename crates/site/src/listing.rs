//! Listing query orchestration.
//!
//! Translates a requested page number into an offset/limit repository
//! call and applies the out-of-range policy: asking for a page past the
//! end redirects to the last available page with an informational
//! notice instead of rendering an empty page.

use crate::db::{RepositoryError, StoreRepository};
use crate::models::Store;

/// Stores shown per listing page.
pub const PAGE_SIZE: i64 = 4;

/// Pagination metadata rendered alongside a page of stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMeta {
    /// The page being rendered (1-based).
    pub page: i64,
    /// Total number of pages.
    pub pages: i64,
    /// Total number of stores.
    pub count: i64,
}

/// Outcome of a listing request.
#[derive(Debug)]
pub enum Listing {
    /// Render this page.
    Page {
        stores: Vec<Store>,
        meta: PageMeta,
    },
    /// The requested page is beyond the data; redirect to the last page.
    OutOfRange {
        requested: i64,
        last_page: i64,
    },
}

/// Offset into the listing for a 1-based page number.
///
/// Pages below 1 clamp to the start rather than producing a negative
/// offset.
#[must_use]
pub const fn offset_for_page(page: i64) -> i64 {
    let zero_based = page - 1;
    if zero_based < 0 { 0 } else { zero_based * PAGE_SIZE }
}

/// Number of pages needed for `count` stores (ceiling division).
#[must_use]
pub const fn total_pages(count: i64) -> i64 {
    (count + PAGE_SIZE - 1) / PAGE_SIZE
}

/// The notice flashed when redirecting from an out-of-range page.
#[must_use]
pub fn out_of_range_notice(requested: i64, last_page: i64) -> String {
    format!("This page {requested} does not exist! Last available page here is {last_page}.")
}

/// Pure redirect decision: an empty result for a non-zero offset means
/// the caller walked past the end.
const fn is_out_of_range(result_len: usize, offset: i64) -> bool {
    result_len == 0 && offset > 0
}

/// Fetch one page of the store listing, applying the out-of-range
/// policy.
///
/// # Errors
///
/// Returns `RepositoryError` if the underlying queries fail.
pub async fn stores_page(
    repo: &StoreRepository<'_>,
    page: i64,
) -> Result<Listing, RepositoryError> {
    let offset = offset_for_page(page);
    let (stores, count) = repo.list(offset, PAGE_SIZE).await?;

    if is_out_of_range(stores.len(), offset) {
        // The last page is at least 1 so an empty table renders an empty
        // first page instead of redirecting forever.
        let last_page = total_pages(count).max(1);
        return Ok(Listing::OutOfRange {
            requested: page,
            last_page,
        });
    }

    let meta = PageMeta {
        page,
        pages: total_pages(count),
        count,
    };

    Ok(Listing::Page { stores, meta })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_for_page() {
        assert_eq!(offset_for_page(1), 0);
        assert_eq!(offset_for_page(2), 4);
        assert_eq!(offset_for_page(4), 12);
        // Pages below 1 clamp to the start
        assert_eq!(offset_for_page(0), 0);
        assert_eq!(offset_for_page(-3), 0);
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0), 0);
        assert_eq!(total_pages(1), 1);
        assert_eq!(total_pages(4), 1);
        assert_eq!(total_pages(5), 2);
        assert_eq!(total_pages(10), 3);
    }

    #[test]
    fn test_out_of_range_decision() {
        // 10 stores, page 4: offset 12 > 0 and no results
        assert!(is_out_of_range(0, offset_for_page(4)));
        // Page 1 of an empty table renders, never redirects
        assert!(!is_out_of_range(0, offset_for_page(1)));
        // A page with results renders
        assert!(!is_out_of_range(3, offset_for_page(3)));
    }

    #[test]
    fn test_notice_wording() {
        assert_eq!(
            out_of_range_notice(4, 3),
            "This page 4 does not exist! Last available page here is 3."
        );
    }

    #[test]
    fn test_spec_example_ten_stores_page_four() {
        // Page size 4, 10 total stores, request page=4: skip 12 > 0,
        // empty result, last page ceil(10/4) = 3.
        let offset = offset_for_page(4);
        assert_eq!(offset, 12);
        assert!(is_out_of_range(0, offset));
        assert_eq!(total_pages(10), 3);
    }
}
