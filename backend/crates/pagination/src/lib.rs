//! Zero-based page requests and page envelopes.
//!
//! A [`PageRequest`] names a page index and a page size. Applying it to an
//! ordered sequence yields the items at `[page * size, page * size + size)`.
//! Non-positive sizes and negative page indices select nothing, so callers
//! never have to special-case malformed query strings.
//!
//! # Examples
//! ```
//! use pagination::PageRequest;
//!
//! let items: Vec<u32> = (0..25).collect();
//! let page = PageRequest::new(1, 10).paginate(items);
//! assert_eq!(page.items().first(), Some(&10));
//! assert_eq!(page.items().len(), 10);
//! assert_eq!(page.total_items(), 25);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Page size used when a request omits `size`.
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Largest page size list endpoints accept.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Validation failures raised by [`PageRequest::bounded`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PageRequestError {
    /// The requested size exceeds [`MAX_PAGE_SIZE`].
    #[error("page size {requested} exceeds the maximum of {max}")]
    SizeTooLarge {
        /// Size supplied by the caller.
        requested: i64,
        /// Configured upper bound.
        max: i64,
    },
}

/// Zero-based page selector.
///
/// Deserialises from `{"page": 0, "size": 20}`; both fields are optional and
/// default to the first page of [`DEFAULT_PAGE_SIZE`] items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageRequest {
    page: i64,
    size: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    /// Build a request for the given zero-based page and size.
    #[must_use]
    pub const fn new(page: i64, size: i64) -> Self {
        Self { page, size }
    }

    /// Build a request and reject sizes above [`MAX_PAGE_SIZE`].
    ///
    /// # Errors
    /// Returns [`PageRequestError::SizeTooLarge`] when `size` is too large.
    pub const fn bounded(page: i64, size: i64) -> Result<Self, PageRequestError> {
        if size > MAX_PAGE_SIZE {
            return Err(PageRequestError::SizeTooLarge {
                requested: size,
                max: MAX_PAGE_SIZE,
            });
        }
        Ok(Self::new(page, size))
    }

    /// Zero-based page index.
    #[must_use]
    pub const fn page(&self) -> i64 {
        self.page
    }

    /// Requested page size.
    #[must_use]
    pub const fn size(&self) -> i64 {
        self.size
    }

    /// Start offset and length of the selected window.
    ///
    /// Returns `None` when the request selects nothing: a non-positive size,
    /// a negative page, or an offset that does not fit in `usize`.
    #[must_use]
    pub fn window(&self) -> Option<(usize, usize)> {
        if self.size <= 0 || self.page < 0 {
            return None;
        }
        let size = usize::try_from(self.size).ok()?;
        let page = usize::try_from(self.page).ok()?;
        let start = page.checked_mul(size)?;
        Some((start, size))
    }

    /// Select the items covered by this request from an ordered sequence.
    #[must_use]
    pub fn apply<T, I>(&self, items: I) -> Vec<T>
    where
        I: IntoIterator<Item = T>,
    {
        match self.window() {
            Some((start, len)) => items.into_iter().skip(start).take(len).collect(),
            None => Vec::new(),
        }
    }

    /// Select a page and keep the total item count for the response.
    #[must_use]
    pub fn paginate<T>(&self, items: Vec<T>) -> Page<T> {
        let total_items = items.len();
        Page {
            items: self.apply(items),
            page: self.page,
            size: self.size,
            total_items,
        }
    }
}

/// One page of results plus the information needed to request the next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    items: Vec<T>,
    page: i64,
    size: i64,
    total_items: usize,
}

impl<T> Page<T> {
    /// Items on this page, in source order.
    #[must_use]
    pub fn items(&self) -> &[T] {
        self.items.as_slice()
    }

    /// Zero-based page index that produced this page.
    #[must_use]
    pub const fn page(&self) -> i64 {
        self.page
    }

    /// Page size that produced this page.
    #[must_use]
    pub const fn size(&self) -> i64 {
        self.size
    }

    /// Number of items in the unpaged sequence.
    #[must_use]
    pub const fn total_items(&self) -> usize {
        self.total_items
    }

    /// Transform every item while keeping the page metadata.
    #[must_use]
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnMut(T) -> U,
    {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_items: self.total_items,
        }
    }
}

#[cfg(test)]
mod tests {
    //! Page arithmetic coverage.

    use super::*;
    use rstest::rstest;

    fn sequence() -> Vec<u32> {
        (0..25).collect()
    }

    #[rstest]
    fn second_page_of_ten_selects_indices_ten_to_nineteen() {
        let selected = PageRequest::new(1, 10).apply(sequence());
        assert_eq!(selected, (10..20).collect::<Vec<u32>>());
    }

    #[rstest]
    fn last_page_is_truncated() {
        let selected = PageRequest::new(2, 10).apply(sequence());
        assert_eq!(selected, (20..25).collect::<Vec<u32>>());
    }

    #[rstest]
    #[case(0, 0)]
    #[case(0, -5)]
    #[case(-1, 10)]
    #[case(3, 10)]
    #[case(i64::MAX, i64::MAX)]
    fn out_of_range_requests_select_nothing(#[case] page: i64, #[case] size: i64) {
        assert!(PageRequest::new(page, size).apply(sequence()).is_empty());
    }

    #[rstest]
    fn paginate_keeps_total_count() {
        let page = PageRequest::new(0, 5).paginate(sequence());
        assert_eq!(page.items().len(), 5);
        assert_eq!(page.total_items(), 25);
        assert_eq!(page.page(), 0);
        assert_eq!(page.size(), 5);
    }

    #[rstest]
    fn map_preserves_metadata() {
        let page = PageRequest::new(1, 2).paginate(sequence()).map(|n| n * 2);
        assert_eq!(page.items(), &[4, 6]);
        assert_eq!(page.total_items(), 25);
    }

    #[rstest]
    fn bounded_rejects_oversized_pages() {
        let err = PageRequest::bounded(0, MAX_PAGE_SIZE + 1).expect_err("too large");
        assert_eq!(
            err,
            PageRequestError::SizeTooLarge {
                requested: MAX_PAGE_SIZE + 1,
                max: MAX_PAGE_SIZE,
            }
        );
        assert!(PageRequest::bounded(0, MAX_PAGE_SIZE).is_ok());
    }

    #[rstest]
    fn missing_query_fields_use_defaults() {
        let request: PageRequest = serde_json::from_str("{}").expect("defaults");
        assert_eq!(request, PageRequest::default());
        let request: PageRequest = serde_json::from_str(r#"{"page":2}"#).expect("page only");
        assert_eq!(request, PageRequest::new(2, DEFAULT_PAGE_SIZE));
    }

    #[rstest]
    fn page_serialises_in_camel_case() {
        let page = PageRequest::new(0, 2).paginate(vec![1_u8, 2, 3]);
        let value = serde_json::to_value(&page).expect("serialise");
        assert_eq!(value["totalItems"], 3);
        assert_eq!(value["items"], serde_json::json!([1, 2]));
    }
}
