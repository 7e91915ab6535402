//! # Pagination
//!
//! Page-number pagination for list endpoints.
//!
//! A listing is split into pages of `page_size` items. Clients ask for a
//! page with `?page=N` (1-based) or `?page=last`. Page 1 is always valid,
//! even for an empty listing; every other page must exist.

use serde::Serialize;

use crate::error::{CoreError, CoreResult};

/// A resolved page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number.
    pub number: u32,
    pub page_size: u32,
}

impl PageRequest {
    /// Resolves the raw `page` query value against the total item count.
    ///
    /// ## Rules
    /// - missing or empty → page 1
    /// - `last` → the last page (1 for an empty listing)
    /// - anything that is not a positive integer → [`CoreError::InvalidPage`]
    /// - a number past the last page → [`CoreError::InvalidPage`]
    ///
    /// ## Example
    /// ```rust
    /// use shelf_core::PageRequest;
    ///
    /// let page = PageRequest::resolve(Some("2"), 25, 10).unwrap();
    /// assert_eq!(page.offset(), 10);
    /// assert!(PageRequest::resolve(Some("4"), 25, 10).is_err());
    /// ```
    pub fn resolve(raw: Option<&str>, total: i64, page_size: u32) -> CoreResult<Self> {
        let page_size = page_size.max(1);
        let last = last_page(total, page_size);

        let number = match raw.map(str::trim) {
            None | Some("") => 1,
            Some("last") => last,
            Some(value) => value.parse::<u32>().map_err(|_| CoreError::InvalidPage)?,
        };

        if number < 1 || number > last {
            return Err(CoreError::InvalidPage);
        }

        Ok(PageRequest { number, page_size })
    }

    /// Number of rows to skip.
    pub fn offset(&self) -> i64 {
        (self.number as i64 - 1) * self.page_size as i64
    }

    /// Number of rows to fetch.
    pub fn limit(&self) -> i64 {
        self.page_size as i64
    }
}

/// Number of the last page; an empty listing still has page 1.
pub fn last_page(total: i64, page_size: u32) -> u32 {
    let page_size = page_size.max(1) as i64;
    let total = total.max(0);
    let pages = (total + page_size - 1) / page_size;
    pages.max(1) as u32
}

/// One page of results, ready to be serialized.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Builds a page, deriving `next`/`previous` links with `link`.
    ///
    /// `link` receives a page number and returns the URL for it.
    pub fn new(
        request: PageRequest,
        count: i64,
        results: Vec<T>,
        link: impl Fn(u32) -> String,
    ) -> Self {
        let last = last_page(count, request.page_size);
        let next = (request.number < last).then(|| link(request.number + 1));
        let previous = (request.number > 1).then(|| link(request.number - 1));

        Page {
            count,
            next,
            previous,
            results,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
