//! Row types, API views and request bodies for each resource.

pub mod campaign;
pub mod category;
pub mod money;
pub mod pledge;
pub mod review;
pub mod stats;
pub mod user;

pub use campaign::*;
pub use category::*;
pub use pledge::*;
pub use review::*;
pub use stats::*;
pub use user::*;

use thiserror::Error;

/// A text column held a value outside the Rust enum it maps to.
#[derive(Error, Debug)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// 1-based page number and clamped page size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn new(page: Option<u32>, page_size: Option<u32>) -> Self {
        PageRequest {
            page: page.unwrap_or(1).max(1),
            page_size: page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn limit(&self) -> u32 {
        self.page_size
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }
}

/// One page of rows plus the total row count across all pages.
#[derive(Debug)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: PageRequest,
}

impl<T> Paged<T> {
    pub fn meta(&self) -> crate::response::PageMeta {
        crate::response::PageMeta::new(self.items.len(), self.page.page, self.page.page_size, self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_request_clamps_and_offsets() {
        let p = PageRequest::new(Some(3), Some(20));
        assert_eq!(p.offset(), 40);
        assert_eq!(p.limit(), 20);

        let p = PageRequest::new(Some(0), Some(5000));
        assert_eq!(p.page, 1);
        assert_eq!(p.page_size, MAX_PAGE_SIZE);
        assert_eq!(p.offset(), 0);

        assert_eq!(PageRequest::new(None, Some(0)).page_size, 1);
        assert_eq!(PageRequest::new(None, None), PageRequest::default());
    }
}
