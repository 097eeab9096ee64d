use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::api::query::PageWindow;

/// Spelling of the next/previous flags in the pagination block.
///
/// Both spellings are served today (`hasNextPage` for destinations and
/// packages, `hasNext` for the blog) and clients may rely on either.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginationKeys {
    /// `hasNextPage` / `hasPrevPage`
    Long,
    /// `hasNext` / `hasPrev`
    Short,
}

impl PaginationKeys {
    fn names(self) -> (&'static str, &'static str) {
        match self {
            PaginationKeys::Long => ("hasNextPage", "hasPrevPage"),
            PaginationKeys::Short => ("hasNext", "hasPrev"),
        }
    }
}

/// Pagination metadata attached to every list response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    /// Documents matching the filter, ignoring the page window.
    pub total: u64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
    pub keys: PaginationKeys,
}

impl Pagination {
    /// `totalPages = ceil(total / limit)`; a non-positive limit yields zero pages.
    pub fn new(window: PageWindow, total: u64, keys: PaginationKeys) -> Self {
        let total_pages = if window.limit > 0 {
            total.div_ceil(window.limit as u64).min(i64::MAX as u64) as i64
        } else {
            0
        };

        Self {
            page: window.page,
            limit: window.limit,
            total,
            total_pages,
            has_next: window.page < total_pages,
            has_prev: window.page > 1,
            keys,
        }
    }
}

impl Serialize for Pagination {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (next, prev) = self.keys.names();
        let mut map = serializer.serialize_map(Some(6))?;
        map.serialize_entry("page", &self.page)?;
        map.serialize_entry("limit", &self.limit)?;
        map.serialize_entry("total", &self.total)?;
        map.serialize_entry("totalPages", &self.total_pages)?;
        map.serialize_entry(next, &self.has_next)?;
        map.serialize_entry(prev, &self.has_prev)?;
        map.end()
    }
}

/// `{ success: true, data: [...], pagination: {...} }`
#[derive(Debug, Serialize)]
pub struct ListResponse<V> {
    pub success: bool,
    pub data: Vec<V>,
    pub pagination: Pagination,
}

impl<V> ListResponse<V> {
    pub fn new(data: Vec<V>, pagination: Pagination) -> Self {
        Self {
            success: true,
            data,
            pagination,
        }
    }
}

/// `{ success: true, data: {...}, message? }`
#[derive(Debug, Serialize)]
pub struct ItemResponse<V> {
    pub success: bool,
    pub data: V,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<V> ItemResponse<V> {
    pub fn new(data: V) -> Self {
        Self {
            success: true,
            data,
            message: None,
        }
    }

    pub fn with_message(data: V, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: Some(message.into()),
        }
    }
}
