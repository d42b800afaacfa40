//! Pagination request/response shapes shared by every listing operation.

use serde::{Deserialize, Serialize};

/// Page window for list operations.
///
/// `limit == 0` means "no pagination": every matching row is returned and
/// `offset` is ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub limit: u64,
    pub offset: u64,
}

impl PageRequest {
    pub fn new(limit: u64, offset: u64) -> Self {
        Self { limit, offset }
    }

    /// Request for every matching row.
    pub fn unpaginated() -> Self {
        Self::default()
    }

    pub fn is_paginated(&self) -> bool {
        self.limit != 0
    }
}

/// One page of results plus the total number of rows matching the filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}
