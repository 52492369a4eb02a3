// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::ActiveFilters;
use crate::query::page_count;
use coursemart_app::SortDirection;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortSpec {
    pub column: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(column: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }

    /// `ordering` query form: `price` ascending, `-price` descending.
    pub fn ordering(&self) -> String {
        match self.direction {
            SortDirection::Asc => self.column.clone(),
            SortDirection::Desc => format!("-{}", self.column),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading {
        seq: u64,
    },
    Ready,
    Failed {
        message: String,
    },
}

/// Observable table state. Mutate it through [`crate::TableEngine`] so the
/// invariants below hold:
/// - `page_index < page_count()` (page count is at least one)
/// - `visible_columns` is never empty
/// - `active_filters` holds no key with an empty value list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableState {
    pub total_count: usize,
    pub page_index: usize,
    pub page_size: usize,
    pub sort: Option<SortSpec>,
    pub active_filters: ActiveFilters,
    pub search_query: String,
    /// Keys of visible columns, in declared column order.
    pub visible_columns: Vec<String>,
    pub status: LoadStatus,
    /// Displayed rows belong to an earlier request that failed to refresh.
    pub stale: bool,
}

impl TableState {
    pub(crate) fn new(page_size: usize, visible_columns: Vec<String>) -> Self {
        Self {
            total_count: 0,
            page_index: 0,
            page_size,
            sort: None,
            active_filters: ActiveFilters::new(),
            search_query: String::new(),
            visible_columns,
            status: LoadStatus::Idle,
            stale: false,
        }
    }

    pub fn loading(&self) -> bool {
        matches!(self.status, LoadStatus::Loading { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match &self.status {
            LoadStatus::Failed { message } => Some(message),
            _ => None,
        }
    }

    pub fn page_count(&self) -> usize {
        page_count(self.total_count, self.page_size)
    }

    pub fn is_visible(&self, column: &str) -> bool {
        self.visible_columns.iter().any(|key| key == column)
    }

    pub fn summary(&self) -> PageSummary {
        let first_row = if self.total_count == 0 {
            0
        } else {
            self.page_index * self.page_size + 1
        };
        let last_row = ((self.page_index + 1) * self.page_size).min(self.total_count);
        PageSummary {
            page_index: self.page_index,
            page_count: self.page_count(),
            first_row,
            last_row,
            total_count: self.total_count,
        }
    }
}

/// "Showing rows X-Y of Z" data. Row numbers are 1-based; both are zero when
/// the table is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSummary {
    pub page_index: usize,
    pub page_count: usize,
    pub first_row: usize,
    pub last_row: usize,
    pub total_count: usize,
}

impl std::fmt::Display for PageSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "rows {}-{} of {} \u{00b7} page {}/{}",
            self.first_row,
            self.last_row,
            self.total_count,
            self.page_index + 1,
            self.page_count,
        )
    }
}
