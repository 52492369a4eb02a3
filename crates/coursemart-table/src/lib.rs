// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Entity-agnostic table state: filtering, search, sorting, pagination,
//! column visibility and CSV export over either an in-memory dataset or a
//! paged remote [`DataSource`].

pub mod column;
pub mod engine;
mod error;
pub mod export;
pub mod filter;
pub mod query;
pub mod remote;
pub mod state;

pub use column::{CellValue, ColumnSpec, Columns};
pub use engine::{SubscriptionId, TableConfig, TableEngine, TableEvent, TableMode};
pub use error::{TableError, ValidationError};
pub use filter::{ActiveFilters, FilterDefinition, Filters, ValuesSource};
pub use remote::{DataSource, FnSource, Page, PageRequest, PendingFetch};
pub use state::{LoadStatus, PageSummary, SortSpec, TableState};
