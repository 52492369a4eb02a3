// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use thiserror::Error;

/// Registration-time configuration errors. These are programmer mistakes
/// and fail table construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("a table needs at least one column")]
    NoColumns,

    #[error("column key {0:?} is declared more than once")]
    DuplicateColumn(String),

    #[error("filter key {0:?} is declared more than once")]
    DuplicateFilter(String),

    #[error("filter {filter:?} reads unknown column {column:?}")]
    UnknownFilterColumn { filter: String, column: String },

    #[error("page size must be positive")]
    ZeroPageSize,

    #[error("initial sort uses unknown or unsortable column {0:?}")]
    InvalidSort(String),

    #[error("hidden column {0:?} is not declared")]
    UnknownColumn(String),

    #[error("at least one column must stay visible")]
    NoVisibleColumns,
}

/// Rejected mutations. The engine logs these and leaves its state alone.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("unknown column {0:?}")]
    UnknownColumn(String),

    #[error("column {0:?} is not sortable")]
    ColumnNotSortable(String),

    #[error("unknown filter {0:?}")]
    UnknownFilter(String),

    #[error("at least one column must stay visible")]
    NoVisibleColumns,

    #[error("page size must be positive")]
    ZeroPageSize,
}
