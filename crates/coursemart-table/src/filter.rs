// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{Columns, TableError};
use std::collections::{BTreeMap, BTreeSet};

/// Active filter selections: filter key to the accepted values. A key is
/// only present while it has at least one value.
pub type ActiveFilters = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValuesSource {
    /// Fixed option list, e.g. a status enum.
    Static(Vec<String>),
    /// Distinct display values of the filter's column in the loaded rows.
    Derived,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterDefinition {
    pub key: String,
    pub label: String,
    /// Column whose display value is compared against the selection.
    pub column: String,
    pub values: ValuesSource,
}

impl FilterDefinition {
    pub fn derived(
        key: impl Into<String>,
        label: impl Into<String>,
        column: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            column: column.into(),
            values: ValuesSource::Derived,
        }
    }

    pub fn fixed<I, S>(
        key: impl Into<String>,
        label: impl Into<String>,
        column: impl Into<String>,
        values: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key: key.into(),
            label: label.into(),
            column: column.into(),
            values: ValuesSource::Static(values.into_iter().map(Into::into).collect()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Filters {
    definitions: Vec<FilterDefinition>,
}

impl Filters {
    pub fn new<R>(
        definitions: Vec<FilterDefinition>,
        columns: &Columns<R>,
    ) -> Result<Self, TableError> {
        let mut seen = BTreeSet::new();
        for definition in &definitions {
            if !seen.insert(definition.key.as_str()) {
                return Err(TableError::DuplicateFilter(definition.key.clone()));
            }
            if !columns.contains(&definition.column) {
                return Err(TableError::UnknownFilterColumn {
                    filter: definition.key.clone(),
                    column: definition.column.clone(),
                });
            }
        }
        Ok(Self { definitions })
    }

    pub fn get(&self, key: &str) -> Option<&FilterDefinition> {
        self.definitions.iter().find(|definition| definition.key == key)
    }

    /// Filter attached to `column`, if any.
    pub fn for_column(&self, column: &str) -> Option<&FilterDefinition> {
        self.definitions
            .iter()
            .find(|definition| definition.column == column)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FilterDefinition> {
        self.definitions.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// Trims, drops blanks and removes duplicates, keeping first-seen order.
pub fn normalize_values<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = BTreeSet::new();
    let mut normalized = Vec::new();
    for value in values {
        let value = value.as_ref().trim();
        if value.is_empty() || !seen.insert(value.to_lowercase()) {
            continue;
        }
        normalized.push(value.to_owned());
    }
    normalized
}

/// Case-insensitive, whitespace-trimmed equality against any selected value.
pub fn value_matches(cell: &str, selected: &[String]) -> bool {
    let cell = cell.trim().to_lowercase();
    selected
        .iter()
        .any(|value| value.trim().to_lowercase() == cell)
}
