// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::TableError;
use coursemart_app::{SortDirection, format_cents, format_date};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use time::Date;

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Text(String),
    Integer(i64),
    Decimal(f64),
    Money(i64),
    Date(Date),
    Bool(bool),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn money(cents: Option<i64>) -> Self {
        cents.map_or(Self::Null, Self::Money)
    }

    pub fn decimal(value: Option<f64>) -> Self {
        value.map_or(Self::Null, Self::Decimal)
    }

    pub fn date(value: Option<Date>) -> Self {
        value.map_or(Self::Null, Self::Date)
    }

    pub fn display(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Text(value) => value.clone(),
            Self::Integer(value) => value.to_string(),
            Self::Decimal(value) => format!("{value:.1}"),
            Self::Money(cents) => format_cents(*cents),
            Self::Date(value) => format_date(*value),
            Self::Bool(true) => "yes".to_owned(),
            Self::Bool(false) => "no".to_owned(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Natural ordering for two non-null values. Text compares bytewise;
    /// mismatched variants fall back to their display strings.
    pub fn cmp_value(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Text(left), Self::Text(right)) => left.cmp(right),
            (Self::Integer(left), Self::Integer(right)) => left.cmp(right),
            (Self::Money(left), Self::Money(right)) => left.cmp(right),
            (Self::Decimal(left), Self::Decimal(right)) => left.total_cmp(right),
            (Self::Date(left), Self::Date(right)) => left.cmp(right),
            (Self::Bool(left), Self::Bool(right)) => left.cmp(right),
            (left, right) => left.display().cmp(&right.display()),
        }
    }
}

type Accessor<R> = Box<dyn Fn(&R) -> CellValue>;
type Renderer<R> = Box<dyn Fn(&CellValue, &R) -> String>;
type Comparator<R> = Box<dyn Fn(&R, &R) -> Ordering>;
type Matcher<R> = Box<dyn Fn(&R, &str) -> bool>;

/// One column of a table over rows of type `R`.
///
/// Columns are exportable by default and neither sortable nor searchable
/// until marked so.
pub struct ColumnSpec<R> {
    key: String,
    header: String,
    accessor: Accessor<R>,
    sortable: bool,
    filterable: bool,
    exportable: bool,
    render: Option<Renderer<R>>,
    comparator: Option<Comparator<R>>,
    matcher: Option<Matcher<R>>,
}

impl<R> ColumnSpec<R> {
    pub fn new(
        key: impl Into<String>,
        header: impl Into<String>,
        accessor: impl Fn(&R) -> CellValue + 'static,
    ) -> Self {
        Self {
            key: key.into(),
            header: header.into(),
            accessor: Box::new(accessor),
            sortable: false,
            filterable: false,
            exportable: true,
            render: None,
            comparator: None,
            matcher: None,
        }
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub fn filterable(mut self) -> Self {
        self.filterable = true;
        self
    }

    pub fn exportable(mut self, exportable: bool) -> Self {
        self.exportable = exportable;
        self
    }

    pub fn render(mut self, render: impl Fn(&CellValue, &R) -> String + 'static) -> Self {
        self.render = Some(Box::new(render));
        self
    }

    pub fn comparator(mut self, comparator: impl Fn(&R, &R) -> Ordering + 'static) -> Self {
        self.comparator = Some(Box::new(comparator));
        self
    }

    pub fn matcher(mut self, matcher: impl Fn(&R, &str) -> bool + 'static) -> Self {
        self.matcher = Some(Box::new(matcher));
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn is_sortable(&self) -> bool {
        self.sortable
    }

    pub fn is_filterable(&self) -> bool {
        self.filterable
    }

    pub fn is_exportable(&self) -> bool {
        self.exportable
    }

    pub fn value(&self, row: &R) -> CellValue {
        (self.accessor)(row)
    }

    pub fn display(&self, row: &R) -> String {
        let value = self.value(row);
        match &self.render {
            Some(render) => render(&value, row),
            None => value.display(),
        }
    }

    /// Orders two rows by this column. Null values go last in both
    /// directions; only the non-null comparison is reversed for `Desc`.
    pub fn compare(&self, left: &R, right: &R, direction: SortDirection) -> Ordering {
        let left_value = self.value(left);
        let right_value = self.value(right);
        match (left_value.is_null(), right_value.is_null()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Greater,
            (false, true) => return Ordering::Less,
            (false, false) => {}
        }

        let order = match &self.comparator {
            Some(comparator) => comparator(left, right),
            None => left_value.cmp_value(&right_value),
        };
        match direction {
            SortDirection::Asc => order,
            SortDirection::Desc => order.reverse(),
        }
    }

    /// `needle` is the trimmed query; the default match is a
    /// case-insensitive substring test on the display value.
    pub fn matches_search(&self, row: &R, needle: &str) -> bool {
        match &self.matcher {
            Some(matcher) => matcher(row, needle),
            None => self
                .display(row)
                .to_lowercase()
                .contains(&needle.to_lowercase()),
        }
    }
}

impl<R> std::fmt::Debug for ColumnSpec<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ColumnSpec")
            .field("key", &self.key)
            .field("header", &self.header)
            .field("sortable", &self.sortable)
            .field("filterable", &self.filterable)
            .field("exportable", &self.exportable)
            .field("render", &self.render.is_some())
            .field("comparator", &self.comparator.is_some())
            .field("matcher", &self.matcher.is_some())
            .finish()
    }
}

/// Registered column set, unique by key, in display order.
#[derive(Debug)]
pub struct Columns<R> {
    specs: Vec<ColumnSpec<R>>,
}

impl<R> Columns<R> {
    pub fn new(specs: Vec<ColumnSpec<R>>) -> Result<Self, TableError> {
        if specs.is_empty() {
            return Err(TableError::NoColumns);
        }
        let mut seen = BTreeSet::new();
        for spec in &specs {
            if !seen.insert(spec.key.as_str()) {
                return Err(TableError::DuplicateColumn(spec.key.clone()));
            }
        }
        Ok(Self { specs })
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&ColumnSpec<R>> {
        self.specs.iter().find(|spec| spec.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnSpec<R>> {
        self.specs.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.specs.iter().map(|spec| spec.key.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::{CellValue, ColumnSpec, Columns};
    use crate::TableError;
    use coursemart_app::SortDirection;
    use std::cmp::Ordering;

    #[derive(Debug)]
    struct Row {
        name: &'static str,
        price: Option<i64>,
    }

    fn price_column() -> ColumnSpec<Row> {
        ColumnSpec::new("price", "Price", |row: &Row| CellValue::money(row.price)).sortable()
    }

    #[test]
    fn nulls_sort_last_in_both_directions() {
        let column = price_column();
        let free = Row {
            name: "free",
            price: None,
        };
        let paid = Row {
            name: "paid",
            price: Some(1_000),
        };

        assert_eq!(column.compare(&free, &paid, SortDirection::Asc), Ordering::Greater);
        assert_eq!(column.compare(&free, &paid, SortDirection::Desc), Ordering::Greater);
        assert_eq!(column.compare(&paid, &free, SortDirection::Desc), Ordering::Less);
        assert_eq!(column.compare(&free, &free, SortDirection::Asc), Ordering::Equal);
    }

    #[test]
    fn custom_comparator_and_renderer_take_precedence() {
        let column = ColumnSpec::new("name", "Name", |row: &Row| CellValue::text(row.name))
            .render(|value, _| value.display().to_uppercase())
            .comparator(|left: &Row, right: &Row| left.name.len().cmp(&right.name.len()));
        let short = Row {
            name: "zz",
            price: None,
        };
        let long = Row {
            name: "aaaa",
            price: None,
        };

        assert_eq!(column.display(&short), "ZZ");
        assert_eq!(column.compare(&short, &long, SortDirection::Asc), Ordering::Less);
        assert_eq!(column.compare(&short, &long, SortDirection::Desc), Ordering::Greater);
    }

    #[test]
    fn default_search_is_case_insensitive_on_display_value() {
        let column = price_column();
        let row = Row {
            name: "paid",
            price: Some(123_456),
        };
        assert!(column.matches_search(&row, "1,234"));
        assert!(!column.matches_search(&row, "999"));

        let custom =
            price_column().matcher(|row: &Row, needle| needle == "free" && row.price.is_none());
        assert!(!custom.matches_search(&row, "1,234"));
    }

    #[test]
    fn text_comparison_is_bytewise() {
        assert_eq!(
            CellValue::text("Zebra").cmp_value(&CellValue::text("apple")),
            Ordering::Less
        );
        assert_eq!(CellValue::Decimal(4.5).display(), "4.5");
        assert_eq!(CellValue::Bool(true).display(), "yes");
    }

    #[test]
    fn duplicate_or_missing_columns_fail_registration() {
        let error = Columns::new(vec![price_column(), price_column()])
            .expect_err("duplicate key should fail");
        assert_eq!(error, TableError::DuplicateColumn("price".to_owned()));

        let error = Columns::<Row>::new(Vec::new()).expect_err("empty columns should fail");
        assert_eq!(error, TableError::NoColumns);
    }
}
