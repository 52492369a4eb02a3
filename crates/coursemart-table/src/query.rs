// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Local pipeline over an in-memory dataset: filter, then search, then
//! sort, then paginate. Every stage works on row indices so the dataset is
//! never cloned.

use crate::filter::value_matches;
use crate::{ActiveFilters, Columns, Filters, SortSpec};
use std::ops::Range;

pub fn page_count(total_count: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 1;
    }
    total_count.div_ceil(page_size).max(1)
}

/// Pulls an out-of-range page index back to the last page.
pub fn clamp_page(page_index: usize, total_count: usize, page_size: usize) -> usize {
    page_index.min(page_count(total_count, page_size) - 1)
}

/// Slice of a `len`-row view that page `page_index` covers.
pub fn page_range(len: usize, page_index: usize, page_size: usize) -> Range<usize> {
    let start = page_index.saturating_mul(page_size).min(len);
    let end = start.saturating_add(page_size).min(len);
    start..end
}

/// Rows whose filter column matches a selected value for every active
/// filter. Unknown filter keys are ignored.
pub fn filter_rows<R>(
    rows: &[R],
    indices: Vec<usize>,
    columns: &Columns<R>,
    filters: &Filters,
    active: &ActiveFilters,
) -> Vec<usize> {
    let checks: Vec<_> = active
        .iter()
        .filter(|(_, selected)| !selected.is_empty())
        .filter_map(|(key, selected)| {
            let definition = filters.get(key)?;
            let column = columns.get(&definition.column)?;
            Some((column, selected))
        })
        .collect();
    if checks.is_empty() {
        return indices;
    }

    indices
        .into_iter()
        .filter(|&index| {
            let row = &rows[index];
            checks
                .iter()
                .all(|(column, selected)| value_matches(&column.display(row), selected))
        })
        .collect()
}

/// Rows where any filterable column matches the trimmed query. A blank
/// query keeps everything.
pub fn search_rows<R>(
    rows: &[R],
    indices: Vec<usize>,
    columns: &Columns<R>,
    query: &str,
) -> Vec<usize> {
    let needle = query.trim();
    if needle.is_empty() {
        return indices;
    }
    let searchable: Vec<_> = columns.iter().filter(|column| column.is_filterable()).collect();
    indices
        .into_iter()
        .filter(|&index| {
            searchable
                .iter()
                .any(|column| column.matches_search(&rows[index], needle))
        })
        .collect()
}

/// Stable sort, so rows that compare equal keep dataset order.
pub fn sort_rows<R>(
    rows: &[R],
    indices: &mut [usize],
    columns: &Columns<R>,
    sort: Option<&SortSpec>,
) {
    let Some(sort) = sort else {
        return;
    };
    let Some(column) = columns.get(&sort.column) else {
        return;
    };
    indices.sort_by(|&left, &right| column.compare(&rows[left], &rows[right], sort.direction));
}

/// Full pipeline; returns the ordered view of matching row indices.
pub fn run<R>(
    rows: &[R],
    columns: &Columns<R>,
    filters: &Filters,
    active: &ActiveFilters,
    query: &str,
    sort: Option<&SortSpec>,
) -> Vec<usize> {
    let indices = (0..rows.len()).collect();
    let indices = filter_rows(rows, indices, columns, filters, active);
    let mut indices = search_rows(rows, indices, columns, query);
    sort_rows(rows, &mut indices, columns, sort);
    indices
}

#[cfg(test)]
mod tests {
    use super::{clamp_page, page_count, page_range, run};
    use crate::{
        ActiveFilters, CellValue, ColumnSpec, Columns, FilterDefinition, Filters, SortSpec,
    };
    use coursemart_app::SortDirection;

    struct Row {
        title: &'static str,
        status: &'static str,
        price: Option<i64>,
    }

    fn dataset() -> Vec<Row> {
        vec![
            Row {
                title: "Rust Basics",
                status: "published",
                price: Some(4_900),
            },
            Row {
                title: "Async Rust",
                status: "draft",
                price: None,
            },
            Row {
                title: "SQL Joins",
                status: "Published",
                price: Some(1_900),
            },
            Row {
                title: "Go Tour",
                status: "archived",
                price: Some(900),
            },
        ]
    }

    fn columns() -> Columns<Row> {
        Columns::new(vec![
            ColumnSpec::new("title", "Title", |row: &Row| CellValue::text(row.title))
                .sortable()
                .filterable(),
            ColumnSpec::new("status", "Status", |row: &Row| CellValue::text(row.status)),
            ColumnSpec::new("price", "Price", |row: &Row| CellValue::money(row.price)).sortable(),
        ])
        .expect("valid columns")
    }

    #[test]
    fn paging_math() {
        assert_eq!(page_count(0, 10), 1);
        assert_eq!(page_count(25, 10), 3);
        assert_eq!(page_count(30, 10), 3);
        assert_eq!(clamp_page(7, 25, 10), 2);
        assert_eq!(clamp_page(1, 0, 10), 0);
        assert_eq!(page_range(25, 2, 10), 20..25);
        assert_eq!(page_range(5, 3, 10), 5..5);
    }

    #[test]
    fn pipeline_filters_then_searches_then_sorts() {
        let rows = dataset();
        let columns = columns();
        let filters = Filters::new(
            vec![FilterDefinition::derived("status", "Status", "status")],
            &columns,
        )
        .expect("valid filters");

        let mut active = ActiveFilters::new();
        active.insert("status".to_owned(), vec!["published".to_owned()]);
        let sort = SortSpec::new("price", SortDirection::Asc);
        assert_eq!(
            run(&rows, &columns, &filters, &active, "", Some(&sort)),
            vec![2, 0]
        );

        // Search only touches filterable columns.
        assert_eq!(
            run(&rows, &columns, &filters, &active, " sql ", None),
            vec![2]
        );
        assert!(run(&rows, &columns, &filters, &active, "archived", None).is_empty());
    }

    #[test]
    fn nulls_stay_last_when_descending() {
        let rows = dataset();
        let columns = columns();
        let filters = Filters::default();
        let active = ActiveFilters::new();
        let sort = SortSpec::new("price", SortDirection::Desc);
        assert_eq!(
            run(&rows, &columns, &filters, &active, "", Some(&sort)),
            vec![0, 2, 3, 1]
        );
    }
}
