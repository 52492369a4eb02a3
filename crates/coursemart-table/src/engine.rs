// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::export::export_csv;
use crate::filter::normalize_values;
use crate::query::{self, clamp_page, page_range};
use crate::remote::RequestTracker;
use crate::{
    ColumnSpec, Columns, DataSource, FilterDefinition, Filters, LoadStatus, Page, PageRequest,
    PageSummary, PendingFetch, SortSpec, TableError, TableState, ValidationError, ValuesSource,
};
use anyhow::Result;
use coursemart_app::SortDirection;
use std::collections::BTreeSet;

pub const DEFAULT_PAGE_SIZE: usize = 25;

/// Bound on back-to-back fetches in [`TableEngine::fetch_with`]; a shrinking
/// total can force one extra round to land on a valid page.
const MAX_FETCH_ROUNDS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableMode {
    /// The full dataset is held in memory and processed here.
    Local,
    /// A [`DataSource`] filters, sorts and pages; only one page is held.
    Remote,
}

pub type SubscriptionId = u64;

type Listener = Box<dyn FnMut(&TableEvent)>;

/// State changes reported by every mutation, in the order they happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableEvent {
    PageChanged(usize),
    PageSizeChanged(usize),
    SortChanged(Option<SortSpec>),
    FiltersChanged,
    SearchChanged(String),
    ColumnsChanged,
    RowsChanged { total_count: usize },
    FetchRequested { seq: u64 },
    LoadFailed { message: String },
    ResponseDiscarded { seq: u64 },
    Rejected(ValidationError),
}

pub struct TableConfig<R> {
    columns: Vec<ColumnSpec<R>>,
    filters: Vec<FilterDefinition>,
    page_size: usize,
    sort: Option<SortSpec>,
    hidden: Vec<String>,
}

impl<R> TableConfig<R> {
    pub fn new(columns: Vec<ColumnSpec<R>>) -> Self {
        Self {
            columns,
            filters: Vec::new(),
            page_size: DEFAULT_PAGE_SIZE,
            sort: None,
            hidden: Vec::new(),
        }
    }

    pub fn filters(mut self, filters: Vec<FilterDefinition>) -> Self {
        self.filters = filters;
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn hidden<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hidden = keys.into_iter().map(Into::into).collect();
        self
    }
}

/// Owns one table's state. All mutations go through `&mut self`, return the
/// events they caused and deliver the same events to subscribers.
pub struct TableEngine<R> {
    columns: Columns<R>,
    filters: Filters,
    mode: TableMode,
    state: TableState,
    /// Local: the whole dataset. Remote: the last loaded page.
    rows: Vec<R>,
    /// Ordered indices into `rows` after filter, search and sort.
    view: Vec<usize>,
    /// Direction the current sort started with; drives the tri-state cycle.
    sort_origin: Option<SortDirection>,
    requests: RequestTracker,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: SubscriptionId,
}

impl<R> TableEngine<R> {
    pub fn local(config: TableConfig<R>, rows: Vec<R>) -> Result<Self, TableError> {
        let mut engine = Self::build(config, TableMode::Local)?;
        engine.rows = rows;
        engine.recompute_local();
        engine.state.status = LoadStatus::Ready;
        Ok(engine)
    }

    /// A remote table starts loading immediately; collect the first request
    /// with [`Self::take_pending_fetch`].
    pub fn remote(config: TableConfig<R>) -> Result<Self, TableError> {
        let mut engine = Self::build(config, TableMode::Remote)?;
        let mut events = Vec::new();
        engine.request_page(&mut events);
        Ok(engine)
    }

    fn build(config: TableConfig<R>, mode: TableMode) -> Result<Self, TableError> {
        if config.page_size == 0 {
            return Err(TableError::ZeroPageSize);
        }
        let columns = Columns::new(config.columns)?;
        let filters = Filters::new(config.filters, &columns)?;

        if let Some(sort) = &config.sort
            && !columns.get(&sort.column).is_some_and(ColumnSpec::is_sortable)
        {
            return Err(TableError::InvalidSort(sort.column.clone()));
        }
        if let Some(unknown) = config.hidden.iter().find(|key| !columns.contains(key.as_str())) {
            return Err(TableError::UnknownColumn(unknown.clone()));
        }
        let visible: Vec<String> = columns
            .keys()
            .filter(|key| !config.hidden.iter().any(|hidden| hidden.as_str() == *key))
            .map(str::to_owned)
            .collect();
        if visible.is_empty() {
            return Err(TableError::NoVisibleColumns);
        }

        let mut state = TableState::new(config.page_size, visible);
        let sort_origin = config.sort.as_ref().map(|sort| sort.direction);
        state.sort = config.sort;

        Ok(Self {
            columns,
            filters,
            mode,
            state,
            rows: Vec::new(),
            view: Vec::new(),
            sort_origin,
            requests: RequestTracker::default(),
            listeners: Vec::new(),
            next_subscription: 1,
        })
    }

    pub fn mode(&self) -> TableMode {
        self.mode
    }

    pub fn state(&self) -> &TableState {
        &self.state
    }

    pub fn columns(&self) -> &Columns<R> {
        &self.columns
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    pub fn summary(&self) -> PageSummary {
        self.state.summary()
    }

    /// Rows on the current page, in display order.
    pub fn rows(&self) -> Vec<&R> {
        self.page_indices()
            .iter()
            .map(|&index| &self.rows[index])
            .collect()
    }

    pub fn visible_columns(&self) -> Vec<&ColumnSpec<R>> {
        self.columns
            .iter()
            .filter(|column| self.state.is_visible(column.key()))
            .collect()
    }

    /// Display strings for the current page, one inner vector per row over
    /// the visible columns.
    pub fn display_rows(&self) -> Vec<Vec<String>> {
        let columns = self.visible_columns();
        self.rows()
            .into_iter()
            .map(|row| columns.iter().map(|column| column.display(row)).collect())
            .collect()
    }

    pub fn sort_direction(&self, column: &str) -> Option<SortDirection> {
        self.state
            .sort
            .as_ref()
            .filter(|sort| sort.column == column)
            .map(|sort| sort.direction)
    }

    /// Selectable values for a filter: its static list, or the sorted
    /// distinct display values of its column over the held rows.
    pub fn filter_options(&self, key: &str) -> Option<Vec<String>> {
        let definition = self.filters.get(key)?;
        match &definition.values {
            ValuesSource::Static(values) => Some(normalize_values(values)),
            ValuesSource::Derived => {
                let column = self.columns.get(&definition.column)?;
                let values: BTreeSet<String> = self
                    .rows
                    .iter()
                    .map(|row| column.display(row).trim().to_owned())
                    .filter(|value| !value.is_empty())
                    .collect();
                Some(values.into_iter().collect())
            }
        }
    }

    /// CSV of visible, exportable columns. Local tables export the whole
    /// filtered and sorted dataset; remote tables export the loaded page.
    pub fn export_visible(&self) -> Result<Vec<u8>> {
        let columns: Vec<_> = self
            .visible_columns()
            .into_iter()
            .filter(|column| column.is_exportable())
            .collect();
        export_csv(&columns, self.view.iter().map(|&index| &self.rows[index]))
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&TableEvent) + 'static) -> SubscriptionId {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    pub fn set_page(&mut self, page_index: usize) -> Vec<TableEvent> {
        let page_index = clamp_page(page_index, self.state.total_count, self.state.page_size);
        if page_index == self.state.page_index {
            return Vec::new();
        }
        self.state.page_index = page_index;
        let mut events = vec![TableEvent::PageChanged(page_index)];
        if self.mode == TableMode::Remote {
            self.request_page(&mut events);
        }
        self.emit(events)
    }

    pub fn next_page(&mut self) -> Vec<TableEvent> {
        self.set_page(self.state.page_index.saturating_add(1))
    }

    pub fn prev_page(&mut self) -> Vec<TableEvent> {
        self.set_page(self.state.page_index.saturating_sub(1))
    }

    pub fn set_page_size(&mut self, page_size: usize) -> Vec<TableEvent> {
        if page_size == 0 {
            return self.reject(ValidationError::ZeroPageSize);
        }
        if page_size == self.state.page_size {
            return Vec::new();
        }
        self.state.page_size = page_size;
        let mut events = vec![TableEvent::PageSizeChanged(page_size)];
        self.reset_page(&mut events);
        self.refresh(&mut events);
        self.emit(events)
    }

    /// Tri-state: a new column takes `direction`; repeating the same column
    /// flips it once, and the next repeat clears the sort.
    pub fn set_sort(&mut self, column: &str, direction: SortDirection) -> Vec<TableEvent> {
        match self.columns.get(column) {
            None => return self.reject(ValidationError::UnknownColumn(column.to_owned())),
            Some(spec) if !spec.is_sortable() => {
                return self.reject(ValidationError::ColumnNotSortable(column.to_owned()));
            }
            Some(_) => {}
        }

        let (next, origin) = match (&self.state.sort, self.sort_origin) {
            (Some(current), Some(origin)) if current.column == column => {
                if current.direction == origin {
                    (Some(SortSpec::new(column, origin.opposite())), Some(origin))
                } else {
                    (None, None)
                }
            }
            _ => (Some(SortSpec::new(column, direction)), Some(direction)),
        };
        self.sort_origin = origin;
        self.state.sort = next.clone();

        let mut events = vec![TableEvent::SortChanged(next)];
        self.refresh(&mut events);
        self.emit(events)
    }

    /// Sort cycling for a header key press: starts ascending.
    pub fn cycle_sort(&mut self, column: &str) -> Vec<TableEvent> {
        self.set_sort(column, SortDirection::Asc)
    }

    pub fn clear_sort(&mut self) -> Vec<TableEvent> {
        if self.state.sort.is_none() {
            return Vec::new();
        }
        self.state.sort = None;
        self.sort_origin = None;
        let mut events = vec![TableEvent::SortChanged(None)];
        self.refresh(&mut events);
        self.emit(events)
    }

    /// Replaces the selection for `key`. An empty selection removes the
    /// filter; re-applying the current selection changes nothing.
    pub fn set_filter<I, S>(&mut self, key: &str, values: I) -> Vec<TableEvent>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if self.filters.get(key).is_none() {
            return self.reject(ValidationError::UnknownFilter(key.to_owned()));
        }
        let values = normalize_values(values);
        let current = self.state.active_filters.get(key);
        if values.is_empty() {
            if current.is_none() {
                return Vec::new();
            }
            self.state.active_filters.remove(key);
        } else {
            if current == Some(&values) {
                return Vec::new();
            }
            self.state.active_filters.insert(key.to_owned(), values);
        }

        let mut events = vec![TableEvent::FiltersChanged];
        self.reset_page(&mut events);
        self.refresh(&mut events);
        self.emit(events)
    }

    /// Adds `value` to the selection for `key`, or removes it if present.
    pub fn toggle_filter_value(&mut self, key: &str, value: &str) -> Vec<TableEvent> {
        let mut selected = self
            .state
            .active_filters
            .get(key)
            .cloned()
            .unwrap_or_default();
        let needle = value.trim().to_lowercase();
        let before = selected.len();
        selected.retain(|existing| existing.to_lowercase() != needle);
        if selected.len() == before {
            selected.push(value.to_owned());
        }
        self.set_filter(key, selected)
    }

    pub fn clear_filter(&mut self, key: &str) -> Vec<TableEvent> {
        self.set_filter(key, std::iter::empty::<&str>())
    }

    pub fn clear_filters(&mut self) -> Vec<TableEvent> {
        if self.state.active_filters.is_empty() {
            return Vec::new();
        }
        self.state.active_filters.clear();
        let mut events = vec![TableEvent::FiltersChanged];
        self.reset_page(&mut events);
        self.refresh(&mut events);
        self.emit(events)
    }

    pub fn set_search(&mut self, query: &str) -> Vec<TableEvent> {
        let query = query.trim();
        if query == self.state.search_query {
            return Vec::new();
        }
        self.state.search_query = query.to_owned();
        let mut events = vec![TableEvent::SearchChanged(query.to_owned())];
        self.reset_page(&mut events);
        self.refresh(&mut events);
        self.emit(events)
    }

    /// Shows exactly the known keys among `keys`, in declared column order.
    /// Unknown keys are reported and skipped; an empty result is rejected.
    pub fn set_visible_columns<I, S>(&mut self, keys: I) -> Vec<TableEvent>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut events = Vec::new();
        let mut requested = BTreeSet::new();
        for key in keys {
            let key = key.as_ref();
            if self.columns.contains(key) {
                requested.insert(key.to_owned());
            } else {
                tracing::warn!(column = key, "ignoring unknown column in visibility change");
                events.push(TableEvent::Rejected(ValidationError::UnknownColumn(
                    key.to_owned(),
                )));
            }
        }

        if requested.is_empty() {
            tracing::warn!("ignoring visibility change that hides every column");
            events.push(TableEvent::Rejected(ValidationError::NoVisibleColumns));
            return self.emit(events);
        }
        let visible: Vec<String> = self
            .columns
            .keys()
            .filter(|key| requested.contains(*key))
            .map(str::to_owned)
            .collect();
        if visible != self.state.visible_columns {
            self.state.visible_columns = visible;
            events.push(TableEvent::ColumnsChanged);
        }
        self.emit(events)
    }

    pub fn hide_column(&mut self, key: &str) -> Vec<TableEvent> {
        if !self.columns.contains(key) {
            return self.reject(ValidationError::UnknownColumn(key.to_owned()));
        }
        if !self.state.is_visible(key) {
            return Vec::new();
        }
        if self.state.visible_columns.len() == 1 {
            return self.reject(ValidationError::NoVisibleColumns);
        }
        self.state.visible_columns.retain(|visible| visible != key);
        self.emit(vec![TableEvent::ColumnsChanged])
    }

    pub fn show_all_columns(&mut self) -> Vec<TableEvent> {
        let all: Vec<String> = self.columns.keys().map(str::to_owned).collect();
        if all == self.state.visible_columns {
            return Vec::new();
        }
        self.state.visible_columns = all;
        self.emit(vec![TableEvent::ColumnsChanged])
    }

    /// Swaps the in-memory dataset of a local table, keeping every
    /// selection and clamping the page if the view shrank.
    pub fn replace_rows(&mut self, rows: Vec<R>) -> Vec<TableEvent> {
        if self.mode == TableMode::Remote {
            tracing::warn!("ignoring dataset replacement on a remote table");
            return Vec::new();
        }
        self.rows = rows;
        let mut events = Vec::new();
        self.refresh(&mut events);
        self.emit(events)
    }

    /// The newest request nobody has started yet. Superseded requests are
    /// never returned.
    pub fn take_pending_fetch(&mut self) -> Option<PendingFetch> {
        self.requests.take()
    }

    /// Applies the outcome of request `seq`. Anything but the newest
    /// outstanding request is discarded.
    pub fn receive(&mut self, seq: u64, result: Result<Page<R>>) -> Vec<TableEvent> {
        if self.mode == TableMode::Local || !self.requests.accepts(seq) {
            tracing::debug!(seq, "discarding stale table response");
            return self.emit(vec![TableEvent::ResponseDiscarded { seq }]);
        }
        self.requests.complete();

        let mut events = Vec::new();
        match result {
            Ok(page) => {
                tracing::debug!(
                    seq,
                    rows = page.rows.len(),
                    total = page.total_count,
                    "page loaded"
                );
                self.rows = page.rows;
                self.view = (0..self.rows.len()).collect();
                self.state.total_count = page.total_count;
                self.state.status = LoadStatus::Ready;
                self.state.stale = false;
                events.push(TableEvent::RowsChanged {
                    total_count: page.total_count,
                });

                let clamped = clamp_page(
                    self.state.page_index,
                    self.state.total_count,
                    self.state.page_size,
                );
                if clamped != self.state.page_index {
                    self.state.page_index = clamped;
                    events.push(TableEvent::PageChanged(clamped));
                    self.request_page(&mut events);
                }
            }
            Err(error) => {
                let message = format!("{error:#}");
                tracing::warn!(seq, error = %message, "page fetch failed");
                self.state.status = LoadStatus::Failed {
                    message: message.clone(),
                };
                self.state.stale = true;
                events.push(TableEvent::LoadFailed { message });
            }
        }
        self.emit(events)
    }

    /// Reissues the last request of a failed remote table under a new
    /// sequence number.
    pub fn retry(&mut self) -> Vec<TableEvent> {
        if self.mode == TableMode::Local || self.state.error().is_none() {
            return Vec::new();
        }
        let request = self
            .requests
            .latest_request()
            .cloned()
            .unwrap_or_else(|| self.page_request());
        let seq = self.requests.issue(request);
        self.state.status = LoadStatus::Loading { seq };
        self.emit(vec![TableEvent::FetchRequested { seq }])
    }

    /// Runs pending requests against `source` on the calling thread.
    pub fn fetch_with<S: DataSource<R> + ?Sized>(&mut self, source: &S) -> Vec<TableEvent> {
        let mut events = Vec::new();
        for _ in 0..MAX_FETCH_ROUNDS {
            let Some(pending) = self.take_pending_fetch() else {
                break;
            };
            let result = source.fetch_page(&pending.request);
            events.extend(self.receive(pending.seq, result));
        }
        events
    }

    fn page_indices(&self) -> &[usize] {
        match self.mode {
            TableMode::Local => {
                &self.view[page_range(self.view.len(), self.state.page_index, self.state.page_size)]
            }
            TableMode::Remote => &self.view,
        }
    }

    fn page_request(&self) -> PageRequest {
        PageRequest {
            page: self.state.page_index,
            page_size: self.state.page_size,
            sort: self.state.sort.clone(),
            filters: self.state.active_filters.clone(),
            search: (!self.state.search_query.is_empty()).then(|| self.state.search_query.clone()),
        }
    }

    fn reset_page(&mut self, events: &mut Vec<TableEvent>) {
        if self.state.page_index != 0 {
            self.state.page_index = 0;
            events.push(TableEvent::PageChanged(0));
        }
    }

    fn refresh(&mut self, events: &mut Vec<TableEvent>) {
        match self.mode {
            TableMode::Local => {
                let before = self.state.page_index;
                if self.recompute_local() {
                    events.push(TableEvent::RowsChanged {
                        total_count: self.state.total_count,
                    });
                }
                if self.state.page_index != before {
                    events.push(TableEvent::PageChanged(self.state.page_index));
                }
            }
            TableMode::Remote => self.request_page(events),
        }
    }

    /// Returns whether the view changed.
    fn recompute_local(&mut self) -> bool {
        let view = query::run(
            &self.rows,
            &self.columns,
            &self.filters,
            &self.state.active_filters,
            &self.state.search_query,
            self.state.sort.as_ref(),
        );
        let changed = view != self.view;
        self.view = view;
        self.state.total_count = self.view.len();
        self.state.page_index = clamp_page(
            self.state.page_index,
            self.state.total_count,
            self.state.page_size,
        );
        changed
    }

    fn request_page(&mut self, events: &mut Vec<TableEvent>) {
        let request = self.page_request();
        let seq = self.requests.issue(request);
        tracing::debug!(seq, page = self.state.page_index, "page fetch requested");
        self.state.status = LoadStatus::Loading { seq };
        events.push(TableEvent::FetchRequested { seq });
    }

    fn reject(&mut self, error: ValidationError) -> Vec<TableEvent> {
        tracing::warn!(%error, "table mutation ignored");
        self.emit(vec![TableEvent::Rejected(error)])
    }

    fn emit(&mut self, events: Vec<TableEvent>) -> Vec<TableEvent> {
        for event in &events {
            for (_, listener) in &mut self.listeners {
                listener(event);
            }
        }
        events
    }
}

impl<R> std::fmt::Debug for TableEngine<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableEngine")
            .field("mode", &self.mode)
            .field("state", &self.state)
            .field("rows", &self.rows.len())
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}
