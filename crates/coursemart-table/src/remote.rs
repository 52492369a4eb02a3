// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{ActiveFilters, SortSpec};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Parameters for one server-side page. `page` is 0-based here; transports
/// translate it to whatever their wire format wants.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: usize,
    pub page_size: usize,
    pub sort: Option<SortSpec>,
    pub filters: ActiveFilters,
    pub search: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<R> {
    pub rows: Vec<R>,
    pub total_count: usize,
}

/// Server-side paging contract.
pub trait DataSource<R> {
    fn fetch_page(&self, request: &PageRequest) -> Result<Page<R>>;
}

impl<R, S: DataSource<R> + ?Sized> DataSource<R> for Arc<S> {
    fn fetch_page(&self, request: &PageRequest) -> Result<Page<R>> {
        (**self).fetch_page(request)
    }
}

impl<R, S: DataSource<R> + ?Sized> DataSource<R> for Box<S> {
    fn fetch_page(&self, request: &PageRequest) -> Result<Page<R>> {
        (**self).fetch_page(request)
    }
}

/// Adapts a closure into a [`DataSource`].
pub struct FnSource<F>(pub F);

impl<R, F> DataSource<R> for FnSource<F>
where
    F: Fn(&PageRequest) -> Result<Page<R>>,
{
    fn fetch_page(&self, request: &PageRequest) -> Result<Page<R>> {
        (self.0)(request)
    }
}

/// A request the engine wants performed. Hand the result back with
/// [`crate::TableEngine::receive`] using the same `seq`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFetch {
    pub seq: u64,
    pub request: PageRequest,
}

/// Sequence bookkeeping for last-request-wins.
#[derive(Debug, Default)]
pub(crate) struct RequestTracker {
    last_seq: u64,
    latest: Option<PendingFetch>,
    dispatched: bool,
    in_flight: bool,
}

impl RequestTracker {
    pub(crate) fn issue(&mut self, request: PageRequest) -> u64 {
        self.last_seq += 1;
        self.latest = Some(PendingFetch {
            seq: self.last_seq,
            request,
        });
        self.dispatched = false;
        self.in_flight = true;
        self.last_seq
    }

    /// The newest request, once. Superseded undispatched requests are never
    /// handed out.
    pub(crate) fn take(&mut self) -> Option<PendingFetch> {
        if self.dispatched || !self.in_flight {
            return None;
        }
        self.dispatched = true;
        self.latest.clone()
    }

    /// Whether a response for `seq` is the one the table is waiting for.
    pub(crate) fn accepts(&self, seq: u64) -> bool {
        self.in_flight && self.latest.as_ref().is_some_and(|latest| latest.seq == seq)
    }

    pub(crate) fn complete(&mut self) {
        self.in_flight = false;
    }

    pub(crate) fn latest_request(&self) -> Option<&PageRequest> {
        self.latest.as_ref().map(|latest| &latest.request)
    }
}
