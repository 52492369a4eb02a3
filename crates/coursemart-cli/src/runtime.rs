// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use coursemart_api::{ApiSource, Client};
use coursemart_app::{Course, Instructor, Order, ResourceKind, Screen};
use coursemart_cache::{CachedSource, PageCache};
use coursemart_table::{DataSource, PageRequest};
use coursemart_testkit::CourseFaker;
use coursemart_tui::{AppRuntime, Dataset, InternalEvent, ResourcePage};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;
use time::OffsetDateTime;
use time::macros::format_description;

const DEMO_SEED: u64 = 42;
const DEMO_COURSES: usize = 120;
const DEMO_INSTRUCTORS: usize = 24;
const DEMO_ORDERS: usize = 300;

type SharedSource<R> = Arc<dyn DataSource<R> + Send + Sync>;

/// Where the page cache lives and how long entries stay fresh.
#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub path: PathBuf,
    pub ttl: Duration,
}

/// One data source per list resource, shareable with fetch workers.
#[derive(Clone)]
pub struct ApiSources {
    courses: SharedSource<Course>,
    instructors: SharedSource<Instructor>,
    orders: SharedSource<Order>,
}

impl ApiSources {
    pub fn new(
        client: &Client,
        endpoint: impl Fn(ResourceKind) -> String,
        cache: Option<&CacheSettings>,
    ) -> Result<Self> {
        Ok(Self {
            courses: shared_source(client, endpoint(ResourceKind::Courses), cache)?,
            instructors: shared_source(client, endpoint(ResourceKind::Instructors), cache)?,
            orders: shared_source(client, endpoint(ResourceKind::Orders), cache)?,
        })
    }

    fn fetch(&self, resource: ResourceKind, request: &PageRequest) -> Result<ResourcePage> {
        Ok(match resource {
            ResourceKind::Courses => ResourcePage::Courses(self.courses.fetch_page(request)?),
            ResourceKind::Instructors => {
                ResourcePage::Instructors(self.instructors.fetch_page(request)?)
            }
            ResourceKind::Orders => ResourcePage::Orders(self.orders.fetch_page(request)?),
        })
    }
}

fn shared_source<R>(
    client: &Client,
    endpoint: String,
    cache: Option<&CacheSettings>,
) -> Result<SharedSource<R>>
where
    R: Serialize + DeserializeOwned + 'static,
{
    let source = ApiSource::<R>::new(client.clone(), endpoint.clone());
    match cache {
        Some(settings) => {
            let cache = PageCache::open(&settings.path, settings.ttl)?;
            cache.bootstrap()?;
            Ok(Arc::new(CachedSource::new(source, endpoint, cache)))
        }
        None => Ok(Arc::new(source)),
    }
}

/// Removes expired pages left by earlier sessions.
pub fn evict_stale_pages(settings: &CacheSettings) -> Result<usize> {
    let cache = PageCache::open(&settings.path, settings.ttl)?;
    cache.bootstrap()?;
    let removed = cache.evict_expired()?;
    if removed > 0 {
        tracing::info!(removed, path = %settings.path.display(), "evicted expired cached pages");
    }
    Ok(removed)
}

enum Backend {
    Demo(CourseFaker),
    Api(ApiSources),
}

pub struct MarketplaceRuntime {
    backend: Backend,
    page_size: usize,
    export_dir: PathBuf,
}

impl MarketplaceRuntime {
    /// Serves seeded rows from memory; every screen sorts and filters
    /// locally.
    pub fn demo(page_size: usize, export_dir: PathBuf) -> Self {
        Self {
            backend: Backend::Demo(CourseFaker::new(DEMO_SEED)),
            page_size,
            export_dir,
        }
    }

    /// Pages every screen through the REST API.
    pub fn api(sources: ApiSources, page_size: usize, export_dir: PathBuf) -> Self {
        Self {
            backend: Backend::Api(sources),
            page_size,
            export_dir,
        }
    }
}

impl AppRuntime for MarketplaceRuntime {
    fn load_dataset(&mut self, resource: ResourceKind) -> Result<Option<Dataset>> {
        let Backend::Demo(faker) = &self.backend else {
            return Ok(None);
        };
        // Each resource starts from the same seed so reopening a screen
        // shows the same rows.
        let mut faker = CourseFaker::new(faker.seed());
        let dataset = match resource {
            ResourceKind::Courses => Dataset::Courses(faker.courses(DEMO_COURSES)),
            ResourceKind::Instructors => Dataset::Instructors(faker.instructors(DEMO_INSTRUCTORS)),
            ResourceKind::Orders => Dataset::Orders(faker.orders(DEMO_ORDERS)),
        };
        Ok(Some(dataset))
    }

    fn fetch_page(
        &mut self,
        resource: ResourceKind,
        request: &PageRequest,
    ) -> Result<ResourcePage> {
        match &self.backend {
            Backend::Api(sources) => sources.fetch(resource, request),
            Backend::Demo(_) => Err(anyhow!(
                "demo data is held in memory; {} are never fetched",
                resource.as_str()
            )),
        }
    }

    fn write_export(&mut self, screen: Screen, csv: &[u8]) -> Result<PathBuf> {
        let path = self.export_dir.join(export_file_name(screen, OffsetDateTime::now_utc())?);
        write_csv(&path, csv)?;
        tracing::info!(screen = screen.label(), path = %path.display(), "exported table");
        Ok(path)
    }

    fn page_size(&self) -> usize {
        self.page_size
    }

    fn spawn_fetch(
        &mut self,
        screen: Screen,
        seq: u64,
        request: PageRequest,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let sources = match &self.backend {
            Backend::Api(sources) => Some(sources.clone()),
            Backend::Demo(_) => None,
        };
        let Some(sources) = sources else {
            let result = self.fetch_page(screen.resource(), &request);
            return tx
                .send(InternalEvent::Fetched {
                    screen,
                    seq,
                    result,
                })
                .map_err(|_| anyhow!("fetch event channel closed"));
        };

        thread::Builder::new()
            .name(format!("fetch-{}", screen.resource().as_str()))
            .spawn(move || {
                let result = sources.fetch(screen.resource(), &request);
                if let Err(error) = &result {
                    tracing::debug!(seq, error = %format!("{error:#}"), "background fetch failed");
                }
                // The UI may have quit while the request was in flight.
                let _ = tx.send(InternalEvent::Fetched {
                    screen,
                    seq,
                    result,
                });
            })
            .context("spawn fetch worker")?;
        Ok(())
    }
}

pub fn write_csv(path: &Path, csv: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create export directory {}", parent.display()))?;
    }
    fs::write(path, csv).with_context(|| format!("write export {}", path.display()))
}

fn export_file_name(screen: Screen, now: OffsetDateTime) -> Result<String> {
    let stamp = now
        .format(format_description!(
            "[year][month][day]-[hour][minute][second]"
        ))
        .context("format export timestamp")?;
    let slug = screen.path().trim_matches('/').replace('/', "-");
    Ok(format!("coursemart-{slug}-{stamp}.csv"))
}
