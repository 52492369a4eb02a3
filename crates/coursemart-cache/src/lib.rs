// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! SQLite-backed cache of fetched table pages.
//!
//! Entries are keyed by the SHA-256 of the resource name and the canonical
//! JSON of the [`PageRequest`], so any change to paging, sort, filters or
//! search is a different entry.

use anyhow::{Context, Result, anyhow, bail};
use coursemart_table::{DataSource, Page, PageRequest};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use time::OffsetDateTime;

const APP_NAME: &str = "coursemart";
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

pub struct PageCache {
    conn: Connection,
    ttl: Duration,
}

impl PageCache {
    pub fn open(path: &Path, ttl: Duration) -> Result<Self> {
        if path.as_os_str().is_empty() {
            bail!("cache path must not be empty");
        }
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("create cache directory {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("open page cache at {}", path.display()))?;
        configure_connection(&conn)?;
        Ok(Self { conn, ttl })
    }

    pub fn open_memory(ttl: Duration) -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory page cache")?;
        configure_connection(&conn)?;
        Ok(Self { conn, ttl })
    }

    pub fn bootstrap(&self) -> Result<()> {
        self.conn
            .execute_batch(include_str!("sql/schema.sql"))
            .context("create page cache schema")
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get<R: DeserializeOwned>(
        &self,
        resource: &str,
        request: &PageRequest,
    ) -> Result<Option<Page<R>>> {
        self.get_at(resource, request, now_unix())
    }

    pub fn put<R: Serialize>(
        &self,
        resource: &str,
        request: &PageRequest,
        page: &Page<R>,
    ) -> Result<()> {
        self.put_at(resource, request, page, now_unix())
    }

    /// Deletes every entry older than the TTL and returns how many went.
    pub fn evict_expired(&self) -> Result<usize> {
        let cutoff = now_unix().saturating_sub(ttl_secs(self.ttl));
        self.conn
            .execute(
                "DELETE FROM cached_pages WHERE fetched_at <= ?",
                params![cutoff],
            )
            .context("evict expired cache entries")
    }

    pub fn invalidate(&self, resource: &str) -> Result<usize> {
        self.conn
            .execute(
                "DELETE FROM cached_pages WHERE resource = ?",
                params![resource],
            )
            .with_context(|| format!("invalidate cached {resource} pages"))
    }

    pub fn len(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM cached_pages", [], |row| row.get(0))
            .context("count cache entries")?;
        usize::try_from(count).context("cache entry count out of range")
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn get_at<R: DeserializeOwned>(
        &self,
        resource: &str,
        request: &PageRequest,
        now: i64,
    ) -> Result<Option<Page<R>>> {
        let key = cache_key(resource, request)?;
        let entry: Option<(String, i64, i64)> = self
            .conn
            .query_row(
                "SELECT payload, total_count, fetched_at FROM cached_pages WHERE key = ?",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()
            .context("read cache entry")?;

        let Some((payload, total_count, fetched_at)) = entry else {
            return Ok(None);
        };
        if now.saturating_sub(fetched_at) >= ttl_secs(self.ttl) {
            return Ok(None);
        }

        match serde_json::from_str::<Vec<R>>(&payload) {
            Ok(rows) => Ok(Some(Page {
                rows,
                total_count: usize::try_from(total_count).unwrap_or_default(),
            })),
            Err(error) => {
                tracing::warn!(%error, resource, "dropping undecodable cache entry");
                self.conn
                    .execute("DELETE FROM cached_pages WHERE key = ?", params![key])
                    .context("delete undecodable cache entry")?;
                Ok(None)
            }
        }
    }

    fn put_at<R: Serialize>(
        &self,
        resource: &str,
        request: &PageRequest,
        page: &Page<R>,
        fetched_at: i64,
    ) -> Result<()> {
        let key = cache_key(resource, request)?;
        let payload = serde_json::to_string(&page.rows).context("encode cached rows")?;
        let total_count = i64::try_from(page.total_count).context("total count out of range")?;
        self.conn
            .execute(
                "INSERT OR REPLACE INTO cached_pages (key, resource, payload, total_count, fetched_at)
                 VALUES (?, ?, ?, ?, ?)",
                params![key, resource, payload, total_count, fetched_at],
            )
            .with_context(|| format!("store cached {resource} page"))?;
        Ok(())
    }
}

/// Read-through cache in front of another [`DataSource`]. Fetch failures are
/// always returned, never papered over with an older cached page.
pub struct CachedSource<S> {
    inner: S,
    resource: String,
    cache: Mutex<PageCache>,
}

impl<S> CachedSource<S> {
    pub fn new(inner: S, resource: impl Into<String>, cache: PageCache) -> Self {
        Self {
            inner,
            resource: resource.into(),
            cache: Mutex::new(cache),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn evict_expired(&self) -> Result<usize> {
        self.lock()?.evict_expired()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, PageCache>> {
        self.cache
            .lock()
            .map_err(|_| anyhow!("page cache lock poisoned"))
    }
}

impl<R, S> DataSource<R> for CachedSource<S>
where
    R: Serialize + DeserializeOwned,
    S: DataSource<R>,
{
    fn fetch_page(&self, request: &PageRequest) -> Result<Page<R>> {
        match self.lock()?.get(&self.resource, request) {
            Ok(Some(page)) => {
                tracing::debug!(resource = %self.resource, page = request.page, "page cache hit");
                return Ok(page);
            }
            Ok(None) => {}
            Err(error) => {
                tracing::warn!(error = %format!("{error:#}"), "page cache read failed");
            }
        }

        let page = self.inner.fetch_page(request)?;
        if let Err(error) = self.lock()?.put(&self.resource, request, &page) {
            tracing::warn!(error = %format!("{error:#}"), "page cache write failed");
        }
        Ok(page)
    }
}

pub fn default_cache_path() -> Result<PathBuf> {
    if let Some(override_path) = env::var_os("COURSEMART_CACHE_PATH") {
        return Ok(PathBuf::from(override_path));
    }

    let cache_root = dirs::cache_dir().ok_or_else(|| {
        anyhow!("cannot resolve cache directory; set COURSEMART_CACHE_PATH or [cache] path")
    })?;
    Ok(cache_root.join(APP_NAME).join("pages.db"))
}

pub fn cache_key(resource: &str, request: &PageRequest) -> Result<String> {
    let canonical = serde_json::to_string(request).context("encode cache key")?;
    let mut hasher = Sha256::new();
    hasher.update(resource.as_bytes());
    hasher.update([0u8]);
    hasher.update(canonical.as_bytes());
    Ok(hex(&hasher.finalize()))
}

fn hex(digest: &[u8]) -> String {
    let mut output = String::with_capacity(digest.len() * 2);
    for byte in digest {
        use std::fmt::Write as _;
        let _ = write!(&mut output, "{byte:02x}");
    }
    output
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )
    .context("configure sqlite pragmas")
}

fn now_unix() -> i64 {
    OffsetDateTime::now_utc().unix_timestamp()
}

fn ttl_secs(ttl: Duration) -> i64 {
    i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::{PageCache, cache_key};
    use coursemart_table::{ActiveFilters, Page, PageRequest};
    use std::time::Duration;

    fn request(page: usize) -> PageRequest {
        PageRequest {
            page,
            page_size: 10,
            sort: None,
            filters: ActiveFilters::new(),
            search: None,
        }
    }

    fn cache(ttl: Duration) -> PageCache {
        let cache = PageCache::open_memory(ttl).expect("open cache");
        cache.bootstrap().expect("bootstrap cache");
        cache
    }

    #[test]
    fn key_depends_on_resource_and_every_parameter() {
        let base = cache_key("courses", &request(0)).expect("key");
        assert_eq!(base.len(), 64);
        assert_eq!(base, cache_key("courses", &request(0)).expect("key"));
        assert_ne!(base, cache_key("orders", &request(0)).expect("key"));
        assert_ne!(base, cache_key("courses", &request(1)).expect("key"));

        let mut searched = request(0);
        searched.search = Some("rust".to_owned());
        assert_ne!(base, cache_key("courses", &searched).expect("key"));
    }

    #[test]
    fn entries_expire_after_ttl() {
        let cache = cache(Duration::from_secs(60));
        let page = Page {
            rows: vec!["a".to_owned(), "b".to_owned()],
            total_count: 2,
        };
        cache
            .put_at("courses", &request(0), &page, 1_000)
            .expect("put");

        let fresh: Option<Page<String>> = cache.get_at("courses", &request(0), 1_059).expect("get");
        assert_eq!(fresh, Some(page));
        let stale: Option<Page<String>> = cache.get_at("courses", &request(0), 1_060).expect("get");
        assert_eq!(stale, None);
    }

    #[test]
    fn evict_expired_removes_old_rows_only() {
        let cache = cache(Duration::from_secs(60));
        let page = Page {
            rows: vec![1_i64],
            total_count: 1,
        };
        cache.put_at("courses", &request(0), &page, 0).expect("put");
        cache.put("courses", &request(1), &page).expect("put");
        assert_eq!(cache.len().expect("len"), 2);

        assert_eq!(cache.evict_expired().expect("evict"), 1);
        assert_eq!(cache.len().expect("len"), 1);
        assert_eq!(cache.invalidate("courses").expect("invalidate"), 1);
        assert!(cache.is_empty().expect("is_empty"));
    }

    #[test]
    fn undecodable_entries_are_dropped() {
        let cache = cache(Duration::from_secs(60));
        let page = Page {
            rows: vec!["text".to_owned()],
            total_count: 1,
        };
        cache.put("courses", &request(0), &page).expect("put");
        let decoded: Option<Page<i64>> = cache.get("courses", &request(0)).expect("get");
        assert_eq!(decoded, None);
        assert!(cache.is_empty().expect("is_empty"));
    }
}
