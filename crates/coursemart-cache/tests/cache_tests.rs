// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use coursemart_app::Course;
use coursemart_cache::{CachedSource, PageCache};
use coursemart_table::{
    ActiveFilters, CellValue, ColumnSpec, DataSource, FnSource, Page, PageRequest, TableConfig,
    TableEngine,
};
use coursemart_testkit::{CourseFaker, temp_cache_path};
use std::cell::Cell;
use std::time::Duration;

fn request(page: usize, search: Option<&str>) -> PageRequest {
    PageRequest {
        page,
        page_size: 5,
        sort: None,
        filters: ActiveFilters::new(),
        search: search.map(str::to_owned),
    }
}

fn memory_cache() -> Result<PageCache> {
    let cache = PageCache::open_memory(Duration::from_secs(300))?;
    cache.bootstrap()?;
    Ok(cache)
}

#[test]
fn repeated_requests_are_served_from_cache() -> Result<()> {
    let calls = Cell::new(0);
    let courses = CourseFaker::new(2).courses(5);
    let upstream = FnSource(|_: &PageRequest| -> Result<Page<Course>> {
        calls.set(calls.get() + 1);
        Ok(Page {
            rows: courses.clone(),
            total_count: 20,
        })
    });
    let source = CachedSource::new(upstream, "courses", memory_cache()?);

    let first: Page<Course> = source.fetch_page(&request(0, None))?;
    let second: Page<Course> = source.fetch_page(&request(0, None))?;
    assert_eq!(first, second);
    assert_eq!(calls.get(), 1);

    let _: Page<Course> = source.fetch_page(&request(0, Some("rust")))?;
    assert_eq!(calls.get(), 2, "different parameters miss the cache");
    Ok(())
}

#[test]
fn fetch_failures_are_not_masked() -> Result<()> {
    let upstream = FnSource(|request: &PageRequest| -> Result<Page<Course>> {
        if request.page > 0 {
            anyhow::bail!("upstream unavailable");
        }
        Ok(Page {
            rows: Vec::new(),
            total_count: 0,
        })
    });
    let source = CachedSource::new(upstream, "courses", memory_cache()?);

    let _: Page<Course> = source.fetch_page(&request(0, None))?;
    let error = DataSource::<Course>::fetch_page(&source, &request(1, None))
        .expect_err("uncached failing page");
    assert_eq!(error.to_string(), "upstream unavailable");
    Ok(())
}

#[test]
fn zero_ttl_disables_hits() -> Result<()> {
    let calls = Cell::new(0);
    let upstream = FnSource(|_: &PageRequest| -> Result<Page<Course>> {
        calls.set(calls.get() + 1);
        Ok(Page {
            rows: Vec::new(),
            total_count: 0,
        })
    });
    let cache = PageCache::open_memory(Duration::ZERO)?;
    cache.bootstrap()?;
    let source = CachedSource::new(upstream, "courses", cache);

    let _: Page<Course> = source.fetch_page(&request(0, None))?;
    let _: Page<Course> = source.fetch_page(&request(0, None))?;
    assert_eq!(calls.get(), 2);
    assert_eq!(source.evict_expired()?, 1);
    Ok(())
}

#[test]
fn cache_file_persists_between_opens() -> Result<()> {
    let (_dir, path) = temp_cache_path()?;
    let page = Page {
        rows: CourseFaker::new(4).courses(3),
        total_count: 3,
    };
    {
        let cache = PageCache::open(&path, Duration::from_secs(300))?;
        cache.bootstrap()?;
        cache.put("courses", &request(0, None), &page)?;
    }

    let reopened = PageCache::open(&path, Duration::from_secs(300))?;
    reopened.bootstrap()?;
    let cached: Option<Page<Course>> = reopened.get("courses", &request(0, None))?;
    assert_eq!(cached, Some(page));
    Ok(())
}

#[test]
fn table_engine_reads_through_the_cache() -> Result<()> {
    let calls = Cell::new(0);
    let courses = CourseFaker::new(6).courses(12);
    let upstream = FnSource(|request: &PageRequest| -> Result<Page<Course>> {
        calls.set(calls.get() + 1);
        let rows = courses
            .iter()
            .skip(request.page * request.page_size)
            .take(request.page_size)
            .cloned()
            .collect();
        Ok(Page {
            rows,
            total_count: courses.len(),
        })
    });
    let source = CachedSource::new(upstream, "courses", memory_cache()?);
    let mut table = TableEngine::remote(
        TableConfig::new(vec![ColumnSpec::new("title", "Title", |course: &Course| {
            CellValue::text(course.title.clone())
        })])
        .page_size(5),
    )?;

    table.fetch_with(&source);
    table.next_page();
    table.fetch_with(&source);
    table.prev_page();
    table.fetch_with(&source);

    assert_eq!(calls.get(), 2);
    assert_eq!(table.rows().len(), 5);
    assert_eq!(table.rows()[0].id, courses[0].id);
    Ok(())
}
