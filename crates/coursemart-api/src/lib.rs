// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Blocking client for the marketplace REST API.
//!
//! List endpoints take `page` (1-based), `page_size`, `ordering` (`col` or
//! `-col`), `search` and the active filters, one `key=value` pair per
//! selected value, and answer `{"results": [...], "count": N}`.

use anyhow::{Context, Result, anyhow, bail};
use coursemart_table::{DataSource, Page, PageRequest};
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::time::Duration;
use url::Url;

/// Query parameters the client sets itself; a filter may not reuse them.
const RESERVED_PARAMS: [&str; 4] = ["page", "page_size", "ordering", "search"];

#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("api.base_url must not be empty");
        }
        let parsed = Url::parse(&base_url)
            .with_context(|| format!("api.base_url {base_url:?} is not a valid URL"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!(
                "api.base_url must use http or https, got {:?}",
                parsed.scheme()
            );
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Succeeds when the API root answers with a 2xx status.
    pub fn ping(&self) -> Result<()> {
        let response = self
            .http
            .get(format!("{}/", self.base_url))
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }
        Ok(())
    }

    pub fn page_url(&self, resource: &str, request: &PageRequest) -> Result<Url> {
        let resource = resource.trim_matches('/');
        if resource.is_empty() {
            bail!("api resource name must not be empty");
        }
        if let Some(key) = request
            .filters
            .keys()
            .find(|key| RESERVED_PARAMS.contains(&key.as_str()))
        {
            bail!("filter key {key:?} collides with a reserved query parameter");
        }
        let mut url = Url::parse(&format!("{}/{resource}", self.base_url))
            .with_context(|| format!("build URL for resource {resource:?}"))?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("page", &(request.page + 1).to_string());
            query.append_pair("page_size", &request.page_size.to_string());
            if let Some(sort) = &request.sort {
                query.append_pair("ordering", &sort.ordering());
            }
            if let Some(search) = request.search.as_deref().filter(|search| !search.is_empty()) {
                query.append_pair("search", search);
            }
            // Repeated pairs keep values containing commas intact.
            for (key, values) in &request.filters {
                for value in values {
                    query.append_pair(key, value);
                }
            }
        }
        Ok(url)
    }

    pub fn fetch_page<R: DeserializeOwned>(
        &self,
        resource: &str,
        request: &PageRequest,
    ) -> Result<Page<R>> {
        let url = self.page_url(resource, request)?;
        tracing::debug!(%url, "fetching page");
        let response = self
            .http
            .get(url)
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }

        let parsed: ListEnvelope<R> = response
            .json()
            .with_context(|| format!("decode {resource} page"))?;
        Ok(Page {
            rows: parsed.results,
            total_count: parsed.count,
        })
    }
}

/// A [`DataSource`] bound to one list endpoint.
#[derive(Debug, Clone)]
pub struct ApiSource<R> {
    client: Client,
    resource: String,
    rows: PhantomData<fn() -> R>,
}

impl<R> ApiSource<R> {
    pub fn new(client: Client, resource: impl Into<String>) -> Self {
        Self {
            client,
            resource: resource.into(),
            rows: PhantomData,
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }
}

impl<R: DeserializeOwned> DataSource<R> for ApiSource<R> {
    fn fetch_page(&self, request: &PageRequest) -> Result<Page<R>> {
        self.client.fetch_page(&self.resource, request)
    }
}

#[derive(Debug, Deserialize)]
struct ListEnvelope<R> {
    results: Vec<R>,
    count: usize,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    if error.is_timeout() {
        return anyhow!(
            "{} did not answer in time -- raise [api] timeout or check the server ({})",
            base_url,
            error
        );
    }
    anyhow!(
        "cannot reach {} -- check [api] base_url or start the API server ({})",
        base_url,
        error
    )
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body)
        && let Some(detail) = parsed
            .detail
            .or(parsed.message)
            .filter(|detail| !detail.trim().is_empty())
    {
        return anyhow!("server error ({}): {}", status.as_u16(), detail.trim());
    }

    if body.len() < 100 && !body.contains('{') && !body.trim().is_empty() {
        return anyhow!("server error ({}): {}", status.as_u16(), body.trim());
    }

    anyhow!("server returned {}", status.as_u16())
}

#[cfg(test)]
mod tests {
    use super::{Client, clean_error_response};
    use coursemart_table::{ActiveFilters, PageRequest, SortSpec};
    use coursemart_app::SortDirection;
    use reqwest::StatusCode;
    use std::time::Duration;

    fn client() -> Client {
        Client::new("http://localhost:8000/api/", Duration::from_secs(1)).expect("client")
    }

    #[test]
    fn rejects_invalid_base_urls() {
        for bad in ["", "   ", "not a url", "ftp://example.com"] {
            assert!(
                Client::new(bad, Duration::from_secs(1)).is_err(),
                "{bad:?} should be rejected"
            );
        }
        assert_eq!(client().base_url(), "http://localhost:8000/api");
    }

    #[test]
    fn page_url_encodes_every_parameter() {
        let mut filters = ActiveFilters::new();
        filters.insert(
            "category".to_owned(),
            vec!["Design".to_owned(), "Data Science".to_owned()],
        );
        filters.insert("status".to_owned(), Vec::new());
        let request = PageRequest {
            page: 2,
            page_size: 25,
            sort: Some(SortSpec::new("price", SortDirection::Desc)),
            filters,
            search: Some("rust & sql".to_owned()),
        };

        let url = client().page_url("/courses/", &request).expect("url");
        assert_eq!(url.path(), "/api/courses");
        assert_eq!(
            url.query(),
            Some(
                "page=3&page_size=25&ordering=-price&search=rust+%26+sql\
                 &category=Design&category=Data+Science"
            ),
        );
    }

    #[test]
    fn filter_values_with_commas_stay_distinct() {
        let request = |values: &[&str]| {
            let mut filters = ActiveFilters::new();
            filters.insert(
                "category".to_owned(),
                values.iter().map(|value| (*value).to_owned()).collect(),
            );
            PageRequest {
                page: 0,
                page_size: 10,
                sort: None,
                filters,
                search: None,
            }
        };

        let single = client()
            .page_url("courses", &request(&["Music, Audio"]))
            .expect("url");
        let pair = client()
            .page_url("courses", &request(&["Music", " Audio"]))
            .expect("url");
        assert_ne!(single, pair);
        assert_eq!(
            single.query(),
            Some("page=1&page_size=10&category=Music%2C+Audio")
        );
        assert_eq!(
            pair.query(),
            Some("page=1&page_size=10&category=Music&category=+Audio")
        );

        let values: Vec<String> = pair
            .query_pairs()
            .filter(|(key, _)| key == "category")
            .map(|(_, value)| value.into_owned())
            .collect();
        assert_eq!(values, vec!["Music", " Audio"]);
    }

    #[test]
    fn filter_keys_cannot_shadow_paging_parameters() {
        for reserved in ["page", "page_size", "ordering", "search"] {
            let mut filters = ActiveFilters::new();
            filters.insert(reserved.to_owned(), vec!["x".to_owned()]);
            let request = PageRequest {
                page: 0,
                page_size: 10,
                sort: None,
                filters,
                search: None,
            };
            let error = client()
                .page_url("courses", &request)
                .expect_err("reserved key should be rejected");
            assert!(error.to_string().contains(reserved), "{error}");
        }
    }

    #[test]
    fn error_bodies_surface_detail_or_message() {
        let error = clean_error_response(StatusCode::BAD_REQUEST, r#"{"detail":"bad ordering"}"#);
        assert_eq!(error.to_string(), "server error (400): bad ordering");

        let error = clean_error_response(StatusCode::FORBIDDEN, r#"{"message":"admins only"}"#);
        assert_eq!(error.to_string(), "server error (403): admins only");

        let error = clean_error_response(StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(error.to_string(), "server error (502): upstream down");

        let error = clean_error_response(StatusCode::INTERNAL_SERVER_ERROR, "{\"trace\":1}");
        assert_eq!(error.to_string(), "server returned 500");
    }
}
