// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use coursemart_app::ResourceKind;
use coursemart_routes::{RoutePattern, RouteTable, marketplace_routes};
use coursemart_table::engine::DEFAULT_PAGE_SIZE;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_NAME: &str = "coursemart";
const CONFIG_VERSION: i64 = 1;
const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
const DEFAULT_LOG_FILTER: &str = "warn,coursemart=info";
const MAX_PAGE_SIZE: usize = 200;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub api: Api,
    #[serde(default)]
    pub table: Table,
    #[serde(default)]
    pub cache: Cache,
    #[serde(default)]
    pub log: Log,
    #[serde(default)]
    pub routes: Vec<RoutePattern>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            api: Api::default(),
            table: Table::default(),
            cache: Cache::default(),
            log: Log::default(),
            routes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Api {
    pub base_url: Option<String>,
    pub timeout: Option<String>,
    #[serde(default)]
    pub resources: Resources,
}

impl Default for Api {
    fn default() -> Self {
        Self {
            base_url: Some(DEFAULT_API_BASE_URL.to_owned()),
            timeout: Some("10s".to_owned()),
            resources: Resources::default(),
        }
    }
}

/// Endpoint names, relative to `base_url`, for each list resource.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Resources {
    pub courses: Option<String>,
    pub instructors: Option<String>,
    pub orders: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Table {
    pub page_size: Option<usize>,
}

impl Default for Table {
    fn default() -> Self {
        Self {
            page_size: Some(DEFAULT_PAGE_SIZE),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Cache {
    pub enabled: Option<bool>,
    pub path: Option<String>,
    pub ttl: Option<String>,
}

impl Default for Cache {
    fn default() -> Self {
        Self {
            enabled: Some(true),
            path: None,
            ttl: Some("5m".to_owned()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Log {
    pub filter: Option<String>,
    pub file: Option<String>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("COURSEMART_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!(
                "cannot resolve config directory; set COURSEMART_CONFIG_PATH to the config file"
            )
        })?;

        let app_dir = config_root.join(APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} has no version. Add `version = 1` at the top; settings live under [api], [table], [cache], [log] and [[routes]]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(page_size) = self.table.page_size
            && !(1..=MAX_PAGE_SIZE).contains(&page_size)
        {
            bail!(
                "table.page_size in {} must be between 1 and {}, got {}",
                path.display(),
                MAX_PAGE_SIZE,
                page_size
            );
        }

        if let Some(base_url) = &self.api.base_url
            && base_url.trim().is_empty()
        {
            bail!("api.base_url in {} must not be empty", path.display());
        }

        if let Some(timeout) = &self.api.timeout {
            let parsed = parse_duration(timeout)
                .with_context(|| format!("api.timeout in {}", path.display()))?;
            if parsed.is_zero() {
                bail!(
                    "api.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        if let Some(ttl) = &self.cache.ttl {
            parse_duration(ttl).with_context(|| format!("cache.ttl in {}", path.display()))?;
        }

        if let Some(cache_path) = &self.cache.path
            && cache_path.trim().is_empty()
        {
            bail!("cache.path in {} must not be empty", path.display());
        }

        if let Some(filter) = &self.log.filter {
            tracing_subscriber::EnvFilter::try_new(filter)
                .with_context(|| format!("log.filter {filter:?} in {}", path.display()))?;
        }

        self.route_table()
            .with_context(|| format!("invalid [[routes]] in {}", path.display()))?;
        Ok(())
    }

    /// Configured routes in declaration order, or the built-in marketplace
    /// map when the file declares none.
    pub fn route_table(&self) -> Result<RouteTable> {
        let routes = if self.routes.is_empty() {
            marketplace_routes()
        } else {
            self.routes.clone()
        };
        Ok(RouteTable::new(routes)?)
    }

    pub fn api_base_url(&self) -> &str {
        self.api
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE_URL)
            .trim_end_matches('/')
    }

    pub fn api_timeout(&self) -> Result<Duration> {
        parse_duration(self.api.timeout.as_deref().unwrap_or("10s"))
    }

    pub fn api_resource(&self, resource: ResourceKind) -> &str {
        let configured = match resource {
            ResourceKind::Courses => self.api.resources.courses.as_deref(),
            ResourceKind::Instructors => self.api.resources.instructors.as_deref(),
            ResourceKind::Orders => self.api.resources.orders.as_deref(),
        };
        configured.unwrap_or(resource.as_str())
    }

    pub fn page_size(&self) -> usize {
        self.table.page_size.unwrap_or(DEFAULT_PAGE_SIZE)
    }

    pub fn cache_enabled(&self) -> bool {
        self.cache.enabled.unwrap_or(true)
    }

    pub fn cache_path(&self) -> Result<PathBuf> {
        match &self.cache.path {
            Some(path) => Ok(PathBuf::from(path)),
            None => coursemart_cache::default_cache_path(),
        }
    }

    pub fn cache_ttl(&self) -> Result<Duration> {
        match &self.cache.ttl {
            Some(ttl) => parse_duration(ttl),
            None => Ok(coursemart_cache::DEFAULT_TTL),
        }
    }

    pub fn log_filter(&self) -> &str {
        self.log.filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }

    pub fn log_file(&self) -> Option<PathBuf> {
        self.log.file.as_deref().map(PathBuf::from)
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# coursemart config\n# Place this file at: {}\n\nversion = 1\n\n[api]\nbase_url = \"{}\"\ntimeout = \"10s\"\n\n[api.resources]\n# Endpoint names relative to base_url.\ncourses = \"courses\"\ninstructors = \"instructors\"\norders = \"orders\"\n\n[table]\npage_size = {}\n\n[cache]\nenabled = true\n# Optional. Default is the platform cache dir (for example ~/.cache/coursemart/pages.db)\n# path = \"/absolute/path/to/pages.db\"\nttl = \"5m\"\n\n[log]\nfilter = \"{}\"\n# file = \"/absolute/path/to/coursemart.log\"\n\n# Chrome per path, first match wins. Omit to use the built-in marketplace map.\n# [[routes]]\n# pattern = \"/admin/*\"\n# sidebar = \"admin-full\"\n# header = \"dark\"\n# links = \"userType\"\n",
            path.display(),
            DEFAULT_API_BASE_URL,
            DEFAULT_PAGE_SIZE,
            DEFAULT_LOG_FILTER,
        )
    }
}

pub fn parse_duration(raw: &str) -> Result<Duration> {
    let raw = raw.trim();
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_secs(mins * 60));
    }
    if let Some(value) = raw.strip_suffix('h') {
        let hours: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_secs(hours * 60 * 60));
    }

    bail!(
        "invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m, <N>h (for example 500ms or 5m)"
    )
}
