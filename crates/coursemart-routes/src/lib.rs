// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Route-to-chrome resolution.
//!
//! A [`RouteTable`] holds an ordered list of [`RoutePattern`]s compiled
//! once at startup. Resolution walks the list in declaration order and the
//! first pattern that fully matches the normalized path wins; there is no
//! specificity ranking, so specific patterns must be listed before broader
//! wildcards.

mod error;
pub mod pattern;

pub use error::RouteError;
pub use pattern::CompiledPattern;

use coursemart_app::{
    ChromeLayout, HeaderType, LayoutResolver, LinksType, SideBarType, normalize_path,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutePattern {
    pub pattern: String,
    #[serde(default = "default_sidebar", alias = "sideBarType")]
    pub sidebar: SideBarType,
    #[serde(default = "default_header", alias = "headerType")]
    pub header: HeaderType,
    #[serde(default = "default_links", alias = "linksType")]
    pub links: LinksType,
}

fn default_sidebar() -> SideBarType {
    SideBarType::None
}

fn default_header() -> HeaderType {
    HeaderType::None
}

fn default_links() -> LinksType {
    LinksType::Default
}

impl RoutePattern {
    pub fn new(
        pattern: impl Into<String>,
        sidebar: SideBarType,
        header: HeaderType,
        links: LinksType,
    ) -> Self {
        Self {
            pattern: pattern.into(),
            sidebar,
            header,
            links,
        }
    }

    pub const fn layout(&self) -> ChromeLayout {
        ChromeLayout::new(self.sidebar, self.header, self.links)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    pub route: &'a RoutePattern,
    /// `[param]` values in declaration order.
    pub params: Vec<(String, String)>,
}

impl RouteMatch<'_> {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<(RoutePattern, CompiledPattern)>,
}

impl RouteTable {
    /// Validates and compiles every pattern. Malformed or duplicated
    /// patterns fail here so that matching never has to.
    pub fn new(routes: Vec<RoutePattern>) -> Result<Self, RouteError> {
        let mut seen = BTreeSet::new();
        let mut compiled: Vec<(RoutePattern, CompiledPattern)> = Vec::with_capacity(routes.len());
        for route in routes {
            let pattern = CompiledPattern::new(&route.pattern)?;
            if !seen.insert(pattern.normalized().to_owned()) {
                return Err(RouteError::Duplicate(route.pattern));
            }
            compiled.push((route, pattern));
        }

        let table = Self { routes: compiled };
        for (route, earlier) in table.shadowed_routes() {
            tracing::warn!(
                pattern = %route.pattern,
                shadowed_by = %earlier.pattern,
                "route pattern is shadowed by an earlier entry; list specific patterns first"
            );
        }
        tracing::debug!(routes = table.len(), "route table compiled");
        Ok(table)
    }

    /// Routes no path can reach, each paired with the earlier entry that
    /// covers it.
    pub fn shadowed_routes(&self) -> Vec<(&RoutePattern, &RoutePattern)> {
        self.routes
            .iter()
            .enumerate()
            .filter_map(|(index, (route, pattern))| {
                self.routes[..index]
                    .iter()
                    .find(|(_, earlier)| earlier.covers(pattern))
                    .map(|(earlier, _)| (route, earlier))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn routes(&self) -> impl Iterator<Item = &RoutePattern> {
        self.routes.iter().map(|(route, _)| route)
    }

    /// First pattern, in declaration order, that fully matches `path`.
    pub fn match_path(&self, path: &str) -> Option<&RoutePattern> {
        let path = normalize_path(path);
        self.routes
            .iter()
            .find(|(_, compiled)| compiled.is_match(&path))
            .map(|(route, _)| route)
    }

    pub fn resolve(&self, path: &str) -> Option<RouteMatch<'_>> {
        let path = normalize_path(path);
        self.routes.iter().find_map(|(route, compiled)| {
            compiled
                .captures(&path)
                .map(|params| RouteMatch { route, params })
        })
    }
}

impl LayoutResolver for RouteTable {
    fn layout_for(&self, path: &str) -> ChromeLayout {
        self.match_path(path)
            .map(RoutePattern::layout)
            .unwrap_or(ChromeLayout::FALLBACK)
    }
}

/// Built-in chrome map for the marketplace surfaces, ordered from most to
/// least specific.
pub fn marketplace_routes() -> Vec<RoutePattern> {
    use HeaderType as H;
    use LinksType as L;
    use SideBarType as S;

    vec![
        RoutePattern::new("/", S::None, H::Home, L::Default),
        RoutePattern::new("/login", S::None, H::Minimal, L::Default),
        RoutePattern::new("/signup", S::None, H::Minimal, L::Default),
        RoutePattern::new("/forgot-password", S::None, H::Minimal, L::Default),
        RoutePattern::new("/courses", S::None, H::Full, L::Default),
        RoutePattern::new("/courses/[slug]/learn/*", S::Minimal, H::Minimal, L::UserType),
        RoutePattern::new("/courses/[slug]", S::None, H::Transparent, L::Default),
        RoutePattern::new("/checkout/*", S::None, H::Centered, L::Default),
        RoutePattern::new("/instructor/courses/[id]/edit", S::Minimal, H::Minimal, L::UserType),
        RoutePattern::new("/instructor/*", S::Full, H::Full, L::UserType),
        RoutePattern::new("/admin/plans", S::AdminMinimal, H::Dark, L::UserType),
        RoutePattern::new("/admin/*", S::AdminFull, H::Dark, L::UserType),
        RoutePattern::new("/account/*", S::Full, H::Full, L::UserType),
    ]
}
