// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Compilation of route patterns into anchored regular expressions.
//!
//! Pattern syntax:
//! - `/admin/plans` matches that exact path
//! - `/courses/[slug]` matches exactly one segment in place of `[slug]`
//! - `/admin/*` matches `/admin` itself and anything below it
//!
//! Paths are compared after trailing-slash normalization, so patterns are
//! normalized the same way.

use crate::RouteError;
use regex::{Regex, RegexBuilder};

pub const MAX_PATTERN_LENGTH: usize = 1024;

const MAX_REGEX_SIZE: usize = 1 << 20;
const WILDCARD_SUFFIX: &str = "/*";
const SEGMENT_CAPTURE: &str = "([^/]+)";
const SUBPATH_CAPTURE: &str = "(?:/.*)?";
const SAMPLE_CHILD: &str = "[*]";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

#[derive(Debug, Clone)]
pub struct CompiledPattern {
    source: String,
    normalized: String,
    regex: Regex,
    segments: Vec<Segment>,
    wildcard: bool,
}

impl CompiledPattern {
    pub fn new(pattern: &str) -> Result<Self, RouteError> {
        if pattern.is_empty() {
            return Err(RouteError::Empty);
        }
        if pattern.len() > MAX_PATTERN_LENGTH {
            return Err(RouteError::TooLong {
                length: pattern.len(),
                limit: MAX_PATTERN_LENGTH,
            });
        }
        if !pattern.starts_with('/') {
            return Err(RouteError::MissingLeadingSlash(pattern.to_owned()));
        }

        let (body, wildcard) = match pattern.strip_suffix(WILDCARD_SUFFIX) {
            Some(body) => (body, true),
            None => (pattern.trim_end_matches('/'), false),
        };

        let segments = parse_segments(pattern, body)?;
        let regex_source = regex_source(&segments, wildcard);
        let regex = RegexBuilder::new(&regex_source)
            .size_limit(MAX_REGEX_SIZE)
            .build()
            .map_err(|source| RouteError::Regex {
                pattern: pattern.to_owned(),
                source,
            })?;

        let mut normalized = if body.is_empty() {
            "/".to_owned()
        } else {
            body.to_owned()
        };
        if wildcard {
            normalized = format!("{}{WILDCARD_SUFFIX}", normalized.trim_end_matches('/'));
        }

        Ok(Self {
            source: pattern.to_owned(),
            normalized,
            regex,
            segments,
            wildcard,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// The pattern with redundant trailing slashes removed; two spellings
    /// of the same route share this form.
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    pub fn is_exact(&self) -> bool {
        !self.wildcard
            && self
                .segments
                .iter()
                .all(|segment| matches!(segment, Segment::Literal(_)))
    }

    pub fn param_names(&self) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Param(name) => Some(name.as_str()),
                Segment::Literal(_) => None,
            })
            .collect()
    }

    /// Matches an already-normalized path.
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    /// Matches an already-normalized path and returns the `[param]` values
    /// in declaration order.
    pub fn captures(&self, path: &str) -> Option<Vec<(String, String)>> {
        let captures = self.regex.captures(path)?;
        let values = self
            .param_names()
            .into_iter()
            .zip(captures.iter().skip(1))
            .filter_map(|(name, value)| value.map(|m| (name.to_owned(), m.as_str().to_owned())))
            .collect();
        Some(values)
    }

    /// Concrete paths that together stand for everything this pattern
    /// matches. Params become `[name]` and wildcards add one- and
    /// two-segment children as `[*]`; bracketed segments can never be
    /// literals, so only a param or wildcard in another pattern matches
    /// them.
    pub fn sample_paths(&self) -> Vec<String> {
        let mut base = String::new();
        for segment in &self.segments {
            base.push('/');
            match segment {
                Segment::Literal(text) => base.push_str(text),
                Segment::Param(name) => {
                    base.push('[');
                    base.push_str(name);
                    base.push(']');
                }
            }
        }

        let mut samples = vec![if base.is_empty() {
            "/".to_owned()
        } else {
            base.clone()
        }];
        if self.wildcard {
            samples.push(format!("{base}/{SAMPLE_CHILD}"));
            samples.push(format!("{base}/{SAMPLE_CHILD}/{SAMPLE_CHILD}"));
        }
        samples
    }

    /// Whether every sample path of `other` matches this pattern, so a
    /// later `other` can never be reached.
    pub fn covers(&self, other: &CompiledPattern) -> bool {
        other
            .sample_paths()
            .iter()
            .all(|sample| self.is_match(sample))
    }
}

impl std::fmt::Display for CompiledPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

fn parse_segments(pattern: &str, body: &str) -> Result<Vec<Segment>, RouteError> {
    let Some(rest) = body.strip_prefix('/') else {
        // `/*` leaves an empty body: the wildcard covers the whole tree.
        return Ok(Vec::new());
    };
    if rest.is_empty() {
        return Ok(Vec::new());
    }

    let mut segments = Vec::new();
    let mut names: Vec<String> = Vec::new();
    for raw in rest.split('/') {
        if raw.is_empty() {
            return Err(RouteError::EmptySegment(pattern.to_owned()));
        }
        if raw.contains('*') {
            return Err(RouteError::MisplacedWildcard(pattern.to_owned()));
        }
        if !raw.contains(['[', ']']) {
            segments.push(Segment::Literal(raw.to_owned()));
            continue;
        }

        let inner = raw
            .strip_prefix('[')
            .and_then(|value| value.strip_suffix(']'))
            .filter(|inner| !inner.contains(['[', ']']));
        let Some(name) = inner else {
            if raw.matches('[').count() != raw.matches(']').count() {
                return Err(RouteError::UnbalancedBracket(pattern.to_owned()));
            }
            return Err(RouteError::PartialSegmentParam(pattern.to_owned()));
        };

        if name.is_empty() {
            return Err(RouteError::EmptyParam(pattern.to_owned()));
        }
        if !name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
        {
            return Err(RouteError::InvalidParamName {
                pattern: pattern.to_owned(),
                name: name.to_owned(),
            });
        }
        if names.iter().any(|existing| existing == name) {
            return Err(RouteError::DuplicateParam {
                pattern: pattern.to_owned(),
                name: name.to_owned(),
            });
        }
        names.push(name.to_owned());
        segments.push(Segment::Param(name.to_owned()));
    }
    Ok(segments)
}

fn regex_source(segments: &[Segment], wildcard: bool) -> String {
    let mut source = String::from("^");
    for segment in segments {
        source.push('/');
        match segment {
            Segment::Literal(text) => source.push_str(&regex::escape(text)),
            Segment::Param(_) => source.push_str(SEGMENT_CAPTURE),
        }
    }
    if wildcard {
        source.push_str(SUBPATH_CAPTURE);
    } else if segments.is_empty() {
        source.push('/');
    }
    source.push('$');
    source
}

#[cfg(test)]
mod tests {
    use super::{CompiledPattern, regex_source};
    use crate::RouteError;

    #[test]
    fn exact_pattern_matches_only_itself() {
        let pattern = CompiledPattern::new("/admin/plans").expect("valid pattern");
        assert!(pattern.is_exact());
        assert!(pattern.is_match("/admin/plans"));
        assert!(!pattern.is_match("/admin/plans/1"));
        assert!(!pattern.is_match("/admin"));
    }

    #[test]
    fn trailing_slash_in_pattern_is_normalized() {
        let pattern = CompiledPattern::new("/admin/plans/").expect("valid pattern");
        assert!(pattern.is_match("/admin/plans"));
    }

    #[test]
    fn param_matches_a_single_segment() {
        let pattern = CompiledPattern::new("/courses/[slug]").expect("valid pattern");
        assert!(!pattern.is_exact());
        assert!(pattern.is_match("/courses/rust-101"));
        assert!(!pattern.is_match("/courses"));
        assert!(!pattern.is_match("/courses/rust-101/reviews"));
        assert_eq!(
            pattern.captures("/courses/rust-101"),
            Some(vec![("slug".to_owned(), "rust-101".to_owned())]),
        );
    }

    #[test]
    fn wildcard_matches_prefix_and_subpaths() {
        let pattern = CompiledPattern::new("/admin/*").expect("valid pattern");
        assert!(pattern.is_wildcard());
        assert!(pattern.is_match("/admin"));
        assert!(pattern.is_match("/admin/plans"));
        assert!(pattern.is_match("/admin/plans/edit/1"));
        assert!(!pattern.is_match("/administrator"));
        assert!(!pattern.is_match("/"));
    }

    #[test]
    fn root_patterns() {
        let root = CompiledPattern::new("/").expect("valid pattern");
        assert!(root.is_match("/"));
        assert!(!root.is_match("/courses"));

        let everything = CompiledPattern::new("/*").expect("valid pattern");
        assert!(everything.is_match("/"));
        assert!(everything.is_match("/courses/rust-101"));
    }

    #[test]
    fn regex_metacharacters_in_literals_are_escaped() {
        let pattern = CompiledPattern::new("/pricing.v2/(beta)").expect("valid pattern");
        assert!(pattern.is_match("/pricing.v2/(beta)"));
        assert!(!pattern.is_match("/pricingXv2/(beta)"));
        assert_eq!(regex_source(&[], false), "^/$");
    }

    #[test]
    fn params_and_wildcard_combine() {
        let pattern = CompiledPattern::new("/courses/[slug]/learn/*").expect("valid pattern");
        assert!(pattern.is_match("/courses/rust-101/learn"));
        assert!(pattern.is_match("/courses/rust-101/learn/lesson/4"));
        assert_eq!(pattern.param_names(), vec!["slug"]);
        assert_eq!(
            pattern.sample_paths(),
            vec![
                "/courses/[slug]/learn",
                "/courses/[slug]/learn/[*]",
                "/courses/[slug]/learn/[*]/[*]",
            ],
        );
    }

    #[test]
    fn coverage_needs_every_sample_path() {
        let exact = CompiledPattern::new("/checkout").expect("valid pattern");
        let wildcard = CompiledPattern::new("/checkout/*").expect("valid pattern");
        let step = CompiledPattern::new("/checkout/[step]").expect("valid pattern");
        assert!(!exact.covers(&wildcard));
        assert!(!step.covers(&wildcard));
        assert!(wildcard.covers(&exact));
        assert!(wildcard.covers(&step));

        let literal = CompiledPattern::new("/courses/slug").expect("valid pattern");
        let param = CompiledPattern::new("/courses/[slug]").expect("valid pattern");
        assert!(!literal.covers(&param));
        assert!(param.covers(&literal));

        let everything = CompiledPattern::new("/*").expect("valid pattern");
        let root = CompiledPattern::new("/").expect("valid pattern");
        assert!(everything.covers(&root));
        assert!(!root.covers(&everything));
    }

    #[test]
    fn malformed_patterns_are_rejected() {
        assert!(matches!(CompiledPattern::new(""), Err(RouteError::Empty)));
        assert!(matches!(
            CompiledPattern::new("admin"),
            Err(RouteError::MissingLeadingSlash(_))
        ));
        assert!(matches!(
            CompiledPattern::new("/admin//plans"),
            Err(RouteError::EmptySegment(_))
        ));
        assert!(matches!(
            CompiledPattern::new("/courses/[slug"),
            Err(RouteError::UnbalancedBracket(_))
        ));
        assert!(matches!(
            CompiledPattern::new("/courses/[]"),
            Err(RouteError::EmptyParam(_))
        ));
        assert!(matches!(
            CompiledPattern::new("/courses/id-[id]"),
            Err(RouteError::PartialSegmentParam(_))
        ));
        assert!(matches!(
            CompiledPattern::new("/courses/[a b]"),
            Err(RouteError::InvalidParamName { .. })
        ));
        assert!(matches!(
            CompiledPattern::new("/a/[id]/b/[id]"),
            Err(RouteError::DuplicateParam { .. })
        ));
        assert!(matches!(
            CompiledPattern::new("/admin/*/edit"),
            Err(RouteError::MisplacedWildcard(_))
        ));
        assert!(matches!(
            CompiledPattern::new("/admin*"),
            Err(RouteError::MisplacedWildcard(_))
        ));
        let long = format!("/{}", "a".repeat(super::MAX_PATTERN_LENGTH));
        assert!(matches!(
            CompiledPattern::new(&long),
            Err(RouteError::TooLong { .. })
        ));
    }
}
