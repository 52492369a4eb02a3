// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use thiserror::Error;

/// Route configuration problems. All of them are raised while the route
/// table is built; matching itself never fails.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("route pattern must not be empty")]
    Empty,

    #[error("route pattern {0:?} must start with `/`")]
    MissingLeadingSlash(String),

    #[error("route pattern is {length} bytes; the limit is {limit}")]
    TooLong { length: usize, limit: usize },

    #[error("route pattern {0:?} has an empty path segment")]
    EmptySegment(String),

    #[error("route pattern {0:?} has unbalanced `[` `]` brackets")]
    UnbalancedBracket(String),

    #[error("route pattern {0:?} has an empty `[]` parameter")]
    EmptyParam(String),

    #[error(
        "route pattern {pattern:?} has an invalid parameter name {name:?}; use letters, digits, `_` or `-`"
    )]
    InvalidParamName { pattern: String, name: String },

    #[error("route pattern {pattern:?} repeats parameter {name:?}")]
    DuplicateParam { pattern: String, name: String },

    #[error(
        "route pattern {0:?} mixes a `[param]` with literal text; a parameter must fill the whole segment"
    )]
    PartialSegmentParam(String),

    #[error("route pattern {0:?} uses `*` outside a trailing `/*` segment")]
    MisplacedWildcard(String),

    #[error("route pattern {0:?} is declared more than once")]
    Duplicate(String),

    #[error("route pattern {pattern:?} does not compile")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}
