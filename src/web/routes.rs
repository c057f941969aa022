//! Route matching on request paths.
//!
//! # Design Decisions
//! - Matching is plain string comparison, case-sensitive, no regex
//! - Prefix routes only match at a segment boundary unless the raw form is used
//! - A matched prefix route hands back the rest of the path

use axum::body::Body;
use axum::http::Request;

/// `path == route`.
pub fn match_exact_route(path: &str, route: &str) -> bool {
    path == route
}

/// Like [`match_exact_route`], ignoring one trailing slash on either side.
pub fn match_exact_route_ignore_slash(path: &str, route: &str) -> bool {
    trim_slash(path) == trim_slash(route)
}

fn trim_slash(s: &str) -> &str {
    s.strip_suffix('/').unwrap_or(s)
}

/// Matches `/a/b` and `/a/b/*`, returning the `*` part (empty for an exact hit).
pub fn match_simple_route<'a>(path: &'a str, route: &str) -> Option<&'a str> {
    if path == route {
        return Some("");
    }
    path.strip_prefix(route)?.strip_prefix('/')
}

/// Matches `/a/b{*}`, returning everything after the route including any
/// leading slash.
pub fn match_simple_route_raw<'a>(path: &'a str, route: &str) -> Option<&'a str> {
    path.strip_prefix(route)
}

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the request matches this condition.
    fn matches(&self, req: &Request<Body>) -> bool;
}

/// A route pattern in one of the supported forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Exact(String),
    ExactIgnoreSlash(String),
    Simple(String),
    SimpleRaw(String),
}

impl Route {
    pub fn exact(route: impl Into<String>) -> Self {
        Route::Exact(route.into())
    }

    pub fn exact_ignore_slash(route: impl Into<String>) -> Self {
        Route::ExactIgnoreSlash(route.into())
    }

    pub fn simple(route: impl Into<String>) -> Self {
        Route::Simple(route.into())
    }

    pub fn simple_raw(route: impl Into<String>) -> Self {
        Route::SimpleRaw(route.into())
    }

    /// The unmatched tail of `path`, or `None` when the route does not match.
    /// Exact routes yield an empty tail.
    pub fn remainder<'a>(&self, path: &'a str) -> Option<&'a str> {
        match self {
            Route::Exact(route) => match_exact_route(path, route).then_some(""),
            Route::ExactIgnoreSlash(route) => match_exact_route_ignore_slash(path, route).then_some(""),
            Route::Simple(route) => match_simple_route(path, route),
            Route::SimpleRaw(route) => match_simple_route_raw(path, route),
        }
    }
}

impl Matcher for Route {
    fn matches(&self, req: &Request<Body>) -> bool {
        self.remainder(req.uri().path()).is_some()
    }
}
