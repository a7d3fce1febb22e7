//! Route matching logic.
//!
//! # Responsibilities
//! - Match the full request URL against a regular expression
//! - Match the URL path against a prefix (case-sensitive)
//!
//! # Design Decisions
//! - Regexes are compiled once when a deployment is built
//! - URL patterns see the absolute URL, so they can constrain the scheme
//! - Path matching is case-sensitive

use regex::Regex;

use crate::http::FetchRequest;

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the request matches this condition.
    fn matches(&self, req: &FetchRequest) -> bool;
}

/// Matches the absolute request URL against a regex.
#[derive(Debug, Clone)]
pub struct UrlPatternMatcher {
    pattern: Regex,
}

impl UrlPatternMatcher {
    /// Compile a new URL matcher.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
        })
    }

    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }
}

impl Matcher for UrlPatternMatcher {
    fn matches(&self, req: &FetchRequest) -> bool {
        self.pattern.is_match(req.url.as_str())
    }
}

/// Matches the request path prefix.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn matches_path(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }
}

impl Matcher for PathPrefixMatcher {
    fn matches(&self, req: &FetchRequest) -> bool {
        self.matches_path(req.url.path())
    }
}
