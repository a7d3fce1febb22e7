//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Compile-check route patterns
//! - Validate path prefixes and the upstream origin
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("upstream origin {0:?} is not an absolute http(s) URL")]
    InvalidOrigin(String),

    #[error("route {route}: invalid pattern: {reason}")]
    InvalidPattern { route: String, reason: String },

    #[error("duplicate route name {0:?}")]
    DuplicateRoute(String),

    #[error("{field} {value:?} must start with '/'")]
    RelativePrefix { field: &'static str, value: String },

    #[error("entry point {entry:?} is outside app prefix {app:?}")]
    EntryPointOutsideApp { entry: String, app: String },

    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),

    #[error("{field} {value:?} is not a socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("precache entry {0:?} does not resolve against the origin")]
    InvalidPrecacheUrl(String),

    #[error("search resolver_url {0:?} has no {{id}} placeholder")]
    ResolverMissingId(String),

    #[error("cache name_prefix must not be empty")]
    EmptyCachePrefix,
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let origin = Url::parse(&config.upstream.origin)
        .ok()
        .filter(|u| matches!(u.scheme(), "http" | "https"));
    if origin.is_none() {
        errors.push(ValidationError::InvalidOrigin(config.upstream.origin.clone()));
    }

    let mut names = HashSet::new();
    for route in &config.routes {
        if !names.insert(route.name.as_str()) {
            errors.push(ValidationError::DuplicateRoute(route.name.clone()));
        }
        if let Err(e) = regex::Regex::new(&route.pattern) {
            errors.push(ValidationError::InvalidPattern {
                route: route.name.clone(),
                reason: e.to_string(),
            });
        }
    }

    let catch = &config.catch;
    let prefixes = [
        ("catch.backend_prefix", &catch.backend_prefix),
        ("catch.app_prefix", &catch.app_prefix),
        ("catch.entry_point", &catch.entry_point),
    ];
    for (field, value) in prefixes
        .into_iter()
        .chain(catch.static_prefixes.iter().map(|p| ("catch.static_prefixes", p)))
    {
        if !value.starts_with('/') {
            errors.push(ValidationError::RelativePrefix {
                field,
                value: value.clone(),
            });
        }
    }
    if !catch.entry_point.starts_with(&catch.app_prefix) {
        errors.push(ValidationError::EntryPointOutsideApp {
            entry: catch.entry_point.clone(),
            app: catch.app_prefix.clone(),
        });
    }

    if let Some(origin) = &origin {
        for entry in &config.precache.entries {
            if origin.join(&entry.url).is_err() {
                errors.push(ValidationError::InvalidPrecacheUrl(entry.url.clone()));
            }
        }
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroValue("timeouts.connect_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroValue("timeouts.request_secs"));
    }
    if config.strategies.network_timeout_secs == Some(0) {
        errors.push(ValidationError::ZeroValue("strategies.network_timeout_secs"));
    }
    if config.security.max_body_size == 0 {
        errors.push(ValidationError::ZeroValue("security.max_body_size"));
    }

    if config.cache.name_prefix.is_empty() {
        errors.push(ValidationError::EmptyCachePrefix);
    }

    let mut addresses = vec![("listener.bind_address", &config.listener.bind_address)];
    if config.admin.enabled {
        addresses.push(("admin.bind_address", &config.admin.bind_address));
    }
    if config.observability.metrics_enabled {
        addresses.push(("observability.metrics_address", &config.observability.metrics_address));
    }
    for (field, value) in addresses {
        if value.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::InvalidAddress {
                field,
                value: value.clone(),
            });
        }
    }

    if config.search.enabled && !config.search.resolver_url.contains("{id}") {
        errors.push(ValidationError::ResolverMissingId(config.search.resolver_url.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::RouteConfig;
    use crate::strategy::StrategyKind;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&ProxyConfig::default()), Ok(()));
    }

    #[test]
    fn test_reports_every_error() {
        let mut config = ProxyConfig::default();
        config.upstream.origin = "farm.example.com".into();
        config.routes.push(RouteConfig {
            name: "api".into(),
            pattern: "(".into(),
            strategy: StrategyKind::NetworkOnly,
        });
        config.catch.static_prefixes.push("alink/img/".into());
        config.timeouts.request_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::InvalidOrigin("farm.example.com".into())));
        assert!(errors.contains(&ValidationError::DuplicateRoute("api".into())));
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::InvalidPattern { route, .. } if route == "api")));
        assert!(errors.contains(&ValidationError::RelativePrefix {
            field: "catch.static_prefixes",
            value: "alink/img/".into(),
        }));
        assert!(errors.contains(&ValidationError::ZeroValue("timeouts.request_secs")));
        assert_eq!(errors.len(), 5);
    }

    #[test]
    fn test_entry_point_must_live_under_app_prefix() {
        let mut config = ProxyConfig::default();
        config.catch.entry_point = "/index.html".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ValidationError::EntryPointOutsideApp { .. }));
    }

    #[test]
    fn test_search_requires_placeholder() {
        let mut config = ProxyConfig::default();
        config.search.enabled = true;
        config.search.resolver_url = "https://farm.example.com/api/asset".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::ResolverMissingId(
                "https://farm.example.com/api/asset".into()
            )]
        );
    }
}
