//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::cache::PrecacheEntry;
use crate::strategy::StrategyKind;

/// Root configuration for the offline proxy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream origin the application is served from.
    pub upstream: UpstreamConfig,

    /// Timeout configuration for upstream fetches.
    pub timeouts: TimeoutConfig,

    /// Cache naming and persistence.
    pub cache: CacheConfig,

    /// Default strategy and strategy tuning.
    pub strategies: StrategiesConfig,

    /// Ordered URL routes; first match wins.
    pub routes: Vec<RouteConfig>,

    /// Offline fallback path prefixes.
    pub catch: CatchConfig,

    /// Precache manifest.
    pub precache: PrecacheConfig,

    /// Release metadata for the deployment built from this config.
    pub deployment: DeploymentConfig,

    /// URL asset search.
    pub search: SearchConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,

    /// Request limits.
    pub security: SecurityConfig,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            upstream: UpstreamConfig::default(),
            timeouts: TimeoutConfig::default(),
            cache: CacheConfig::default(),
            strategies: StrategiesConfig::default(),
            routes: default_routes(),
            catch: CatchConfig::default(),
            precache: PrecacheConfig::default(),
            deployment: DeploymentConfig::default(),
            search: SearchConfig::default(),
            observability: ObservabilityConfig::default(),
            admin: AdminConfig::default(),
            security: SecurityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Origin that origin-form request targets are resolved against.
    pub origin: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            origin: "http://127.0.0.1:3000".to_string(),
        }
    }
}

/// Timeout configuration for upstream fetches.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// Idle pooled connection timeout in seconds.
    pub idle_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
            idle_secs: 60,
        }
    }
}

/// Cache naming and persistence.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Prefix for cache names (`<prefix>-precache-v2`, `<prefix>-runtime`).
    pub name_prefix: String,

    /// Snapshot file loaded at startup and written at shutdown.
    pub persistence_path: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            name_prefix: "asset-link".to_string(),
            persistence_path: None,
        }
    }
}

/// Strategy settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StrategiesConfig {
    /// Strategy for requests no route matches.
    pub default: StrategyKind,

    /// Network-first serves the cache if the network takes longer than this.
    pub network_timeout_secs: Option<u64>,
}

impl Default for StrategiesConfig {
    fn default() -> Self {
        Self {
            default: StrategyKind::SkipCacheAware,
            network_timeout_secs: None,
        }
    }
}

/// Route configuration mapping a URL pattern to a strategy.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging/metrics.
    pub name: String,

    /// Regex tested against the absolute request URL.
    pub pattern: String,

    /// Strategy that handles matching requests.
    pub strategy: StrategyKind,
}

/// Built-in route table.
pub fn default_routes() -> Vec<RouteConfig> {
    vec![
        RouteConfig {
            name: "repo-json".to_string(),
            pattern: r"^https://.*\.repo\.json".to_string(),
            strategy: StrategyKind::SkipCacheAware,
        },
        RouteConfig {
            name: "alink-plugins".to_string(),
            pattern: r"^https://.*\.alink\..*".to_string(),
            strategy: StrategyKind::SkipCacheAware,
        },
        RouteConfig {
            name: "api".to_string(),
            pattern: r"^https?://.*/api".to_string(),
            strategy: StrategyKind::NetworkOnly,
        },
    ]
}

/// Offline fallback prefixes. Environment-specific; substitute at deploy time.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CatchConfig {
    /// Backend calls under this prefix always fail loudly.
    pub backend_prefix: String,

    /// Script/style prefixes served only from their own precache entries.
    pub static_prefixes: Vec<String>,

    /// In-app routes; resolved to the entry point when offline.
    pub app_prefix: String,

    /// Path of the single entry-point document.
    pub entry_point: String,
}

impl Default for CatchConfig {
    fn default() -> Self {
        Self {
            backend_prefix: "/alink/backend/".to_string(),
            static_prefixes: vec!["/alink/js/".to_string(), "/alink/css/".to_string()],
            app_prefix: "/alink/".to_string(),
            entry_point: "/alink/index.html".to_string(),
        }
    }
}

/// Precache manifest configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PrecacheConfig {
    /// JSON array of `{url, revision}` merged into `entries` at load time.
    pub manifest_path: Option<String>,

    /// Inline manifest entries.
    pub entries: Vec<PrecacheEntry>,
}

/// Deployment metadata.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DeploymentConfig {
    /// Release label reported by the admin API.
    pub release: String,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            release: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// URL asset search configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Enable `/admin/search`.
    pub enabled: bool,

    /// Asset lookup URL; `{id}` is replaced by the extracted id.
    pub resolver_url: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            resolver_url: "http://127.0.0.1:3000/api/asset/{id}".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum buffered request body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}
