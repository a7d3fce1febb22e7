//! Caching strategy subsystem.
//!
//! # Data Flow
//! ```text
//! HandlerInput (event | request | url string)
//!     → normalized FetchRequest
//!     → Strategy variant
//!         cache_first.rs    cache → network (populate)
//!         network_first.rs  network (populate) → cache
//!         network_only.rs   network
//!         skip_cache.rs     X-Skip-Cache ? network-first : cache-first
//!     → CachedResponse or StrategyError
//! ```
//!
//! # Design Decisions
//! - Closed set of variants selected by configuration, no trait objects
//! - Only `200` responses to `GET` requests are written to the runtime cache
//! - Strategies never retry; failures surface to the router

pub mod cache_first;
pub mod network_first;
pub mod network_only;
pub mod skip_cache;
pub mod types;

use axum::http::Method;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use cache_first::CacheFirst;
pub use network_first::NetworkFirst;
pub use network_only::NetworkOnly;
pub use skip_cache::SkipCacheAware;
pub use types::{StrategyContext, StrategyError, StrategyResult};

use crate::http::response::CachedResponse;
use crate::http::{FetchRequest, HandlerInput};
use crate::observability::metrics;

/// Strategy names as written in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    CacheFirst,
    NetworkFirst,
    NetworkOnly,
    SkipCacheAware,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::CacheFirst => "cache-first",
            StrategyKind::NetworkFirst => "network-first",
            StrategyKind::NetworkOnly => "network-only",
            StrategyKind::SkipCacheAware => "skip-cache-aware",
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A configured strategy instance.
#[derive(Debug, Clone, Copy)]
pub enum Strategy {
    CacheFirst(CacheFirst),
    NetworkFirst(NetworkFirst),
    NetworkOnly(NetworkOnly),
    SkipCacheAware(SkipCacheAware),
}

impl Strategy {
    /// Instantiate a strategy of `kind`.
    pub fn from_kind(kind: StrategyKind, network_timeout: Option<Duration>) -> Self {
        let network_first = NetworkFirst::new(network_timeout);
        match kind {
            StrategyKind::CacheFirst => Strategy::CacheFirst(CacheFirst),
            StrategyKind::NetworkFirst => Strategy::NetworkFirst(network_first),
            StrategyKind::NetworkOnly => Strategy::NetworkOnly(NetworkOnly),
            StrategyKind::SkipCacheAware => {
                Strategy::SkipCacheAware(SkipCacheAware::new(network_first))
            }
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::CacheFirst(_) => StrategyKind::CacheFirst,
            Strategy::NetworkFirst(_) => StrategyKind::NetworkFirst,
            Strategy::NetworkOnly(_) => StrategyKind::NetworkOnly,
            Strategy::SkipCacheAware(_) => StrategyKind::SkipCacheAware,
        }
    }

    /// Normalize `input` and produce a response.
    pub async fn handle(
        &self,
        ctx: &StrategyContext,
        input: impl Into<HandlerInput>,
    ) -> StrategyResult<CachedResponse> {
        let request = input.into().into_request()?;
        self.handle_request(ctx, &request).await
    }

    /// Produce a response for an already normalized request.
    pub async fn handle_request(
        &self,
        ctx: &StrategyContext,
        request: &FetchRequest,
    ) -> StrategyResult<CachedResponse> {
        let result = match self {
            Strategy::CacheFirst(s) => s.handle(ctx, request).await,
            Strategy::NetworkFirst(s) => s.handle(ctx, request).await,
            Strategy::NetworkOnly(s) => s.handle(ctx, request).await,
            Strategy::SkipCacheAware(s) => s.handle(ctx, request).await,
        };
        metrics::record_strategy_outcome(self.kind().as_str(), result.is_ok());
        result
    }
}

/// Write a fetched response to the runtime cache if it qualifies.
async fn cache_put(
    ctx: &StrategyContext,
    request: &FetchRequest,
    key: &str,
    response: &CachedResponse,
) {
    if request.method == Method::GET && response.is_cacheable() {
        ctx.store
            .put(&ctx.runtime_cache, key, response.clone())
            .await;
    }
}
