//! Skip-cache-aware: cache-first unless the request opts out via `X-Skip-Cache`.

use crate::http::response::CachedResponse;
use crate::http::FetchRequest;
use crate::strategy::{CacheFirst, NetworkFirst, StrategyContext, StrategyResult};

#[derive(Debug, Clone, Copy, Default)]
pub struct SkipCacheAware {
    cache_first: CacheFirst,
    network_first: NetworkFirst,
}

impl SkipCacheAware {
    pub fn new(network_first: NetworkFirst) -> Self {
        Self {
            cache_first: CacheFirst,
            network_first,
        }
    }

    /// Decided before any I/O; errors come from the delegate unchanged.
    pub async fn handle(
        &self,
        ctx: &StrategyContext,
        request: &FetchRequest,
    ) -> StrategyResult<CachedResponse> {
        if request.skips_cache() {
            tracing::debug!(url = %request.url, "X-Skip-Cache set, using network-first");
            self.network_first.handle(ctx, request).await
        } else {
            self.cache_first.handle(ctx, request).await
        }
    }
}
