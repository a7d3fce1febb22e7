//! Network-first: prefer fresh responses, fall back to cache on failure.

use std::time::Duration;

use crate::http::response::CachedResponse;
use crate::http::FetchRequest;
use crate::strategy::{StrategyContext, StrategyError, StrategyResult};

#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkFirst {
    /// Serve a cached entry if the network hasn't answered by then.
    network_timeout: Option<Duration>,
}

impl NetworkFirst {
    pub fn new(network_timeout: Option<Duration>) -> Self {
        Self { network_timeout }
    }

    pub async fn handle(
        &self,
        ctx: &StrategyContext,
        request: &FetchRequest,
    ) -> StrategyResult<CachedResponse> {
        let key = request.cache_key();
        let fetch = ctx.fetcher.fetch(request);
        tokio::pin!(fetch);

        if let Some(timeout) = self.network_timeout {
            tokio::select! {
                result = &mut fetch => return self.settle(ctx, request, &key, result).await,
                _ = tokio::time::sleep(timeout) => {
                    if let Some(hit) = ctx.store.lookup(&ctx.runtime_cache, &key).await {
                        tracing::debug!(url = %request.url, ?timeout, "Network slow, served from cache");
                        return Ok(hit);
                    }
                }
            }
        }

        let result = fetch.await;
        self.settle(ctx, request, &key, result).await
    }

    async fn settle(
        &self,
        ctx: &StrategyContext,
        request: &FetchRequest,
        key: &str,
        result: StrategyResult<CachedResponse>,
    ) -> StrategyResult<CachedResponse> {
        match result {
            Ok(response) => {
                super::cache_put(ctx, request, key, &response).await;
                Ok(response)
            }
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "Network failed, trying cache");
                ctx.store
                    .lookup(&ctx.runtime_cache, key)
                    .await
                    .ok_or_else(|| StrategyError::NoResponse {
                        url: request.url.to_string(),
                    })
            }
        }
    }
}
