//! Cache-first: serve from cache, populate it from the network on a miss.

use crate::http::response::CachedResponse;
use crate::http::FetchRequest;
use crate::strategy::{StrategyContext, StrategyResult};

#[derive(Debug, Clone, Copy, Default)]
pub struct CacheFirst;

impl CacheFirst {
    pub async fn handle(
        &self,
        ctx: &StrategyContext,
        request: &FetchRequest,
    ) -> StrategyResult<CachedResponse> {
        let key = request.cache_key();
        if let Some(hit) = ctx.store.lookup(&ctx.runtime_cache, &key).await {
            tracing::debug!(url = %request.url, "Served from cache");
            return Ok(hit);
        }

        let response = ctx.fetcher.fetch(request).await?;
        super::cache_put(ctx, request, &key, &response).await;
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::test_support::{context, URL};
    use crate::strategy::StrategyError;

    #[tokio::test]
    async fn test_miss_fetches_and_populates() {
        let (ctx, fetcher) = context();
        fetcher.respond(URL, CachedResponse::new(200, "v1"));
        let request = FetchRequest::parse(URL).unwrap();

        let first = CacheFirst.handle(&ctx, &request).await.unwrap();
        assert_eq!(first.body, b"v1");

        fetcher.respond(URL, CachedResponse::new(200, "v2"));
        let second = CacheFirst.handle(&ctx, &request).await.unwrap();
        assert_eq!(second.body, b"v1");
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_error_status_not_cached() {
        let (ctx, fetcher) = context();
        fetcher.respond(URL, CachedResponse::new(500, "boom"));
        let request = FetchRequest::parse(URL).unwrap();

        let response = CacheFirst.handle(&ctx, &request).await.unwrap();
        assert_eq!(response.status, 500);
        assert!(ctx.store.lookup(&ctx.runtime_cache, URL).await.is_none());
    }

    #[tokio::test]
    async fn test_offline_miss_propagates_network_error() {
        let (ctx, fetcher) = context();
        fetcher.set_offline(true);
        let request = FetchRequest::parse(URL).unwrap();

        let err = CacheFirst.handle(&ctx, &request).await.unwrap_err();
        assert!(matches!(err, StrategyError::Network { .. }));
    }
}
