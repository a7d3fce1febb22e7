//! Network-only: never consults or populates a cache.

use crate::http::response::CachedResponse;
use crate::http::FetchRequest;
use crate::strategy::{StrategyContext, StrategyResult};

#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkOnly;

impl NetworkOnly {
    pub async fn handle(
        &self,
        ctx: &StrategyContext,
        request: &FetchRequest,
    ) -> StrategyResult<CachedResponse> {
        ctx.fetcher.fetch(request).await
    }
}
