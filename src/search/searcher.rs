//! Finds assets by recognizing asset URLs pasted into the search box.

use futures_util::future::BoxFuture;
use futures_util::stream::{FusedStream, Stream};
use futures_util::FutureExt;
use regex::Regex;
use std::pin::Pin;
use std::sync::{Arc, OnceLock};
use std::task::{Context, Poll};

use crate::search::resolver::AssetResolver;
use crate::search::types::{AssetRef, SearchRequest, SearchResult};

fn asset_url_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"https?://.*/asset/(\d+)").expect("static regex"))
}

/// Searcher for terms shaped like `http(s)://.../asset/<id>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlAssetSearcher;

impl UrlAssetSearcher {
    /// Start a search, or `None` if the request is not an asset URL search.
    pub fn search_assets(
        &self,
        resolver: Arc<dyn AssetResolver>,
        request: &SearchRequest,
    ) -> Option<AssetResults> {
        let SearchRequest::TextSearch { term: Some(term) } = request else {
            return None;
        };
        let id = extract_asset_id(term)?;
        tracing::debug!(id, "Search term is an asset URL");
        Some(AssetResults::new(resolver, id))
    }
}

/// Asset id from the first asset URL in `term`.
pub fn extract_asset_id(term: &str) -> Option<u64> {
    if term.is_empty() {
        return None;
    }
    asset_url_pattern()
        .captures(term)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Lazy, single-use stream of at most one result.
///
/// Resolution starts on the first poll. Once the stream has ended it stays
/// ended; a new search needs a new `AssetResults`.
pub struct AssetResults {
    id: u64,
    pending: Option<BoxFuture<'static, Option<AssetRef>>>,
}

impl AssetResults {
    fn new(resolver: Arc<dyn AssetResolver>, id: u64) -> Self {
        let pending = async move { resolver.resolve_asset(id).await }.boxed();
        Self {
            id,
            pending: Some(pending),
        }
    }

    pub fn asset_id(&self) -> u64 {
        self.id
    }
}

impl Stream for AssetResults {
    type Item = SearchResult;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let Some(pending) = this.pending.as_mut() else {
            return Poll::Ready(None);
        };

        match pending.poll_unpin(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(asset) => {
                this.pending = None;
                Poll::Ready(asset.map(|asset| SearchResult {
                    weight: 0,
                    weight_text: format!("Asset with id={}", this.id),
                    asset,
                }))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.pending {
            Some(_) => (0, Some(1)),
            None => (0, Some(0)),
        }
    }
}

impl FusedStream for AssetResults {
    fn is_terminated(&self) -> bool {
        self.pending.is_none()
    }
}
