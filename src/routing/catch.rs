//! Offline fallback for requests no route could serve.
//!
//! # Policy (first match wins)
//! ```text
//! backend prefix      → network error (never stale backend data)
//! static prefixes     → precached copy of that exact asset, else network error
//! application prefix  → precached entry-point document (SPA deep links)
//! anything else       → network error
//! ```

use crate::cache::Precache;
use crate::config::CatchConfig;
use crate::http::response::Reply;
use crate::http::FetchRequest;
use crate::observability::metrics;
use crate::routing::matcher::PathPrefixMatcher;
use crate::strategy::StrategyContext;

/// Which branch of the policy a request fell into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatchDecision {
    Backend,
    StaticAsset,
    Application,
    Unhandled,
}

impl CatchDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            CatchDecision::Backend => "backend",
            CatchDecision::StaticAsset => "static",
            CatchDecision::Application => "application",
            CatchDecision::Unhandled => "unhandled",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CatchHandler {
    backend: PathPrefixMatcher,
    statics: Vec<PathPrefixMatcher>,
    application: PathPrefixMatcher,
    entry_point: String,
}

impl CatchHandler {
    pub fn from_config(config: &CatchConfig) -> Self {
        Self {
            backend: PathPrefixMatcher::new(&config.backend_prefix),
            statics: config
                .static_prefixes
                .iter()
                .map(PathPrefixMatcher::new)
                .collect(),
            application: PathPrefixMatcher::new(&config.app_prefix),
            entry_point: config.entry_point.clone(),
        }
    }

    /// Classify a path.
    pub fn decide(&self, path: &str) -> CatchDecision {
        if self.backend.matches_path(path) {
            CatchDecision::Backend
        } else if self.statics.iter().any(|m| m.matches_path(path)) {
            CatchDecision::StaticAsset
        } else if self.application.matches_path(path) {
            CatchDecision::Application
        } else {
            CatchDecision::Unhandled
        }
    }

    /// Produce a best-effort reply for a request whose route failed.
    pub async fn handle(
        &self,
        ctx: &StrategyContext,
        precache: &Precache,
        request: &FetchRequest,
    ) -> Reply {
        let path = request.url.path();
        let decision = self.decide(path);
        metrics::record_catch_decision(decision.as_str());

        let reply = match decision {
            CatchDecision::Backend | CatchDecision::Unhandled => Reply::NetworkError,
            CatchDecision::StaticAsset => self.precached(ctx, precache, request, path).await,
            CatchDecision::Application => {
                self.precached(ctx, precache, request, &self.entry_point).await
            }
        };

        tracing::debug!(
            url = %request.url,
            decision = decision.as_str(),
            served = !reply.is_network_error(),
            "Catch handler invoked"
        );
        reply
    }

    /// Stored precache entry for `path` on the request's origin.
    async fn precached(
        &self,
        ctx: &StrategyContext,
        precache: &Precache,
        request: &FetchRequest,
        path: &str,
    ) -> Reply {
        let Ok(url) = request.url.join(path) else {
            return Reply::NetworkError;
        };
        let Some(key) = precache.cache_key_for_url(&url) else {
            return Reply::NetworkError;
        };
        precache.lookup(ctx, key).await.into()
    }
}
