//! Strategy context and error definitions.

use std::sync::Arc;
use thiserror::Error;

use crate::cache::CacheStore;
use crate::net::Fetcher;

/// Errors a strategy (or precache install) can raise.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StrategyError {
    /// Upstream could not be reached or the transfer failed.
    #[error("network request to {url} failed: {reason}")]
    Network { url: String, reason: String },

    /// Neither the network nor the cache produced a response.
    #[error("no response for {url} from network or cache")]
    NoResponse { url: String },

    /// A string input did not parse as an absolute URL.
    #[error("invalid request url: {0}")]
    InvalidUrl(String),

    /// The incoming request body could not be buffered.
    #[error("unreadable request body: {0}")]
    Body(String),

    /// A precache entry answered with a non-success status.
    #[error("precache fetch of {url} returned status {status}")]
    PrecacheStatus { url: String, status: u16 },
}

/// Result type for strategy operations.
pub type StrategyResult<T> = Result<T, StrategyError>;

/// Shared collaborators every strategy runs against.
#[derive(Clone)]
pub struct StrategyContext {
    pub fetcher: Arc<dyn Fetcher>,
    pub store: Arc<dyn CacheStore>,
    /// Cache name for runtime (non-precached) entries.
    pub runtime_cache: String,
}

impl StrategyContext {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        store: Arc<dyn CacheStore>,
        runtime_cache: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            store,
            runtime_cache: runtime_cache.into(),
        }
    }
}

impl std::fmt::Debug for StrategyContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StrategyContext")
            .field("runtime_cache", &self.runtime_cache)
            .finish_non_exhaustive()
    }
}
