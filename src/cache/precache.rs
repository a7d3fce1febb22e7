//! Precaching: a fixed manifest of assets stored at install time.
//!
//! # Responsibilities
//! - Map manifest URLs to revisioned cache keys
//! - Install: fetch every entry the store does not hold yet
//! - Activate: drop keys no longer listed by the manifest
//! - Serve matching requests from the precache, network as fallback
//!
//! # Design Decisions
//! - Install is all-or-nothing; a non-2xx entry fails it
//! - Keys for revisioned entries carry `__WB_REVISION__` so two releases
//!   never collide in the same cache

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use url::Url;

use crate::http::FetchRequest;
use crate::http::response::CachedResponse;
use crate::strategy::{StrategyContext, StrategyError, StrategyResult};

const REVISION_PARAM: &str = "__WB_REVISION__";
const DIRECTORY_INDEX: &str = "index.html";

/// One manifest entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PrecacheEntry {
    pub url: String,
    #[serde(default)]
    pub revision: Option<String>,
}

impl PrecacheEntry {
    pub fn new(url: impl Into<String>, revision: Option<&str>) -> Self {
        Self {
            url: url.into(),
            revision: revision.map(str::to_string),
        }
    }
}

/// A resolved precache manifest bound to one cache.
#[derive(Debug, Clone)]
pub struct Precache {
    cache_name: String,
    /// Absolute URL (no fragment) → cache key.
    urls_to_keys: HashMap<String, String>,
}

impl Precache {
    /// Resolve `entries` against `origin`.
    pub fn new(
        origin: &Url,
        entries: &[PrecacheEntry],
        cache_name: impl Into<String>,
    ) -> Result<Self, url::ParseError> {
        let mut urls_to_keys = HashMap::with_capacity(entries.len());
        for entry in entries {
            let mut url = origin.join(&entry.url)?;
            url.set_fragment(None);

            let mut key = url.clone();
            if let Some(revision) = &entry.revision {
                key.query_pairs_mut().append_pair(REVISION_PARAM, revision);
            }
            urls_to_keys.insert(url.to_string(), key.to_string());
        }

        Ok(Self {
            cache_name: cache_name.into(),
            urls_to_keys,
        })
    }

    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    pub fn len(&self) -> usize {
        self.urls_to_keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls_to_keys.is_empty()
    }

    /// Exact key lookup for a URL; fragments are ignored.
    pub fn cache_key_for_url(&self, url: &Url) -> Option<&str> {
        let mut url = url.clone();
        url.set_fragment(None);
        self.urls_to_keys.get(url.as_str()).map(String::as_str)
    }

    /// Key lookup tolerant of tracking parameters, directory indexes and clean URLs.
    pub fn route_key_for_url(&self, url: &Url) -> Option<&str> {
        url_variations(url)
            .iter()
            .find_map(|candidate| self.urls_to_keys.get(candidate.as_str()))
            .map(String::as_str)
    }

    /// Fetch and store every entry missing from the store.
    ///
    /// Returns the number of entries fetched.
    pub async fn install(&self, ctx: &StrategyContext) -> StrategyResult<usize> {
        let mut fetched = 0;
        for (url, key) in &self.urls_to_keys {
            if ctx.store.lookup(&self.cache_name, key).await.is_some() {
                continue;
            }

            let request = FetchRequest::parse(url)?;
            let response = ctx.fetcher.fetch(&request).await?;
            if !response.is_ok() {
                return Err(StrategyError::PrecacheStatus {
                    url: url.clone(),
                    status: response.status,
                });
            }
            ctx.store.put(&self.cache_name, key, response).await;
            fetched += 1;
        }

        tracing::info!(
            cache = %self.cache_name,
            entries = self.urls_to_keys.len(),
            fetched,
            "Precache installed"
        );
        Ok(fetched)
    }

    /// Delete stored keys this manifest does not list.
    ///
    /// Returns the number of entries deleted.
    pub async fn activate(&self, ctx: &StrategyContext) -> usize {
        let current: HashSet<&str> = self.urls_to_keys.values().map(String::as_str).collect();
        let mut deleted = 0;
        for key in ctx.store.keys(&self.cache_name).await {
            if !current.contains(key.as_str()) && ctx.store.delete(&self.cache_name, &key).await {
                deleted += 1;
            }
        }
        if deleted > 0 {
            tracing::info!(cache = %self.cache_name, deleted, "Removed outdated precache entries");
        }
        deleted
    }

    /// Look up the stored entry for a key.
    pub async fn lookup(&self, ctx: &StrategyContext, key: &str) -> Option<CachedResponse> {
        ctx.store.lookup(&self.cache_name, key).await
    }

    /// Serve a request whose URL maps to `key`: cache, then network.
    pub async fn handle(
        &self,
        ctx: &StrategyContext,
        key: &str,
        request: &FetchRequest,
    ) -> StrategyResult<CachedResponse> {
        if let Some(hit) = self.lookup(ctx, key).await {
            return Ok(hit);
        }

        tracing::warn!(url = %request.url, key, "Precached entry missing, falling back to network");
        let response = ctx.fetcher.fetch(request).await?;
        if response.is_ok() {
            ctx.store.put(&self.cache_name, key, response.clone()).await;
        }
        Ok(response)
    }
}

fn is_ignored_param(name: &str) -> bool {
    name.starts_with("utm_") || name == "fbclid"
}

/// Candidate URLs to try against the manifest, most specific first.
fn url_variations(url: &Url) -> Vec<Url> {
    let mut exact = url.clone();
    exact.set_fragment(None);

    let mut stripped = exact.clone();
    let kept: Vec<(String, String)> = exact
        .query_pairs()
        .filter(|(k, _)| !is_ignored_param(k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if kept.is_empty() {
        stripped.set_query(None);
    } else {
        stripped.query_pairs_mut().clear().extend_pairs(kept);
    }

    let mut variations = vec![exact, stripped.clone()];

    if stripped.path().ends_with('/') {
        let mut index = stripped.clone();
        index.set_path(&format!("{}{}", stripped.path(), DIRECTORY_INDEX));
        variations.push(index);
    } else {
        let mut clean = stripped.clone();
        clean.set_path(&format!("{}.html", stripped.path()));
        variations.push(clean);
    }

    variations
}
