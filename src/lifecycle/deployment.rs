//! Deployments and their activation.
//!
//! # State
//! ```text
//! startup:           build → install → active
//! config reload:     build → install → waiting   (active keeps serving)
//! SKIP_WAITING:      waiting → active → drop stale precache entries
//! ```

use arc_swap::{ArcSwap, ArcSwapOption};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::config::ProxyConfig;
use crate::lifecycle::control::{ControlMessage, SKIP_WAITING};
use crate::observability::metrics;
use crate::routing::{RouteError, Router};
use crate::strategy::{StrategyContext, StrategyResult};

/// One built route table plus precache manifest.
#[derive(Debug)]
pub struct Deployment {
    release: String,
    router: Router,
}

impl Deployment {
    pub fn build(config: &ProxyConfig) -> Result<Self, RouteError> {
        Ok(Self {
            release: config.deployment.release.clone(),
            router: Router::from_config(config)?,
        })
    }

    pub fn release(&self) -> &str {
        &self.release
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Fetch this deployment's precache entries.
    pub async fn install(&self, ctx: &StrategyContext) -> StrategyResult<usize> {
        self.router.precache().install(ctx).await
    }
}

/// Snapshot of lifecycle state for the admin API.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LifecycleStatus {
    pub active_release: String,
    pub waiting_release: Option<String>,
    pub activations: u64,
    pub precache_entries: usize,
}

/// Holds the active deployment and at most one waiting successor.
pub struct Lifecycle {
    active: ArcSwap<Deployment>,
    waiting: ArcSwapOption<Deployment>,
    ctx: StrategyContext,
    activations: AtomicU64,
}

impl Lifecycle {
    /// Install the first deployment and make it active immediately.
    pub async fn start(first: Deployment, ctx: StrategyContext) -> StrategyResult<Self> {
        first.install(&ctx).await?;
        first.router().precache().activate(&ctx).await;
        tracing::info!(release = first.release(), "Deployment active");

        Ok(Self {
            active: ArcSwap::from_pointee(first),
            waiting: ArcSwapOption::empty(),
            ctx,
            activations: AtomicU64::new(0),
        })
    }

    pub fn context(&self) -> &StrategyContext {
        &self.ctx
    }

    pub fn active(&self) -> Arc<Deployment> {
        self.active.load_full()
    }

    pub fn waiting(&self) -> Option<Arc<Deployment>> {
        self.waiting.load_full()
    }

    pub fn activations(&self) -> u64 {
        self.activations.load(Ordering::Relaxed)
    }

    /// Install `next` and park it until a `SKIP_WAITING` message arrives.
    ///
    /// A failed install leaves both active and waiting untouched.
    pub async fn stage(&self, next: Deployment) -> StrategyResult<()> {
        next.install(&self.ctx).await?;
        tracing::info!(
            release = next.release(),
            active = self.active().release(),
            "Update installed and waiting; send SKIP_WAITING to activate"
        );
        if let Some(replaced) = self.waiting.swap(Some(Arc::new(next))) {
            tracing::debug!(release = replaced.release(), "Replaced previously waiting deployment");
        }
        Ok(())
    }

    /// Promote the waiting deployment. Returns false if nothing was waiting.
    pub async fn skip_waiting(&self) -> bool {
        let Some(next) = self.waiting.swap(None) else {
            tracing::debug!("SKIP_WAITING received with no waiting deployment");
            return false;
        };

        let previous = self.active.swap(next.clone());
        next.router().precache().activate(&self.ctx).await;
        self.activations.fetch_add(1, Ordering::Relaxed);
        metrics::record_activation();
        tracing::info!(
            release = next.release(),
            previous = previous.release(),
            "Waiting deployment activated"
        );
        true
    }

    /// React to a control message; only `SKIP_WAITING` is actionable.
    pub async fn handle_message(&self, message: &ControlMessage) -> bool {
        if message.kind == SKIP_WAITING {
            self.skip_waiting().await
        } else {
            tracing::debug!(kind = %message.kind, "Ignoring control message");
            false
        }
    }

    pub fn status(&self) -> LifecycleStatus {
        let active = self.active();
        LifecycleStatus {
            active_release: active.release().to_string(),
            waiting_release: self.waiting().map(|d| d.release().to_string()),
            activations: self.activations(),
            precache_entries: active.router().precache().len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::PrecacheEntry;
    use crate::cache::{CacheStore, InMemoryCacheStore};
    use crate::http::response::CachedResponse;
    use crate::http::{FetchEvent, FetchRequest};
    use axum::body::Body;
    use axum::http::Request;
    use crate::strategy::test_support::context;
    use async_trait::async_trait;
    use std::sync::{Mutex, OnceLock};

    const INDEX: &str = "https://farm.example.com/alink/index.html";

    fn config(release: &str, revision: &str) -> ProxyConfig {
        let mut config = ProxyConfig::default();
        config.upstream.origin = "https://farm.example.com".into();
        config.deployment.release = release.into();
        config.precache.entries = vec![PrecacheEntry::new("/alink/index.html", Some(revision))];
        config
    }

    fn message(kind: &str) -> ControlMessage {
        ControlMessage { kind: kind.into() }
    }

    #[tokio::test]
    async fn test_start_activates_first_deployment() {
        let (ctx, fetcher) = context();
        fetcher.respond(INDEX, CachedResponse::new(200, "index"));

        let lifecycle = Lifecycle::start(Deployment::build(&config("1", "a")).unwrap(), ctx)
            .await
            .unwrap();
        assert_eq!(lifecycle.active().release(), "1");
        assert!(lifecycle.waiting().is_none());
        assert_eq!(lifecycle.status().precache_entries, 1);
    }

    #[tokio::test]
    async fn test_start_fails_when_precache_fails() {
        let (ctx, fetcher) = context();
        fetcher.set_offline(true);
        let result = Lifecycle::start(Deployment::build(&config("1", "a")).unwrap(), ctx).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_skip_waiting_activates_exactly_once() {
        let (ctx, fetcher) = context();
        fetcher.respond(INDEX, CachedResponse::new(200, "index"));
        let lifecycle = Lifecycle::start(Deployment::build(&config("1", "a")).unwrap(), ctx)
            .await
            .unwrap();

        lifecycle
            .stage(Deployment::build(&config("2", "b")).unwrap())
            .await
            .unwrap();
        assert_eq!(lifecycle.active().release(), "1");
        assert_eq!(lifecycle.status().waiting_release.as_deref(), Some("2"));

        assert!(!lifecycle.handle_message(&message("CLIENTS_CLAIM")).await);
        assert_eq!(lifecycle.active().release(), "1");

        assert!(lifecycle.handle_message(&message(SKIP_WAITING)).await);
        assert!(!lifecycle.handle_message(&message(SKIP_WAITING)).await);
        assert_eq!(lifecycle.active().release(), "2");
        assert_eq!(lifecycle.activations(), 1);
    }

    #[tokio::test]
    async fn test_activation_drops_old_precache_revision() {
        let (ctx, fetcher) = context();
        fetcher.respond(INDEX, CachedResponse::new(200, "index"));
        let lifecycle = Lifecycle::start(Deployment::build(&config("1", "a")).unwrap(), ctx.clone())
            .await
            .unwrap();
        lifecycle
            .stage(Deployment::build(&config("2", "b")).unwrap())
            .await
            .unwrap();
        assert_eq!(ctx.store.keys("asset-link-precache-v2").await.len(), 2);

        lifecycle.skip_waiting().await;
        assert_eq!(
            ctx.store.keys("asset-link-precache-v2").await,
            vec![format!("{INDEX}?__WB_REVISION__=b")]
        );
    }

    /// Records which release was active whenever an entry is deleted.
    struct DeleteRecordingStore {
        inner: InMemoryCacheStore,
        lifecycle: OnceLock<Arc<Lifecycle>>,
        active_at_delete: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CacheStore for DeleteRecordingStore {
        async fn lookup(&self, cache: &str, key: &str) -> Option<CachedResponse> {
            self.inner.lookup(cache, key).await
        }

        async fn put(&self, cache: &str, key: &str, response: CachedResponse) {
            self.inner.put(cache, key, response).await
        }

        async fn delete(&self, cache: &str, key: &str) -> bool {
            if let Some(lifecycle) = self.lifecycle.get() {
                self.active_at_delete
                    .lock()
                    .unwrap()
                    .push(lifecycle.active().release().to_string());
            }
            self.inner.delete(cache, key).await
        }

        async fn keys(&self, cache: &str) -> Vec<String> {
            self.inner.keys(cache).await
        }
    }

    #[tokio::test]
    async fn test_old_precache_removed_only_after_new_deployment_serves() {
        let (ctx, fetcher) = context();
        fetcher.respond(INDEX, CachedResponse::new(200, "index"));
        let store = Arc::new(DeleteRecordingStore {
            inner: InMemoryCacheStore::default(),
            lifecycle: OnceLock::new(),
            active_at_delete: Mutex::new(Vec::new()),
        });
        let ctx = StrategyContext::new(ctx.fetcher.clone(), store.clone(), "asset-link-runtime");

        let lifecycle = Arc::new(
            Lifecycle::start(Deployment::build(&config("1", "a")).unwrap(), ctx)
                .await
                .unwrap(),
        );
        let _ = store.lifecycle.set(lifecycle.clone());
        lifecycle
            .stage(Deployment::build(&config("2", "b")).unwrap())
            .await
            .unwrap();

        assert!(lifecycle.skip_waiting().await);
        assert_eq!(*store.active_at_delete.lock().unwrap(), vec!["2".to_string()]);
    }

    #[tokio::test]
    async fn test_activated_deployment_resolves_requests_against_its_origin() {
        let (ctx, fetcher) = context();
        fetcher.respond(INDEX, CachedResponse::new(200, "index"));
        fetcher.respond(
            "https://mirror.example.net/alink/index.html",
            CachedResponse::new(200, "mirror index"),
        );
        let lifecycle = Lifecycle::start(Deployment::build(&config("1", "a")).unwrap(), ctx)
            .await
            .unwrap();

        let mut moved = config("2", "a");
        moved.upstream.origin = "https://mirror.example.net".into();
        lifecycle
            .stage(Deployment::build(&moved).unwrap())
            .await
            .unwrap();
        assert!(lifecycle.skip_waiting().await);

        let active = lifecycle.active();
        assert_eq!(active.router().origin().as_str(), "https://mirror.example.net/");

        let request = Request::builder()
            .uri("/alink/assets/9/edit")
            .body(Body::empty())
            .unwrap();
        let fetch = FetchRequest::from_http(request, active.router().origin(), 1024)
            .await
            .unwrap();
        assert_eq!(fetch.url.host_str(), Some("mirror.example.net"));

        fetcher.set_offline(true);
        let reply = active
            .router()
            .handle(lifecycle.context(), FetchEvent::new(fetch, "t"))
            .await;
        assert_eq!(reply.into_cached().unwrap().body, b"mirror index");
    }

    #[tokio::test]
    async fn test_failed_stage_keeps_state() {
        let (ctx, fetcher) = context();
        fetcher.respond(INDEX, CachedResponse::new(200, "index"));
        let lifecycle = Lifecycle::start(Deployment::build(&config("1", "a")).unwrap(), ctx)
            .await
            .unwrap();

        fetcher.set_offline(true);
        let result = lifecycle
            .stage(Deployment::build(&config("2", "b")).unwrap())
            .await;
        assert!(result.is_err());
        assert!(lifecycle.waiting().is_none());
        assert!(!lifecycle.skip_waiting().await);
    }
}
