//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the proxy and control handlers
//! - Wire up middleware (tracing, timeouts, body limit, request ID)
//! - Build, install and activate the first deployment
//! - Stage reloaded configs as waiting deployments
//! - Run the admin API and control listener alongside the proxy
//! - Persist the cache store on shutdown

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::admin::{self, AdminState};
use crate::cache::{CacheNames, InMemoryCacheStore};
use crate::config::ProxyConfig;
use crate::http::request::{request_id_layer, request_id_of, FetchEvent, FetchRequest};
use crate::lifecycle::{ControlBus, ControlListener, ControlMessage, Deployment, Lifecycle};
use crate::net::{Fetcher, ReqwestFetcher};
use crate::routing::RouteError;
use crate::search::{AssetResolver, HttpAssetResolver};
use crate::strategy::{StrategyContext, StrategyError};

/// Path of the client control-message endpoint.
pub const CONTROL_PATH: &str = "/__offline/message";

/// Errors that stop the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("http client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("invalid deployment: {0}")]
    Deployment(#[from] RouteError),

    #[error("precache install failed: {0}")]
    Install(#[from] StrategyError),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub lifecycle: Arc<Lifecycle>,
    pub control: ControlBus,
    pub max_body_size: usize,
}

/// HTTP server for the offline proxy.
pub struct HttpServer {
    config: ProxyConfig,
    fetcher: Arc<dyn Fetcher>,
    store: Arc<InMemoryCacheStore>,
}

impl HttpServer {
    /// Create a server with a reqwest upstream client and the configured store.
    pub fn new(config: ProxyConfig) -> Result<Self, ServerError> {
        let fetcher = Arc::new(ReqwestFetcher::new(&config.timeouts)?);
        let store = match &config.cache.persistence_path {
            Some(path) => InMemoryCacheStore::load_from_file(&PathBuf::from(path))?,
            None => InMemoryCacheStore::new(None),
        };
        Ok(Self::with_parts(config, fetcher, Arc::new(store)))
    }

    /// Create a server over explicit collaborators.
    pub fn with_parts(
        config: ProxyConfig,
        fetcher: Arc<dyn Fetcher>,
        store: Arc<InMemoryCacheStore>,
    ) -> Self {
        Self {
            config,
            fetcher,
            store,
        }
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route(CONTROL_PATH, post(control_handler))
            .fallback(proxy_handler)
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs + config.timeouts.connect_secs,
            )))
            .layer(request_id_layer())
            .layer(TraceLayer::new_for_http())
    }

    /// Run until `shutdown` fires, staging every config received on `config_updates`.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<ProxyConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let names = CacheNames::from_prefix(&self.config.cache.name_prefix);
        let ctx = StrategyContext::new(self.fetcher.clone(), self.store.clone(), names.runtime);

        let first = Deployment::build(&self.config)?;
        let lifecycle = Arc::new(Lifecycle::start(first, ctx).await?);

        let (control, control_listener) = ControlListener::register(lifecycle.clone());

        let state = AppState {
            lifecycle: lifecycle.clone(),
            control: control.clone(),
            max_body_size: self.config.security.max_body_size,
        };

        // Admin API
        let mut admin_task = None;
        if self.config.admin.enabled {
            let resolver: Option<Arc<dyn AssetResolver>> = if self.config.search.enabled {
                Some(Arc::new(HttpAssetResolver::new(
                    &self.config.search.resolver_url,
                    Duration::from_secs(self.config.timeouts.request_secs),
                )?))
            } else {
                None
            };
            let admin_state = AdminState {
                lifecycle: lifecycle.clone(),
                store: self.store.clone(),
                control: control.clone(),
                resolver,
                api_key: Arc::from(self.config.admin.api_key.as_str()),
            };
            let admin_listener = TcpListener::bind(&self.config.admin.bind_address).await?;
            tracing::info!(address = %admin_listener.local_addr()?, "Admin API listening");
            let app = admin::setup_admin_router(admin_state);
            admin_task = Some(tokio::spawn(async move {
                if let Err(e) = axum::serve(admin_listener, app).await {
                    tracing::error!(error = %e, "Admin API stopped");
                }
            }));
        }

        // Stage reloaded configs as waiting deployments.
        let staging = lifecycle.clone();
        let reload_task = tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                let deployment = match Deployment::build(&config) {
                    Ok(d) => d,
                    Err(e) => {
                        tracing::error!(error = %e, "Reloaded config rejected");
                        continue;
                    }
                };
                if let Err(e) = staging.stage(deployment).await {
                    tracing::error!(error = %e, "Update install failed; keeping current deployment");
                }
            }
        });

        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, upstream = %self.config.upstream.origin, "Offline proxy listening");

        let app = Self::build_router(&self.config, state);
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        reload_task.abort();
        if let Some(task) = admin_task {
            task.abort();
        }
        control_listener.teardown();

        if let Err(e) = self.store.save_to_file() {
            tracing::error!(error = %e, "Failed to persist cache snapshot");
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main proxy handler: route the request through the active deployment.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let request_id = request_id_of(&request);
    // One deployment serves the whole request, including origin resolution.
    let deployment = state.lifecycle.active();
    let router = deployment.router();

    let fetch = match FetchRequest::from_http(request, router.origin(), state.max_body_size).await {
        Ok(fetch) => fetch,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Rejected request");
            return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
        }
    };

    tracing::debug!(
        request_id = %request_id,
        method = %fetch.method,
        url = %fetch.url,
        "Intercepted request"
    );

    router
        .handle(state.lifecycle.context(), FetchEvent::new(fetch, request_id))
        .await
        .into_response()
}

/// Accepts `{ "type": ... }` control messages from clients.
async fn control_handler(
    State(state): State<AppState>,
    Json(message): Json<ControlMessage>,
) -> StatusCode {
    publish_control(&state.control, message)
}

/// Shared by the client and admin control endpoints.
pub(crate) fn publish_control(bus: &ControlBus, message: ControlMessage) -> StatusCode {
    tracing::info!(kind = %message.kind, "Control message received");
    if bus.publish(message) {
        StatusCode::ACCEPTED
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
