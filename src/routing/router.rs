//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store compiled routes in configured order
//! - Select exactly one strategy per request (precache, route, default)
//! - Turn strategy failures into catch-handler replies
//!
//! # Design Decisions
//! - Immutable after construction (shared without locks)
//! - O(n) pattern scan; first match wins
//! - Only GET is routed; other methods pass straight through to the network
//! - Network-only failures skip the catch handler so they can never be
//!   answered from cache

use axum::http::Method;
use std::time::{Duration, Instant};
use thiserror::Error;
use url::Url;

use crate::cache::{CacheNames, Precache};
use crate::config::ProxyConfig;
use crate::http::response::Reply;
use crate::http::FetchEvent;
use crate::observability::metrics;
use crate::routing::catch::CatchHandler;
use crate::routing::matcher::{Matcher, UrlPatternMatcher};
use crate::strategy::{Strategy, StrategyContext, StrategyKind};

/// Errors building a router from configuration.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("route {name}: invalid pattern: {source}")]
    Pattern {
        name: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid upstream origin {0:?}")]
    Origin(String),

    #[error("invalid precache entry: {0}")]
    Precache(#[from] url::ParseError),
}

/// A compiled route: pattern plus strategy.
#[derive(Debug)]
pub struct Route {
    pub name: String,
    pub matcher: Box<dyn Matcher>,
    pub strategy: Strategy,
}

/// Which handler served a request; used for logs and metrics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handled {
    Passthrough,
    Precache,
    Route(String),
    Default,
}

impl Handled {
    pub fn label(&self) -> &str {
        match self {
            Handled::Passthrough => "passthrough",
            Handled::Precache => "precache",
            Handled::Route(name) => name,
            Handled::Default => "default",
        }
    }
}

/// Immutable request router.
#[derive(Debug)]
pub struct Router {
    origin: Url,
    routes: Vec<Route>,
    default: Strategy,
    precache: Precache,
    catch: CatchHandler,
}

impl Router {
    /// Compile routes, precache manifest and catch policy.
    pub fn from_config(config: &ProxyConfig) -> Result<Self, RouteError> {
        let timeout = config.strategies.network_timeout_secs.map(Duration::from_secs);

        let routes = config
            .routes
            .iter()
            .map(|route| {
                let matcher = UrlPatternMatcher::new(&route.pattern).map_err(|source| {
                    RouteError::Pattern {
                        name: route.name.clone(),
                        source,
                    }
                })?;
                Ok(Route {
                    name: route.name.clone(),
                    matcher: Box::new(matcher),
                    strategy: Strategy::from_kind(route.strategy, timeout),
                })
            })
            .collect::<Result<Vec<_>, RouteError>>()?;

        let origin = Url::parse(&config.upstream.origin)
            .map_err(|_| RouteError::Origin(config.upstream.origin.clone()))?;
        let names = CacheNames::from_prefix(&config.cache.name_prefix);
        let precache = Precache::new(&origin, &config.precache.entries, names.precache)?;

        Ok(Self {
            origin,
            routes,
            default: Strategy::from_kind(config.strategies.default, timeout),
            precache,
            catch: CatchHandler::from_config(&config.catch),
        })
    }

    /// Origin that origin-form request targets are resolved against.
    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn precache(&self) -> &Precache {
        &self.precache
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Find the strategy for a GET request without running it.
    pub fn select(&self, event: &FetchEvent) -> (Handled, &Strategy) {
        self.routes
            .iter()
            .find(|route| route.matcher.matches(&event.request))
            .map(|route| (Handled::Route(route.name.clone()), &route.strategy))
            .unwrap_or((Handled::Default, &self.default))
    }

    /// Handle one intercepted request.
    pub async fn handle(&self, ctx: &StrategyContext, event: FetchEvent) -> Reply {
        let start = Instant::now();
        let request = &event.request;
        let request_id = event.request_id.as_str();

        if request.method != Method::GET {
            let reply = match ctx.fetcher.fetch(request).await {
                Ok(response) => Reply::Response(response),
                Err(e) => {
                    tracing::warn!(request_id, url = %request.url, error = %e, "Passthrough failed");
                    Reply::NetworkError
                }
            };
            self.finish(request_id, &Handled::Passthrough, &reply, start);
            return reply;
        }

        if let Some(key) = self.precache.route_key_for_url(&request.url) {
            let reply = match self.precache.handle(ctx, key, request).await {
                Ok(response) => Reply::Response(response),
                Err(e) => {
                    tracing::warn!(request_id, url = %request.url, error = %e, "Precache route failed");
                    self.catch.handle(ctx, &self.precache, request).await
                }
            };
            self.finish(request_id, &Handled::Precache, &reply, start);
            return reply;
        }

        let (handled, strategy) = self.select(&event);
        let reply = match strategy.handle_request(ctx, request).await {
            Ok(response) => Reply::Response(response),
            Err(e) if strategy.kind() == StrategyKind::NetworkOnly => {
                tracing::warn!(request_id, url = %request.url, error = %e, "Network-only request failed");
                Reply::NetworkError
            }
            Err(e) => {
                tracing::info!(
                    request_id,
                    url = %request.url,
                    strategy = %strategy.kind(),
                    error = %e,
                    "Strategy failed, using catch handler"
                );
                self.catch.handle(ctx, &self.precache, request).await
            }
        };
        self.finish(request_id, &handled, &reply, start);
        reply
    }

    fn finish(&self, request_id: &str, handled: &Handled, reply: &Reply, start: Instant) {
        tracing::debug!(
            request_id,
            handler = handled.label(),
            status = reply.status(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Request handled"
        );
        metrics::record_route(handled.label(), reply.status(), start);
    }
}
