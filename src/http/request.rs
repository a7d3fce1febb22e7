//! Request handling and normalization.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4) for every incoming request
//! - Convert an incoming axum request into a [`FetchRequest`]
//! - Normalize the three accepted handler inputs (event, request, URL string)
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Origin-form targets are resolved against the configured upstream origin
//! - Absolute-form targets (forward-proxy style) are used as-is

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, HeaderValue, Method, Request};
use tower_http::request_id::{MakeRequestId, RequestId, SetRequestIdLayer};
use url::Url;

use crate::http::response::is_hop_by_hop;
use crate::strategy::StrategyError;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Header that forces network-first on skip-cache-aware routes.
pub const X_SKIP_CACHE: &str = "x-skip-cache";

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        let id = uuid::Uuid::new_v4().to_string();
        HeaderValue::from_str(&id).ok().map(RequestId::new)
    }
}

/// Layer that stamps `x-request-id` on requests that don't carry one.
pub fn request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::x_request_id(MakeRequestUuid)
}

/// Read the request ID stamped by [`request_id_layer`].
pub fn request_id_of<B>(request: &Request<B>) -> String {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

/// A normalized outgoing fetch.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl FetchRequest {
    /// A bodiless GET for `url`.
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Parse an absolute URL string into a GET request.
    pub fn parse(url: &str) -> Result<Self, StrategyError> {
        Url::parse(url)
            .map(Self::get)
            .map_err(|_| StrategyError::InvalidUrl(url.to_string()))
    }

    /// Attach a header, replacing any previous value.
    pub fn with_header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Build from an incoming HTTP request, buffering at most `max_body` bytes.
    pub async fn from_http(
        request: Request<Body>,
        origin: &Url,
        max_body: usize,
    ) -> Result<Self, StrategyError> {
        let (parts, body) = request.into_parts();

        let target = parts.uri.to_string();
        let url = if parts.uri.scheme().is_some() {
            Url::parse(&target)
        } else {
            let path = parts
                .uri
                .path_and_query()
                .map(|pq| pq.as_str())
                .unwrap_or("/");
            origin.join(path)
        }
        .map_err(|_| StrategyError::InvalidUrl(target.clone()))?;

        let mut headers = HeaderMap::new();
        for (name, value) in parts.headers.iter() {
            if name == axum::http::header::HOST || is_hop_by_hop(name.as_str()) {
                continue;
            }
            headers.append(name.clone(), value.clone());
        }

        let body = axum::body::to_bytes(body, max_body)
            .await
            .map_err(|e| StrategyError::Body(e.to_string()))?;

        Ok(Self {
            method: parts.method,
            url,
            headers,
            body,
        })
    }

    /// Runtime cache key: the URL without its fragment.
    pub fn cache_key(&self) -> String {
        let mut url = self.url.clone();
        url.set_fragment(None);
        url.into()
    }

    /// True if the request asks to bypass the cache.
    pub fn skips_cache(&self) -> bool {
        self.headers
            .get(X_SKIP_CACHE)
            .map(|v| !v.as_bytes().is_empty())
            .unwrap_or(false)
    }
}

/// One intercepted request, as seen by the router.
#[derive(Debug, Clone)]
pub struct FetchEvent {
    pub request: FetchRequest,
    pub request_id: String,
}

impl FetchEvent {
    pub fn new(request: FetchRequest, request_id: impl Into<String>) -> Self {
        Self {
            request,
            request_id: request_id.into(),
        }
    }
}

/// Anything a strategy accepts as input.
#[derive(Debug, Clone)]
pub enum HandlerInput {
    Event(FetchEvent),
    Request(FetchRequest),
    Url(String),
}

impl HandlerInput {
    /// Normalize to a single request value.
    pub fn into_request(self) -> Result<FetchRequest, StrategyError> {
        match self {
            HandlerInput::Event(event) => Ok(event.request),
            HandlerInput::Request(request) => Ok(request),
            HandlerInput::Url(url) => FetchRequest::parse(&url),
        }
    }
}

impl From<FetchEvent> for HandlerInput {
    fn from(event: FetchEvent) -> Self {
        HandlerInput::Event(event)
    }
}

impl From<FetchRequest> for HandlerInput {
    fn from(request: FetchRequest) -> Self {
        HandlerInput::Request(request)
    }
}

impl From<&str> for HandlerInput {
    fn from(url: &str) -> Self {
        HandlerInput::Url(url.to_string())
    }
}

impl From<String> for HandlerInput {
    fn from(url: String) -> Self {
        HandlerInput::Url(url)
    }
}
