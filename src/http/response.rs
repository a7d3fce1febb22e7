//! Response handling and transformation.
//!
//! # Responsibilities
//! - Represent stored/fetched responses independently of the HTTP stack
//! - Render replies (including the network-error sentinel) for the client
//! - Strip hop-by-hop headers in both directions
//!
//! # Design Decisions
//! - Bodies are fully buffered; cached entries must be replayable
//! - The network-error sentinel is a 502 tagged with `x-offline-proxy`

use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

/// Marker header set on sentinel replies.
pub const X_OFFLINE_PROXY: &str = "x-offline-proxy";

const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Headers that must not be forwarded or replayed.
pub fn is_hop_by_hop(name: &str) -> bool {
    HOP_BY_HOP.iter().any(|h| name.eq_ignore_ascii_case(h))
}

/// A buffered response, as fetched from upstream or stored in a cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CachedResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Only complete `200` responses go into runtime caches.
    pub fn is_cacheable(&self) -> bool {
        self.status == 200
    }

    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl IntoResponse for CachedResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::BAD_GATEWAY);
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = status;

        let headers = response.headers_mut();
        for (name, value) in self.headers {
            if is_hop_by_hop(&name) || name.eq_ignore_ascii_case("content-length") {
                continue;
            }
            if let (Ok(name), Ok(value)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(&value),
            ) {
                headers.append(name, value);
            }
        }
        response
    }
}

/// What the router hands back for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Response(CachedResponse),
    /// Explicit network failure; never backed by cached content.
    NetworkError,
}

impl Reply {
    pub fn is_network_error(&self) -> bool {
        matches!(self, Reply::NetworkError)
    }

    pub fn status(&self) -> u16 {
        match self {
            Reply::Response(r) => r.status,
            Reply::NetworkError => StatusCode::BAD_GATEWAY.as_u16(),
        }
    }

    pub fn into_cached(self) -> Option<CachedResponse> {
        match self {
            Reply::Response(r) => Some(r),
            Reply::NetworkError => None,
        }
    }
}

impl From<Option<CachedResponse>> for Reply {
    fn from(response: Option<CachedResponse>) -> Self {
        response.map(Reply::Response).unwrap_or(Reply::NetworkError)
    }
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        match self {
            Reply::Response(response) => response.into_response(),
            Reply::NetworkError => (
                StatusCode::BAD_GATEWAY,
                [(X_OFFLINE_PROXY, "network-error")],
                "Network error",
            )
                .into_response(),
        }
    }
}
