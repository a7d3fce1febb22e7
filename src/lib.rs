//! Offline-first caching proxy library.
//!
//! Sits in front of a web application and decides, per request, whether to
//! answer from the network, from a revisioned precache or from a runtime
//! cache, and what to serve when the network is unreachable.

pub mod admin;
pub mod cache;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;
pub mod search;
pub mod strategy;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
