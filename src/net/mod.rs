//! Upstream network subsystem.
//!
//! # Data Flow
//! ```text
//! Strategy needs the network
//!     → fetcher.rs (Fetcher trait)
//!     → ReqwestFetcher (connect/request timeouts, redirects followed)
//!     → CachedResponse (fully buffered) or StrategyError::Network
//! ```
//!
//! # Design Decisions
//! - Strategies only see the `Fetcher` trait, never the HTTP client
//! - Every transport failure maps to one error variant; no retries here
//! - Non-2xx statuses are responses, not failures

pub mod fetcher;

pub use fetcher::{Fetcher, ReqwestFetcher};
