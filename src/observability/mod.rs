//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured tracing events, request IDs as fields)
//!     → metrics.rs (counters, histograms, gauges)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through router, strategies and catch handler logs
//! - Metric updates are fire-and-forget; no recorder installed means no-op

pub mod logging;
pub mod metrics;
