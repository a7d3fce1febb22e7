//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Intercepted request (FetchEvent)
//!     → router.rs (method gate, precache route, ordered URL routes, default)
//!     → matcher.rs (evaluate URL pattern)
//!     → strategy runs
//!     → on failure: catch.rs (offline fallback by path prefix)
//!     → Reply (response or network-error sentinel)
//!
//! Route Compilation (per deployment):
//!     RouteConfig[] (config order)
//!     → Compile regex matchers
//!     → Freeze as immutable Router
//! ```
//!
//! # Design Decisions
//! - Routes compiled when a deployment is built, immutable at runtime
//! - Deterministic: same input always matches same route
//! - First match wins (config order)

pub mod catch;
pub mod matcher;
pub mod router;

pub use catch::{CatchDecision, CatchHandler};
pub use router::{Handled, Route, RouteError, Router};
