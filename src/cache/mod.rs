//! Cache storage subsystem.
//!
//! # Data Flow
//! ```text
//! Strategy lookup / write
//!     → store.rs (named caches, key → CachedResponse)
//!
//! Deployment install / activate:
//!     manifest entries
//!     → precache.rs (revisioned cache keys)
//!     → fetch missing entries into "<prefix>-precache-v2"
//!     → on activate, delete keys the new manifest no longer lists
//! ```
//!
//! # Design Decisions
//! - Cache names are derived from one configured prefix
//! - Keys are absolute URLs; precache keys carry the revision as a query parameter
//! - Store contents survive restarts through an optional JSON snapshot

pub mod precache;
pub mod store;

pub use precache::{Precache, PrecacheEntry};
pub use store::{CacheStore, InMemoryCacheStore};

/// Names of the caches a deployment uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheNames {
    pub precache: String,
    pub runtime: String,
}

impl CacheNames {
    pub fn from_prefix(prefix: &str) -> Self {
        Self {
            precache: format!("{prefix}-precache-v2"),
            runtime: format!("{prefix}-runtime"),
        }
    }
}
