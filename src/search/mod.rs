//! URL asset search.
//!
//! # Data Flow
//! ```text
//! SearchRequest { type: "text-search", term }
//!     → searcher.rs (regex: http(s)://.../asset/<id>)
//!     → AssetResults (lazy, single-shot stream)
//!     → resolver.rs (AssetResolver::resolve_asset on first poll)
//!     → zero or one SearchResult
//! ```
//!
//! # Design Decisions
//! - Non-matching input is `None`, never an error
//! - Resolution failures collapse to "no result"

pub mod resolver;
pub mod searcher;
pub mod types;

pub use resolver::{AssetResolver, HttpAssetResolver};
pub use searcher::{AssetResults, UrlAssetSearcher};
pub use types::{AssetRef, SearchRequest, SearchResult};
