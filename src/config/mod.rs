//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) + optional precache manifest (JSON)
//!     → loader.rs (parse, merge manifest)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → built into a Deployment
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → server installs a new Deployment and stages it as waiting
//!     → SKIP_WAITING control message activates it
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AdminConfig, CacheConfig, CatchConfig, ObservabilityConfig, PrecacheConfig, ProxyConfig,
    RouteConfig, SearchConfig, TimeoutConfig,
};
pub use validation::ValidationError;
