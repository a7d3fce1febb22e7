//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, normalize into FetchRequest)
//!     → routing layer picks precache / route / default strategy
//!     → response.rs (CachedResponse or network-error sentinel → HTTP)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{FetchEvent, FetchRequest, HandlerInput, X_REQUEST_ID, X_SKIP_CACHE};
pub use response::{CachedResponse, Reply};
pub use server::{HttpServer, ServerError};
