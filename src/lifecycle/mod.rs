//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     Load config → Build deployment → Install precache → Active → Listen
//!
//! Update (config reload):
//!     Build deployment → Install precache → Waiting
//!
//! Control (control.rs):
//!     { "type": "SKIP_WAITING" } → waiting promoted to active
//!
//! Shutdown (shutdown.rs):
//!     SIGTERM/SIGINT → Stop accepting → Drain → Tear down listener → Save snapshot
//! ```
//!
//! # Design Decisions
//! - Updates never activate on their own; a client decides when
//! - At most one waiting deployment; a newer one replaces it
//! - Startup fails fast if the first precache install fails

pub mod control;
pub mod deployment;
pub mod shutdown;

pub use control::{ControlBus, ControlListener, ControlMessage, SKIP_WAITING};
pub use deployment::{Deployment, Lifecycle, LifecycleStatus};
pub use shutdown::Shutdown;
