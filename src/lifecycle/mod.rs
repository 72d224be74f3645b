//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     SiteConfig → Validate → Page index → Routers → Dispatcher → Site
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Broadcast → Server stops accepting → Drain → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then content, then routing
//! - Listeners start last (traffic only when ready)

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::ShutdownSignal;
pub use startup::{Site, StartupError};
