//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Forward (path → endpoint):
//!     request path
//!     → composite.rs (delegates to the primary router only)
//!     → router.rs (ordered walk of routes and mounts)
//!     → pattern.rs (anchored match, captured kwargs)
//!     → RouteMatch or NoPathMatch
//!
//! Reverse (name → path):
//!     route name + args
//!     → composite.rs: primary router first
//!     → on NoReverseMatch: apphook routers in registry order
//!     → first apphook hit is bound to its hosting page (cached)
//!     → page URL + apphook-relative path
//! ```
//!
//! # Design Decisions
//! - Routers are built at startup and never mutated
//! - The binding cache is the only shared mutable state, behind one mutex
//! - Reversal failure is a value, not control flow

pub mod composite;
pub mod pattern;
pub mod router;

use thiserror::Error;

pub use composite::{merge_indexes, CompositeRouter};
pub use pattern::{PathPattern, ReverseArgs};
pub use router::{
    page_router, Endpoint, NamespaceEntry, Route, RouteMatch, RouterEntry, UrlRouter, ViewFn,
    PAGES_DETAILS_BY_SLUG, PAGES_ROOT,
};

/// Errors produced by URL routers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    /// No route resolves the path.
    #[error("no route matches path '{path}'")]
    NoPathMatch { path: String },

    /// No route reverses the name with the given arguments.
    #[error("reverse for '{name}' not found")]
    NoReverseMatch { name: String },

    /// A pattern failed to compile.
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}
