//! Apphook subsystem.
//!
//! An apphook is an independently routed application that a page can host;
//! its URL configuration is grafted onto the hosting page's subtree.
//!
//! # Data Flow
//! ```text
//! embedding application
//!     → registry.rs (register, in order)
//!     → [apphooks] enabled allow-list
//!     → snapshot handed to CompositeRouter and Dispatcher
//! ```

pub mod registry;

use thiserror::Error;

pub use registry::{Apphook, ApphookRegistry, FnApphook};

/// Errors raised while registering apphooks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("apphook '{0}' is already registered")]
    Duplicate(String),
}
