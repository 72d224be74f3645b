//! Content-tree access.
//!
//! # Data Flow
//! ```text
//! [[pages]] config (or any content store)
//!     → page.rs (Page / Title, immutable once built)
//!     → index.rs (PageIndex: path lookup, apphook host lookup, URLs)
//!     → permissions.rs (view / change checks for a Requester)
//! ```
//!
//! # Design Decisions
//! - The core only reads pages; creating and editing them is the content
//!   store's job
//! - A missing title is an explicit error so callers can decide to degrade

pub mod index;
pub mod page;
pub mod permissions;

use thiserror::Error;

pub use index::{InMemoryPageIndex, PageIndex, PageMatch, UrlScheme};
pub use page::{Page, PageId, Title, TEMPLATE_INHERIT};
pub use permissions::{has_change_permission, has_view_permission, Requester};

/// Errors raised while reading the content tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContentError {
    /// The page has no title row for the language.
    #[error("page {page} has no title for language '{language}'")]
    MissingTitle { page: PageId, language: String },

    #[error("page {page} references unknown parent {parent}")]
    UnknownParent { page: PageId, parent: PageId },

    #[error("page {0} is part of a parent cycle")]
    Cycle(PageId),

    #[error("page id {0} is used more than once")]
    DuplicatePage(PageId),
}
