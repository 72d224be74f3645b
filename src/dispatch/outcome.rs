//! Terminal states of a dispatch.

use std::sync::Arc;

use axum::response::Response;

use crate::content::Page;

/// What the renderer needs to produce the page response.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub template: String,
    /// Active language.
    pub language: String,
    /// Language whose title is shown; differs from `language` after an
    /// in-place fallback.
    pub content_language: String,
    pub page: Arc<Page>,
    pub has_change_permissions: bool,
    pub has_view_permissions: bool,
}

/// Result of dispatching one page request.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// Render the page (200).
    Render(RenderContext),
    /// Redirect to the URL (302).
    Redirect(String),
    /// Not found, or not visible to the requester (404).
    NotFound,
    /// Development welcome page for an empty site (200).
    Welcome,
    /// Response produced by an apphook view.
    Delegated(Response),
}

impl DispatchOutcome {
    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            DispatchOutcome::Render(_) => "render",
            DispatchOutcome::Redirect(_) => "redirect",
            DispatchOutcome::NotFound => "not_found",
            DispatchOutcome::Welcome => "welcome",
            DispatchOutcome::Delegated(_) => "apphook",
        }
    }
}
