//! Response generation.
//!
//! # Responsibilities
//! - Render pages through a pluggable `Renderer`
//! - Map dispatch outcomes to HTTP responses
//!
//! # Design Decisions
//! - Apphook responses pass through untouched
//! - Redirects are 302 with a `Location` header

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};

use crate::dispatch::{DispatchOutcome, PageRequest, RenderContext};

/// Turns a render context into an HTML document.
pub trait Renderer: Send + Sync {
    fn render(&self, context: &RenderContext, request: &PageRequest) -> String;
}

/// Minimal renderer: a document naming the page title and template.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicRenderer;

impl Renderer for BasicRenderer {
    fn render(&self, context: &RenderContext, _request: &PageRequest) -> String {
        let title = context
            .page
            .title(&context.content_language)
            .map(|t| t.title.as_str())
            .unwrap_or_default();
        let toolbar = if context.has_change_permissions {
            "\n<div id=\"toolbar\">edit</div>"
        } else {
            ""
        };
        format!(
            "<!DOCTYPE html>\n<html lang=\"{lang}\">\n<head><meta name=\"template\" content=\"{template}\"><title>{title}</title></head>\n<body data-page=\"{id}\" data-content-language=\"{content}\">{toolbar}\n<h1>{title}</h1>\n</body>\n</html>\n",
            lang = escape_html(&context.language),
            template = escape_html(&context.template),
            title = escape_html(title),
            id = context.page.id,
            content = escape_html(&context.content_language),
        )
    }
}

const WELCOME: &str = "<!DOCTYPE html>\n<html>\n<head><title>Welcome</title></head>\n<body><h1>It worked!</h1><p>The site has no pages yet.</p></body>\n</html>\n";

/// Map a dispatch outcome to a response.
pub fn outcome_response(
    outcome: DispatchOutcome,
    renderer: &dyn Renderer,
    request: &PageRequest,
) -> Response {
    match outcome {
        DispatchOutcome::Render(context) => Html(renderer.render(&context, request)).into_response(),
        DispatchOutcome::Redirect(location) => redirect(&location),
        DispatchOutcome::NotFound => not_found(),
        DispatchOutcome::Welcome => Html(WELCOME).into_response(),
        DispatchOutcome::Delegated(response) => response,
    }
}

/// A 302 response to `location`.
pub fn redirect(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (StatusCode::FOUND, [(header::LOCATION, value)]).into_response(),
        Err(_) => {
            tracing::error!(location, "Redirect target is not a valid header value");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Html("<h1>Not Found</h1>")).into_response()
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
