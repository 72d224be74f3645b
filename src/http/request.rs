//! Request handling.
//!
//! # Responsibilities
//! - Generate unique request IDs (UUID v4)
//! - Resolve the requester from the bearer token
//! - Negotiate the active language
//! - Translate the HTTP request into a `PageRequest`
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Unknown tokens are treated as anonymous, never as an error

use axum::http::{header, request::Parts, HeaderMap, HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::content::Requester;
use crate::dispatch::PageRequest;
use crate::i18n::language_from_request;
use crate::lifecycle::Site;

/// Request ID header name.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates a UUID v4 for every request lacking an id.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// The request id assigned by the request-id layer.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Identity behind `Authorization: Bearer <token>`.
pub fn requester(site: &Site, headers: &HeaderMap) -> Requester {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .and_then(|token| site.requester_for_token(token.trim()))
        .cloned()
        .unwrap_or_else(Requester::anonymous)
}

/// Build the dispatcher's view of an HTTP request.
pub fn page_request(site: &Site, parts: &Parts) -> PageRequest {
    let path = parts.uri.path().to_string();
    let query = parts.uri.query().unwrap_or("");

    let host = parts
        .headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| parts.uri.authority().map(|a| a.as_str()))
        .unwrap_or("localhost")
        .to_string();
    let secure = parts.uri.scheme_str() == Some("https")
        || parts
            .headers
            .get("x-forwarded-proto")
            .and_then(|h| h.to_str().ok())
            .is_some_and(|p| p.eq_ignore_ascii_case("https"));

    let mut request = PageRequest::new(path)
        .with_query(query)
        .with_host(host, secure)
        .with_requester(requester(site, &parts.headers));

    let accept_language = parts
        .headers
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|h| h.to_str().ok());
    let language = language_from_request(
        &site.languages,
        &request.path,
        request.param("language"),
        accept_language,
    );
    request.language = language;
    request
}
