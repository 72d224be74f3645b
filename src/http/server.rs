//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all page handler
//! - Wire up middleware (timeout, request ID, tracing)
//! - Hold the current site snapshot and swap it on config reload
//! - Resolve paths through the composite router and dispatch page requests

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::apphooks::ApphookRegistry;
use crate::config::SiteConfig;
use crate::dispatch::PageRequest;
use crate::http::request::{page_request, request_id, UuidRequestId};
use crate::http::response::{self, outcome_response, BasicRenderer, Renderer};
use crate::lifecycle::{Site, StartupError};
use crate::observability::metrics;
use crate::routing::Endpoint;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<ArcSwap<Site>>,
    pub renderer: Arc<dyn Renderer>,
}

/// HTTP server for the site.
pub struct HttpServer {
    state: AppState,
    registry: Arc<ApphookRegistry>,
    request_timeout: Duration,
}

impl HttpServer {
    /// Build the initial site snapshot from `config`.
    pub fn new(config: SiteConfig, registry: ApphookRegistry) -> Result<Self, StartupError> {
        let request_timeout = Duration::from_secs(config.timeouts.request_secs);
        let site = Site::build(config, &registry)?;
        Ok(Self {
            state: AppState {
                inner: Arc::new(ArcSwap::from_pointee(site)),
                renderer: Arc::new(BasicRenderer),
            },
            registry: Arc::new(registry),
            request_timeout,
        })
    }

    /// Replace the page renderer.
    pub fn with_renderer(mut self, renderer: impl Renderer + 'static) -> Self {
        self.state.renderer = Arc::new(renderer);
        self
    }

    /// The site snapshot currently serving requests.
    pub fn site(&self) -> Arc<Site> {
        self.state.inner.load_full()
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", any(page_handler))
            .route("/{*path}", any(page_handler))
            .with_state(self.state.clone())
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                    .layer(TraceLayer::new_for_http().make_span_with(
                        |request: &Request<Body>| {
                            tracing::info_span!(
                                "request",
                                method = %request.method(),
                                path = %request.uri().path(),
                                request_id = %request_id(request.headers()),
                            )
                        },
                    ))
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(self.request_timeout)),
            )
    }

    /// Serve until `shutdown` fires, rebuilding the site for every config
    /// received on `config_updates`.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<SiteConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let inner = self.state.inner.clone();
        let registry = self.registry.clone();
        tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                match Site::build(config, &registry) {
                    Ok(site) => {
                        inner.store(Arc::new(site));
                        tracing::info!("Site snapshot swapped");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Rejected reloaded config; keeping current site")
                    }
                }
            }
        });

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Catch-all handler: every path goes through the composite router.
async fn page_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let site = state.inner.load_full();
    let (parts, _body) = request.into_parts();
    let method = parts.method.to_string();
    let page_request = page_request(&site, &parts);

    tracing::debug!(
        request_id = %request_id(&parts.headers),
        path = %page_request.path,
        language = %page_request.language,
        "Serving request"
    );

    let renderer = state.renderer.clone();
    let task = tokio::task::spawn_blocking(move || serve(&site, renderer.as_ref(), page_request));
    let response = match task.await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "Page handler task failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    };

    metrics::record_request(&method, response.status().as_u16(), start);
    response
}

fn serve(site: &Site, renderer: &dyn Renderer, mut request: PageRequest) -> Response {
    let matched = match site.router.resolve_path(&request.path) {
        Ok(matched) => matched,
        Err(e) => {
            tracing::debug!(error = %e, "No route");
            return unmatched(site, &request).unwrap_or_else(response::not_found);
        }
    };

    if let Some(language) = &matched.language {
        request.language = language.clone();
    }

    match &matched.endpoint {
        Endpoint::Page => {
            let slug = matched.kwarg("slug").unwrap_or_default();
            let outcome = site.dispatcher.dispatch(&request, slug);
            outcome_response(outcome, renderer, &request)
        }
        Endpoint::View(view) => view(&request, &matched),
    }
}

/// Redirects for paths that only miss a language prefix or a trailing slash.
fn unmatched(site: &Site, request: &PageRequest) -> Option<Response> {
    let first_segment = request.path.trim_start_matches('/').split('/').next().unwrap_or("");
    let mut candidates = Vec::new();
    if site.languages.uses_prefix_patterns() && !site.languages.is_configured(first_segment) {
        let localized = format!("/{}{}", request.language, request.path);
        if site.config.site.append_slash && !localized.ends_with('/') {
            candidates.push(format!("{localized}/"));
        }
        candidates.push(localized);
    }
    if site.config.site.append_slash && !request.path.ends_with('/') {
        candidates.push(format!("{}/", request.path));
    }

    let target = candidates
        .into_iter()
        .find(|path| site.router.resolve_path(path).is_ok())?;
    let location = if request.query_string.is_empty() {
        target
    } else {
        format!("{}?{}", target, request.query_string)
    };
    tracing::debug!(from = %request.path, to = %location, "Redirecting to canonical path");
    Some(response::redirect(&location))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    fn server() -> HttpServer {
        let config = parse_config(
            r#"
            [i18n]
            languages = [{ code = "en" }, { code = "de" }]

            [[pages]]
            id = 1
            home = true
            titles = [{ language = "en", title = "Home", slug = "home" }]
            "#,
        )
        .unwrap();
        HttpServer::new(config, ApphookRegistry::new()).unwrap()
    }

    #[test]
    fn test_unprefixed_path_redirects_to_language() {
        let server = server();
        let site = server.site();
        let request = PageRequest::new("/").with_language("en");
        let response = unmatched(&site, &request).unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()["location"], "/en/");
    }

    #[test]
    fn test_missing_slash_redirects() {
        let server = server();
        let site = server.site();
        let request = PageRequest::new("/en/about")
            .with_language("en")
            .with_query("a=1");
        let response = unmatched(&site, &request).unwrap();
        assert_eq!(response.headers()["location"], "/en/about/?a=1");
    }

    #[test]
    fn test_foreign_first_segment_gets_language_prefix() {
        let server = server();
        let site = server.site();
        let request = PageRequest::new("/xx/about/").with_language("en");
        let response = unmatched(&site, &request).unwrap();
        assert_eq!(response.headers()["location"], "/en/xx/about/");
    }
}
