//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use graft::apphooks::{ApphookRegistry, FnApphook};
use graft::config::{parse_config, SiteConfig};
use graft::dispatch::PageRequest;
use graft::lifecycle::{ShutdownSignal, Site};
use graft::routing::{Route, RouteMatch, UrlRouter};
use graft::HttpServer;

pub const EDITOR_TOKEN: &str = "editor-token";
pub const MEMBER_TOKEN: &str = "member-token";

pub const SITE: &str = r#"
[site]
debug = true
templates = ["home.html", "page.html", "wide.html"]
default_template = "page.html"

[i18n]
default_language = "en"
languages = [
    { code = "en", fallbacks = ["de"], redirect_on_fallback = false },
    { code = "de", fallbacks = ["en"] },
]

[[users]]
username = "editor"
token = "editor-token"
staff = true

[[users]]
username = "member"
token = "member-token"
groups = ["members"]

[[pages]]
id = 1
home = true
template = "home.html"
titles = [
    { language = "en", title = "Home", slug = "home" },
    { language = "de", title = "Startseite", slug = "start" },
]

[[pages]]
id = 2
parent = 1
titles = [{ language = "de", title = "Nur Deutsch", slug = "seite" }]

[[pages]]
id = 3
parent = 1
apphook = "Blog"
titles = [{ language = "en", title = "Blog", slug = "blog" }]

[[pages]]
id = 4
parent = 1
login_required = true
titles = [{ language = "en", title = "Members", slug = "members" }]

[[pages]]
id = 5
parent = 1
titles = [{ language = "en", title = "Old", slug = "old", redirect = "/blog/" }]
"#;

pub fn site_config() -> SiteConfig {
    parse_config(SITE).unwrap()
}

fn blog_index(request: &PageRequest, _matched: &RouteMatch) -> axum::response::Response {
    let host = request
        .current_page
        .as_ref()
        .map(|p| p.id.to_string())
        .unwrap_or_default();
    format!("blog index on page {host}").into_response()
}

fn blog_entry(_request: &PageRequest, matched: &RouteMatch) -> axum::response::Response {
    match matched.kwarg("id") {
        Some(id) => format!("entry {id}").into_response(),
        None => StatusCode::BAD_REQUEST.into_response(),
    }
}

pub fn registry() -> ApphookRegistry {
    let mut registry = ApphookRegistry::new();
    registry
        .register(
            FnApphook::new("Blog", || {
                UrlRouter::new()
                    .route(Route::view("", blog_index).unwrap().with_name("blog-index"))
                    .route(
                        Route::view("{id:int}/", blog_entry)
                            .unwrap()
                            .with_name("blog-entry"),
                    )
            })
            .with_app_name("blog"),
        )
        .unwrap();
    registry
}

/// A running server bound to an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub site: Arc<Site>,
    pub config_updates: mpsc::UnboundedSender<SiteConfig>,
    shutdown: ShutdownSignal,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

pub async fn start_server(config: SiteConfig) -> TestServer {
    let server = HttpServer::new(config, registry()).unwrap();
    let site = server.site();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = ShutdownSignal::new();
    let server_shutdown = shutdown.subscribe();
    let (config_updates, updates_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let _ = server.run(listener, updates_rx, server_shutdown).await;
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    TestServer {
        addr,
        site,
        config_updates,
        shutdown,
    }
}

/// A client that does not follow redirects.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}
