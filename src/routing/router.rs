//! Ordered URL router with forward and reverse resolution.
//!
//! # Responsibilities
//! - Store routes and mounted sub-routers in declaration order
//! - Resolve a path to an endpoint plus captured arguments
//! - Reverse a (possibly namespaced) route name back to a path
//! - Describe the namespaces it declares
//!
//! # Design Decisions
//! - Immutable after construction; shared via Arc
//! - First match wins, in declaration order, for both directions
//! - Mount prefixes are literal; only route patterns capture values
//! - Language prefixes are a router property, not a pattern

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use axum::response::Response;

use crate::dispatch::PageRequest;
use crate::routing::pattern::{PathPattern, ReverseArgs};
use crate::routing::RoutingError;

/// A synchronous view function.
pub type ViewFn = dyn Fn(&PageRequest, &RouteMatch) -> Response + Send + Sync;

/// What a matched route hands the request to.
#[derive(Clone)]
pub enum Endpoint {
    /// The content-tree page view; driven by the dispatcher.
    Page,
    /// A plain view function.
    View(Arc<ViewFn>),
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Page => f.write_str("Endpoint::Page"),
            Endpoint::View(_) => f.write_str("Endpoint::View(..)"),
        }
    }
}

/// A single named route.
#[derive(Debug, Clone)]
pub struct Route {
    pattern: PathPattern,
    name: Option<String>,
    endpoint: Endpoint,
    defaults: BTreeMap<String, String>,
}

impl Route {
    /// A route served by the page view.
    pub fn page(pattern: &str) -> Result<Self, RoutingError> {
        Ok(Self {
            pattern: PathPattern::parse(pattern)?,
            name: None,
            endpoint: Endpoint::Page,
            defaults: BTreeMap::new(),
        })
    }

    /// A route served by a view function.
    pub fn view<F>(pattern: &str, view: F) -> Result<Self, RoutingError>
    where
        F: Fn(&PageRequest, &RouteMatch) -> Response + Send + Sync + 'static,
    {
        Ok(Self {
            pattern: PathPattern::parse(pattern)?,
            name: None,
            endpoint: Endpoint::View(Arc::new(view)),
            defaults: BTreeMap::new(),
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Extra keyword argument passed on every match. Overrides captures.
    pub fn with_default(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.defaults.insert(key.into(), value.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }
}

/// A sub-router grafted at a literal prefix.
#[derive(Debug, Clone)]
pub struct Mount {
    prefix: String,
    namespace: Option<String>,
    app_name: Option<String>,
    router: UrlRouter,
}

/// One entry of a router, in declaration order.
#[derive(Debug, Clone)]
pub enum RouterEntry {
    Route(Route),
    Mount(Mount),
}

/// Where a namespace is mounted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceEntry {
    /// Literal path prefix of the namespace, relative to the router.
    pub prefix: String,
    /// Application namespace shared by all instances, if any.
    pub app_name: Option<String>,
}

/// Result of forward resolution.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub endpoint: Endpoint,
    pub url_name: Option<String>,
    /// Instance namespaces crossed, outermost first.
    pub namespaces: Vec<String>,
    /// Application namespaces crossed, outermost first.
    pub app_names: Vec<String>,
    pub kwargs: BTreeMap<String, String>,
    /// Language taken from the path prefix, for language-prefixed routers.
    pub language: Option<String>,
}

impl RouteMatch {
    /// Fully qualified name, e.g. `blog:entry-detail`.
    pub fn view_name(&self) -> Option<String> {
        let name = self.url_name.as_deref()?;
        if self.namespaces.is_empty() {
            return Some(name.to_string());
        }
        Some(format!("{}:{}", self.namespaces.join(":"), name))
    }

    pub fn kwarg(&self, key: &str) -> Option<&str> {
        self.kwargs.get(key).map(String::as_str)
    }
}

/// An ordered collection of routes and mounts.
#[derive(Debug, Clone, Default)]
pub struct UrlRouter {
    entries: Vec<RouterEntry>,
    languages: Option<Vec<String>>,
}

impl UrlRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a route.
    pub fn route(mut self, route: Route) -> Self {
        self.entries.push(RouterEntry::Route(route));
        self
    }

    /// Graft a sub-router at `prefix` without a namespace.
    pub fn mount(mut self, prefix: impl Into<String>, router: UrlRouter) -> Self {
        self.entries.push(RouterEntry::Mount(Mount {
            prefix: prefix.into(),
            namespace: None,
            app_name: None,
            router,
        }));
        self
    }

    /// Graft a sub-router at `prefix` under an instance namespace.
    pub fn mount_namespaced(
        mut self,
        prefix: impl Into<String>,
        namespace: impl Into<String>,
        app_name: Option<String>,
        router: UrlRouter,
    ) -> Self {
        self.entries.push(RouterEntry::Mount(Mount {
            prefix: prefix.into(),
            namespace: Some(namespace.into()),
            app_name,
            router,
        }));
        self
    }

    /// Require a `{lang}/` first segment on resolution and emit one on reversal.
    pub fn language_prefixed(mut self, languages: Vec<String>) -> Self {
        self.languages = Some(languages);
        self
    }

    pub fn entries(&self) -> &[RouterEntry] {
        &self.entries
    }

    /// Resolve a path. Exactly one leading slash is stripped first.
    pub fn resolve(&self, path: &str) -> Result<RouteMatch, RoutingError> {
        let no_match = || RoutingError::NoPathMatch {
            path: path.to_string(),
        };
        let relative = path.strip_prefix('/').unwrap_or(path);

        let (relative, language) = match &self.languages {
            Some(languages) => {
                let (first, rest) = relative.split_once('/').unwrap_or((relative, ""));
                if !languages.iter().any(|l| l == first) {
                    return Err(no_match());
                }
                (rest, Some(first.to_string()))
            }
            None => (relative, None),
        };

        let mut matched = self.resolve_relative(relative).ok_or_else(no_match)?;
        matched.language = language;
        Ok(matched)
    }

    fn resolve_relative(&self, path: &str) -> Option<RouteMatch> {
        for entry in &self.entries {
            match entry {
                RouterEntry::Route(route) => {
                    if let Some(mut kwargs) = route.pattern.match_path(path) {
                        kwargs.extend(route.defaults.clone());
                        return Some(RouteMatch {
                            endpoint: route.endpoint.clone(),
                            url_name: route.name.clone(),
                            namespaces: Vec::new(),
                            app_names: Vec::new(),
                            kwargs,
                            language: None,
                        });
                    }
                }
                RouterEntry::Mount(mount) => {
                    let Some(rest) = path.strip_prefix(mount.prefix.as_str()) else {
                        continue;
                    };
                    if let Some(mut matched) = mount.router.resolve_relative(rest) {
                        if let Some(ns) = &mount.namespace {
                            matched.namespaces.insert(0, ns.clone());
                        }
                        if let Some(app) = &mount.app_name {
                            matched.app_names.insert(0, app.clone());
                        }
                        return Some(matched);
                    }
                }
            }
        }
        None
    }

    /// Reverse a route name (`name` or `ns:...:name`) to `prefix` + path.
    pub fn reverse(
        &self,
        name: &str,
        prefix: &str,
        args: &ReverseArgs,
        language: &str,
    ) -> Result<String, RoutingError> {
        let parts: Vec<&str> = name.split(':').collect();
        let path = self
            .reverse_relative(&parts, args)
            .ok_or_else(|| RoutingError::NoReverseMatch {
                name: name.to_string(),
            })?;

        if self.languages.is_some() {
            Ok(format!("{}{}/{}", prefix, language, path))
        } else {
            Ok(format!("{}{}", prefix, path))
        }
    }

    fn reverse_relative(&self, parts: &[&str], args: &ReverseArgs) -> Option<String> {
        match parts {
            [] => None,
            [view] => self.entries.iter().find_map(|entry| match entry {
                RouterEntry::Route(route) if route.name.as_deref() == Some(*view) => {
                    route.pattern.reverse(args)
                }
                RouterEntry::Mount(mount) if mount.namespace.is_none() => mount
                    .router
                    .reverse_relative(parts, args)
                    .map(|p| format!("{}{}", mount.prefix, p)),
                _ => None,
            }),
            [ns, rest @ ..] => {
                // Instance namespace first, then the application namespace.
                let direct = self
                    .mounts()
                    .find(|m| m.namespace.as_deref() == Some(*ns))
                    .or_else(|| self.mounts().find(|m| m.app_name.as_deref() == Some(*ns)));
                if let Some(mount) = direct {
                    return mount
                        .router
                        .reverse_relative(rest, args)
                        .map(|p| format!("{}{}", mount.prefix, p));
                }
                self.mounts()
                    .filter(|m| m.namespace.is_none())
                    .find_map(|m| {
                        m.router
                            .reverse_relative(parts, args)
                            .map(|p| format!("{}{}", m.prefix, p))
                    })
            }
        }
    }

    fn mounts(&self) -> impl Iterator<Item = &Mount> {
        self.entries.iter().filter_map(|e| match e {
            RouterEntry::Mount(m) => Some(m),
            RouterEntry::Route(_) => None,
        })
    }

    /// Instance namespaces reachable from this router.
    ///
    /// Namespaces nested in un-namespaced mounts are lifted with their
    /// prefix. Within one router the earliest declaration wins.
    pub fn namespace_index(&self) -> BTreeMap<String, NamespaceEntry> {
        let mut index = BTreeMap::new();
        self.collect_namespaces("", &mut index);
        index
    }

    fn collect_namespaces(&self, base: &str, index: &mut BTreeMap<String, NamespaceEntry>) {
        for mount in self.mounts() {
            let prefix = format!("{}{}", base, mount.prefix);
            match &mount.namespace {
                Some(ns) => {
                    index.entry(ns.clone()).or_insert(NamespaceEntry {
                        prefix,
                        app_name: mount.app_name.clone(),
                    });
                }
                None => mount.router.collect_namespaces(&prefix, index),
            }
        }
    }

    /// Application namespace to the instance namespaces deployed under it.
    pub fn app_index(&self) -> BTreeMap<String, Vec<String>> {
        let mut index: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (ns, entry) in self.namespace_index() {
            if let Some(app) = entry.app_name {
                index.entry(app).or_default().push(ns);
            }
        }
        index
    }
}

/// Build the primary router serving the content tree.
///
/// The root route (empty slug) is registered ahead of the slug route.
pub fn page_router(
    append_slash: bool,
    languages: Option<Vec<String>>,
) -> Result<UrlRouter, RoutingError> {
    let slug_pattern = if append_slash {
        "{slug:page}/"
    } else {
        "{slug:page}"
    };

    let router = UrlRouter::new()
        .route(
            Route::page("")?
                .with_name(PAGES_ROOT)
                .with_default("slug", ""),
        )
        .route(Route::page(slug_pattern)?.with_name(PAGES_DETAILS_BY_SLUG));

    Ok(match languages {
        Some(languages) => router.language_prefixed(languages),
        None => router,
    })
}

/// Route name of the content-tree root.
pub const PAGES_ROOT: &str = "pages-root";
/// Route name of every other content-tree page.
pub const PAGES_DETAILS_BY_SLUG: &str = "pages-details-by-slug";

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    fn ok_view(_: &PageRequest, _: &RouteMatch) -> Response {
        "ok".into_response()
    }

    fn blog() -> UrlRouter {
        UrlRouter::new()
            .route(Route::view("", ok_view).unwrap().with_name("index"))
            .route(
                Route::view("{id:int}/", ok_view)
                    .unwrap()
                    .with_name("entry"),
            )
    }

    #[test]
    fn test_resolve_strips_one_leading_slash() {
        let router = blog();
        assert!(router.resolve("/").is_ok());
        assert!(router.resolve("").is_ok());
        let m = router.resolve("/12/").unwrap();
        assert_eq!(m.url_name.as_deref(), Some("entry"));
        assert_eq!(m.kwarg("id"), Some("12"));
        assert!(matches!(
            router.resolve("//12/"),
            Err(RoutingError::NoPathMatch { .. })
        ));
    }

    #[test]
    fn test_first_declared_route_wins() {
        let router = UrlRouter::new()
            .route(Route::view("{x}/", ok_view).unwrap().with_name("first"))
            .route(Route::view("{y}/", ok_view).unwrap().with_name("second"));
        let m = router.resolve("/a/").unwrap();
        assert_eq!(m.url_name.as_deref(), Some("first"));
    }

    #[test]
    fn test_namespaced_mount_resolve_and_reverse() {
        let router = UrlRouter::new().mount_namespaced(
            "blog/",
            "news",
            Some("blog".to_string()),
            blog(),
        );

        let m = router.resolve("/blog/3/").unwrap();
        assert_eq!(m.view_name().as_deref(), Some("news:entry"));
        assert_eq!(m.app_names, vec!["blog".to_string()]);

        let args = ReverseArgs::named([("id", "3")]);
        assert_eq!(router.reverse("news:entry", "/", &args, "en").unwrap(), "/blog/3/");
        // Application namespace reaches the instance too
        assert_eq!(router.reverse("blog:entry", "/", &args, "en").unwrap(), "/blog/3/");
        // Namespaced names are not visible without the namespace
        assert!(router.reverse("entry", "/", &args, "en").is_err());
    }

    #[test]
    fn test_unnamespaced_mount_is_transparent() {
        let router = UrlRouter::new().mount("extra/", blog());
        assert_eq!(
            router.reverse("index", "/", &ReverseArgs::none(), "en").unwrap(),
            "/extra/"
        );
    }

    #[test]
    fn test_reverse_failure_reports_name() {
        let err = blog()
            .reverse("missing", "/", &ReverseArgs::none(), "en")
            .unwrap_err();
        assert_eq!(
            err,
            RoutingError::NoReverseMatch {
                name: "missing".into()
            }
        );
    }

    #[test]
    fn test_page_router_with_language_prefix() {
        let router = page_router(true, Some(vec!["en".into(), "de".into()])).unwrap();

        let root = router.resolve("/de/").unwrap();
        assert_eq!(root.url_name.as_deref(), Some(PAGES_ROOT));
        assert_eq!(root.kwarg("slug"), Some(""));
        assert_eq!(root.language.as_deref(), Some("de"));

        let page = router.resolve("/en/about/team/").unwrap();
        assert_eq!(page.kwarg("slug"), Some("about/team"));

        assert!(router.resolve("/fr/about/").is_err());
        assert_eq!(
            router.reverse(PAGES_ROOT, "/", &ReverseArgs::none(), "de").unwrap(),
            "/de/"
        );
    }

    #[test]
    fn test_page_router_without_trailing_slash() {
        let router = page_router(false, None).unwrap();
        assert_eq!(router.resolve("/about").unwrap().kwarg("slug"), Some("about"));
        assert_eq!(router.resolve("/").unwrap().url_name.as_deref(), Some(PAGES_ROOT));
    }

    #[test]
    fn test_namespace_and_app_index() {
        let router = UrlRouter::new()
            .mount_namespaced("a/", "one", Some("blog".into()), blog())
            .mount(
                "nested/",
                UrlRouter::new().mount_namespaced("b/", "two", Some("blog".into()), blog()),
            );

        let ns = router.namespace_index();
        assert_eq!(ns["one"].prefix, "a/");
        assert_eq!(ns["two"].prefix, "nested/b/");
        assert_eq!(
            router.app_index()["blog"],
            vec!["one".to_string(), "two".to_string()]
        );
    }
}
