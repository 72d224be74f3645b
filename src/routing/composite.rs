//! Primary router composed with apphook routers.
//!
//! # Responsibilities
//! - Forward resolution: primary router only
//! - Reverse resolution: primary first, then a hosting page's instance
//!   namespace, then each apphook router in registry order; an apphook hit is
//!   rebased onto the page hosting the apphook
//! - Merged namespace / app indexes
//! - Memoize apphook → hosting page bindings
//!
//! # Design Decisions
//! - One instance per site snapshot; rebuilding the site drops the cache
//! - The cache (including "unbound") is never invalidated by this type
//! - Cache check, page lookup and write-back happen under a single mutex,
//!   so each identity is looked up at most once per router

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use crate::apphooks::{Apphook, ApphookRegistry};
use crate::content::{Page, PageIndex};
use crate::observability::metrics;
use crate::routing::pattern::ReverseArgs;
use crate::routing::router::{NamespaceEntry, RouteMatch, RouterEntry, UrlRouter};
use crate::routing::RoutingError;

/// Cached hosting page for an apphook identity or instance namespace.
#[derive(Debug, Clone)]
enum Binding {
    Page(Arc<Page>),
    Unbound,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum BindingKey {
    Apphook(String),
    Namespace(String),
}

impl BindingKey {
    fn label(&self) -> &str {
        match self {
            BindingKey::Apphook(name) | BindingKey::Namespace(name) => name,
        }
    }
}

/// Primary router plus one router per registered apphook.
pub struct CompositeRouter {
    primary: UrlRouter,
    /// Registry snapshot order.
    apphooks: Vec<(String, UrlRouter)>,
    pages: Arc<dyn PageIndex>,
    bindings: Mutex<HashMap<BindingKey, Binding>>,
}

impl CompositeRouter {
    /// Build from the primary router and a registry snapshot.
    pub fn new(primary: UrlRouter, registry: &ApphookRegistry, pages: Arc<dyn PageIndex>) -> Self {
        let apphooks: Vec<(String, UrlRouter)> = registry
            .iter()
            .map(|hook| (hook.name().to_string(), scoped_urls(hook.as_ref())))
            .collect();

        tracing::info!(apphooks = apphooks.len(), "Composite router built");

        Self {
            primary,
            apphooks,
            pages,
            bindings: Mutex::new(HashMap::new()),
        }
    }

    /// The primary router's entries. Apphook routes are never listed.
    pub fn url_patterns(&self) -> &[RouterEntry] {
        self.primary.entries()
    }

    /// Router built for the apphook registered as `name`.
    pub fn apphook_router(&self, name: &str) -> Option<&UrlRouter> {
        self.apphooks
            .iter()
            .find(|(apphook, _)| apphook == name)
            .map(|(_, router)| router)
    }

    /// Primary namespaces merged with every apphook router's.
    pub fn namespace_index(&self) -> BTreeMap<String, NamespaceEntry> {
        merge_indexes(
            self.primary.namespace_index(),
            self.apphooks.iter().map(|(_, r)| r.namespace_index()),
        )
    }

    /// Primary app index merged with every apphook router's.
    pub fn app_index(&self) -> BTreeMap<String, Vec<String>> {
        merge_indexes(
            self.primary.app_index(),
            self.apphooks.iter().map(|(_, r)| r.app_index()),
        )
    }

    /// Forward resolution, delegated to the primary router.
    pub fn resolve_path(&self, path: &str) -> Result<RouteMatch, RoutingError> {
        self.primary.resolve(path)
    }

    /// Reverse a route name for the active `language`.
    ///
    /// When neither router yields a path, the primary router's error is
    /// returned unchanged.
    pub fn reverse(
        &self,
        name: &str,
        prefix: &str,
        args: &ReverseArgs,
        language: &str,
    ) -> Result<String, RoutingError> {
        let original = match self.primary.reverse(name, prefix, args, language) {
            Ok(path) => return Ok(path),
            Err(e) => e,
        };
        self.reverse_for_instance(name, prefix, args, language)
            .or_else(|| self.reverse_for_apphook(name, prefix, args, language))
            .ok_or(original)
    }

    /// `ns:rest` where `ns` is the instance namespace of a hosting page:
    /// `rest` is reversed in that page's apphook and rebased onto that page.
    fn reverse_for_instance(
        &self,
        name: &str,
        prefix: &str,
        args: &ReverseArgs,
        language: &str,
    ) -> Option<String> {
        let (namespace, rest) = name.split_once(':')?;
        let page = self.bound_page(BindingKey::Namespace(namespace.to_string()))?;
        let router = self.apphook_router(page.apphook.as_deref()?)?;
        let raw = router.reverse(rest, prefix, args, language).ok()?;
        self.rebase(&page, &raw, language)
    }

    fn reverse_for_apphook(
        &self,
        name: &str,
        prefix: &str,
        args: &ReverseArgs,
        language: &str,
    ) -> Option<String> {
        let (apphook, raw) = self.apphooks.iter().find_map(|(apphook, router)| {
            router
                .reverse(name, prefix, args, language)
                .ok()
                .map(|raw| (apphook.as_str(), raw))
        })?;

        let page = self.bound_page(BindingKey::Apphook(apphook.to_string()))?;
        self.rebase(&page, &raw, language)
    }

    fn rebase(&self, page: &Page, raw: &str, language: &str) -> Option<String> {
        let base = self.pages.absolute_url(page, language)?;
        let relative = raw.strip_prefix('/').unwrap_or(raw);
        Some(format!("{}{}", base, relative))
    }

    /// Hosting page for `key`, looked up once and then cached.
    fn bound_page(&self, key: BindingKey) -> Option<Arc<Page>> {
        let mut bindings = self
            .bindings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let binding = match bindings.get(&key) {
            Some(binding) => binding.clone(),
            None => {
                let host = match &key {
                    BindingKey::Apphook(apphook) => self.pages.published_page_for_apphook(apphook),
                    BindingKey::Namespace(ns) => self.pages.published_page_for_namespace(ns),
                };
                let binding = match host {
                    Some(page) => {
                        tracing::debug!(key = key.label(), page = %page.id, "Apphook bound to page");
                        Binding::Page(page)
                    }
                    None => {
                        tracing::warn!(key = key.label(), "No published page hosts apphook");
                        Binding::Unbound
                    }
                };
                metrics::record_binding_lookup(key.label(), matches!(binding, Binding::Page(_)));
                bindings.insert(key, binding.clone());
                binding
            }
        };

        match binding {
            Binding::Page(page) => Some(page),
            Binding::Unbound => None,
        }
    }
}

/// An apphook's URL configuration, scoped under its application namespace
/// when it declares one. Names stay reachable without the namespace too.
fn scoped_urls(hook: &dyn Apphook) -> UrlRouter {
    match hook.app_name() {
        Some(app) => UrlRouter::new()
            .mount_namespaced("", app, Some(app.to_string()), hook.urls())
            .mount("", hook.urls()),
        None => hook.urls(),
    }
}

impl std::fmt::Debug for CompositeRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeRouter")
            .field("primary", &self.primary)
            .field(
                "apphooks",
                &self.apphooks.iter().map(|(n, _)| n).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

/// Merge indexes in order: each later index overwrites earlier keys.
///
/// Intentional precedence: apphook entries overwrite the primary router's,
/// and a later apphook (registry order) overwrites an earlier one.
pub fn merge_indexes<V, I>(base: BTreeMap<String, V>, overlays: I) -> BTreeMap<String, V>
where
    I: IntoIterator<Item = BTreeMap<String, V>>,
{
    let mut merged = base;
    for overlay in overlays {
        merged.extend(overlay);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap as Map;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::response::{IntoResponse, Response};

    use crate::apphooks::FnApphook;
    use crate::content::{InMemoryPageIndex, PageId, PageMatch, Title, UrlScheme};
    use crate::dispatch::PageRequest;
    use crate::routing::{page_router, Route};

    fn view(_: &PageRequest, _: &RouteMatch) -> Response {
        "app".into_response()
    }

    /// Counts apphook host lookups reaching the content store.
    struct CountingIndex {
        inner: InMemoryPageIndex,
        apphook_lookups: AtomicUsize,
    }

    impl PageIndex for CountingIndex {
        fn page_for_path(&self, path: &str, drafts: bool) -> Option<PageMatch> {
            self.inner.page_for_path(path, drafts)
        }
        fn published_page_for_apphook(&self, apphook: &str) -> Option<Arc<Page>> {
            self.apphook_lookups.fetch_add(1, Ordering::SeqCst);
            self.inner.published_page_for_apphook(apphook)
        }
        fn published_page_for_namespace(&self, namespace: &str) -> Option<Arc<Page>> {
            self.inner.published_page_for_namespace(namespace)
        }
        fn absolute_url(&self, page: &Page, language: &str) -> Option<String> {
            self.inner.absolute_url(page, language)
        }
        fn ancestors(&self, page: &Page) -> Vec<Arc<Page>> {
            self.inner.ancestors(page)
        }
    }

    fn page(id: u64, parent: Option<u64>, slug: &str, apphook: Option<&str>) -> Page {
        let mut titles = Map::new();
        for lang in ["en", "de"] {
            titles.insert(
                lang.to_string(),
                Title {
                    language: lang.into(),
                    title: slug.into(),
                    slug: format!("{}-{}", slug, lang),
                    path: String::new(),
                    published: true,
                    redirect: None,
                },
            );
        }
        Page {
            id: PageId(id),
            parent: parent.map(PageId),
            is_home: id == 1,
            template: "page.html".into(),
            titles,
            apphook: apphook.map(str::to_string),
            apphook_namespace: None,
            login_required: false,
            view_groups: Vec::new(),
        }
    }

    fn registry() -> ApphookRegistry {
        let mut registry = ApphookRegistry::new();
        registry
            .register(FnApphook::new("Blog", || {
                UrlRouter::new()
                    .route(Route::view("", view).unwrap().with_name("blog-index"))
                    .route(
                        Route::view("{id:int}/", view)
                            .unwrap()
                            .with_name("blog-entry"),
                    )
                    .route(Route::view("about/", view).unwrap().with_name("shared"))
            }))
            .unwrap();
        registry
            .register(FnApphook::new("Shop", || {
                UrlRouter::new()
                    .route(Route::view("cart/", view).unwrap().with_name("shop-cart"))
                    .route(Route::view("other/", view).unwrap().with_name("shared"))
            }))
            .unwrap();
        registry
    }

    fn router(pages: Vec<Page>) -> (CompositeRouter, Arc<CountingIndex>) {
        let index = Arc::new(CountingIndex {
            inner: InMemoryPageIndex::new(pages, UrlScheme::default()).unwrap(),
            apphook_lookups: AtomicUsize::new(0),
        });
        let primary = page_router(true, Some(vec!["en".into(), "de".into()]))
            .unwrap()
            .route(Route::view("login/", view).unwrap().with_name("blog-entry"));
        let router = CompositeRouter::new(primary, &registry(), index.clone());
        (router, index)
    }

    fn site() -> Vec<Page> {
        vec![
            page(1, None, "home", None),
            page(2, Some(1), "news", None),
            page(3, Some(2), "blog", Some("Blog")),
        ]
    }

    #[test]
    fn test_apphook_reverse_rebased_on_host_page() {
        let (router, index) = router(site());
        let args = ReverseArgs::named([("id", "5")]);
        for _ in 0..3 {
            // blog-entry also exists on the primary router but needs no args
            let url = router.reverse("blog-index", "/", &ReverseArgs::none(), "en").unwrap();
            assert_eq!(url, "/en/news-en/blog-en/");
        }
        let url = router.reverse("blog-entry", "/", &args, "de").unwrap();
        assert_eq!(url, "/de/news-de/blog-de/5/");
        assert_eq!(index.apphook_lookups.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_primary_router_takes_precedence() {
        let (router, index) = router(site());
        let url = router
            .reverse("blog-entry", "/", &ReverseArgs::none(), "en")
            .unwrap();
        assert_eq!(url, "/en/login/");
        assert_eq!(index.apphook_lookups.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_first_apphook_in_registry_order_wins() {
        let (router, _) = router(site());
        // "shared" exists in Blog and Shop; Blog is registered first
        let url = router.reverse("shared", "/", &ReverseArgs::none(), "en").unwrap();
        assert_eq!(url, "/en/news-en/blog-en/about/");
    }

    #[test]
    fn test_unbound_apphook_cached_as_no_match() {
        let (router, index) = router(site());
        for _ in 0..3 {
            let err = router
                .reverse("shop-cart", "/", &ReverseArgs::none(), "en")
                .unwrap_err();
            assert_eq!(
                err,
                RoutingError::NoReverseMatch {
                    name: "shop-cart".into()
                }
            );
        }
        assert_eq!(index.apphook_lookups.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unknown_name_returns_primary_error() {
        let (router, _) = router(site());
        let err = router
            .reverse("nope", "/", &ReverseArgs::none(), "en")
            .unwrap_err();
        assert_eq!(err, RoutingError::NoReverseMatch { name: "nope".into() });
    }

    #[test]
    fn test_apphook_on_home_page_has_no_double_slash() {
        let pages = vec![page(1, None, "home", Some("Blog"))];
        let (router, _) = router(pages);
        let url = router
            .reverse("blog-entry", "/", &ReverseArgs::positional(["9"]), "en")
            .unwrap();
        assert_eq!(url, "/en/9/");
        assert!(!url.starts_with("//"));
    }

    #[test]
    fn test_resolve_path_ignores_apphook_routes() {
        let (router, _) = router(site());
        let m = router.resolve_path("/en/news-en/blog-en/5/").unwrap();
        assert_eq!(m.kwarg("slug"), Some("news-en/blog-en/5"));
        assert!(router.resolve_path("/cart/").is_err());
        assert_eq!(router.url_patterns().len(), 3);
    }

    #[test]
    fn test_concurrent_reverse_looks_up_once() {
        let (router, index) = router(site());
        let router = Arc::new(router);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let router = router.clone();
                std::thread::spawn(move || {
                    router
                        .reverse("blog-index", "/", &ReverseArgs::none(), "en")
                        .unwrap()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), "/en/news-en/blog-en/");
        }
        assert_eq!(index.apphook_lookups.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_app_and_instance_namespaces_reverse() {
        let mut registry = ApphookRegistry::new();
        registry
            .register(
                FnApphook::new("Blog", || {
                    UrlRouter::new()
                        .route(Route::view("", view).unwrap().with_name("blog-index"))
                        .route(
                            Route::view("{id:int}/", view)
                                .unwrap()
                                .with_name("blog-entry"),
                        )
                })
                .with_app_name("blog"),
            )
            .unwrap();
        let mut news = page(2, Some(1), "news", Some("Blog"));
        news.apphook_namespace = Some("news".into());
        let mut archive = page(3, Some(1), "archive", Some("Blog"));
        archive.apphook_namespace = Some("archive".into());
        let index = Arc::new(
            InMemoryPageIndex::new(
                vec![page(1, None, "home", None), news, archive],
                UrlScheme::default(),
            )
            .unwrap(),
        );
        let primary = page_router(true, Some(vec!["en".into(), "de".into()])).unwrap();
        let router = CompositeRouter::new(primary, &registry, index);
        let none = ReverseArgs::none();

        // Application namespace binds to the first hosting page
        assert_eq!(router.reverse("blog:blog-index", "/", &none, "en").unwrap(), "/en/news-en/");
        assert_eq!(router.reverse("blog-index", "/", &none, "en").unwrap(), "/en/news-en/");
        // Instance namespaces pick their own hosting page
        assert_eq!(router.reverse("news:blog-index", "/", &none, "en").unwrap(), "/en/news-en/");
        let url = router
            .reverse("archive:blog-entry", "/", &ReverseArgs::named([("id", "4")]), "de")
            .unwrap();
        assert_eq!(url, "/de/archive-de/4/");
        assert_eq!(
            router.reverse("gone:blog-index", "/", &none, "en").unwrap_err(),
            RoutingError::NoReverseMatch {
                name: "gone:blog-index".into()
            }
        );

        let ns = router.namespace_index();
        assert_eq!(ns["blog"].prefix, "");
        assert_eq!(ns["blog"].app_name.as_deref(), Some("blog"));
        assert_eq!(router.app_index()["blog"], vec!["blog".to_string()]);
    }

    #[test]
    fn test_merge_precedence() {
        let primary = Map::from([("a".to_string(), 0), ("b".to_string(), 0)]);
        let first = Map::from([("b".to_string(), 1), ("c".to_string(), 1)]);
        let second = Map::from([("c".to_string(), 2)]);
        let merged = merge_indexes(primary, [first, second]);
        assert_eq!(merged["a"], 0);
        assert_eq!(merged["b"], 1);
        assert_eq!(merged["c"], 2);
    }

    #[test]
    fn test_namespace_index_apphook_overwrites_primary() {
        let inner = || UrlRouter::new().route(Route::view("", view).unwrap().with_name("x"));
        let primary = UrlRouter::new().mount_namespaced("p/", "shared", None, inner());
        let mut registry = ApphookRegistry::new();
        registry
            .register(FnApphook::new("One", move || {
                UrlRouter::new().mount_namespaced("one/", "shared", Some("app".into()), inner())
            }))
            .unwrap();
        registry
            .register(FnApphook::new("Two", move || {
                UrlRouter::new().mount_namespaced("two/", "shared", Some("app".into()), inner())
            }))
            .unwrap();
        let index = Arc::new(InMemoryPageIndex::default());
        let router = CompositeRouter::new(primary, &registry, index);

        let ns = router.namespace_index();
        assert_eq!(ns["shared"].prefix, "two/");
        assert_eq!(router.app_index()["app"], vec!["shared".to_string()]);
    }
}
