//! Page lookup.
//!
//! # Responsibilities
//! - Find the page serving a slug path (exact title path, else the deepest
//!   apphook host whose path prefixes it)
//! - Find the published page hosting an apphook
//! - Compute a page's absolute URL for a language
//!
//! # Design Decisions
//! - `PageIndex` is the seam to the content store; lookups are blocking
//! - Index order is page id order; "first match" means lowest id
//! - Title paths are computed once when the index is built

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::content::page::{Page, PageId};
use crate::content::ContentError;

/// A page matched for a request path.
#[derive(Debug, Clone)]
pub struct PageMatch {
    pub page: Arc<Page>,
    /// Part of the path below the page, without leading slash. Empty for
    /// exact matches; only apphook hosts match with a remainder.
    pub remainder: String,
}

/// Read access to the content tree.
pub trait PageIndex: Send + Sync {
    /// Page serving `path` (slug chain without surrounding slashes).
    /// Unpublished titles only count when `drafts` is set.
    fn page_for_path(&self, path: &str, drafts: bool) -> Option<PageMatch>;

    /// First published page whose apphook identity equals `apphook`.
    fn published_page_for_apphook(&self, apphook: &str) -> Option<Arc<Page>>;

    /// First published apphook host whose instance namespace is `namespace`.
    fn published_page_for_namespace(&self, namespace: &str) -> Option<Arc<Page>>;

    /// Absolute URL of `page` in `language`, falling back to any title the
    /// page has. `None` only for pages without titles.
    fn absolute_url(&self, page: &Page, language: &str) -> Option<String>;

    /// Ancestors of `page`, nearest first.
    fn ancestors(&self, page: &Page) -> Vec<Arc<Page>>;
}

/// How page paths map to URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UrlScheme {
    pub language_prefixed: bool,
    pub append_slash: bool,
}

impl Default for UrlScheme {
    fn default() -> Self {
        Self {
            language_prefixed: true,
            append_slash: true,
        }
    }
}

impl UrlScheme {
    /// URL for a slug chain in `language`.
    pub fn url_for(&self, language: &str, path: &str) -> String {
        let mut url = String::from("/");
        if self.language_prefixed {
            url.push_str(language);
            url.push('/');
        }
        if !path.is_empty() {
            url.push_str(path);
            if self.append_slash {
                url.push('/');
            }
        }
        url
    }
}

/// Page index over an in-memory snapshot of the tree.
#[derive(Debug, Default)]
pub struct InMemoryPageIndex {
    pages: BTreeMap<PageId, Arc<Page>>,
    scheme: UrlScheme,
}

impl InMemoryPageIndex {
    /// Build the index, computing every title's path from the tree.
    pub fn new(pages: Vec<Page>, scheme: UrlScheme) -> Result<Self, ContentError> {
        let mut by_id: BTreeMap<PageId, Page> = BTreeMap::new();
        for page in pages {
            let id = page.id;
            if by_id.insert(id, page).is_some() {
                return Err(ContentError::DuplicatePage(id));
            }
        }

        let mut paths: BTreeMap<(PageId, String), String> = BTreeMap::new();
        for page in by_id.values() {
            for language in page.titles.keys() {
                let path = compute_path(&by_id, page, language, 0)?;
                paths.insert((page.id, language.clone()), path);
            }
        }

        let pages = by_id
            .into_iter()
            .map(|(id, mut page)| {
                for (language, title) in page.titles.iter_mut() {
                    if let Some(path) = paths.remove(&(id, language.clone())) {
                        title.path = path;
                    }
                }
                (id, Arc::new(page))
            })
            .collect();

        Ok(Self { pages, scheme })
    }

    pub fn get(&self, id: PageId) -> Option<Arc<Page>> {
        self.pages.get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

fn compute_path(
    pages: &BTreeMap<PageId, Page>,
    page: &Page,
    language: &str,
    depth: usize,
) -> Result<String, ContentError> {
    if depth > pages.len() {
        return Err(ContentError::Cycle(page.id));
    }
    if page.is_home {
        return Ok(String::new());
    }
    let slug = page
        .title(language)
        .or_else(|| page.titles.values().next())
        .map(|t| t.slug.trim_matches('/'))
        .unwrap_or_default();

    let Some(parent_id) = page.parent else {
        return Ok(slug.to_string());
    };
    let parent = pages.get(&parent_id).ok_or(ContentError::UnknownParent {
        page: page.id,
        parent: parent_id,
    })?;
    let base = compute_path(pages, parent, language, depth + 1)?;
    if base.is_empty() {
        Ok(slug.to_string())
    } else {
        Ok(format!("{}/{}", base, slug))
    }
}

impl PageIndex for InMemoryPageIndex {
    fn page_for_path(&self, path: &str, drafts: bool) -> Option<PageMatch> {
        let path = path.trim_matches('/');
        let visible = |published: bool| drafts || published;

        let exact = self.pages.values().find(|page| {
            page.titles
                .values()
                .any(|t| t.path == path && visible(t.published))
        });
        if let Some(page) = exact {
            return Some(PageMatch {
                page: page.clone(),
                remainder: String::new(),
            });
        }

        // Deepest apphook host whose path prefixes the request
        let mut best: Option<(&Arc<Page>, usize)> = None;
        for page in self.pages.values() {
            if page.apphook.as_deref().map_or(true, str::is_empty) {
                continue;
            }
            for title in page.titles.values() {
                if !visible(title.published) {
                    continue;
                }
                let hosts = title.path.is_empty()
                    || path
                        .strip_prefix(title.path.as_str())
                        .is_some_and(|rest| rest.starts_with('/'));
                if hosts && best.map_or(true, |(_, len)| title.path.len() > len) {
                    best = Some((page, title.path.len()));
                }
            }
        }

        best.map(|(page, len)| PageMatch {
            page: page.clone(),
            remainder: path[len..].trim_start_matches('/').to_string(),
        })
    }

    fn published_page_for_apphook(&self, apphook: &str) -> Option<Arc<Page>> {
        self.pages
            .values()
            .find(|p| p.apphook.as_deref() == Some(apphook) && p.is_public())
            .cloned()
    }

    fn published_page_for_namespace(&self, namespace: &str) -> Option<Arc<Page>> {
        self.pages
            .values()
            .find(|p| {
                p.apphook.is_some()
                    && p.apphook_namespace.as_deref() == Some(namespace)
                    && p.is_public()
            })
            .cloned()
    }

    fn absolute_url(&self, page: &Page, language: &str) -> Option<String> {
        let title = page
            .title(language)
            .or_else(|| page.titles.values().next())?;
        Some(self.scheme.url_for(language, &title.path))
    }

    fn ancestors(&self, page: &Page) -> Vec<Arc<Page>> {
        let mut out = Vec::new();
        let mut next = page.parent;
        while let Some(id) = next {
            let Some(parent) = self.pages.get(&id) else {
                break;
            };
            if out.len() > self.pages.len() {
                break;
            }
            out.push(parent.clone());
            next = parent.parent;
        }
        out
    }
}
