//! Content-tree page and title types.
//!
//! Pages are read-only here; they are owned by the content store and shared
//! via Arc.

use std::collections::BTreeMap;
use std::fmt;

use crate::content::ContentError;

/// Template name meaning "use the parent's template".
pub const TEMPLATE_INHERIT: &str = "INHERIT";

/// Unique page identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageId(pub u64);

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Localized slug and state of a page for one language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Title {
    pub language: String,
    pub title: String,
    pub slug: String,
    /// Slug chain from the tree root; empty for the home page.
    pub path: String,
    pub published: bool,
    /// Per-language redirect target.
    pub redirect: Option<String>,
}

/// A node in the content tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub id: PageId,
    pub parent: Option<PageId>,
    /// The home page contributes an empty path segment.
    pub is_home: bool,
    pub template: String,
    /// Titles keyed by language code.
    pub titles: BTreeMap<String, Title>,
    /// Apphook identity hosted by this page.
    pub apphook: Option<String>,
    pub apphook_namespace: Option<String>,
    pub login_required: bool,
    /// Groups allowed to view the page. Empty means public.
    pub view_groups: Vec<String>,
}

impl Page {
    pub fn has_language(&self, language: &str) -> bool {
        self.titles.contains_key(language)
    }

    pub fn title(&self, language: &str) -> Option<&Title> {
        self.titles.get(language)
    }

    pub fn is_published(&self, language: &str) -> bool {
        self.titles.get(language).is_some_and(|t| t.published)
    }

    /// Published in at least one language.
    pub fn is_public(&self) -> bool {
        self.titles.values().any(|t| t.published)
    }

    pub fn redirect(&self, language: &str) -> Option<&str> {
        self.titles
            .get(language)
            .and_then(|t| t.redirect.as_deref())
            .filter(|r| !r.is_empty())
    }

    /// Apphook identity bound for `language`.
    ///
    /// The binding is read through the page's title row, so a page without a
    /// title in `language` reports `MissingTitle` rather than "no apphook".
    pub fn application_urls(&self, language: &str) -> Result<Option<&str>, ContentError> {
        if !self.titles.contains_key(language) {
            return Err(ContentError::MissingTitle {
                page: self.id,
                language: language.to_string(),
            });
        }
        Ok(self.apphook.as_deref().filter(|a| !a.is_empty()))
    }
}
