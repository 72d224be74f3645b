//! Page permission checks.

use crate::content::page::Page;

/// The identity behind a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Requester {
    /// `None` for anonymous requests.
    pub username: Option<String>,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub groups: Vec<String>,
}

impl Requester {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.username.is_some()
    }
}

/// Whether `requester` may see `page` at all.
pub fn has_view_permission(page: &Page, requester: &Requester) -> bool {
    if page.view_groups.is_empty() || requester.is_superuser {
        return true;
    }
    requester.is_authenticated()
        && requester
            .groups
            .iter()
            .any(|g| page.view_groups.contains(g))
}

/// Whether `requester` may edit `page`.
pub fn has_change_permission(_page: &Page, requester: &Requester) -> bool {
    requester.is_superuser || requester.is_staff
}
