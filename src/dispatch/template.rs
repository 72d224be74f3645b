//! Template selection.

use crate::config::SiteSettings;
use crate::content::{Page, PageIndex, TEMPLATE_INHERIT};
use crate::dispatch::PageRequest;

/// Pick the template for `page`.
///
/// Staff may override it with `?template=` for any listed template.
/// Inheriting pages take the nearest ancestor's template.
pub fn select_template(
    page: &Page,
    request: &PageRequest,
    pages: &dyn PageIndex,
    settings: &SiteSettings,
) -> String {
    if request.requester.is_staff {
        if let Some(requested) = request.param("template") {
            if settings.templates.iter().any(|t| t == requested) {
                return requested.to_string();
            }
        }
    }

    let concrete = |t: &str| !t.is_empty() && t != TEMPLATE_INHERIT;
    if concrete(&page.template) {
        return page.template.clone();
    }
    pages
        .ancestors(page)
        .iter()
        .map(|p| p.template.as_str())
        .find(|t| concrete(t))
        .map(str::to_string)
        .unwrap_or_else(|| settings.default_template.clone())
}
