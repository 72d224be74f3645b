//! Page request dispatcher.
//!
//! # State Machine
//! ```text
//! page lookup ─▶ language check ─▶ fallback ─▶ apphook ─▶ redirect
//!      │               │               │           │          │
//!   welcome/404   root redirect     redirect/   delegated  redirect
//!                    or 404          404                      │
//!                                                 login ◀─────┘
//!                                                   │
//!                                        view permission ─▶ render
//! ```
//!
//! # Design Decisions
//! - Every redirect carries the request's edit-mode suffix
//! - A redirect pointing back at the request itself is ignored
//! - Missing permissions look exactly like a missing page

use std::sync::Arc;

use url::form_urlencoded;

use crate::apphooks::ApphookRegistry;
use crate::config::SiteSettings;
use crate::content::{has_change_permission, has_view_permission, Page, PageIndex, PageMatch};
use crate::dispatch::outcome::{DispatchOutcome, RenderContext};
use crate::dispatch::request::PageRequest;
use crate::dispatch::template::select_template;
use crate::i18n::LanguageSettings;
use crate::observability::metrics;
use crate::routing::{CompositeRouter, Endpoint, ReverseArgs, PAGES_ROOT};

/// Runs page requests against one site snapshot.
pub struct Dispatcher {
    pages: Arc<dyn PageIndex>,
    router: Arc<CompositeRouter>,
    registry: Arc<ApphookRegistry>,
    languages: Arc<LanguageSettings>,
    settings: SiteSettings,
}

impl Dispatcher {
    pub fn new(
        pages: Arc<dyn PageIndex>,
        router: Arc<CompositeRouter>,
        registry: Arc<ApphookRegistry>,
        languages: Arc<LanguageSettings>,
        settings: SiteSettings,
    ) -> Self {
        Self {
            pages,
            router,
            registry,
            languages,
            settings,
        }
    }

    /// Dispatch `request` for the page at `slug` (no leading or trailing
    /// slash; empty for the root).
    pub fn dispatch(&self, request: &PageRequest, slug: &str) -> DispatchOutcome {
        let outcome = self.run(request, slug);
        tracing::debug!(
            path = %request.path,
            slug,
            language = %request.language,
            outcome = outcome.label(),
            "Page dispatched"
        );
        metrics::record_dispatch(outcome.label());
        outcome
    }

    fn run(&self, request: &PageRequest, slug: &str) -> DispatchOutcome {
        let Some(PageMatch { page, remainder }) =
            self.pages.page_for_path(slug, request.shows_drafts())
        else {
            return self.no_page(slug);
        };

        let language = request.language.as_str();
        let suffix = request.edit_suffix();

        let user_languages = if request.requester.is_staff {
            self.languages.language_list()
        } else {
            self.languages.public_languages()
        };
        let available: Vec<&str> = user_languages
            .iter()
            .copied()
            .filter(|l| page.has_language(l))
            .collect();

        if !user_languages.contains(&language) {
            if !slug.is_empty() {
                return DispatchOutcome::NotFound;
            }
            let Some(&first) = available.first() else {
                return DispatchOutcome::NotFound;
            };
            if self.languages.is_public(first) {
                match self
                    .router
                    .reverse(PAGES_ROOT, "/", &ReverseArgs::none(), first)
                {
                    Ok(root) => return DispatchOutcome::Redirect(format!("{root}{suffix}")),
                    Err(e) => tracing::warn!(error = %e, language = first, "Cannot reverse site root"),
                }
            }
        }

        let mut content_language = language.to_string();
        if !available.contains(&language) {
            let fallback = self
                .languages
                .fallbacks(language)
                .iter()
                .find(|alt| available.contains(&alt.as_str()));
            let Some(alt) = fallback else {
                return DispatchOutcome::NotFound;
            };
            if self.languages.redirect_on_fallback(alt) {
                if let Some(url) = self.pages.absolute_url(&page, alt) {
                    return DispatchOutcome::Redirect(format!("{url}{suffix}"));
                }
            }
            tracing::debug!(page = %page.id, language, fallback = %alt, "Rendering fallback content");
            content_language = alt.clone();
        }

        if !self.registry.is_empty() {
            if let Some(outcome) = self.dispatch_apphook(request, &page, language, &remainder) {
                return outcome;
            }
        }
        if !remainder.is_empty() {
            return DispatchOutcome::NotFound;
        }

        if let Some(target) = page.redirect(language) {
            let target = self.localize_redirect(target, language);
            if self.points_at_request(&target, request) {
                tracing::debug!(page = %page.id, target = %target, "Ignoring self-redirect");
            } else {
                return DispatchOutcome::Redirect(format!("{target}{suffix}"));
            }
        }

        if page.login_required && !request.requester.is_authenticated() {
            return DispatchOutcome::Redirect(self.login_redirect(request));
        }

        if !has_view_permission(&page, &request.requester) {
            return DispatchOutcome::NotFound;
        }

        DispatchOutcome::Render(RenderContext {
            template: select_template(&page, request, self.pages.as_ref(), &self.settings),
            language: language.to_string(),
            content_language,
            has_change_permissions: has_change_permission(&page, &request.requester),
            has_view_permissions: true,
            page,
        })
    }

    fn no_page(&self, slug: &str) -> DispatchOutcome {
        if slug.is_empty() && self.settings.debug {
            DispatchOutcome::Welcome
        } else {
            DispatchOutcome::NotFound
        }
    }

    /// Hand the request to the apphook hosted by `page`, if one serves it.
    fn dispatch_apphook(
        &self,
        request: &PageRequest,
        page: &Arc<Page>,
        language: &str,
        remainder: &str,
    ) -> Option<DispatchOutcome> {
        let name = match page.application_urls(language) {
            Ok(name) => name?,
            Err(e) => {
                tracing::debug!(error = %e, "No apphook for language");
                return None;
            }
        };

        // Editors of an unpublished translation see the page, not the app
        if !page.is_published(language) && request.edit_mode() {
            return None;
        }

        let Some(router) = self.router.apphook_router(name) else {
            tracing::warn!(apphook = name, page = %page.id, "Page hosts an unregistered apphook");
            return None;
        };

        let mut path = format!("/{remainder}");
        if !remainder.is_empty() && self.settings.append_slash {
            path.push('/');
        }
        let matched = router.resolve(&path).ok()?;
        let Endpoint::View(view) = &matched.endpoint else {
            return None;
        };

        let mut app_request = request.clone();
        app_request.current_page = Some(page.clone());
        app_request.current_app = page.apphook_namespace.clone().or_else(|| {
            self.registry
                .get(name)
                .and_then(|hook| hook.app_name().map(str::to_string))
        });

        tracing::debug!(apphook = name, path = %path, "Delegating to apphook");
        Some(DispatchOutcome::Delegated(view(&app_request, &matched)))
    }

    /// Prefix a site-relative redirect with the active language.
    fn localize_redirect(&self, target: &str, language: &str) -> String {
        let prefix = format!("/{language}/");
        if self.languages.uses_prefix_patterns()
            && target.starts_with('/')
            && !target.starts_with(&prefix)
        {
            format!("{}{}", prefix, target.trim_start_matches('/'))
        } else {
            target.to_string()
        }
    }

    fn points_at_request(&self, target: &str, request: &PageRequest) -> bool {
        target == request.absolute_uri()
            || target == format!("/{}", request.path)
            || target == request.path
    }

    fn login_redirect(&self, request: &PageRequest) -> String {
        let next: String = form_urlencoded::byte_serialize(request.full_path().as_bytes()).collect();
        let separator = if self.settings.login_url.contains('?') {
            '&'
        } else {
            '?'
        };
        format!("{}{}next={}", self.settings.login_url, separator, next)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("router", &self.router)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
