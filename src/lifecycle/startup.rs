//! Site snapshot construction.
//!
//! # Responsibilities
//! - Validate configuration
//! - Build the page index, apphook registry view, routers and dispatcher
//! - Build the bearer-token identity table
//!
//! # Design Decisions
//! - Fail fast: any build error rejects the whole snapshot
//! - A snapshot is immutable; reloads build a new one (and a new binding cache)

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::apphooks::ApphookRegistry;
use crate::config::{validate_config, ConfigError, PageConfig, SiteConfig};
use crate::content::{ContentError, InMemoryPageIndex, Page, PageId, PageIndex, Requester, Title, UrlScheme};
use crate::dispatch::Dispatcher;
use crate::i18n::LanguageSettings;
use crate::routing::{page_router, CompositeRouter, RoutingError};

/// Errors that prevent a site snapshot from being built.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid content tree: {0}")]
    Content(#[from] ContentError),

    #[error("invalid routes: {0}")]
    Routing(#[from] RoutingError),
}

/// Everything needed to serve requests for one configuration.
pub struct Site {
    pub config: SiteConfig,
    pub languages: Arc<LanguageSettings>,
    pub pages: Arc<InMemoryPageIndex>,
    pub registry: Arc<ApphookRegistry>,
    pub router: Arc<CompositeRouter>,
    pub dispatcher: Dispatcher,
    users: HashMap<String, Requester>,
}

impl Site {
    /// Build a snapshot from `config` and the registered apphooks.
    pub fn build(config: SiteConfig, apphooks: &ApphookRegistry) -> Result<Self, StartupError> {
        validate_config(&config).map_err(ConfigError::Validation)?;

        let languages = Arc::new(LanguageSettings::from_config(&config.i18n));
        let scheme = UrlScheme {
            language_prefixed: config.i18n.prefix_patterns,
            append_slash: config.site.append_slash,
        };
        let pages = Arc::new(InMemoryPageIndex::new(
            config.pages.iter().map(page_from_config).collect(),
            scheme,
        )?);
        let index: Arc<dyn PageIndex> = pages.clone();

        let registry = Arc::new(apphooks.restricted_to(&config.apphooks.enabled));

        let prefixes = config.i18n.prefix_patterns.then(|| {
            languages
                .language_list()
                .into_iter()
                .map(str::to_string)
                .collect()
        });
        let primary = page_router(config.site.append_slash, prefixes)?;
        let router = Arc::new(CompositeRouter::new(primary, &registry, index.clone()));

        let dispatcher = Dispatcher::new(
            index,
            router.clone(),
            registry.clone(),
            languages.clone(),
            config.site.clone(),
        );

        let users = config
            .users
            .iter()
            .map(|u| {
                let requester = Requester {
                    username: Some(u.username.clone()),
                    is_staff: u.staff,
                    is_superuser: u.superuser,
                    groups: u.groups.clone(),
                };
                (u.token.clone(), requester)
            })
            .collect();

        tracing::info!(
            pages = pages.len(),
            apphooks = registry.len(),
            languages = languages.language_list().len(),
            "Site built"
        );

        Ok(Self {
            config,
            languages,
            pages,
            registry,
            router,
            dispatcher,
            users,
        })
    }

    /// Identity for a bearer token.
    pub fn requester_for_token(&self, token: &str) -> Option<&Requester> {
        self.users.get(token)
    }
}

impl std::fmt::Debug for Site {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Site")
            .field("pages", &self.pages.len())
            .field("registry", &self.registry)
            .field("router", &self.router)
            .finish_non_exhaustive()
    }
}

fn page_from_config(config: &PageConfig) -> Page {
    let titles = config
        .titles
        .iter()
        .map(|t| {
            let title = Title {
                language: t.language.clone(),
                title: t.title.clone(),
                slug: t.slug.clone(),
                path: String::new(),
                published: t.published,
                redirect: t.redirect.clone(),
            };
            (t.language.clone(), title)
        })
        .collect();

    Page {
        id: PageId(config.id),
        parent: config.parent.map(PageId),
        is_home: config.home,
        template: config.template.clone(),
        titles,
        apphook: config.apphook.clone(),
        apphook_namespace: config.apphook_namespace.clone(),
        login_required: config.login_required,
        view_groups: config.view_groups.clone(),
    }
}
