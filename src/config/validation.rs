//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (languages, page parents)
//! - Validate value ranges (timeouts > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SiteConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use thiserror::Error;

use crate::config::schema::SiteConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("default language '{0}' is not configured")]
    UnknownDefaultLanguage(String),

    #[error("language '{0}' is configured more than once")]
    DuplicateLanguage(String),

    #[error("language '{language}' falls back to unknown language '{fallback}'")]
    UnknownFallback { language: String, fallback: String },

    #[error("page {page} has a title in unknown language '{language}'")]
    UnknownTitleLanguage { page: u64, language: String },

    #[error("page {page} has two titles in language '{language}'")]
    DuplicateTitle { page: u64, language: String },

    #[error("page id {0} is used more than once")]
    DuplicatePage(u64),

    #[error("page {page} references unknown parent {parent}")]
    UnknownParent { page: u64, parent: u64 },

    #[error("more than one home page: {0:?}")]
    MultipleHomePages(Vec<u64>),

    #[error("default template '{0}' is not listed in site.templates")]
    UnlistedDefaultTemplate(String),

    #[error("site.login_url must not be empty")]
    EmptyLoginUrl,

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroTimeout,

    #[error("user token for '{0}' is used more than once")]
    DuplicateToken(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &SiteConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let mut codes = HashSet::new();
    for language in &config.i18n.languages {
        if !codes.insert(language.code.as_str()) {
            errors.push(ValidationError::DuplicateLanguage(language.code.clone()));
        }
    }
    if !codes.contains(config.i18n.default_language.as_str()) {
        errors.push(ValidationError::UnknownDefaultLanguage(
            config.i18n.default_language.clone(),
        ));
    }
    for language in &config.i18n.languages {
        for fallback in language.fallbacks.iter().flatten() {
            if !codes.contains(fallback.as_str()) {
                errors.push(ValidationError::UnknownFallback {
                    language: language.code.clone(),
                    fallback: fallback.clone(),
                });
            }
        }
    }

    let mut ids = HashSet::new();
    for page in &config.pages {
        if !ids.insert(page.id) {
            errors.push(ValidationError::DuplicatePage(page.id));
        }
    }
    for page in &config.pages {
        if let Some(parent) = page.parent {
            if !ids.contains(&parent) {
                errors.push(ValidationError::UnknownParent {
                    page: page.id,
                    parent,
                });
            }
        }
        let mut title_languages = HashSet::new();
        for title in &page.titles {
            if !codes.contains(title.language.as_str()) {
                errors.push(ValidationError::UnknownTitleLanguage {
                    page: page.id,
                    language: title.language.clone(),
                });
            }
            if !title_languages.insert(title.language.as_str()) {
                errors.push(ValidationError::DuplicateTitle {
                    page: page.id,
                    language: title.language.clone(),
                });
            }
        }
    }
    let homes: Vec<u64> = config.pages.iter().filter(|p| p.home).map(|p| p.id).collect();
    if homes.len() > 1 {
        errors.push(ValidationError::MultipleHomePages(homes));
    }

    let site = &config.site;
    if !site.templates.is_empty() && !site.templates.contains(&site.default_template) {
        errors.push(ValidationError::UnlistedDefaultTemplate(
            site.default_template.clone(),
        ));
    }
    if site.login_url.is_empty() {
        errors.push(ValidationError::EmptyLoginUrl);
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }

    let mut tokens = HashSet::new();
    for user in &config.users {
        if !tokens.insert(user.token.as_str()) {
            errors.push(ValidationError::DuplicateToken(user.username.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{LanguageConfig, PageConfig, TitleConfig};

    fn page(id: u64, parent: Option<u64>, language: &str) -> PageConfig {
        PageConfig {
            id,
            parent,
            home: false,
            template: "page.html".into(),
            apphook: None,
            apphook_namespace: None,
            login_required: false,
            view_groups: Vec::new(),
            titles: vec![TitleConfig {
                language: language.into(),
                title: "t".into(),
                slug: format!("p{}", id),
                published: true,
                redirect: None,
            }],
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&SiteConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = SiteConfig::default();
        config.i18n.default_language = "xx".into();
        config.i18n.languages.push(LanguageConfig {
            fallbacks: Some(vec!["zz".into()]),
            ..LanguageConfig::new("de")
        });
        config.pages = vec![page(1, None, "en"), page(1, Some(7), "fr")];
        config.site.login_url.clear();

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.contains(&ValidationError::UnknownDefaultLanguage("xx".into())));
        assert!(errors.contains(&ValidationError::UnknownFallback {
            language: "de".into(),
            fallback: "zz".into()
        }));
        assert!(errors.contains(&ValidationError::DuplicatePage(1)));
        assert!(errors.contains(&ValidationError::UnknownParent { page: 1, parent: 7 }));
        assert!(errors.contains(&ValidationError::UnknownTitleLanguage {
            page: 1,
            language: "fr".into()
        }));
        assert!(errors.contains(&ValidationError::EmptyLoginUrl));
    }

    #[test]
    fn test_single_home_page() {
        let mut config = SiteConfig::default();
        let mut a = page(1, None, "en");
        a.home = true;
        let mut b = page(2, None, "en");
        b.home = true;
        config.pages = vec![a, b];
        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::MultipleHomePages(vec![1, 2])]
        );
    }

    #[test]
    fn test_default_template_must_be_listed() {
        let mut config = SiteConfig::default();
        config.site.templates = vec!["a.html".into()];
        assert_eq!(
            validate_config(&config).unwrap_err(),
            vec![ValidationError::UnlistedDefaultTemplate("page.html".into())]
        );
    }
}
