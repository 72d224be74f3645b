//! Configured languages and fallback policy.

use crate::config::I18nConfig;

/// One configured language, with its fallback chain resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Language {
    pub code: String,
    pub name: String,
    pub public: bool,
    pub fallbacks: Vec<String>,
    pub redirect_on_fallback: bool,
}

/// Language list, public subset and fallback policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageSettings {
    languages: Vec<Language>,
    default_language: String,
    prefix_patterns: bool,
}

impl LanguageSettings {
    /// Build from configuration. A language without an explicit fallback
    /// chain falls back to every other public language, in declared order.
    pub fn from_config(config: &I18nConfig) -> Self {
        let public: Vec<&str> = config
            .languages
            .iter()
            .filter(|l| l.public)
            .map(|l| l.code.as_str())
            .collect();

        let languages = config
            .languages
            .iter()
            .map(|l| Language {
                code: l.code.clone(),
                name: l.name.clone().unwrap_or_else(|| l.code.clone()),
                public: l.public,
                fallbacks: l.fallbacks.clone().unwrap_or_else(|| {
                    public
                        .iter()
                        .filter(|c| **c != l.code)
                        .map(|c| c.to_string())
                        .collect()
                }),
                redirect_on_fallback: l.redirect_on_fallback,
            })
            .collect();

        Self {
            languages,
            default_language: config.default_language.clone(),
            prefix_patterns: config.prefix_patterns,
        }
    }

    /// Every configured language code.
    pub fn language_list(&self) -> Vec<&str> {
        self.languages.iter().map(|l| l.code.as_str()).collect()
    }

    /// Codes of the publicly exposed languages.
    pub fn public_languages(&self) -> Vec<&str> {
        self.languages
            .iter()
            .filter(|l| l.public)
            .map(|l| l.code.as_str())
            .collect()
    }

    pub fn get(&self, code: &str) -> Option<&Language> {
        self.languages.iter().find(|l| l.code == code)
    }

    pub fn is_configured(&self, code: &str) -> bool {
        self.get(code).is_some()
    }

    pub fn is_public(&self, code: &str) -> bool {
        self.get(code).is_some_and(|l| l.public)
    }

    /// Ordered fallback chain of `code`.
    pub fn fallbacks(&self, code: &str) -> &[String] {
        self.get(code).map(|l| l.fallbacks.as_slice()).unwrap_or(&[])
    }

    /// Whether falling back to `code` redirects instead of rendering in place.
    pub fn redirect_on_fallback(&self, code: &str) -> bool {
        self.get(code).is_some_and(|l| l.redirect_on_fallback)
    }

    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    /// Whether page URLs carry a `/{lang}/` prefix.
    pub fn uses_prefix_patterns(&self) -> bool {
        self.prefix_patterns
    }
}
