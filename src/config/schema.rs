//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the site.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SiteConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Page-serving behaviour.
    pub site: SiteSettings,

    /// Languages and fallback policy.
    pub i18n: I18nConfig,

    /// Apphook allow-list.
    pub apphooks: ApphookConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Identities accepted via bearer token.
    pub users: Vec<UserConfig>,

    /// Content tree.
    pub pages: Vec<PageConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Page-serving behaviour.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteSettings {
    /// Development mode: an empty site root shows the welcome page.
    pub debug: bool,

    /// Page URLs end with a slash.
    pub append_slash: bool,

    /// Where unauthenticated visitors of login-only pages are sent.
    pub login_url: String,

    /// Template names a staff user may select with `?template=`.
    pub templates: Vec<String>,

    /// Template used when a page inherits and no ancestor sets one.
    pub default_template: String,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            debug: false,
            append_slash: true,
            login_url: "/accounts/login/".to_string(),
            templates: Vec::new(),
            default_template: "page.html".to_string(),
        }
    }
}

/// Language configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct I18nConfig {
    pub default_language: String,

    /// Prefix page URLs with `/{lang}/`.
    pub prefix_patterns: bool,

    pub languages: Vec<LanguageConfig>,
}

impl Default for I18nConfig {
    fn default() -> Self {
        Self {
            default_language: "en".to_string(),
            prefix_patterns: true,
            languages: vec![LanguageConfig::new("en")],
        }
    }
}

/// A single configured language.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LanguageConfig {
    pub code: String,

    #[serde(default)]
    pub name: Option<String>,

    /// Shown to anonymous visitors.
    #[serde(default = "default_true")]
    pub public: bool,

    /// Ordered fallback chain. Defaults to the other public languages.
    #[serde(default)]
    pub fallbacks: Option<Vec<String>>,

    /// Redirect to the fallback URL instead of rendering in place.
    #[serde(default = "default_true")]
    pub redirect_on_fallback: bool,
}

impl LanguageConfig {
    /// A public language with default fallback policy.
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: None,
            public: true,
            fallbacks: None,
            redirect_on_fallback: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Apphook allow-list.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ApphookConfig {
    /// Registered apphooks to enable. Empty enables all.
    pub enabled: Vec<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// "pretty" or "json".
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// An identity accepted via `Authorization: Bearer <token>`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserConfig {
    pub username: String,
    pub token: String,
    #[serde(default)]
    pub staff: bool,
    #[serde(default)]
    pub superuser: bool,
    #[serde(default)]
    pub groups: Vec<String>,
}

/// A content-tree page.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PageConfig {
    pub id: u64,

    #[serde(default)]
    pub parent: Option<u64>,

    /// The site root page; its slug is not part of child paths.
    #[serde(default)]
    pub home: bool,

    #[serde(default = "default_page_template")]
    pub template: String,

    #[serde(default)]
    pub apphook: Option<String>,

    #[serde(default)]
    pub apphook_namespace: Option<String>,

    #[serde(default)]
    pub login_required: bool,

    #[serde(default)]
    pub view_groups: Vec<String>,

    #[serde(default)]
    pub titles: Vec<TitleConfig>,
}

fn default_page_template() -> String {
    crate::content::TEMPLATE_INHERIT.to_string()
}

/// A page title for one language.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TitleConfig {
    pub language: String,
    pub title: String,
    pub slug: String,
    #[serde(default = "default_true")]
    pub published: bool,
    #[serde(default)]
    pub redirect: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_document_uses_defaults() {
        let config: SiteConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8000");
        assert!(config.site.append_slash);
        assert_eq!(config.i18n.default_language, "en");
        assert!(config.pages.is_empty());
    }

    #[test]
    fn test_pages_and_languages() {
        let doc = r#"
            [i18n]
            default_language = "de"
            languages = [
                { code = "de" },
                { code = "en", public = false, fallbacks = ["de"] },
            ]

            [[pages]]
            id = 1
            home = true
            template = "home.html"
            titles = [{ language = "de", title = "Start", slug = "start" }]

            [[pages]]
            id = 2
            parent = 1
            apphook = "Blog"
            titles = [{ language = "de", title = "Blog", slug = "blog", published = false }]
        "#;
        let config: SiteConfig = toml::from_str(doc).unwrap();
        assert!(!config.i18n.languages[1].public);
        assert!(config.i18n.languages[0].redirect_on_fallback);
        assert_eq!(config.pages[1].template, "INHERIT");
        assert!(!config.pages[1].titles[0].published);
        assert!(config.pages[0].titles[0].published);
    }
}
