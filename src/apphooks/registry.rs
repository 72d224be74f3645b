//! Apphook registration.
//!
//! # Responsibilities
//! - Hold the registered apphooks in registration order
//! - Reject duplicate identities
//! - Apply the configured allow-list
//!
//! # Design Decisions
//! - Built once at startup; shared read-only via Arc
//! - Iteration order is registration order and is observable: it decides
//!   reverse-resolution and namespace-merge precedence between apphooks

use std::fmt;
use std::sync::Arc;

use crate::apphooks::RegistryError;
use crate::routing::UrlRouter;

/// An application that a page can host.
pub trait Apphook: Send + Sync {
    /// Stable identity stored on hosting pages.
    fn name(&self) -> &str;

    /// Application namespace for reverse lookups (`app:name`). Also the
    /// current app of delegated requests on pages without an instance
    /// namespace.
    fn app_name(&self) -> Option<&str> {
        None
    }

    /// Build a fresh router over the application's URL configuration.
    /// Paths are relative to the hosting page.
    fn urls(&self) -> UrlRouter;
}

/// Closure-backed apphook.
pub struct FnApphook {
    name: String,
    app_name: Option<String>,
    urls: Box<dyn Fn() -> UrlRouter + Send + Sync>,
}

impl FnApphook {
    pub fn new<F>(name: impl Into<String>, urls: F) -> Self
    where
        F: Fn() -> UrlRouter + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            app_name: None,
            urls: Box::new(urls),
        }
    }

    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }
}

impl Apphook for FnApphook {
    fn name(&self) -> &str {
        &self.name
    }

    fn app_name(&self) -> Option<&str> {
        self.app_name.as_deref()
    }

    fn urls(&self) -> UrlRouter {
        (self.urls)()
    }
}

impl fmt::Debug for FnApphook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnApphook")
            .field("name", &self.name)
            .field("app_name", &self.app_name)
            .finish_non_exhaustive()
    }
}

/// Ordered set of registered apphooks.
#[derive(Clone, Default)]
pub struct ApphookRegistry {
    hooks: Vec<Arc<dyn Apphook>>,
}

impl ApphookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an apphook. Identities must be unique.
    pub fn register(&mut self, hook: impl Apphook + 'static) -> Result<(), RegistryError> {
        if self.get(hook.name()).is_some() {
            return Err(RegistryError::Duplicate(hook.name().to_string()));
        }
        tracing::debug!(apphook = hook.name(), "Apphook registered");
        self.hooks.push(Arc::new(hook));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Apphook>> {
        self.hooks.iter().find(|h| h.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Apphook>> {
        self.hooks.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.hooks.iter().map(|h| h.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Keep only the apphooks named in `enabled`, in registration order.
    /// An empty list keeps everything.
    pub fn restricted_to(&self, enabled: &[String]) -> Self {
        if enabled.is_empty() {
            return self.clone();
        }
        for name in enabled {
            if self.get(name).is_none() {
                tracing::warn!(apphook = %name, "Enabled apphook is not registered");
            }
        }
        Self {
            hooks: self
                .hooks
                .iter()
                .filter(|h| enabled.iter().any(|e| e == h.name()))
                .cloned()
                .collect(),
        }
    }
}

impl fmt::Debug for ApphookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ApphookRegistry {
        let mut registry = ApphookRegistry::new();
        registry.register(FnApphook::new("Blog", UrlRouter::new)).unwrap();
        registry
            .register(FnApphook::new("Shop", UrlRouter::new).with_app_name("shop"))
            .unwrap();
        registry.register(FnApphook::new("Faq", UrlRouter::new)).unwrap();
        registry
    }

    #[test]
    fn test_registration_order_preserved() {
        assert_eq!(registry().names(), vec!["Blog", "Shop", "Faq"]);
        assert_eq!(registry().get("Shop").unwrap().app_name(), Some("shop"));
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut registry = registry();
        let err = registry
            .register(FnApphook::new("Blog", UrlRouter::new))
            .unwrap_err();
        assert_eq!(err, RegistryError::Duplicate("Blog".into()));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_allow_list_keeps_registration_order() {
        let enabled = vec!["Faq".to_string(), "Blog".to_string(), "Missing".to_string()];
        let restricted = registry().restricted_to(&enabled);
        assert_eq!(restricted.names(), vec!["Blog", "Faq"]);
        assert_eq!(registry().restricted_to(&[]).len(), 3);
    }
}
