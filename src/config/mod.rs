//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → SiteConfig (validated, immutable)
//!     → lifecycle::startup builds a Site snapshot from it
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → server rebuilds the Site and swaps it atomically
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    ApphookConfig, I18nConfig, LanguageConfig, ListenerConfig, ObservabilityConfig, PageConfig,
    SiteConfig, SiteSettings, TimeoutConfig, TitleConfig, UserConfig,
};
pub use validation::{validate_config, ValidationError};
pub use watcher::ConfigWatcher;
