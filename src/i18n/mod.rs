//! Internationalization helpers.
//!
//! # Data Flow
//! ```text
//! [i18n] config
//!     → languages.rs (language list, public subset, fallback chains)
//!     → negotiation.rs (active language for a request)
//!     → consumed by the dispatcher's availability and fallback checks
//! ```

pub mod languages;
pub mod negotiation;

pub use languages::{Language, LanguageSettings};
pub use negotiation::{language_from_request, parse_accept_language};
