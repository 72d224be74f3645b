//! Page-tree site server with pluggable applications ("apphooks").
//!
//! Pages form a tree with per-language titles. Applications are attached to
//! pages and contribute their own URL routes; reverse resolution rebases
//! those routes onto the hosting page's URL.

pub mod apphooks;
pub mod config;
pub mod content;
pub mod dispatch;
pub mod http;
pub mod i18n;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use apphooks::{Apphook, ApphookRegistry, FnApphook};
pub use config::schema::SiteConfig;
pub use http::HttpServer;
pub use lifecycle::{ShutdownSignal, Site};
