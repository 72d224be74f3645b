//! Page request dispatch.
//!
//! # Data Flow
//! ```text
//! http layer
//!     → PageRequest (path, query, language, requester)
//!     → dispatcher.rs (page lookup, languages, apphooks, redirects, access)
//!     → template.rs (template for rendered pages)
//!     → DispatchOutcome → http::response
//! ```

pub mod dispatcher;
pub mod outcome;
pub mod request;
pub mod template;

pub use dispatcher::Dispatcher;
pub use outcome::{DispatchOutcome, RenderContext};
pub use request::PageRequest;
pub use template::select_template;
