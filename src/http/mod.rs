//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, timeout)
//!     → request.rs (identity, language, PageRequest)
//!     → routing::CompositeRouter (forward resolution)
//!     → dispatch::Dispatcher or an apphook view
//!     → response.rs (render, redirect, not found)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use response::{BasicRenderer, Renderer};
pub use server::{AppState, HttpServer};
