//! canonize - canonical URL redirects for HTTP servers.
//!
//! canonize decides whether an incoming request must be sent to its canonical
//! URL and, if so, answers with a `301 Moved Permanently`. It is meant to sit
//! in front of an application as an `axum` middleware layer.
//!
//! # Policies
//! Evaluated for every request, in this order:
//! - **TLS**: redirect plain HTTP to `https`
//! - **Host**: enforce one host name (honouring a single `X-Forwarded-Host`)
//! - **Lower case**: lower-case the path, with an optional exempting regex
//! - **Trailing slash** / **No trailing slash**: add or strip the final `/`,
//!   each with an optional exempting regex (the root path is never touched)
//! - **Regex redirects**: ordered `pattern -> template` rules, first match wins
//! - **Exact redirects**: literal `path -> path` table, applied last
//!
//! # Quick Example
//! ```no_run
//! use std::sync::Arc;
//!
//! use axum::{Router, middleware, routing::get};
//! use canonize::{CsvRuleSource, RedirectEngine, create_redirect_middleware};
//!
//! # fn main() -> Result<(), canonize::core::RuleError> {
//! let mut builder = RedirectEngine::builder()
//!     .force_tls(true)
//!     .force_host("www.example.com")
//!     .force_no_trailing_slash(true);
//! builder.append_redirects(&CsvRuleSource::new("redirects.csv"))?;
//! let engine = Arc::new(builder.build()?);
//!
//! let app: Router = Router::new()
//!     .route("/", get(|| async { "Hello" }))
//!     .layer(middleware::from_fn(create_redirect_middleware(engine)));
//! # Ok(()) }
//! ```
//!
//! # Architecture
//! The crate separates **ports** (traits) from **adapters** (implementations)
//! while keeping the decision logic inside `core`. The engine is built once
//! through [`RedirectEngineBuilder`] and is immutable afterwards, so a single
//! `Arc<RedirectEngine>` is shared by every request without locking.
//!
//! # Error Handling
//! Library errors are typed (`thiserror`). Invalid regular expressions and
//! malformed rule tables are rejected while the engine is being built; the
//! only request-time failure is a redirect target that cannot be parsed back
//! into a URL, answered with a `500`.
pub mod config;
pub mod metrics;
pub mod ports;
pub mod server;
pub mod tracing_setup;
pub mod utils;

pub mod adapters;
pub mod core;

// Re-export the specific types needed by the binary crate
pub use crate::{
    adapters::{CsvRuleSource, HttpRequestView, UrlRequestView, create_redirect_middleware},
    core::{Decision, Policy, RedirectEngine, RedirectEngineBuilder},
    ports::{RequestView, RuleSource},
};
