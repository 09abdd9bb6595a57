//! # Tree Navigator
//!
//! An async router that resolves a path against a tree of routes:
//!
//! - **Nested Routes** - Child paths are relative to their parent's
//! - **Actions** - Async handlers that decide whether to continue into children
//! - **Parameters** - `:name`, custom regex, optional and repeated segments
//! - **First Match Wins** - Siblings are tested in declaration order
//! - **Error Handling** - Structured 404 failures with an optional recovery hook
//! - **Named Routes** - Generate paths back from route names
//! - **History** - In-memory navigation stack with listeners (feature `history`)
//!
//! # Quick Start
//!
//! ```
//! use tree_navigator::{ResolveError, Route, RouteContext, Router, RouterOptions};
//!
//! struct Session {
//!     user: String,
//! }
//!
//! let routes = vec![Route::new("/", |ctx: RouteContext<Session, String>| async move {
//!     let page = ctx.next().await?.unwrap_or_default();
//!     Ok::<_, ResolveError>(Some(format!("<layout>{}</layout>", page)))
//! })
//! .children(vec![
//!     Route::new("home", |ctx: RouteContext<Session, String>| {
//!         let user = ctx.context().user.clone();
//!         async move { Ok(Some(format!("hello {}", user))) }
//!     }),
//!     Route::new("posts/:slug", |ctx| {
//!         let slug = ctx.param("slug").unwrap_or_default().to_string();
//!         async move { Ok(Some(format!("post {}", slug))) }
//!     }),
//! ])];
//!
//! let options = RouterOptions::new().error_handler(|path, error, _ctx: &Session| {
//!     let page = format!("{} ({})", error, path);
//!     async move { Ok(Some(page)) }
//! });
//! let router = Router::with_options(routes, options).unwrap();
//!
//! let session = || Session { user: "ada".to_string() };
//! let page = pollster::block_on(router.resolve("/home", session())).unwrap();
//! assert_eq!(page.as_deref(), Some("<layout>hello ada</layout>"));
//!
//! let page = pollster::block_on(router.resolve("/missing", session())).unwrap();
//! assert_eq!(page.as_deref(), Some("Route not found: /missing (/missing)"));
//! ```
//!
//! # Feature Flags
//!
//! - `log` (default) - Uses the standard `log` crate for logging
//! - `tracing` - Uses the `tracing` crate for structured logging
//! - `history` (default) - In-memory [`History`] with serde-backed state

#![cfg_attr(docsrs, feature(doc_cfg))]
// Lints are configured in Cargo.toml [lints] section

// Logging abstraction
pub mod logging;

// Core routing modules
pub mod matcher;
pub mod options;
pub mod params;
pub mod route;
pub mod router;

// Error handling
pub mod error;

// Navigation history
#[cfg(feature = "history")]
pub mod history;

// Per-match context handed to actions
mod context;

pub use context::RouteContext;
pub use error::{BoxError, PatternError, ResolveError, RouterError};
#[cfg(feature = "history")]
pub use history::{
    AbortController, AbortSignal, History, HistoryEntry, HistoryError, ListenOptions, ListenerId,
    NavigationDirection, NavigationEvent,
};
pub use matcher::CompiledPattern;
pub use options::{ErrorHandler, RouterOptions, DEFAULT_BASE_URL};
pub use params::RouteParams;
pub use route::{Action, ActionFuture, IntoLocation, Location, Route};
pub use router::{NodeId, RouteNode, Router};
