//! Route definition and candidate locations

use crate::context::RouteContext;
use crate::error::ResolveError;
use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::sync::Arc;
use url::Url;

/// Future produced by actions, `next()` and `resolve`
///
/// `Ok(None)` is the "no value" outcome: a matched route that produced
/// nothing. It is distinct from a not-found failure.
pub type ActionFuture<R> = BoxFuture<'static, Result<Option<R>, ResolveError>>;

/// Handler invoked when a route matches
pub type Action<C, R> = Arc<dyn Fn(RouteContext<C, R>) -> ActionFuture<R> + Send + Sync>;

// ============================================================================
// Route
// ============================================================================

/// Route definition
///
/// Routes form a strict tree. A route's `path` is relative to its parent: the
/// router strips leading and trailing `/` from every segment and joins the
/// chain, so `"/dashboard"` with a child `"settings"` matches
/// `/dashboard/settings`.
///
/// # Example
///
/// ```
/// use tree_navigator::Route;
///
/// let routes: Vec<Route<(), String>> = vec![Route::group("/dashboard").children(vec![
///     Route::new("overview", |_ctx| async { Ok(Some("overview".to_string())) }),
///     Route::new("users/:id", |ctx| {
///         let id = ctx.param("id").unwrap_or_default().to_string();
///         async move { Ok(Some(format!("user {}", id))) }
///     }),
/// ])];
/// # assert_eq!(routes[0].get_children().len(), 2);
/// ```
pub struct Route<C, R> {
    pub(crate) path: String,
    pub(crate) name: Option<String>,
    pub(crate) action: Option<Action<C, R>>,
    pub(crate) children: Vec<Route<C, R>>,
}

impl<C, R> Route<C, R> {
    /// Create a route with an action
    ///
    /// The action receives a [`RouteContext`] and decides by itself whether to
    /// delegate to the route's children through [`RouteContext::next`].
    pub fn new<F, Fut>(path: impl Into<String>, action: F) -> Self
    where
        C: 'static,
        R: 'static,
        F: Fn(RouteContext<C, R>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<R>, ResolveError>> + Send + 'static,
    {
        Self {
            path: path.into(),
            name: None,
            action: Some(Arc::new(move |ctx| action(ctx).boxed())),
            children: Vec::new(),
        }
    }

    /// Create a route without an action
    ///
    /// When it matches, resolution passes straight through to its children.
    /// Without children it resolves to `Ok(None)`.
    pub fn group(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: None,
            action: None,
            children: Vec::new(),
        }
    }

    /// Replace the child routes
    pub fn children(mut self, children: Vec<Route<C, R>>) -> Self {
        self.children = children;
        self
    }

    /// Append a single child route
    pub fn child(mut self, child: Route<C, R>) -> Self {
        self.children.push(child);
        self
    }

    /// Set route name
    ///
    /// Named routes can be turned back into URLs with
    /// [`Router::url_for`](crate::Router::url_for).
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn get_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn has_action(&self) -> bool {
        self.action.is_some()
    }

    pub fn get_children(&self) -> &[Route<C, R>] {
        &self.children
    }
}

impl<C, R> std::fmt::Debug for Route<C, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("path", &self.path)
            .field("name", &self.name)
            .field("action", &self.action.is_some())
            .field("children", &self.children)
            .finish()
    }
}

// ============================================================================
// Locations
// ============================================================================

/// A candidate path as supplied by the caller, resolved against the base URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    input: String,
    url: Option<Url>,
}

impl Location {
    /// The candidate exactly as supplied
    pub fn input(&self) -> &str {
        &self.input
    }

    /// The candidate resolved against the base URL; `None` if unparsable
    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }
}

/// Types accepted as a candidate path by `resolve`
///
/// Strings are joined onto the router's base URL, so both `"/users/1"` and
/// absolute URLs work. A string that cannot be parsed produces a location no
/// route matches.
pub trait IntoLocation {
    fn into_location(self, base: &Url) -> Location;
}

impl IntoLocation for &str {
    fn into_location(self, base: &Url) -> Location {
        let url = match base.join(self) {
            Ok(url) => Some(url),
            Err(err) => {
                crate::warn_log!("Cannot resolve '{}' against '{}': {}", self, base, err);
                None
            }
        };
        Location {
            input: self.to_string(),
            url,
        }
    }
}

impl IntoLocation for String {
    fn into_location(self, base: &Url) -> Location {
        self.as_str().into_location(base)
    }
}

impl IntoLocation for &String {
    fn into_location(self, base: &Url) -> Location {
        self.as_str().into_location(base)
    }
}

impl IntoLocation for Url {
    fn into_location(self, _base: &Url) -> Location {
        Location {
            input: self.as_str().to_string(),
            url: Some(self),
        }
    }
}

impl IntoLocation for &Url {
    fn into_location(self, base: &Url) -> Location {
        self.clone().into_location(base)
    }
}

impl IntoLocation for Location {
    fn into_location(self, _base: &Url) -> Location {
        self
    }
}
