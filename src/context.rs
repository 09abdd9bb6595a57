//! Per-match route context handed to actions

use crate::params::RouteParams;
use crate::route::{ActionFuture, Location};
use crate::router::{NodeId, RouteNode, Router};
use std::sync::Arc;
use url::Url;

/// Everything an action knows about the match it was invoked for
///
/// A fresh context is built for every matched node on every `resolve` call.
/// The caller's context value is shared by reference count and is never
/// inspected or modified by the router.
pub struct RouteContext<C, R> {
    router: Router<C, R>,
    route: NodeId,
    parent: Option<NodeId>,
    params: RouteParams,
    location: Arc<Location>,
    context: Arc<C>,
}

impl<C, R> RouteContext<C, R> {
    pub(crate) fn new(
        router: Router<C, R>,
        route: NodeId,
        parent: Option<NodeId>,
        params: RouteParams,
        location: Arc<Location>,
        context: Arc<C>,
    ) -> Self {
        Self {
            router,
            route,
            parent,
            params,
            location,
            context,
        }
    }

    /// The matched node
    pub fn route(&self) -> &RouteNode<C, R> {
        self.router.node(self.route)
    }

    /// The matched ancestor whose children were being scanned
    pub fn parent(&self) -> Option<&RouteNode<C, R>> {
        self.parent.map(|id| self.router.node(id))
    }

    /// Parameters captured by the matched pattern, ancestors included
    pub fn params(&self) -> &RouteParams {
        &self.params
    }

    /// Shorthand for `params().get(key)`
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key)
    }

    /// The candidate exactly as given to `resolve`
    pub fn path(&self) -> &str {
        self.location.input()
    }

    /// The candidate resolved against the base URL
    pub fn url(&self) -> Option<&Url> {
        self.location.url()
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    /// The caller's context
    pub fn context(&self) -> &C {
        &self.context
    }

    /// The caller's context, for moving into a future
    pub fn shared_context(&self) -> Arc<C> {
        Arc::clone(&self.context)
    }

    pub fn router(&self) -> &Router<C, R> {
        &self.router
    }
}

impl<C, R> RouteContext<C, R>
where
    C: Send + Sync + 'static,
    R: Send + 'static,
{
    /// Resolve the same path against this route's children
    ///
    /// Yields `Ok(None)` when the route has no children. Not-found and action
    /// failures from the children propagate through the returned future.
    /// Every call runs child resolution again; nothing is memoized.
    ///
    /// # Example
    ///
    /// ```
    /// use tree_navigator::{ResolveError, Route, Router};
    ///
    /// let router: Router<(), String> = Router::new(vec![Route::new("/admin", |ctx| async move {
    ///     let inner = ctx.next().await?.unwrap_or_default();
    ///     Ok::<_, ResolveError>(Some(format!("<admin>{}</admin>", inner)))
    /// })
    /// .child(Route::new("users", |_ctx| async { Ok(Some("users".to_string())) }))])
    /// .unwrap();
    ///
    /// let page = pollster::block_on(router.resolve("/admin/users", ())).unwrap();
    /// assert_eq!(page.as_deref(), Some("<admin>users</admin>"));
    /// ```
    pub fn next(&self) -> ActionFuture<R> {
        self.router.next_within(
            self.route,
            Arc::clone(&self.location),
            Arc::clone(&self.context),
        )
    }
}

impl<C, R> Clone for RouteContext<C, R> {
    fn clone(&self) -> Self {
        Self {
            router: self.router.clone(),
            route: self.route,
            parent: self.parent,
            params: self.params.clone(),
            location: Arc::clone(&self.location),
            context: Arc::clone(&self.context),
        }
    }
}

impl<C, R> std::fmt::Debug for RouteContext<C, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteContext")
            .field("route", &self.route().pattern().source())
            .field("parent", &self.parent().map(|node| node.pattern().source()))
            .field("params", &self.params)
            .field("path", &self.path())
            .finish()
    }
}
