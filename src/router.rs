//! Route tree resolution
//!
//! The [`Router`] flattens the route tree into an arena at construction time.
//! Each node gets a [`NodeId`] and its own [`CompiledPattern`], so a node's
//! matcher is looked up by index and never shared between nodes.
//!
//! Resolution walks siblings in declaration order. The first sibling whose
//! pattern matches wins and the remaining siblings are never tested. A node
//! with an action hands control to that action, which may continue into the
//! node's children through [`RouteContext::next`]. A node without an action
//! passes straight through to its children. When no sibling matches, a 404
//! [`RouterError`] unwinds to the outermost `resolve` call, where the
//! configured error handler may replace it with a value.

use crate::context::RouteContext;
use crate::error::{PatternError, ResolveError, RouterError};
use crate::matcher::{join_segments, strip_segment, CompiledPattern};
use crate::options::{ErrorHandler, RouterOptions};
use crate::params::RouteParams;
use crate::route::{Action, ActionFuture, IntoLocation, Location, Route};
use crate::{debug_log, info_log, trace_log};
use futures::future::{self, FutureExt};
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

/// Index of a route node in the router's arena
///
/// Ids are assigned in document order (pre-order), starting at 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// What happens when a node matches
pub(crate) enum Dispatch<C, R> {
    /// Invoke the route's action
    Action(Action<C, R>),
    /// Resolve directly against the children
    PassThrough,
}

/// A route node after construction
pub struct RouteNode<C, R> {
    id: NodeId,
    path: String,
    name: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    pattern: CompiledPattern,
    dispatch: Dispatch<C, R>,
}

impl<C, R> RouteNode<C, R> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The segment exactly as declared on the route
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Compiled pattern including every ancestor segment
    pub fn pattern(&self) -> &CompiledPattern {
        &self.pattern
    }

    pub fn has_action(&self) -> bool {
        matches!(self.dispatch, Dispatch::Action(_))
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

impl<C, R> std::fmt::Debug for RouteNode<C, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteNode")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("name", &self.name)
            .field("pattern", &self.pattern.source())
            .field("action", &self.has_action())
            .field("children", &self.children)
            .finish()
    }
}

struct RouterInner<C, R> {
    nodes: Vec<RouteNode<C, R>>,
    roots: Vec<NodeId>,
    names: HashMap<String, NodeId>,
    base_url: Url,
    error_handler: Option<ErrorHandler<C, R>>,
}

/// Resolves paths against a tree of routes
///
/// `C` is the caller's context, passed through untouched to every action.
/// `R` is the value actions produce. Cloning a router is cheap and clones
/// share the same compiled tree.
///
/// # Example
///
/// ```
/// use tree_navigator::{Route, Router};
///
/// let router: Router<(), String> = Router::new(vec![Route::group("/").children(vec![
///     Route::new("foo", |_ctx| async { Ok(Some("foo".to_string())) }),
///     Route::new("foo/:x", |ctx| {
///         let x = ctx.param("x").unwrap_or_default().to_string();
///         async move { Ok(Some(format!("x = {}", x))) }
///     }),
/// ])])
/// .unwrap();
///
/// let page = pollster::block_on(router.resolve("/foo/7", ())).unwrap();
/// assert_eq!(page.as_deref(), Some("x = 7"));
///
/// let err = pollster::block_on(router.resolve("/bar", ())).unwrap_err();
/// assert_eq!(err.status(), Some(404));
/// ```
pub struct Router<C, R> {
    inner: Arc<RouterInner<C, R>>,
}

impl<C, R> Clone for Router<C, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C, R> Router<C, R> {
    /// Build a router with default options
    pub fn new(routes: Vec<Route<C, R>>) -> Result<Self, PatternError> {
        Self::with_options(routes, RouterOptions::new())
    }

    /// Build a router, compiling one pattern per node
    ///
    /// Fails on the first malformed pattern, duplicate parameter along a
    /// route chain, duplicate route name or unusable base URL.
    pub fn with_options(
        routes: Vec<Route<C, R>>,
        options: RouterOptions<C, R>,
    ) -> Result<Self, PatternError> {
        let (base_url, error_handler) = options.into_parts()?;

        let mut builder = TreeBuilder {
            base_url: &base_url,
            nodes: Vec::new(),
            names: HashMap::new(),
        };
        let roots = builder.add_siblings(routes, None, &[])?;
        let TreeBuilder { nodes, names, .. } = builder;

        debug_log!(
            "Router built: {} routes ({} roots), base '{}'",
            nodes.len(),
            roots.len(),
            base_url
        );

        Ok(Self {
            inner: Arc::new(RouterInner {
                nodes,
                roots,
                names,
                base_url,
                error_handler,
            }),
        })
    }

    /// Base URL every pattern is anchored at
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Number of route nodes in the tree
    pub fn len(&self) -> usize {
        self.inner.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.nodes.is_empty()
    }

    pub fn has_error_handler(&self) -> bool {
        self.inner.error_handler.is_some()
    }

    /// Top-level nodes in declaration order
    pub fn roots(&self) -> &[NodeId] {
        &self.inner.roots
    }

    /// Get a node by id
    pub fn get(&self, id: NodeId) -> Option<&RouteNode<C, R>> {
        self.inner.nodes.get(id.0)
    }

    /// Find a node by route name
    pub fn find(&self, name: &str) -> Option<&RouteNode<C, R>> {
        self.inner.names.get(name).map(|&id| self.node(id))
    }

    /// All nodes in document order
    pub fn iter(&self) -> impl Iterator<Item = &RouteNode<C, R>> {
        self.inner.nodes.iter()
    }

    /// Generate the path of a named route
    ///
    /// The path includes the base URL's path. Optional parameters left out
    /// of `params` are dropped together with their leading `/`.
    ///
    /// # Example
    ///
    /// ```
    /// use tree_navigator::{Route, RouteParams, Router};
    ///
    /// let router: Router<(), ()> = Router::new(vec![
    ///     Route::group("/users").child(Route::group(":id").name("user.detail")),
    /// ])
    /// .unwrap();
    ///
    /// let params = RouteParams::new().with("id", "123");
    /// assert_eq!(router.url_for("user.detail", &params).unwrap(), "/users/123");
    /// ```
    pub fn url_for(&self, name: &str, params: &RouteParams) -> Result<String, PatternError> {
        let node = self
            .find(name)
            .ok_or_else(|| PatternError::UnknownRoute(name.to_string()))?;
        node.pattern.reverse(params)
    }

    pub(crate) fn node(&self, id: NodeId) -> &RouteNode<C, R> {
        &self.inner.nodes[id.0]
    }
}

impl<C, R> Router<C, R>
where
    C: Send + Sync + 'static,
    R: Send + 'static,
{
    /// Resolve a path with a caller context
    ///
    /// Accepts `&str`, `String`, [`Url`] or [`Location`]. The returned future
    /// settles with the value of the matched action, `Ok(None)` when the
    /// matched route produced nothing, or an error. A not-found failure is
    /// handed to the error handler when one is configured.
    pub fn resolve(&self, path: impl IntoLocation, context: C) -> ActionFuture<R> {
        let location = Arc::new(path.into_location(&self.inner.base_url));
        let context = Arc::new(context);
        let router = self.clone();

        async move {
            debug_log!("Resolving '{}'", location.input());
            let result = router
                .resolve_within(Arc::clone(&location), None, Arc::clone(&context))
                .await;

            match result {
                Err(ResolveError::Router(error)) => match &router.inner.error_handler {
                    Some(handler) => {
                        info_log!(
                            "Handing '{}' for '{}' to the error handler",
                            error,
                            location.input()
                        );
                        handler(location.input(), error, &context).await
                    }
                    None => Err(error.into()),
                },
                other => other,
            }
        }
        .boxed()
    }

    /// Resolve a path with the default context
    pub fn resolve_path(&self, path: impl IntoLocation) -> ActionFuture<R>
    where
        C: Default,
    {
        self.resolve(path, C::default())
    }

    /// Resolve against the children of `parent`, or the roots
    fn resolve_within(
        &self,
        location: Arc<Location>,
        parent: Option<NodeId>,
        context: Arc<C>,
    ) -> ActionFuture<R> {
        let router = self.clone();

        async move {
            let siblings = match parent {
                Some(id) => router.node(id).children.as_slice(),
                None => router.inner.roots.as_slice(),
            };

            for &id in siblings {
                let node = router.node(id);
                let Some(params) = node.pattern.test(&location) else {
                    trace_log!("'{}' does not match '{}'", location.input(), node.pattern);
                    continue;
                };
                trace_log!(
                    "'{}' matches '{}' ({} params)",
                    location.input(),
                    node.pattern,
                    params.len()
                );

                return match &node.dispatch {
                    Dispatch::Action(action) => {
                        let ctx = RouteContext::new(
                            router.clone(),
                            id,
                            parent,
                            params,
                            Arc::clone(&location),
                            Arc::clone(&context),
                        );
                        action(ctx).await
                    }
                    Dispatch::PassThrough => router.next_within(id, location, context).await,
                };
            }

            debug_log!("No route matches '{}'", location.input());
            Err(RouterError::not_found(location.input()).into())
        }
        .boxed()
    }

    /// Continuation for a matched node: its children, or no value
    pub(crate) fn next_within(
        &self,
        id: NodeId,
        location: Arc<Location>,
        context: Arc<C>,
    ) -> ActionFuture<R> {
        if self.node(id).is_leaf() {
            return future::ready(Ok(None)).boxed();
        }
        self.resolve_within(location, Some(id), context)
    }
}

impl<C, R> std::fmt::Debug for Router<C, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("base_url", &self.inner.base_url.as_str())
            .field("nodes", &self.inner.nodes)
            .field("roots", &self.inner.roots)
            .field("error_handler", &self.inner.error_handler.is_some())
            .finish()
    }
}

/// Flattens a route tree into the arena
struct TreeBuilder<'a, C, R> {
    base_url: &'a Url,
    nodes: Vec<RouteNode<C, R>>,
    names: HashMap<String, NodeId>,
}

impl<C, R> TreeBuilder<'_, C, R> {
    fn add_siblings(
        &mut self,
        routes: Vec<Route<C, R>>,
        parent: Option<NodeId>,
        ancestors: &[String],
    ) -> Result<Vec<NodeId>, PatternError> {
        routes
            .into_iter()
            .map(|route| self.add(route, parent, ancestors))
            .collect()
    }

    fn add(
        &mut self,
        route: Route<C, R>,
        parent: Option<NodeId>,
        ancestors: &[String],
    ) -> Result<NodeId, PatternError> {
        let Route {
            path,
            name,
            action,
            children,
        } = route;

        let mut segments = ancestors.to_vec();
        segments.push(strip_segment(&path).to_string());
        let source = join_segments(segments.iter().map(String::as_str));
        let pattern = CompiledPattern::compile(self.base_url, &source, !children.is_empty())?;

        let id = NodeId(self.nodes.len());
        if let Some(name) = &name {
            if self.names.insert(name.clone(), id).is_some() {
                return Err(PatternError::DuplicateRouteName(name.clone()));
            }
        }
        trace_log!("Compiled {:?} '{}' as {}", id, source, pattern.as_regex());

        let dispatch = match action {
            Some(action) => Dispatch::Action(action),
            None => Dispatch::PassThrough,
        };
        self.nodes.push(RouteNode {
            id,
            path,
            name,
            parent,
            children: Vec::new(),
            pattern,
            dispatch,
        });

        let children = self.add_siblings(children, Some(id), &segments)?;
        self.nodes[id.0].children = children;
        Ok(id)
    }
}
