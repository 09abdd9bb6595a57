//! Router configuration

use crate::error::{PatternError, ResolveError, RouterError};
use crate::route::ActionFuture;
use futures::future::FutureExt;
use std::future::Future;
use std::sync::Arc;
use url::Url;

/// Base URL used when none is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost/";

/// Recovery hook for structured router failures
///
/// Receives the path as supplied to `resolve`, the failure and the caller's
/// context. Whatever it returns becomes the result of `resolve`.
pub type ErrorHandler<C, R> =
    Arc<dyn Fn(&str, RouterError, &C) -> ActionFuture<R> + Send + Sync>;

/// Options applied when building a [`Router`](crate::Router)
///
/// # Example
///
/// ```
/// use tree_navigator::RouterOptions;
///
/// let options = RouterOptions::<(), String>::new()
///     .try_base_url("https://example.com/app")
///     .unwrap()
///     .error_handler(|path, error, _ctx| {
///         let page = format!("{} ({})", error, path);
///         async move { Ok(Some(page)) }
///     });
///
/// assert_eq!(options.get_base_url().unwrap().as_str(), "https://example.com/app/");
/// assert!(options.has_error_handler());
/// ```
pub struct RouterOptions<C, R> {
    base_url: Option<Url>,
    error_handler: Option<ErrorHandler<C, R>>,
}

impl<C, R> RouterOptions<C, R> {
    /// Create options with the default base URL and no error handler
    pub fn new() -> Self {
        Self {
            base_url: None,
            error_handler: None,
        }
    }

    /// Anchor every compiled pattern at this URL
    ///
    /// Query and fragment are dropped and a trailing `/` is added to the path,
    /// so relative candidates join below it.
    pub fn base_url(mut self, url: Url) -> Self {
        self.base_url = Some(normalize_base(url));
        self
    }

    /// Parse and set the base URL
    pub fn try_base_url(self, input: &str) -> Result<Self, PatternError> {
        let url = Url::parse(input).map_err(|e| PatternError::InvalidBaseUrl {
            input: input.to_string(),
            message: e.to_string(),
        })?;
        Ok(self.base_url(url))
    }

    /// Install the recovery hook for router failures
    ///
    /// Only [`RouterError`]s reach the handler. Errors raised by actions are
    /// returned to the caller unchanged.
    pub fn error_handler<F, Fut>(mut self, handler: F) -> Self
    where
        C: 'static,
        R: 'static,
        F: Fn(&str, RouterError, &C) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<R>, ResolveError>> + Send + 'static,
    {
        self.error_handler = Some(Arc::new(
            move |path: &str, error: RouterError, context: &C| {
                handler(path, error, context).boxed()
            },
        ));
        self
    }

    pub fn get_base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    pub fn has_error_handler(&self) -> bool {
        self.error_handler.is_some()
    }

    /// Split into the effective base URL and the handler
    pub(crate) fn into_parts(self) -> Result<(Url, Option<ErrorHandler<C, R>>), PatternError> {
        let base = match self.base_url {
            Some(url) => url,
            None => Url::parse(DEFAULT_BASE_URL).map_err(|e| PatternError::InvalidBaseUrl {
                input: DEFAULT_BASE_URL.to_string(),
                message: e.to_string(),
            })?,
        };
        if base.cannot_be_a_base() {
            return Err(PatternError::InvalidBaseUrl {
                input: base.to_string(),
                message: "URL cannot be used as a base".to_string(),
            });
        }
        Ok((base, self.error_handler))
    }
}

impl<C, R> Default for RouterOptions<C, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, R> std::fmt::Debug for RouterOptions<C, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterOptions")
            .field("base_url", &self.base_url)
            .field("error_handler", &self.error_handler.is_some())
            .finish()
    }
}

fn normalize_base(mut url: Url) -> Url {
    url.set_query(None);
    url.set_fragment(None);
    if !url.cannot_be_a_base() && !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
