//! Error handling for the resolver
//!
//! Three error families exist:
//!
//! - [`RouterError`] - the router's own structured failure (status + message).
//!   Raised when no sibling matches a candidate path, recoverable through
//!   [`RouterOptions::error_handler`](crate::RouterOptions::error_handler).
//! - [`ResolveError`] - what `resolve` and `next()` return. Either a
//!   [`RouterError`] or an opaque failure raised by route action code.
//! - [`PatternError`] - construction-time failures: malformed patterns,
//!   duplicate names, invalid base URLs, plus reverse URL generation failures.

use thiserror::Error;

/// Boxed error raised by route action code.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// ============================================================================
// Router Errors
// ============================================================================

/// Structured router failure carrying a numeric status and a message.
///
/// # Example
///
/// ```
/// use tree_navigator::RouterError;
///
/// let error = RouterError::not_found("/missing");
/// assert_eq!(error.status(), 404);
/// assert_eq!(error.to_string(), "Route not found: /missing");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RouterError {
    status: u16,
    message: String,
}

impl RouterError {
    /// Status used when no route matches a path.
    pub const NOT_FOUND: u16 = 404;

    /// Create a router error with an arbitrary status.
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Create the not-found error for an unresolved path
    pub fn not_found(path: &str) -> Self {
        Self::new(Self::NOT_FOUND, format!("Route not found: {}", path))
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_not_found(&self) -> bool {
        self.status == Self::NOT_FOUND
    }
}

/// Failure of a `resolve` call or of a `next()` continuation.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Structured failure produced by the router itself
    #[error(transparent)]
    Router(#[from] RouterError),

    /// Failure raised by route action code, passed through untouched
    #[error(transparent)]
    Action(BoxError),
}

impl ResolveError {
    /// Wrap an arbitrary error raised inside a route action.
    ///
    /// # Example
    ///
    /// ```
    /// use tree_navigator::ResolveError;
    ///
    /// let err = ResolveError::action("database offline");
    /// assert!(err.as_router().is_none());
    /// assert_eq!(err.to_string(), "database offline");
    /// ```
    pub fn action(error: impl Into<BoxError>) -> Self {
        Self::Action(error.into())
    }

    /// Get the structured router failure, if this is one
    pub fn as_router(&self) -> Option<&RouterError> {
        match self {
            ResolveError::Router(error) => Some(error),
            ResolveError::Action(_) => None,
        }
    }

    /// Check if this is a 404 produced by the router
    pub fn is_not_found(&self) -> bool {
        self.as_router().is_some_and(RouterError::is_not_found)
    }

    /// Status of a structured failure; action failures have none
    pub fn status(&self) -> Option<u16> {
        self.as_router().map(RouterError::status)
    }
}

// ============================================================================
// Construction Errors
// ============================================================================

/// Errors raised while compiling the route tree or generating URLs
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// A `(` without its `)`, or the reverse
    #[error("Unbalanced group at offset {offset} in pattern '{pattern}'")]
    UnbalancedGroup { pattern: String, offset: usize },

    /// A `:` not followed by a parameter name
    #[error("Missing parameter name at offset {offset} in pattern '{pattern}'")]
    MissingParamName { pattern: String, offset: usize },

    /// A `()` group with nothing inside
    #[error("Empty group at offset {offset} in pattern '{pattern}'")]
    EmptyGroup { pattern: String, offset: usize },

    /// The same parameter declared twice along one route chain
    #[error("Duplicate route parameter '{name}' in pattern '{pattern}'")]
    DuplicateParam { pattern: String, name: String },

    /// The generated regular expression was rejected
    #[error("Invalid regex in pattern '{pattern}': {message}")]
    InvalidRegex { pattern: String, message: String },

    /// Two routes share one name
    #[error("Duplicate route name '{0}'")]
    DuplicateRouteName(String),

    /// `url_for` was given a name no route carries
    #[error("Unknown route name '{0}'")]
    UnknownRoute(String),

    /// `url_for` was not given a value for a required parameter
    #[error("Missing value for parameter '{name}' in pattern '{pattern}'")]
    MissingParam { pattern: String, name: String },

    /// `url_for` produced a path the route's own pattern rejects
    #[error("Generated path '{path}' does not match pattern '{pattern}'")]
    InvalidParamValue { pattern: String, path: String },

    /// The configured base URL could not be parsed or cannot carry paths
    #[error("Invalid base URL '{input}': {message}")]
    InvalidBaseUrl { input: String, message: String },
}

// ============================================================================
// Tests
// ============================================================================
