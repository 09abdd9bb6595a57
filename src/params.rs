//! Route parameters captured by a compiled pattern
//!
//! Parameters keep the order in which the pattern declares them. Every
//! capture group declared by a pattern has an entry, even when it did not
//! participate in the match: optional parameters map to `None` instead of
//! being omitted.

use indexmap::IndexMap;

/// Ordered mapping from parameter name to captured value
///
/// # Example
///
/// ```
/// use tree_navigator::RouteParams;
///
/// // Pattern: /users/:id/:tab?
/// // Matched: /users/123
/// let mut params = RouteParams::new();
/// params.insert("id", Some("123".to_string()));
/// params.insert("tab", None);
///
/// assert_eq!(params.get("id"), Some("123"));
/// assert_eq!(params.get_as::<i32>("id"), Some(123));
/// assert!(params.contains("tab"));
/// assert_eq!(params.get("tab"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams {
    params: IndexMap<String, Option<String>>,
}

impl RouteParams {
    /// Create new empty route params
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of a present value, handy for `url_for`
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Get a parameter value; `None` if absent or unmatched
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key)?.as_deref()
    }

    /// Get a parameter and parse it as a specific type
    ///
    /// Returns `None` if the parameter is missing, unmatched, or cannot be parsed.
    pub fn get_as<T>(&self, key: &str) -> Option<T>
    where
        T: std::str::FromStr,
    {
        self.get(key)?.parse().ok()
    }

    /// Insert a parameter, replacing any previous value but keeping its position
    pub fn insert(&mut self, key: impl Into<String>, value: Option<String>) {
        self.params.insert(key.into(), value);
    }

    /// Insert a present value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.insert(key, Some(value.into()));
    }

    /// Check if the parameter is declared, whether or not it matched
    pub fn contains(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// Iterate over all parameters in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.params
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_deref()))
    }

    /// Parameter names in declaration order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }
}

impl<K, V> FromIterator<(K, V)> for RouteParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.set(key, value);
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_params_basic() {
        let mut params = RouteParams::new();
        params.set("id", "123");

        assert_eq!(params.get("id"), Some("123"));
        assert!(params.contains("id"));
        assert!(!params.contains("missing"));
    }

    #[test]
    fn test_route_params_get_as() {
        let params = RouteParams::new().with("id", "123").with("active", "true");

        assert_eq!(params.get_as::<i32>("id"), Some(123));
        assert_eq!(params.get_as::<u32>("id"), Some(123));
        assert_eq!(params.get_as::<bool>("active"), Some(true));
        assert_eq!(params.get_as::<i32>("missing"), None);
    }

    #[test]
    fn test_unmatched_param_is_declared() {
        let mut params = RouteParams::new();
        params.insert("tab", None);

        assert!(params.contains("tab"));
        assert_eq!(params.get("tab"), None);
        assert_eq!(params.len(), 1);
        assert_eq!(params.iter().next(), Some(("tab", None)));
    }

    #[test]
    fn test_declaration_order_is_kept() {
        let params: RouteParams = [("z", "1"), ("a", "2"), ("m", "3")].into_iter().collect();

        let keys: Vec<&str> = params.keys().collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut params = RouteParams::new().with("a", "1").with("b", "2");
        params.set("a", "3");

        let pairs: Vec<_> = params.iter().collect();
        assert_eq!(pairs, vec![("a", Some("3")), ("b", Some("2"))]);
    }

    #[test]
    fn test_route_params_empty() {
        let params = RouteParams::new();
        assert!(params.is_empty());
        assert_eq!(params.len(), 0);
    }
}
