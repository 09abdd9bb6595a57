//! Route pattern compilation
//!
//! Every route node owns exactly one [`CompiledPattern`], built eagerly when the
//! router is constructed from the node's own segment joined onto its ancestors'
//! segments. Malformed patterns therefore fail at construction, never while
//! resolving.
//!
//! Pattern syntax:
//! - literal text matches itself
//! - `:name` captures one path segment
//! - `:name(regex)` captures with a custom expression
//! - `?`, `*`, `+` after a parameter make it optional, zero-or-more or
//!   one-or-more segments. An optional parameter directly after `/` swallows
//!   that `/`, so `/users/:id?` matches both `/users` and `/users/42`
//! - `(regex)` is an unnamed capture and a bare `*` an unnamed wildcard;
//!   unnamed captures are keyed `"0"`, `"1"`, ... in order
//! - `\` escapes the next character
//!
//! Literal text is percent-encoded the way `url` encodes paths, so a route
//! declared as `/café` matches the candidate `/café`. Captured values are
//! percent-decoded before they reach [`RouteParams`], and [`CompiledPattern::reverse`]
//! encodes them again.

use crate::error::PatternError;
use crate::params::RouteParams;
use crate::route::Location;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use regex::{Regex, RegexBuilder};
use std::collections::HashSet;
use std::iter::Peekable;
use std::str::CharIndices;
use url::{Origin, Url};

/// Default expression for a parameter: one segment
const SEGMENT: &str = "[^/]+";

/// Expression for an unnamed `*`
const WILDCARD: &str = ".*";

/// Suffix accepted after a node that has children
const PREFIX_TAIL: &str = "(?:/.*)?";

/// Maximum compiled regex size, in bytes
const MAX_REGEX_SIZE: usize = 1 << 20;

/// Characters `url` percent-encodes in a path
const PATH: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Encoding for a value spanning several segments
const MULTI_SEGMENT_VALUE: &AsciiSet = &PATH.add(b'%');

/// Encoding for a single-segment value
const SEGMENT_VALUE: &AsciiSet = &MULTI_SEGMENT_VALUE.add(b'/');

/// Strip leading and trailing separators from a route segment
///
/// `"/foo/"`, `"/foo"` and `"foo"` all become `"foo"`; `"/"` and `""` become `""`.
pub fn strip_segment(segment: &str) -> &str {
    segment.trim_matches('/')
}

/// Join route segments into one rooted pattern
///
/// # Example
///
/// ```
/// use tree_navigator::matcher::join_segments;
///
/// assert_eq!(join_segments(["/", "dashboard/", "/settings"]), "/dashboard/settings");
/// assert_eq!(join_segments(["", "/"]), "/");
/// ```
pub fn join_segments<'a>(segments: impl IntoIterator<Item = &'a str>) -> String {
    let mut path = String::from("/");
    for segment in segments.into_iter().map(strip_segment) {
        if segment.is_empty() {
            continue;
        }
        if path.len() > 1 {
            path.push('/');
        }
        path.push_str(segment);
    }
    path
}

/// How many segments a parameter consumes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Modifier {
    One,
    Optional,
    ZeroOrMore,
    OneOrMore,
}

impl Modifier {
    fn is_optional(self) -> bool {
        matches!(self, Modifier::Optional | Modifier::ZeroOrMore)
    }

    fn is_repeated(self) -> bool {
        matches!(self, Modifier::ZeroOrMore | Modifier::OneOrMore)
    }
}

/// A parsed piece of a pattern
#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    Param {
        key: String,
        expr: String,
        modifier: Modifier,
        /// Whether the `/` before this parameter belongs to it
        slash: bool,
    },
}

/// A route pattern compiled to an anchored regular expression
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    /// Joined node pattern, without the base path
    source: String,
    /// Base URL path without its trailing `/`
    base_prefix: String,
    parts: Vec<Part>,
    /// Parameter key and regex group name, in declaration order
    keys: Vec<(String, String)>,
    regex: Regex,
    origin: Origin,
    prefix: bool,
}

impl CompiledPattern {
    /// Compile a joined pattern anchored at `base`
    ///
    /// With `prefix` set the pattern also accepts any path continuing below it
    /// at a segment boundary, which is how nodes with children reach them.
    pub fn compile(base: &Url, source: &str, prefix: bool) -> Result<Self, PatternError> {
        let mut parts = parse(source)?;
        if prefix && source == "/" {
            parts.clear();
        }
        for part in &mut parts {
            if let Part::Literal(text) = part {
                *text = utf8_percent_encode(text, PATH).to_string();
            }
        }

        let base_prefix = base.path().trim_end_matches('/').to_string();
        let mut expr = format!("^{}", regex::escape(&base_prefix));
        let mut keys = Vec::new();

        for part in &parts {
            match part {
                Part::Literal(text) => expr.push_str(&regex::escape(text)),
                Part::Param {
                    key,
                    expr: param,
                    modifier,
                    slash,
                } => {
                    let group = format!("k{}", keys.len());
                    let body = if modifier.is_repeated() {
                        format!("(?:{param})(?:/(?:{param}))*")
                    } else {
                        format!("(?:{param})")
                    };
                    let capture = format!("(?P<{group}>{body})");
                    match (modifier.is_optional(), slash) {
                        (true, true) => expr.push_str(&format!("(?:/{capture})?")),
                        (true, false) => expr.push_str(&format!("{capture}?")),
                        (false, _) => expr.push_str(&capture),
                    }
                    keys.push((key.clone(), group));
                }
            }
        }

        if prefix {
            expr.push_str(PREFIX_TAIL);
        }
        expr.push('$');

        let regex = RegexBuilder::new(&expr)
            .size_limit(MAX_REGEX_SIZE)
            .build()
            .map_err(|e| PatternError::InvalidRegex {
                pattern: source.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            source: source.to_string(),
            base_prefix,
            parts,
            keys,
            regex,
            origin: base.origin(),
            prefix,
        })
    }

    /// The joined node pattern, e.g. `/users/:id`
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The generated regular expression
    pub fn as_regex(&self) -> &str {
        self.regex.as_str()
    }

    /// Whether paths below the pattern also match
    pub fn is_prefix(&self) -> bool {
        self.prefix
    }

    /// Declared parameter keys in order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(|(key, _)| key.as_str())
    }

    /// Test a candidate location
    ///
    /// Candidates from another origin, or that could not be parsed, never match.
    /// Query and fragment are ignored.
    pub fn test(&self, location: &Location) -> Option<RouteParams> {
        let url = location.url()?;
        if url.origin() != self.origin {
            return None;
        }
        self.match_path(url.path())
    }

    /// Match a bare URL path, including the base path
    ///
    /// `path` is expected in the percent-encoded form [`Url::path`] returns.
    /// Captured values are decoded.
    pub fn match_path(&self, path: &str) -> Option<RouteParams> {
        let captures = self.regex.captures(path)?;
        let mut params = RouteParams::new();
        for (key, group) in &self.keys {
            let value = captures
                .name(group)
                .map(|m| percent_decode_str(m.as_str()).decode_utf8_lossy().to_string());
            params.insert(key.clone(), value);
        }
        Some(params)
    }

    /// Build a path from parameter values, the reverse of [`match_path`](Self::match_path)
    ///
    /// Values are percent-encoded. A `/` is kept only in repeated parameters.
    pub fn reverse(&self, params: &RouteParams) -> Result<String, PatternError> {
        let mut path = self.base_prefix.clone();

        for part in &self.parts {
            match part {
                Part::Literal(text) => path.push_str(text),
                Part::Param {
                    key,
                    modifier,
                    slash,
                    ..
                } => match params.get(key) {
                    Some(value) => {
                        if *slash {
                            path.push('/');
                        }
                        let set = if modifier.is_repeated() {
                            MULTI_SEGMENT_VALUE
                        } else {
                            SEGMENT_VALUE
                        };
                        path.extend(utf8_percent_encode(value, set));
                    }
                    None if modifier.is_optional() => {}
                    None => {
                        return Err(PatternError::MissingParam {
                            pattern: self.source.clone(),
                            name: key.clone(),
                        })
                    }
                },
            }
        }

        if path.is_empty() {
            path.push('/');
        }

        if self.match_path(&path).is_none() {
            return Err(PatternError::InvalidParamValue {
                pattern: self.source.clone(),
                path,
            });
        }
        Ok(path)
    }
}

impl std::fmt::Display for CompiledPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.source)
    }
}

// ============================================================================
// Parsing
// ============================================================================

fn parse(source: &str) -> Result<Vec<Part>, PatternError> {
    let mut parts = Vec::new();
    let mut literal = String::new();
    let mut seen = HashSet::new();
    let mut unnamed = 0usize;
    let mut chars = source.char_indices().peekable();

    while let Some((offset, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, escaped)) => literal.push(escaped),
                None => literal.push('\\'),
            },
            ':' => {
                let name = read_name(&mut chars);
                if name.is_empty() {
                    return Err(PatternError::MissingParamName {
                        pattern: source.to_string(),
                        offset,
                    });
                }
                let expr = match chars.peek() {
                    Some(&(open, '(')) => {
                        chars.next();
                        read_group(source, &mut chars, open)?
                    }
                    _ => SEGMENT.to_string(),
                };
                let modifier = read_modifier(&mut chars);
                if !seen.insert(name.clone()) {
                    return Err(PatternError::DuplicateParam {
                        pattern: source.to_string(),
                        name,
                    });
                }
                push_param(&mut parts, &mut literal, name, expr, modifier);
            }
            '(' => {
                let expr = read_group(source, &mut chars, offset)?;
                let modifier = read_modifier(&mut chars);
                push_param(&mut parts, &mut literal, unnamed.to_string(), expr, modifier);
                unnamed += 1;
            }
            '*' => {
                push_param(
                    &mut parts,
                    &mut literal,
                    unnamed.to_string(),
                    WILDCARD.to_string(),
                    Modifier::One,
                );
                unnamed += 1;
            }
            ')' => {
                return Err(PatternError::UnbalancedGroup {
                    pattern: source.to_string(),
                    offset,
                })
            }
            _ => literal.push(c),
        }
    }

    if !literal.is_empty() {
        parts.push(Part::Literal(literal));
    }
    Ok(parts)
}

/// Identifier after `:`; may not start with a digit
fn read_name(chars: &mut Peekable<CharIndices<'_>>) -> String {
    let mut name = String::new();
    while let Some(&(_, c)) = chars.peek() {
        let valid = c == '_' || c.is_ascii_alphabetic() || (!name.is_empty() && c.is_ascii_digit());
        if !valid {
            break;
        }
        name.push(c);
        chars.next();
    }
    name
}

/// Body of a `(...)` group whose `(` at `open` was already consumed
fn read_group(
    source: &str,
    chars: &mut Peekable<CharIndices<'_>>,
    open: usize,
) -> Result<String, PatternError> {
    let mut depth = 1usize;
    let mut body = String::new();

    while let Some((_, c)) = chars.next() {
        match c {
            '\\' => {
                body.push(c);
                if let Some((_, escaped)) = chars.next() {
                    body.push(escaped);
                }
                continue;
            }
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    if body.is_empty() {
                        return Err(PatternError::EmptyGroup {
                            pattern: source.to_string(),
                            offset: open,
                        });
                    }
                    return Ok(body);
                }
            }
            _ => {}
        }
        body.push(c);
    }

    Err(PatternError::UnbalancedGroup {
        pattern: source.to_string(),
        offset: open,
    })
}

fn read_modifier(chars: &mut Peekable<CharIndices<'_>>) -> Modifier {
    let modifier = match chars.peek() {
        Some(&(_, '?')) => Modifier::Optional,
        Some(&(_, '*')) => Modifier::ZeroOrMore,
        Some(&(_, '+')) => Modifier::OneOrMore,
        _ => return Modifier::One,
    };
    chars.next();
    modifier
}

fn push_param(
    parts: &mut Vec<Part>,
    literal: &mut String,
    key: String,
    expr: String,
    modifier: Modifier,
) {
    let slash = modifier.is_optional() && literal.ends_with('/');
    if slash {
        literal.pop();
    }
    if !literal.is_empty() {
        parts.push(Part::Literal(std::mem::take(literal)));
    }
    parts.push(Part::Param {
        key,
        expr,
        modifier,
        slash,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::IntoLocation;

    fn base() -> Url {
        Url::parse("http://localhost/").unwrap()
    }

    fn exact(source: &str) -> CompiledPattern {
        CompiledPattern::compile(&base(), source, false).unwrap()
    }

    fn prefix(source: &str) -> CompiledPattern {
        CompiledPattern::compile(&base(), source, true).unwrap()
    }

    #[test]
    fn test_segment_stripping() {
        assert_eq!(strip_segment("/foo/"), "foo");
        assert_eq!(strip_segment("/foo"), "foo");
        assert_eq!(strip_segment("foo"), "foo");
        assert_eq!(strip_segment("//"), "");
        assert_eq!(strip_segment(""), "");
    }

    #[test]
    fn test_join_segments() {
        assert_eq!(join_segments(["/", "foo"]), "/foo");
        assert_eq!(join_segments(["/base/", "/sub"]), "/base/sub");
        assert_eq!(join_segments(["users", ":id"]), "/users/:id");
        assert_eq!(join_segments([""]), "/");
    }

    #[test]
    fn test_static_route_matching() {
        let pattern = exact("/users");

        assert!(pattern.match_path("/users").is_some());
        assert!(pattern.match_path("/posts").is_none());
        assert!(pattern.match_path("/users/123").is_none());
    }

    #[test]
    fn test_dynamic_route_matching() {
        let pattern = exact("/users/:id");

        let params = pattern.match_path("/users/42").unwrap();
        assert_eq!(params.get("id"), Some("42"));

        assert!(pattern.match_path("/users").is_none());
        assert!(pattern.match_path("/users/").is_none());
        assert!(pattern.match_path("/users/42/posts").is_none());
    }

    #[test]
    fn test_optional_param() {
        let pattern = exact("/users/:id?");

        let params = pattern.match_path("/users").unwrap();
        assert!(params.contains("id"));
        assert_eq!(params.get("id"), None);

        let params = pattern.match_path("/users/7").unwrap();
        assert_eq!(params.get("id"), Some("7"));
    }

    #[test]
    fn test_prefix_matching_respects_segment_boundary() {
        let pattern = prefix("/base");

        assert!(pattern.match_path("/base").is_some());
        assert!(pattern.match_path("/base/sub").is_some());
        assert!(pattern.match_path("/base/sub/deeper").is_some());
        assert!(pattern.match_path("/basement").is_none());
        assert!(pattern.match_path("/sub").is_none());
    }

    #[test]
    fn test_root_prefix_matches_everything() {
        let pattern = prefix("/");

        assert!(pattern.match_path("/").is_some());
        assert!(pattern.match_path("/foo").is_some());
        assert!(pattern.match_path("/foo/bar").is_some());
    }

    #[test]
    fn test_custom_regex_param() {
        let pattern = exact("/users/:id(\\d+)");

        assert_eq!(pattern.match_path("/users/123").unwrap().get("id"), Some("123"));
        assert!(pattern.match_path("/users/abc").is_none());
    }

    #[test]
    fn test_repeated_params() {
        let pattern = exact("/files/:path+");
        let params = pattern.match_path("/files/a/b/c").unwrap();
        assert_eq!(params.get("path"), Some("a/b/c"));
        assert!(pattern.match_path("/files").is_none());

        let pattern = exact("/files/:path*");
        assert_eq!(pattern.match_path("/files").unwrap().get("path"), None);
        assert_eq!(pattern.match_path("/files/x/y").unwrap().get("path"), Some("x/y"));
    }

    #[test]
    fn test_unnamed_captures() {
        let pattern = exact("/files/*");
        let params = pattern.match_path("/files/docs/report.pdf").unwrap();
        assert_eq!(params.get("0"), Some("docs/report.pdf"));
        assert!(pattern.match_path("/other").is_none());

        let pattern = exact("/(\\d+)/:slug");
        let params = pattern.match_path("/2024/hello").unwrap();
        let keys: Vec<&str> = params.keys().collect();
        assert_eq!(keys, vec!["0", "slug"]);
        assert_eq!(params.get("0"), Some("2024"));
    }

    #[test]
    fn test_literal_metacharacters_are_escaped() {
        let pattern = exact("/report.pdf");
        assert!(pattern.match_path("/report.pdf").is_some());
        assert!(pattern.match_path("/reportxpdf").is_none());

        let pattern = exact("/a\\:b");
        assert!(pattern.match_path("/a:b").is_some());
        assert_eq!(pattern.keys().count(), 0);
    }

    #[test]
    fn test_malformed_patterns() {
        let base = base();

        assert!(matches!(
            CompiledPattern::compile(&base, "/users/:", false),
            Err(PatternError::MissingParamName { .. })
        ));
        assert!(matches!(
            CompiledPattern::compile(&base, "/a/(b", false),
            Err(PatternError::UnbalancedGroup { .. })
        ));
        assert!(matches!(
            CompiledPattern::compile(&base, "/a)", false),
            Err(PatternError::UnbalancedGroup { .. })
        ));
        assert!(matches!(
            CompiledPattern::compile(&base, "/a/()", false),
            Err(PatternError::EmptyGroup { .. })
        ));
        assert!(matches!(
            CompiledPattern::compile(&base, "/users/:id/posts/:id", false),
            Err(PatternError::DuplicateParam { .. })
        ));
        assert!(matches!(
            CompiledPattern::compile(&base, "/:id([)", false),
            Err(PatternError::InvalidRegex { .. })
        ));
    }

    #[test]
    fn test_base_path_anchoring() {
        let base = Url::parse("http://localhost/app/").unwrap();
        let pattern = CompiledPattern::compile(&base, "/users", false).unwrap();

        assert!(pattern.match_path("/app/users").is_some());
        assert!(pattern.match_path("/users").is_none());
        assert!(pattern.test(&"users".into_location(&base)).is_some());
        assert!(pattern.test(&"/users".into_location(&base)).is_none());
    }

    #[test]
    fn test_origin_and_query_handling() {
        let base = base();
        let pattern = exact("/users/:id");

        let params = pattern
            .test(&"/users/42?tab=posts#top".into_location(&base))
            .unwrap();
        assert_eq!(params.get("id"), Some("42"));

        assert!(pattern
            .test(&"http://elsewhere/users/42".into_location(&base))
            .is_none());
    }

    #[test]
    fn test_reverse() {
        let pattern = exact("/users/:id");
        let params = RouteParams::new().with("id", "42");
        assert_eq!(pattern.reverse(&params).unwrap(), "/users/42");

        let optional = exact("/users/:id?");
        assert_eq!(optional.reverse(&RouteParams::new()).unwrap(), "/users");

        assert!(matches!(
            pattern.reverse(&RouteParams::new()),
            Err(PatternError::MissingParam { .. })
        ));

        let numeric = exact("/users/:id(\\d+)");
        assert!(matches!(
            numeric.reverse(&RouteParams::new().with("id", "abc")),
            Err(PatternError::InvalidParamValue { .. })
        ));
    }

    #[test]
    fn test_non_ascii_and_space_literals() {
        let base = base();

        let pattern = exact("/café");
        assert!(pattern.test(&"/café".into_location(&base)).is_some());
        assert!(pattern.match_path("/caf%C3%A9").is_some());
        assert_eq!(pattern.reverse(&RouteParams::new()).unwrap(), "/caf%C3%A9");

        let pattern = exact("/hello world");
        assert!(pattern.test(&"/hello world".into_location(&base)).is_some());
        assert!(pattern.test(&"/hello%20world".into_location(&base)).is_some());
    }

    #[test]
    fn test_captured_values_are_decoded() {
        let base = base();
        let pattern = exact("/tags/:tag");

        let params = pattern.test(&"/tags/rust lang".into_location(&base)).unwrap();
        assert_eq!(params.get("tag"), Some("rust lang"));

        let params = pattern.match_path("/tags/%C3%A9t%C3%A9").unwrap();
        assert_eq!(params.get("tag"), Some("été"));
    }

    #[test]
    fn test_reverse_encodes_values() {
        let base = base();
        let pattern = exact("/items/:sku");

        let params = RouteParams::new().with("sku", "a b/c%");
        let path = pattern.reverse(&params).unwrap();
        assert_eq!(path, "/items/a%20b%2Fc%25");
        assert_eq!(
            pattern.test(&path.as_str().into_location(&base)).unwrap(),
            params
        );

        let pattern = exact("/files/:path+");
        let params = RouteParams::new().with("path", "my docs/report.pdf");
        let path = pattern.reverse(&params).unwrap();
        assert_eq!(path, "/files/my%20docs/report.pdf");
        assert_eq!(pattern.match_path(&path).unwrap(), params);
    }

    #[test]
    fn test_reverse_with_base_path() {
        let base = Url::parse("http://localhost/app/").unwrap();
        let pattern = CompiledPattern::compile(&base, "/", true).unwrap();
        assert_eq!(pattern.reverse(&RouteParams::new()).unwrap(), "/app");

        let pattern = CompiledPattern::compile(&base, "/posts/:slug", false).unwrap();
        let params = RouteParams::new().with("slug", "hello");
        assert_eq!(pattern.reverse(&params).unwrap(), "/app/posts/hello");
    }
}
