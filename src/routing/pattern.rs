//! Route pattern compilation.
//!
//! # Responsibilities
//! - Tokenize a path specification on `/`, dropping empty segments
//! - Classify each token as a literal or a parenthesized regex capture
//! - Compile capture tokens, anchored so they must match a whole segment
//!
//! # Design Decisions
//! - Two phases (tokenize, then classify+compile) so each is testable alone
//! - The first segment must be literal and becomes `root_segment`
//! - Regexes compare by source text, so Route supports structural equality

use axum::http::Method;
use regex::Regex;

use crate::routing::RouteError;

/// Opaque lookup key binding a route to its handler.
///
/// This is not an ownership relation: the server resolves the identity in its
/// handler map at dispatch time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HandlerId(String);

impl HandlerId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for HandlerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One compiled path segment.
#[derive(Debug, Clone)]
pub enum Segment {
    /// Matched byte-for-byte.
    Literal(String),
    /// Parenthesized regex, anchored to the whole segment.
    Capture(Regex),
}

impl Segment {
    pub fn is_capture(&self) -> bool {
        matches!(self, Segment::Capture(_))
    }
}

impl PartialEq for Segment {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Segment::Literal(a), Segment::Literal(b)) => a == b,
            (Segment::Capture(a), Segment::Capture(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl Eq for Segment {}

/// A compiled (method, path-pattern) binding to a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub method: Method,
    /// The path specification as registered, before compilation.
    pub raw_path: String,
    /// Compiled segments in path order.
    pub pattern: Vec<Segment>,
    /// First literal segment, used as a coarse namespace.
    pub root_segment: String,
    pub handler: HandlerId,
    /// Public routes bypass authentication enforcement.
    pub public: bool,
}

impl Route {
    /// Match an incoming path against this pattern.
    ///
    /// Returns the captured groups in segment order, or `None` if any segment
    /// fails to match. Segment counts must agree exactly.
    pub fn matches(&self, path: &str) -> Option<Vec<String>> {
        let segments: Vec<&str> = tokenize(path).collect();
        if segments.len() != self.pattern.len() {
            return None;
        }

        let mut captures = Vec::new();
        for (expected, actual) in self.pattern.iter().zip(&segments) {
            match expected {
                Segment::Literal(lit) => {
                    if lit != actual {
                        return None;
                    }
                }
                Segment::Capture(re) => {
                    let caps = re.captures(actual)?;
                    captures.extend(
                        caps.iter()
                            .skip(1)
                            .flatten()
                            .map(|m| m.as_str().to_string()),
                    );
                }
            }
        }
        Some(captures)
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.raw_path)
    }
}

/// Split a path on `/`, dropping empty segments.
///
/// Leading, trailing and duplicate slashes all produce empty tokens, so
/// `/instances//42/` tokenizes the same as `instances/42`.
pub fn tokenize(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Classify one token as a literal or a compiled capture segment.
fn classify(token: &str) -> Result<Segment, RouteError> {
    if token.len() >= 2 && token.starts_with('(') && token.ends_with(')') {
        // Anchor so the regex must cover the whole incoming segment.
        let re = Regex::new(&format!("^{token}$"))
            .map_err(|e| RouteError::Compile(format!("bad capture segment {token}: {e}")))?;
        Ok(Segment::Capture(re))
    } else {
        Ok(Segment::Literal(token.to_string()))
    }
}

/// Compile a route specification into a matchable [`Route`].
pub fn compile(
    method: Method,
    path: &str,
    handler: HandlerId,
    public: bool,
) -> Result<Route, RouteError> {
    let mut pattern = Vec::new();
    for token in tokenize(path) {
        pattern.push(classify(token)?);
    }

    let root_segment = match pattern.first() {
        Some(Segment::Literal(lit)) => lit.clone(),
        _ => {
            return Err(RouteError::Compile(
                "route must start with a literal segment".into(),
            ))
        }
    };

    Ok(Route {
        method,
        raw_path: path.to_string(),
        pattern,
        root_segment,
        handler,
        public,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_literal_root() {
        let route = compile(Method::GET, "/instances", HandlerId::new("list"), false).unwrap();
        assert_eq!(route.root_segment, "instances");
        assert_eq!(route.pattern.len(), 1);
        assert!(!route.public);
    }

    #[test]
    fn test_compile_with_capture() {
        let route = compile(
            Method::GET,
            "/instances/([0-9]+)",
            HandlerId::new("get"),
            false,
        )
        .unwrap();
        assert_eq!(route.root_segment, "instances");
        assert!(route.pattern[1].is_capture());
    }

    #[test]
    fn test_compile_rejects_regex_root() {
        let err = compile(Method::GET, "/([a-z]+)/x", HandlerId::new("h"), false).unwrap_err();
        assert!(matches!(err, RouteError::Compile(_)));
    }

    #[test]
    fn test_compile_rejects_empty_path() {
        assert!(compile(Method::GET, "/", HandlerId::new("h"), false).is_err());
        assert!(compile(Method::GET, "", HandlerId::new("h"), false).is_err());
    }

    #[test]
    fn test_tokenize_drops_empty_segments() {
        let tokens: Vec<&str> = tokenize("//instances//42/").collect();
        assert_eq!(tokens, vec!["instances", "42"]);
    }

    #[test]
    fn test_matches_extracts_captures() {
        let route = compile(
            Method::GET,
            "/instances/([0-9]+)/db/([a-z]+)",
            HandlerId::new("db"),
            false,
        )
        .unwrap();
        let caps = route.matches("/instances/42/db/postgres").unwrap();
        assert_eq!(caps, vec!["42", "postgres"]);
    }

    #[test]
    fn test_matches_requires_full_segment() {
        let route = compile(
            Method::GET,
            "/instances/([0-9]+)",
            HandlerId::new("get"),
            false,
        )
        .unwrap();
        assert!(route.matches("/instances/42abc").is_none());
        assert!(route.matches("/instances/abc").is_none());
        assert!(route.matches("/instances").is_none());
    }

    #[test]
    fn test_route_equality_by_structure() {
        let a = compile(Method::GET, "/x/([0-9]+)", HandlerId::new("h"), false).unwrap();
        let b = compile(Method::GET, "/x/([0-9]+)", HandlerId::new("h"), false).unwrap();
        let c = compile(Method::POST, "/x/([0-9]+)", HandlerId::new("h"), false).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
