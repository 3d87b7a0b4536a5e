//! Route matching logic.
//!
//! # Responsibilities
//! - Match the request path against glob-style path patterns
//! - Match the request method against an optional allow-list
//! - Combine conditions with AND semantics
//!
//! # Design Decisions
//! - Path matching is segment based and case-sensitive
//! - `*` and `{name}` match exactly one non-empty segment
//! - A trailing `**` matches any suffix, including the empty one
//! - One trailing `/` on the request path is ignored
//! - No regex in predicates; regexes are only used by rewrites

use axum::http::Method;
use thiserror::Error;

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the request matches this condition.
    fn matches(&self, method: &Method, path: &str) -> bool;
}

/// Error raised for a malformed path pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("pattern must start with '/'")]
    MissingLeadingSlash,
    #[error("empty segment in pattern")]
    EmptySegment,
    #[error("'**' is only allowed as the last segment")]
    MisplacedDoubleWildcard,
    #[error("unsupported wildcard in segment '{0}'")]
    UnsupportedWildcard(String),
    #[error("malformed variable segment '{0}'")]
    MalformedVariable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// `*` or `{name}`.
    Single,
}

impl Segment {
    fn matches(&self, segment: &str) -> bool {
        match self {
            Segment::Literal(expected) => expected == segment,
            Segment::Single => !segment.is_empty(),
        }
    }
}

/// A compiled path pattern such as `/api/users/**`.
#[derive(Debug, Clone)]
pub struct PathPattern {
    source: String,
    segments: Vec<Segment>,
    any_suffix: bool,
}

impl PathPattern {
    /// Compile a pattern.
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        let rest = pattern
            .strip_prefix('/')
            .ok_or(PatternError::MissingLeadingSlash)?;

        let mut segments = Vec::new();
        let mut any_suffix = false;

        if !rest.is_empty() {
            let parts: Vec<&str> = rest.split('/').collect();
            let last = parts.len() - 1;
            for (i, part) in parts.iter().enumerate() {
                match *part {
                    "" if i == last => {} // tolerate "/users/"
                    "" => return Err(PatternError::EmptySegment),
                    "**" if i == last => any_suffix = true,
                    "**" => return Err(PatternError::MisplacedDoubleWildcard),
                    "*" => segments.push(Segment::Single),
                    p if p.starts_with('{') || p.ends_with('}') => {
                        let well_formed = p
                            .strip_prefix('{')
                            .and_then(|p| p.strip_suffix('}'))
                            .is_some_and(|name| !name.is_empty() && !name.contains(['{', '}']));
                        if !well_formed {
                            return Err(PatternError::MalformedVariable(p.to_string()));
                        }
                        segments.push(Segment::Single);
                    }
                    p if p.contains('*') => {
                        return Err(PatternError::UnsupportedWildcard(p.to_string()))
                    }
                    p => segments.push(Segment::Literal(p.to_string())),
                }
            }
        }

        Ok(Self {
            source: pattern.to_string(),
            segments,
            any_suffix,
        })
    }

    /// The pattern as written in configuration.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// True for `/**`, which matches every path.
    pub fn is_catch_all(&self) -> bool {
        self.segments.is_empty() && self.any_suffix
    }

    /// Test a request path.
    pub fn matches_path(&self, path: &str) -> bool {
        let Some(rest) = path.strip_prefix('/') else {
            return false;
        };
        let rest = rest.strip_suffix('/').unwrap_or(rest);

        let parts: Vec<&str> = if rest.is_empty() {
            Vec::new()
        } else {
            rest.split('/').collect()
        };

        if self.any_suffix {
            if parts.len() < self.segments.len() {
                return false;
            }
        } else if parts.len() != self.segments.len() {
            return false;
        }

        self.segments
            .iter()
            .zip(parts.iter())
            .all(|(segment, part)| segment.matches(part))
    }
}

/// Matches if any of its path patterns matches.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    patterns: Vec<PathPattern>,
}

impl PathMatcher {
    pub fn new(patterns: Vec<PathPattern>) -> Self {
        Self { patterns }
    }

    pub fn patterns(&self) -> &[PathPattern] {
        &self.patterns
    }
}

impl Matcher for PathMatcher {
    fn matches(&self, _method: &Method, path: &str) -> bool {
        self.patterns.iter().any(|p| p.matches_path(path))
    }
}

/// Matches the request method. An empty allow-list accepts every method.
#[derive(Debug, Clone, Default)]
pub struct MethodMatcher {
    methods: Vec<Method>,
}

impl MethodMatcher {
    pub fn new(methods: Vec<Method>) -> Self {
        Self { methods }
    }

    pub fn methods(&self) -> &[Method] {
        &self.methods
    }
}

impl Matcher for MethodMatcher {
    fn matches(&self, method: &Method, _path: &str) -> bool {
        self.methods.is_empty() || self.methods.contains(method)
    }
}

/// Combines multiple matchers with AND semantics.
#[derive(Debug)]
pub struct AndMatcher {
    matchers: Vec<Box<dyn Matcher>>,
}

impl AndMatcher {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }
}

impl Matcher for AndMatcher {
    fn matches(&self, method: &Method, path: &str) -> bool {
        // All matchers must pass (AND)
        self.matchers.iter().all(|m| m.matches(method, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern(p: &str) -> PathPattern {
        PathPattern::parse(p).unwrap()
    }

    #[test]
    fn test_double_wildcard_matches_empty_suffix() {
        let p = pattern("/api/users/**");
        assert!(p.matches_path("/api/users"));
        assert!(p.matches_path("/api/users/"));
        assert!(p.matches_path("/api/users/123"));
        assert!(p.matches_path("/api/users/123/orders"));
        assert!(!p.matches_path("/api/usersx"));
        assert!(!p.matches_path("/api"));
        assert!(!p.matches_path("/users/123"));
    }

    #[test]
    fn test_catch_all() {
        let p = pattern("/**");
        assert!(p.is_catch_all());
        assert!(p.matches_path("/"));
        assert!(p.matches_path("/dashboard"));
        assert!(p.matches_path("/assets/index.js"));
        assert!(!pattern("/users/**").is_catch_all());
    }

    #[test]
    fn test_single_segment_wildcards() {
        let p = pattern("/users/*");
        assert!(p.matches_path("/users/1"));
        assert!(p.matches_path("/users/1/"));
        assert!(!p.matches_path("/users"));
        assert!(!p.matches_path("/users/1/2"));

        let v = pattern("/sales/{id}/items");
        assert!(v.matches_path("/sales/9/items"));
        assert!(!v.matches_path("/sales//items"));
    }

    #[test]
    fn test_literal_is_case_sensitive() {
        let p = pattern("/dashboard");
        assert!(p.matches_path("/dashboard"));
        assert!(!p.matches_path("/Dashboard"));
    }

    #[test]
    fn test_invalid_patterns() {
        assert_eq!(
            PathPattern::parse("users/**").unwrap_err(),
            PatternError::MissingLeadingSlash
        );
        assert_eq!(
            PathPattern::parse("/**/users").unwrap_err(),
            PatternError::MisplacedDoubleWildcard
        );
        assert_eq!(
            PathPattern::parse("/a//b").unwrap_err(),
            PatternError::EmptySegment
        );
        assert!(matches!(
            PathPattern::parse("/user*"),
            Err(PatternError::UnsupportedWildcard(_))
        ));
        assert!(matches!(
            PathPattern::parse("/{id"),
            Err(PatternError::MalformedVariable(_))
        ));
    }

    #[test]
    fn test_method_matcher() {
        let any = MethodMatcher::default();
        assert!(any.matches(&Method::DELETE, "/"));

        let only_get = MethodMatcher::new(vec![Method::GET]);
        assert!(only_get.matches(&Method::GET, "/"));
        assert!(!only_get.matches(&Method::POST, "/"));
    }

    #[test]
    fn test_and_matcher() {
        let matcher = AndMatcher::new(vec![
            Box::new(PathMatcher::new(vec![pattern("/sales/**")])),
            Box::new(MethodMatcher::new(vec![Method::POST])),
        ]);
        assert!(matcher.matches(&Method::POST, "/sales/1"));
        assert!(!matcher.matches(&Method::GET, "/sales/1"));
        assert!(!matcher.matches(&Method::POST, "/users/1"));
    }
}
