//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store compiled routes in declaration order
//! - Look up the first route matching a request
//! - Rewrite the path of the matched request
//! - Return the match or an explicit no-match error
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) scan in declaration order; first match wins
//! - Explicit NoMatch rather than silent default

use axum::http::Method;
use thiserror::Error;

use crate::config::RouteConfig;
use crate::routing::matcher::{AndMatcher, Matcher, MethodMatcher, PathMatcher, PathPattern, PatternError};
use crate::routing::rewrite::{rewrite_path, RewriteRule};
use crate::routing::target::{Target, TargetError};

/// No route accepted the request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    #[error("no route matches {method} {path}")]
    NoMatch { method: Method, path: String },
}

/// A route definition could not be compiled.
#[derive(Debug, Error)]
pub enum RouteBuildError {
    #[error("route '{route}' has no path predicates")]
    NoPredicates { route: String },

    #[error("route '{route}': invalid path pattern '{pattern}': {source}")]
    InvalidPattern {
        route: String,
        pattern: String,
        #[source]
        source: PatternError,
    },

    #[error("route '{route}': invalid method '{method}'")]
    InvalidMethod { route: String, method: String },

    #[error("route '{route}': invalid rewrite pattern '{pattern}': {source}")]
    InvalidRewrite {
        route: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("route '{route}': invalid target '{uri}': {source}")]
    InvalidTarget {
        route: String,
        uri: String,
        #[source]
        source: TargetError,
    },
}

/// Parse a configured method name (case-insensitive).
pub fn parse_method(method: &str) -> Option<Method> {
    Method::from_bytes(method.trim().to_ascii_uppercase().as_bytes()).ok()
}

/// A compiled route.
#[derive(Debug)]
pub struct Route {
    name: String,
    paths: PathMatcher,
    methods: MethodMatcher,
    matcher: AndMatcher,
    rewrites: Vec<RewriteRule>,
    target: Target,
}

impl Route {
    /// Compile a single route definition.
    pub fn from_config(config: &RouteConfig) -> Result<Self, RouteBuildError> {
        let route = || config.name.clone();

        if config.paths.is_empty() {
            return Err(RouteBuildError::NoPredicates { route: route() });
        }

        let patterns = config
            .paths
            .iter()
            .map(|p| {
                PathPattern::parse(p).map_err(|source| RouteBuildError::InvalidPattern {
                    route: route(),
                    pattern: p.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let methods = config
            .methods
            .iter()
            .map(|m| {
                parse_method(m).ok_or_else(|| RouteBuildError::InvalidMethod {
                    route: route(),
                    method: m.clone(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let rewrites = config
            .rewrites
            .iter()
            .map(|r| {
                RewriteRule::new(&r.pattern, &r.replacement).map_err(|source| {
                    RouteBuildError::InvalidRewrite {
                        route: route(),
                        pattern: r.pattern.clone(),
                        source,
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let target = Target::parse(&config.uri).map_err(|source| RouteBuildError::InvalidTarget {
            route: route(),
            uri: config.uri.clone(),
            source,
        })?;

        let paths = PathMatcher::new(patterns);
        let methods = MethodMatcher::new(methods);
        let matcher = AndMatcher::new(vec![Box::new(paths.clone()), Box::new(methods.clone())]);

        Ok(Self {
            name: config.name.clone(),
            paths,
            methods,
            matcher,
            rewrites,
            target,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn patterns(&self) -> &[PathPattern] {
        self.paths.patterns()
    }

    pub fn methods(&self) -> &[Method] {
        self.methods.methods()
    }

    pub fn rewrites(&self) -> &[RewriteRule] {
        &self.rewrites
    }

    /// True when one of the predicates is `/**` and the route accepts every
    /// method. A method-restricted `/**` route does not shadow later routes.
    pub fn is_catch_all(&self) -> bool {
        self.methods.methods().is_empty() && self.paths.patterns().iter().any(PathPattern::is_catch_all)
    }

    fn matches(&self, method: &Method, path: &str) -> bool {
        self.matcher.matches(method, path)
    }
}

/// Outcome of a successful lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch<'a> {
    /// Name of the matched route.
    pub route: &'a str,
    /// Where the request goes.
    pub target: &'a Target,
    /// Path to forward, after rewrites.
    pub path: String,
}

/// Ordered, immutable route table.
#[derive(Debug, Default)]
pub struct Router {
    routes: Vec<Route>,
}

impl Router {
    /// Compile a route table. Declaration order is evaluation order.
    pub fn from_config(configs: &[RouteConfig]) -> Result<Self, RouteBuildError> {
        let routes = configs
            .iter()
            .map(Route::from_config)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { routes })
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Find the first route accepting `method` and `path`, and rewrite the path.
    pub fn route(&self, method: &Method, path: &str) -> Result<RouteMatch<'_>, RoutingError> {
        let route = self
            .routes
            .iter()
            .find(|r| r.matches(method, path))
            .ok_or_else(|| RoutingError::NoMatch {
                method: method.clone(),
                path: path.to_string(),
            })?;

        Ok(RouteMatch {
            route: route.name(),
            target: route.target(),
            path: rewrite_path(route.rewrites(), path),
        })
    }
}
