//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Compile-check route patterns, rewrites and targets
//! - Check referential integrity (routes reference declared services)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Enforce catch-all ordering and CORS consistency
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::HeaderName;
use thiserror::Error;

use crate::config::schema::{GatewayConfig, RouteConfig, ServiceConfig};
use crate::load_balancer::backend::Backend;
use crate::routing::matcher::PathPattern;
use crate::routing::rewrite::RewriteRule;
use crate::routing::router::{parse_method, RouteBuildError};
use crate::routing::target::{Target, TargetError};

/// A single semantic problem in the configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),

    #[error("frontend.uri '{uri}' is not a usable static target: {reason}")]
    InvalidFrontendUri { uri: String, reason: String },

    #[error("route #{index} has an empty name")]
    EmptyRouteName { index: usize },

    #[error("duplicate route name '{0}'")]
    DuplicateRoute(String),

    #[error(transparent)]
    Route(#[from] RouteBuildError),

    #[error("route '{route}' targets undeclared service '{service}'")]
    UnknownService { route: String, service: String },

    #[error("catch-all route '{route}' must be the last route")]
    CatchAllNotLast { route: String },

    #[error("service #{index} has an empty name")]
    EmptyServiceName { index: usize },

    #[error("duplicate service name '{0}'")]
    DuplicateService(String),

    #[error("service '{0}' has no instances")]
    NoInstances(String),

    #[error("service '{service}': invalid instance '{instance}': {reason}")]
    InvalidInstance {
        service: String,
        instance: String,
        reason: String,
    },

    #[error("retries.budget_ratio must be within 0.0..=1.0, got {0}")]
    InvalidBudgetRatio(f32),

    #[error("cors: wildcard origin '*' cannot be combined with allow_credentials")]
    CorsWildcardWithCredentials,

    #[error("cors: invalid method '{0}'")]
    InvalidCorsMethod(String),

    #[error("cors: invalid header name '{0}'")]
    InvalidCorsHeader(String),
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    validate_listener(config, &mut errors);
    validate_frontend(config, &mut errors);
    validate_services(&config.services, &mut errors);

    let services: HashSet<&str> = config.services.iter().map(|s| s.name.as_str()).collect();
    validate_routes(&config.route_table(), &services, &mut errors);

    validate_limits(config, &mut errors);
    validate_cors(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_listener(config: &GatewayConfig, errors: &mut Vec<ValidationError>) {
    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.listener.max_in_flight == 0 {
        errors.push(ValidationError::ZeroValue("listener.max_in_flight"));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }
}

fn validate_frontend(config: &GatewayConfig, errors: &mut Vec<ValidationError>) {
    let uri = &config.frontend.uri;
    let reason = match Target::parse(uri) {
        Ok(Target::Static(_)) => return,
        Ok(Target::Service(_)) => "a load-balanced target is not allowed here".to_string(),
        Err(e) => e.to_string(),
    };
    errors.push(ValidationError::InvalidFrontendUri {
        uri: uri.clone(),
        reason,
    });
}

fn validate_services(services: &[ServiceConfig], errors: &mut Vec<ValidationError>) {
    let mut seen = HashSet::new();

    for (index, service) in services.iter().enumerate() {
        if service.name.is_empty() {
            errors.push(ValidationError::EmptyServiceName { index });
            continue;
        }
        if !seen.insert(service.name.as_str()) {
            errors.push(ValidationError::DuplicateService(service.name.clone()));
        }
        if service.instances.is_empty() {
            errors.push(ValidationError::NoInstances(service.name.clone()));
        }
        if service.max_connections == 0 {
            errors.push(ValidationError::ZeroValue("services.max_connections"));
        }
        for instance in &service.instances {
            let reason = match Backend::new(service.name.clone(), instance, 1) {
                Ok(b) if b.base_url.scheme() == "http" => continue,
                Ok(b) => TargetError::UnsupportedScheme(b.base_url.scheme().to_string()).to_string(),
                Err(e) => e.to_string(),
            };
            errors.push(ValidationError::InvalidInstance {
                service: service.name.clone(),
                instance: instance.clone(),
                reason,
            });
        }
    }
}

fn validate_routes(routes: &[RouteConfig], services: &HashSet<&str>, errors: &mut Vec<ValidationError>) {
    let mut seen = HashSet::new();
    let last = routes.len().saturating_sub(1);

    for (index, route) in routes.iter().enumerate() {
        let name = route.name.clone();
        if name.is_empty() {
            errors.push(ValidationError::EmptyRouteName { index });
        } else if !seen.insert(route.name.as_str()) {
            errors.push(ValidationError::DuplicateRoute(name.clone()));
        }

        if route.paths.is_empty() {
            errors.push(RouteBuildError::NoPredicates { route: name.clone() }.into());
        }

        let mut catch_all = false;
        for pattern in &route.paths {
            match PathPattern::parse(pattern) {
                Ok(p) => catch_all |= p.is_catch_all(),
                Err(source) => errors.push(
                    RouteBuildError::InvalidPattern {
                        route: name.clone(),
                        pattern: pattern.clone(),
                        source,
                    }
                    .into(),
                ),
            }
        }
        if catch_all && route.methods.is_empty() && index != last {
            errors.push(ValidationError::CatchAllNotLast { route: name.clone() });
        }

        for method in &route.methods {
            if parse_method(method).is_none() {
                errors.push(
                    RouteBuildError::InvalidMethod {
                        route: name.clone(),
                        method: method.clone(),
                    }
                    .into(),
                );
            }
        }

        for rewrite in &route.rewrites {
            if let Err(source) = RewriteRule::new(&rewrite.pattern, &rewrite.replacement) {
                errors.push(
                    RouteBuildError::InvalidRewrite {
                        route: name.clone(),
                        pattern: rewrite.pattern.clone(),
                        source,
                    }
                    .into(),
                );
            }
        }

        match Target::parse(&route.uri) {
            Ok(Target::Service(service)) if !services.contains(service.as_str()) => {
                errors.push(ValidationError::UnknownService {
                    route: name.clone(),
                    service,
                });
            }
            Ok(_) => {}
            Err(source) => errors.push(
                RouteBuildError::InvalidTarget {
                    route: name.clone(),
                    uri: route.uri.clone(),
                    source,
                }
                .into(),
            ),
        }
    }
}

fn validate_limits(config: &GatewayConfig, errors: &mut Vec<ValidationError>) {
    let timeouts = &config.timeouts;
    if timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroValue("timeouts.connect_secs"));
    }
    if timeouts.upstream_secs == 0 {
        errors.push(ValidationError::ZeroValue("timeouts.upstream_secs"));
    }
    if timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroValue("timeouts.request_secs"));
    }

    let retries = &config.retries;
    if retries.enabled {
        if retries.max_attempts == 0 {
            errors.push(ValidationError::ZeroValue("retries.max_attempts"));
        }
        if !(0.0..=1.0).contains(&retries.budget_ratio) {
            errors.push(ValidationError::InvalidBudgetRatio(retries.budget_ratio));
        }
    }

    let health = &config.health_check;
    if health.enabled {
        if health.interval_secs == 0 {
            errors.push(ValidationError::ZeroValue("health_check.interval_secs"));
        }
        if health.timeout_secs == 0 {
            errors.push(ValidationError::ZeroValue("health_check.timeout_secs"));
        }
    }
    if health.unhealthy_threshold == 0 {
        errors.push(ValidationError::ZeroValue("health_check.unhealthy_threshold"));
    }
    if health.healthy_threshold == 0 {
        errors.push(ValidationError::ZeroValue("health_check.healthy_threshold"));
    }
}

fn validate_cors(config: &GatewayConfig, errors: &mut Vec<ValidationError>) {
    let cors = &config.cors;
    if cors.allow_credentials && cors.allowed_origins.iter().any(|o| o == "*") {
        errors.push(ValidationError::CorsWildcardWithCredentials);
    }
    for method in &cors.allowed_methods {
        if parse_method(method).is_none() {
            errors.push(ValidationError::InvalidCorsMethod(method.clone()));
        }
    }
    for header in &cors.allowed_headers {
        if HeaderName::from_bytes(header.as_bytes()).is_err() {
            errors.push(ValidationError::InvalidCorsHeader(header.clone()));
        }
    }
}
