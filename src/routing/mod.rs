//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (ordered route scan)
//!     → matcher.rs (evaluate path/method predicates)
//!     → rewrite.rs (regex rewrites on the matched route)
//!     → Return: RouteMatch { route, target, path } or NoMatch
//!
//! Route Compilation (at startup and on reload):
//!     RouteConfig[]
//!     → Compile path patterns, rewrite regexes, targets
//!     → Freeze as immutable Router
//! ```
//!
//! # Design Decisions
//! - Routes compiled up front, immutable at runtime
//! - Declaration order is evaluation order; first match wins
//! - Regex only in rewrites, never in predicates

pub mod matcher;
pub mod rewrite;
pub mod router;
pub mod target;

pub use router::{Route, RouteBuildError, RouteMatch, Router, RoutingError};
pub use target::Target;
