//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → cors.rs (origin allow-list, preflight answers)
//!     → headers.rs (strip hop-by-hop, add X-Forwarded-*)
//!     → Forward to upstream
//! Upstream response:
//!     → headers.rs (strip hop-by-hop)
//!     → cors.rs (attach CORS headers for allowed origins)
//! ```
//!
//! # Design Decisions
//! - CORS is origin based and uniform across routes
//! - The gateway never rejects on origin; browsers enforce the policy

pub mod cors;
pub mod headers;

pub use cors::CorsPolicy;
