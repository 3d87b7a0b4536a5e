//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Periodic timer
//!     → Probe each service instance
//!     → Update state.rs
//!
//! Passive health checks (passive.rs):
//!     Forwarded request outcome observed
//!     → Increment failure/success count
//!     → Update state.rs if threshold exceeded
//!
//! State machine (state.rs):
//!     Unknown → Healthy ←→ Unhealthy
//!     With thresholds to prevent flapping
//! ```
//!
//! # Design Decisions
//! - Active and passive checks are complementary; active is opt-in
//! - State transitions require consecutive successes/failures
//! - Health state is per-instance, not per-service

pub mod active;
pub mod passive;
pub mod state;
