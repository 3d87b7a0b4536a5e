//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to upstream:
//!     → timeouts.rs (connect timeout on the connector, response deadline)
//!     → On failure: retries.rs (retryable? within budget?)
//!     → backoff.rs (jittered exponential delay before the next attempt)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every upstream call has a deadline
//! - Retries are opt-in and limited to safe methods
//! - Retry budget prevents retry storms

pub mod backoff;
pub mod retries;
pub mod timeouts;

pub use retries::{is_retryable, RetryBudget};
pub use timeouts::UpstreamTimeouts;
