//! Backend health state machine.
//!
//! # States
//! - Unknown: no observation yet; backend receives traffic
//! - Healthy: backend receives traffic
//! - Unhealthy: backend excluded from load balancing
//!
//! # State Transitions
//! ```text
//! Healthy/Unknown → Unhealthy: consecutive failures >= unhealthy_threshold
//! Unhealthy/Unknown → Healthy: consecutive successes >= healthy_threshold
//! ```
//!
//! Hysteresis prevents flapping; counters reset on the opposite outcome.

/// Health State enum, stored in an `AtomicU8` on each backend.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    Unknown = 0,
    Healthy = 1,
    Unhealthy = 2,
}

impl From<u8> for HealthState {
    fn from(val: u8) -> Self {
        match val {
            1 => HealthState::Healthy,
            2 => HealthState::Unhealthy,
            _ => HealthState::Unknown,
        }
    }
}

impl HealthState {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthState::Unknown => "unknown",
            HealthState::Healthy => "healthy",
            HealthState::Unhealthy => "unhealthy",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_through_u8() {
        for state in [HealthState::Unknown, HealthState::Healthy, HealthState::Unhealthy] {
            assert_eq!(HealthState::from(state as u8), state);
        }
        assert_eq!(HealthState::from(42), HealthState::Unknown);
    }
}
