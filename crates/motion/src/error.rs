//! Error types for the motion planning crate.

use thiserror::Error;

/// Errors that can occur during motion planning.
#[derive(Debug, Error, PartialEq, Clone)]
pub enum PlannerError {
    /// A planner limit was non-positive where it must be positive.
    #[error("invalid planner limits: {0}")]
    InvalidLimits(&'static str),
    /// The segment count would overflow the planner's internal block counter.
    #[error("allocation failed for {0} segments")]
    AllocationFailed(usize),
}
