//! Typed error taxonomy for the simulation engine
//!
//! Every fallible entry point returns [`SimError`] instead of a bare
//! `std::io::Error` so callers can match exhaustively on the kind of
//! failure rather than sniffing message text.

use thiserror::Error;

/// All failure modes the engine can surface.
#[derive(Debug, Error)]
pub enum SimError {
    /// Bad request parameters caught before any integration begins.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Two distinct bodies occupy the same point in space.
    #[error("bodies {i} and {j} coincide exactly")]
    Coincidence { i: usize, j: usize },

    /// A NaN or infinite value appeared in position, velocity, or
    /// acceleration after a step.
    #[error("non-finite value encountered in {field} at step {step}")]
    NonFinite { field: &'static str, step: u64 },

    /// Persistent storage could not be read or written.
    #[error("I/O failure: {0}")]
    IoFailure(#[from] std::io::Error),

    /// Cooperative cancellation was observed; the caller already has
    /// the truncated trajectory buffer and this variant is informational.
    #[error("simulation cancelled after {steps_completed} recorded steps")]
    Cancelled { steps_completed: usize },

    /// Adaptive step was clamped to the step floor and still failed the
    /// error test after `max_iteration` attempts. Never returned from
    /// `?` — the step is force-accepted and this is only logged via
    /// [`log::warn!`], kept here so tests can assert on the taxonomy.
    #[error("step floor reached after {attempts} attempts at t={t}")]
    StepFloor { t: f64, attempts: u32 },
}

pub type SimResult<T> = Result<T, SimError>;
