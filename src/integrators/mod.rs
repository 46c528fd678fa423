//! Integrator dispatch (component 4.B/C/D/E)
//!
//! A single tagged enum replaces a bag of booleans: callers pick one
//! variant up front and the simulator drives it through a uniform
//! `advance` call without knowing which family is underneath.

pub mod embedded_rk;
pub mod fixed_step;
pub mod ias15;
pub mod tableau;

use crate::body::State;
use crate::error::SimError;
use embedded_rk::EmbeddedRk;
use fixed_step::{FixedStepIntegrator, FixedStepKind};
use ias15::Ias15;
use tableau::EmbeddedKind;

/// Selects which integration scheme a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegratorKind {
    Euler,
    EulerCromer,
    Rk4,
    Leapfrog,
    Rkf45,
    Dopri54,
    Dverk65,
    Rkf78,
    Ias15,
}

impl IntegratorKind {
    pub fn is_adaptive(self) -> bool {
        !matches!(
            self,
            IntegratorKind::Euler | IntegratorKind::EulerCromer | IntegratorKind::Rk4 | IntegratorKind::Leapfrog
        )
    }
}

/// Step-control parameters for the adaptive families; ignored by
/// fixed-step integrators.
#[derive(Debug, Clone, Copy)]
pub struct AdaptiveParams {
    pub tolerance: f64,
    pub expected_time_scale: f64,
    pub min_iteration: u32,
    pub max_iteration: u32,
}

impl Default for AdaptiveParams {
    fn default() -> Self {
        AdaptiveParams {
            tolerance: 1e-9,
            expected_time_scale: 1.0,
            min_iteration: 1,
            max_iteration: 10_000,
        }
    }
}

enum Driver {
    Fixed(FixedStepIntegrator),
    Embedded(EmbeddedRk),
    Ias15(Box<Ias15>),
}

/// Owns whichever concrete integrator a run selected and dispatches
/// `advance` to it uniformly.
pub struct Integrator {
    driver: Driver,
    pub kind: IntegratorKind,
    params: AdaptiveParams,
}

impl Integrator {
    pub fn new(kind: IntegratorKind, n: usize, params: AdaptiveParams) -> Self {
        let driver = match kind {
            IntegratorKind::Euler => Driver::Fixed(FixedStepIntegrator::new(FixedStepKind::Euler)),
            IntegratorKind::EulerCromer => Driver::Fixed(FixedStepIntegrator::new(FixedStepKind::EulerCromer)),
            IntegratorKind::Rk4 => Driver::Fixed(FixedStepIntegrator::new(FixedStepKind::Rk4)),
            IntegratorKind::Leapfrog => Driver::Fixed(FixedStepIntegrator::new(FixedStepKind::Leapfrog)),
            IntegratorKind::Rkf45 => Driver::Embedded(EmbeddedRk::new(EmbeddedKind::Rkf45)),
            IntegratorKind::Dopri54 => Driver::Embedded(EmbeddedRk::new(EmbeddedKind::Dopri54)),
            IntegratorKind::Dverk65 => Driver::Embedded(EmbeddedRk::new(EmbeddedKind::Dverk65)),
            IntegratorKind::Rkf78 => Driver::Embedded(EmbeddedRk::new(EmbeddedKind::Rkf78)),
            IntegratorKind::Ias15 => Driver::Ias15(Box::new(Ias15::new(n))),
        };
        Integrator { driver, kind, params }
    }

    /// Pick an initial `state.dt` when the caller didn't supply one,
    /// for the adaptive families only.
    pub fn initial_step_size(&self, state: &State, m: &[f64], g: f64) -> Option<f64> {
        match &self.driver {
            Driver::Embedded(e) => Some(e.initial_step_size(&state.x, &state.v, m, g, self.params.tolerance)),
            _ => None,
        }
    }

    /// Advance `state` by one step (fixed-size for the fixed-step
    /// family, adaptive for embedded RK / IAS15).
    pub fn advance(&mut self, state: &mut State, m: &[f64], g: f64) -> Result<(), SimError> {
        match &mut self.driver {
            Driver::Fixed(integrator) => integrator.step(state, m, g),
            Driver::Embedded(integrator) => integrator.step_loop(
                state,
                m,
                g,
                self.params.tolerance,
                self.params.expected_time_scale,
                self.params.min_iteration,
                self.params.max_iteration,
            ),
            Driver::Ias15(integrator) => {
                integrator.step(state, m, g, self.params.tolerance, self.params.expected_time_scale)
            }
        }
    }

    /// Advance by an explicit step size, used only for the final short
    /// step of a fixed-step run that must land exactly on `tf`.
    pub fn advance_by(&mut self, state: &mut State, m: &[f64], g: f64, h: f64) -> Result<(), SimError> {
        match &mut self.driver {
            Driver::Fixed(integrator) => integrator.step_into(state, m, g, h),
            _ => self.advance(state, m, g),
        }
    }
}
