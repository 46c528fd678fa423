//! High-level simulation driver (component 4.J)
//!
//! Wires the pipeline `H -> B -> {C, D, E} -> F -> G -> I`: builds the
//! initial state from a catalog entry or a custom system, drives the
//! chosen integrator to `tf`, records the trajectory, and (optionally)
//! computes diagnostics. Cancellation is cooperative: the caller polls
//! a flag between steps and the engine returns the partial trajectory
//! on the next check.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::body::State;
use crate::constants::G;
use crate::diagnostics;
use crate::error::SimError;
use crate::integrators::{AdaptiveParams, Integrator, IntegratorKind};
use crate::progress::ProgressSink;
use crate::trajectory::Trajectory;

/// A completed (or cancelled) run: the recorded trajectory plus the
/// masses it was produced under, needed to compute diagnostics later.
pub struct RunOutcome {
    pub trajectory: Trajectory,
    pub m: Vec<f64>,
    pub cancelled: bool,
}

/// Shared cooperative-cancellation flag; clone and hand one side to
/// the caller, keep the other for `Simulator::run` to poll.
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        CancelFlag(Arc::new(AtomicBool::new(false)))
    }
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
    fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

pub struct Simulator {
    kind: IntegratorKind,
    params: AdaptiveParams,
}

impl Simulator {
    pub fn new(kind: IntegratorKind, params: AdaptiveParams) -> Self {
        log::info!("selected integrator {kind:?}");
        Simulator { kind, params }
    }

    /// Drive `state` forward to `tf` (days), recording every
    /// `store_every_n`-th accepted step. `cancel` is polled once per
    /// step; on cancellation the partial trajectory is returned with
    /// `cancelled = true` rather than an error, matching §7's
    /// "Cancelled" semantics of a truncated-not-failed result.
    pub fn run(
        &self,
        mut state: State,
        tf: f64,
        store_every_n: u64,
        cancel: &CancelFlag,
        progress: &mut dyn ProgressSink,
    ) -> Result<RunOutcome, SimError> {
        if tf < 0.0 {
            return Err(SimError::InvalidInput(format!("tf must be >= 0, got {tf}")));
        }
        let m = state.m.clone();
        let mut integrator = Integrator::new(self.kind, state.n(), self.params);
        if self.kind.is_adaptive() {
            if let Some(dt0) = integrator.initial_step_size(&state, &m, G) {
                state.dt = dt0;
            }
        }

        let mut trajectory = Trajectory::new(store_every_n);
        trajectory.record_if_due(&state);

        let mut step_index: u64 = 0;
        let mut cancelled = false;

        if self.kind.is_adaptive() {
            loop {
                if cancel.is_cancelled() {
                    cancelled = true;
                    log::warn!("run cancelled after {step_index} steps");
                    break;
                }
                if state.t >= tf {
                    break;
                }
                integrator.advance(&mut state, &m, G)?;
                step_index += 1;
                trajectory.record_if_due(&state);
            }
        } else {
            // Fixed-step family (4.C): exactly `total = floor(tf/dt)`
            // full-size steps, then one short remainder step landing
            // exactly on `tf` if it isn't already an exact multiple of dt.
            let total = (tf / state.dt).floor() as u64;
            let has_remainder = tf > total as f64 * state.dt;
            let report_total = if has_remainder { total + 1 } else { total }.max(1);

            for _ in 0..total {
                if cancel.is_cancelled() {
                    cancelled = true;
                    log::warn!("run cancelled after {step_index} steps");
                    break;
                }
                integrator.advance(&mut state, &m, G)?;
                step_index += 1;
                progress.report(step_index, report_total);
                trajectory.record_if_due(&state);
            }

            if !cancelled && has_remainder {
                if cancel.is_cancelled() {
                    cancelled = true;
                    log::warn!("run cancelled after {step_index} steps");
                } else {
                    let remainder = tf - state.t;
                    if remainder > 0.0 {
                        integrator.advance_by(&mut state, &m, G, remainder)?;
                        step_index += 1;
                        progress.report(step_index, report_total);
                        trajectory.record_if_due(&state);
                    }
                }
            }
        }

        if !cancelled {
            trajectory.force_last(&state);
        }

        log::info!(
            "run complete: {} recorded samples, final t = {}",
            trajectory.len(),
            state.t
        );
        Ok(RunOutcome { trajectory, m, cancelled })
    }
}

/// Compute the energy and angular-momentum series for a completed run.
pub fn diagnostics_for(outcome: &RunOutcome, progress: &mut dyn ProgressSink) -> Result<(Vec<f64>, Vec<f64>), SimError> {
    let n = outcome.m.len();
    let sol_x: Vec<Vec<[f64; 3]>> = outcome
        .trajectory
        .sol_state
        .iter()
        .map(|flat| flat[0..3 * n].chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect())
        .collect();
    let sol_v: Vec<Vec<[f64; 3]>> = outcome
        .trajectory
        .sol_state
        .iter()
        .map(|flat| flat[3 * n..6 * n].chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect())
        .collect();
    diagnostics::compute_series(&sol_x, &sol_v, &outcome.m, G, progress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Preset;
    use crate::progress::NullProgress;

    #[test]
    fn fixed_step_run_records_first_and_last_sample() {
        let state = Preset::CircularBinaryOrbit.build(0.1).unwrap();
        let sim = Simulator::new(IntegratorKind::Leapfrog, AdaptiveParams::default());
        let cancel = CancelFlag::new();
        let mut progress = NullProgress;
        let outcome = sim.run(state, 5.0, 1, &cancel, &mut progress).unwrap();
        assert!(!outcome.cancelled);
        assert_eq!(outcome.trajectory.sol_time[0], 0.0);
        assert!((*outcome.trajectory.sol_time.last().unwrap() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn adaptive_run_advances_to_tf() {
        let state = Preset::EccentricBinaryOrbit.build(1e-3).unwrap();
        let sim = Simulator::new(
            IntegratorKind::Ias15,
            AdaptiveParams {
                tolerance: 1e-9,
                expected_time_scale: 1.0,
                min_iteration: 1,
                max_iteration: 5000,
            },
        );
        let cancel = CancelFlag::new();
        let mut progress = NullProgress;
        let outcome = sim.run(state, 2.0, 1, &cancel, &mut progress).unwrap();
        assert!(!outcome.cancelled);
        assert!(*outcome.trajectory.sol_time.last().unwrap() >= 2.0);
    }

    #[test]
    fn cancellation_truncates_the_trajectory() {
        let state = Preset::CircularBinaryOrbit.build(0.01).unwrap();
        let sim = Simulator::new(IntegratorKind::Euler, AdaptiveParams::default());
        let cancel = CancelFlag::new();
        cancel.cancel();
        let mut progress = NullProgress;
        let outcome = sim.run(state, 100.0, 1, &cancel, &mut progress).unwrap();
        assert!(outcome.cancelled);
        assert_eq!(outcome.trajectory.len(), 1);
    }
}
