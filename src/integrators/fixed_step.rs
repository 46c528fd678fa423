//! Fixed-step explicit integrators (component 4.C)
//!
//! Euler, Euler-Cromer, RK4, and kick-drift-kick leapfrog, all sharing
//! the same acceleration kernel. Leapfrog caches the end-of-step
//! acceleration so each step after the first needs only one fresh
//! evaluation instead of two.

use crate::acceleration::{acceleration, all_finite};
use crate::body::State;
use crate::error::SimError;
use crate::vector::{self, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixedStepKind {
    Euler,
    EulerCromer,
    Rk4,
    Leapfrog,
}

pub struct FixedStepIntegrator {
    kind: FixedStepKind,
    cached_accel: Option<Vec<Vec3>>,
    step_count: u64,
}

impl FixedStepIntegrator {
    pub fn new(kind: FixedStepKind) -> Self {
        FixedStepIntegrator {
            kind,
            cached_accel: None,
            step_count: 0,
        }
    }

    fn check(&self, a: &[Vec3]) -> Result<(), SimError> {
        if !all_finite(a) {
            return Err(SimError::NonFinite {
                field: "acceleration",
                step: self.step_count,
            });
        }
        Ok(())
    }

    /// Advance `state` by `state.dt` in place.
    pub fn step(&mut self, state: &mut State, m: &[f64], g: f64) -> Result<(), SimError> {
        self.step_into(state, m, g, state.dt)
    }

    /// Advance `state` by an explicit step size `h` (used for the final
    /// short step that lands exactly on `tf`).
    pub fn step_into(
        &mut self,
        state: &mut State,
        m: &[f64],
        g: f64,
        h: f64,
    ) -> Result<(), SimError> {
        let n = state.n();
        match self.kind {
            FixedStepKind::Euler => {
                let a = acceleration(&state.x, m, g);
                self.check(&a)?;
                for i in 0..n {
                    state.x[i] = vector::add(state.x[i], vector::scale(state.v[i], h));
                }
                for i in 0..n {
                    state.v[i] = vector::add(state.v[i], vector::scale(a[i], h));
                }
            }
            FixedStepKind::EulerCromer => {
                let a = acceleration(&state.x, m, g);
                self.check(&a)?;
                for i in 0..n {
                    state.v[i] = vector::add(state.v[i], vector::scale(a[i], h));
                }
                for i in 0..n {
                    state.x[i] = vector::add(state.x[i], vector::scale(state.v[i], h));
                }
            }
            FixedStepKind::Rk4 => {
                let k1v = acceleration(&state.x, m, g);
                self.check(&k1v)?;
                let k1x = state.v.clone();

                let x2: Vec<Vec3> = (0..n)
                    .map(|i| vector::add(state.x[i], vector::scale(k1x[i], h / 2.0)))
                    .collect();
                let k2v = acceleration(&x2, m, g);
                self.check(&k2v)?;
                let k2x: Vec<Vec3> = (0..n)
                    .map(|i| vector::add(state.v[i], vector::scale(k1v[i], h / 2.0)))
                    .collect();

                let x3: Vec<Vec3> = (0..n)
                    .map(|i| vector::add(state.x[i], vector::scale(k2x[i], h / 2.0)))
                    .collect();
                let k3v = acceleration(&x3, m, g);
                self.check(&k3v)?;
                let k3x: Vec<Vec3> = (0..n)
                    .map(|i| vector::add(state.v[i], vector::scale(k2v[i], h / 2.0)))
                    .collect();

                let x4: Vec<Vec3> = (0..n)
                    .map(|i| vector::add(state.x[i], vector::scale(k3x[i], h)))
                    .collect();
                let k4v = acceleration(&x4, m, g);
                self.check(&k4v)?;
                let k4x: Vec<Vec3> = (0..n)
                    .map(|i| vector::add(state.v[i], vector::scale(k3v[i], h)))
                    .collect();

                for i in 0..n {
                    let dx = vector::scale(
                        vector::add(
                            vector::add(k1x[i], vector::scale(k2x[i], 2.0)),
                            vector::add(vector::scale(k3x[i], 2.0), k4x[i]),
                        ),
                        h / 6.0,
                    );
                    let dv = vector::scale(
                        vector::add(
                            vector::add(k1v[i], vector::scale(k2v[i], 2.0)),
                            vector::add(vector::scale(k3v[i], 2.0), k4v[i]),
                        ),
                        h / 6.0,
                    );
                    state.x[i] = vector::add(state.x[i], dx);
                    state.v[i] = vector::add(state.v[i], dv);
                }
            }
            FixedStepKind::Leapfrog => {
                let a0 = match self.cached_accel.take() {
                    Some(a) => a,
                    None => acceleration(&state.x, m, g),
                };
                self.check(&a0)?;
                for i in 0..n {
                    state.v[i] = vector::add(state.v[i], vector::scale(a0[i], h / 2.0));
                }
                for i in 0..n {
                    state.x[i] = vector::add(state.x[i], vector::scale(state.v[i], h));
                }
                let a1 = acceleration(&state.x, m, g);
                self.check(&a1)?;
                for i in 0..n {
                    state.v[i] = vector::add(state.v[i], vector::scale(a1[i], h / 2.0));
                }
                self.cached_accel = Some(a1);
            }
        }
        state.t += h;
        self.step_count += 1;
        Ok(())
    }
}
