//! Embedded Runge-Kutta integrator with adaptive step control (component 4.D)
//!
//! One driver parameterized by a [`Tableau`]; implements the initial
//! step estimator and the bounded inner step loop shared by all four
//! supported pairs (RKF4(5), DOPRI5(4), DVERK 6(5), RKF7(8)).

use crate::acceleration::{acceleration, all_finite};
use crate::body::State;
use crate::error::SimError;
use crate::integrators::tableau::{EmbeddedKind, Tableau};
use crate::vector::{self, Vec3};

/// Step-size safety bounds, shared across tableaus (source-verbatim;
/// see `SPEC_FULL.md` §9 on the 0.38 constant).
const SAFETY_FAC_MAX: f64 = 6.0;
const SAFETY_FAC_MIN: f64 = 0.33;

pub struct EmbeddedRk {
    kind: EmbeddedKind,
    step_count: u64,
}

impl EmbeddedRk {
    pub fn new(kind: EmbeddedKind) -> Self {
        EmbeddedRk { kind, step_count: 0 }
    }

    fn tableau(&self) -> &'static Tableau {
        self.kind.tableau()
    }

    /// Hairer-Norsett-Wanner style initial step estimate, with the
    /// source's documented empirical `1e-3` shrink applied at the end.
    pub fn initial_step_size(&self, x: &[Vec3], v: &[Vec3], m: &[f64], g: f64, tolerance: f64) -> f64 {
        let power = self.tableau().power;
        let n = x.len();
        let a = acceleration(x, m, g);
        let six_n = (6 * n) as f64;

        let scale_x = |i: usize, k: usize| tolerance + tolerance * x[i][k].abs();
        let scale_v = |i: usize, k: usize| tolerance + tolerance * v[i][k].abs();

        let mut sum0 = 0.0;
        let mut sum1 = 0.0;
        for i in 0..n {
            for k in 0..3 {
                let sx = scale_x(i, k);
                let sv = scale_v(i, k);
                sum0 += (x[i][k] / sx).powi(2) + (v[i][k] / sv).powi(2);
                sum1 += (v[i][k] / sx).powi(2) + (a[i][k] / sv).powi(2);
            }
        }
        let d0 = (sum0 / six_n).sqrt();
        let d1 = (sum1 / six_n).sqrt();

        let dt0 = if d0 < 1e-5 || d1 < 1e-5 { 1e-4 } else { d0 / d1 };

        let x1: Vec<Vec3> = (0..n)
            .map(|i| vector::add(x[i], vector::scale(v[i], dt0 / 100.0)))
            .collect();
        let v1: Vec<Vec3> = (0..n)
            .map(|i| vector::add(v[i], vector::scale(a[i], dt0 / 100.0)))
            .collect();
        let a1 = acceleration(&x1, m, g);

        let mut sum2 = 0.0;
        for i in 0..n {
            for k in 0..3 {
                let sx = scale_x(i, k);
                let sv = scale_v(i, k);
                sum2 += ((v1[i][k] - v[i][k]) / sx).powi(2) + ((a1[i][k] - a[i][k]) / sv).powi(2);
            }
        }
        let d2 = (sum2 / six_n).sqrt() / dt0;

        let d1_d2_max = d1.max(d2);
        let dt1 = if d1_d2_max <= 1e-15 {
            (1e-6_f64).max(dt0 * 1e-3)
        } else {
            (0.01 / d1_d2_max).powf(1.0 / (1.0 + power as f64))
        };

        let dt = (100.0 * dt0).min(dt1);
        dt * 1e-3
    }

    /// Run the bounded inner loop: repeated accept/reject attempts
    /// until `min_iteration` attempts have elapsed AND `t` has advanced
    /// by at least `expected_time_scale * 1e-5`, or `max_iteration` is
    /// reached. Mutates `state.t`, `state.x`, `state.v`, `state.dt` in
    /// place.
    pub fn step_loop(
        &mut self,
        state: &mut State,
        m: &[f64],
        g: f64,
        tolerance: f64,
        expected_time_scale: f64,
        min_iteration: u32,
        max_iteration: u32,
    ) -> Result<(), SimError> {
        let tab = self.tableau();
        let n = state.n();
        let stages = tab.stages;
        let power_min = tab.power.min(tab.power_hat) as f64;
        let safety_fac = 0.38_f64.powf(1.0 / (1.0 + power_min));
        let floor = expected_time_scale * 1e-12;

        let t_start = state.t;
        let mut actual_dt = state.dt;

        for attempt in 0..max_iteration {
            let mut xk: Vec<Vec<Vec3>> = vec![vec![vector::ZERO; n]; stages];
            let mut vk: Vec<Vec<Vec3>> = vec![vec![vector::ZERO; n]; stages];

            vk[0] = acceleration(&state.x, m, g);
            if !all_finite(&vk[0]) {
                return Err(SimError::NonFinite {
                    field: "acceleration",
                    step: self.step_count,
                });
            }
            xk[0] = state.v.clone();
            for stage in 1..stages {
                let mut temp_v = vec![vector::ZERO; n];
                let mut temp_x = vec![vector::ZERO; n];
                for j in 0..stage {
                    let c = tab.c[stage - 1][j];
                    for i in 0..n {
                        temp_v[i] = vector::add(temp_v[i], vector::scale(vk[j][i], c));
                        temp_x[i] = vector::add(temp_x[i], vector::scale(xk[j][i], c));
                    }
                }
                let x_stage: Vec<Vec3> = (0..n)
                    .map(|i| vector::add(state.x[i], vector::scale(temp_x[i], actual_dt)))
                    .collect();
                vk[stage] = acceleration(&x_stage, m, g);
                if !all_finite(&vk[stage]) {
                    return Err(SimError::NonFinite {
                        field: "acceleration",
                        step: self.step_count,
                    });
                }
                xk[stage] = (0..n)
                    .map(|i| vector::add(state.v[i], vector::scale(temp_v[i], actual_dt)))
                    .collect();
            }

            let mut temp_v = vec![vector::ZERO; n];
            let mut temp_x = vec![vector::ZERO; n];
            let mut delta_v = vec![vector::ZERO; n];
            let mut delta_x = vec![vector::ZERO; n];
            for stage in 0..stages {
                let db = tab.b[stage] - tab.b_hat[stage];
                for i in 0..n {
                    temp_v[i] = vector::add(temp_v[i], vector::scale(vk[stage][i], tab.b[stage]));
                    temp_x[i] = vector::add(temp_x[i], vector::scale(xk[stage][i], tab.b[stage]));
                    delta_v[i] = vector::add(delta_v[i], vector::scale(vk[stage][i], db));
                    delta_x[i] = vector::add(delta_x[i], vector::scale(xk[stage][i], db));
                }
            }
            let x1: Vec<Vec3> = (0..n)
                .map(|i| vector::add(state.x[i], vector::scale(temp_x[i], actual_dt)))
                .collect();
            let v1: Vec<Vec3> = (0..n)
                .map(|i| vector::add(state.v[i], vector::scale(temp_v[i], actual_dt)))
                .collect();
            for i in 0..n {
                delta_v[i] = vector::scale(delta_v[i], actual_dt);
                delta_x[i] = vector::scale(delta_x[i], actual_dt);
            }

            let mut sum = 0.0;
            for i in 0..n {
                for k in 0..3 {
                    let sx = tolerance + tolerance * x1[i][k].abs().max(state.x[i][k].abs());
                    let sv = tolerance + tolerance * v1[i][k].abs().max(state.v[i][k].abs());
                    sum += (delta_x[i][k] / sx).powi(2) + (delta_v[i][k] / sv).powi(2);
                }
            }
            let error = (sum / (6 * n) as f64).sqrt();

            if error <= 1.0 || actual_dt <= floor {
                if error > 1.0 {
                    log::warn!(
                        "step floor reached at t={} after {} attempts, force-accepting",
                        state.t,
                        attempt + 1
                    );
                }
                state.t += actual_dt;
                state.x = x1;
                state.v = v1;
                self.step_count += 1;
            }

            let dt_new = if error == 0.0 {
                actual_dt
            } else {
                actual_dt * safety_fac / error.powf(1.0 / (1.0 + power_min))
            };

            if dt_new > SAFETY_FAC_MAX * actual_dt {
                actual_dt *= SAFETY_FAC_MAX;
            } else if dt_new < SAFETY_FAC_MIN * actual_dt {
                actual_dt *= SAFETY_FAC_MIN;
            } else {
                actual_dt = dt_new;
            }
            if dt_new / expected_time_scale < 1e-12 {
                actual_dt = floor;
            }

            state.dt = actual_dt;

            if attempt + 1 >= min_iteration && state.t > t_start + expected_time_scale * 1e-5 {
                return Ok(());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::G;

    #[test]
    fn initial_step_is_bounded() {
        let x = vec![[1.0, 0.3, -0.2], [-0.8, 1.1, 0.4], [0.5, -0.9, 0.1]];
        let v = vec![[0.01, -0.02, 0.03], [-0.02, 0.01, 0.0], [0.0, 0.03, -0.01]];
        let m = vec![1.0, 0.5, 0.8];
        for kind in [
            EmbeddedKind::Rkf45,
            EmbeddedKind::Dopri54,
            EmbeddedKind::Dverk65,
            EmbeddedKind::Rkf78,
        ] {
            let integrator = EmbeddedRk::new(kind);
            let dt = integrator.initial_step_size(&x, &v, &m, 1.0, 1e-9);
            assert!(dt >= 1e-12 && dt <= 1.0, "dt={dt} out of bounds for {kind:?}");
        }
    }

    #[test]
    fn step_loop_advances_time_and_keeps_dt_positive() {
        let mut state = State::new(
            vec![1.0 / G, 0.8 / G],
            vec![[1.0, 0.0, 0.0], [-1.25, 0.0, 0.0]],
            vec![[0.0, 0.5, 0.0], [0.0, -0.625, 0.0]],
            1e-3,
        )
        .unwrap();
        let mut integrator = EmbeddedRk::new(EmbeddedKind::Rkf45);
        let t0 = state.t;
        integrator
            .step_loop(&mut state, &state.m.clone(), G, 1e-9, 1.0, 2, 1000)
            .unwrap();
        assert!(state.t > t0);
        assert!(state.dt > 0.0);
    }

    #[test]
    fn coincident_bodies_surface_non_finite_error() {
        let mut state = State::new(
            vec![1.0, 1.0],
            vec![[1.0, 1.0, 1.0], [1.0, 1.0, 1.0]],
            vec![[0.0, 0.0, 0.0], [0.0, 0.0, 0.0]],
            1e-3,
        )
        .unwrap();
        let mut integrator = EmbeddedRk::new(EmbeddedKind::Rkf45);
        let err = integrator.step_loop(&mut state, &state.m.clone(), G, 1e-9, 1.0, 1, 10);
        assert!(matches!(err, Err(SimError::NonFinite { .. })));
    }
}
