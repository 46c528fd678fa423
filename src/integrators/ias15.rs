//! IAS15: 15th-order Gauss-Radau predictor-corrector (component 4.E)
//!
//! Everhart-style implicit Runge-Kutta with 7 unevenly spaced substeps
//! per step, refined by an iterated corrector rather than an embedded
//! pair. Reference: Rein & Spiegel (2015), "IAS15: a fast, adaptive,
//! high-order integrator for gravitational dynamics".
//!
//! Position and time accumulation uses Kahan compensated summation so
//! that long integrations do not accrue rounding drift from millions
//! of small steps.

use crate::acceleration::{acceleration, all_finite};
use crate::body::State;
use crate::error::SimError;
use crate::vector::{self, Vec3};

/// Gauss-Radau substep fractions, `h[0] = 0` through `h[7]`.
const H: [f64; 8] = [
    0.0,
    0.0562625605369221464656522,
    0.1802406917368923649875799,
    0.3526247171131672612346688,
    0.5471536263305553830014486,
    0.7342101772154105315232103,
    0.8853209468390957680903598,
    0.9775206135612875018911745,
];

const CORRECTOR_MAX_ITER: u32 = 12;
const CORRECTOR_TOL: f64 = 1e-16;

/// Step-size clamp bound, `new_dt/dt` confined to `[1/SAFETY_FAC, SAFETY_FAC]`
/// (component 4.E.7; the spec's "typically ~6").
const SAFETY_FAC: f64 = 6.0;

/// Predict position and velocity a fraction `h` of the way through a
/// step of size `dt`, given the step-start state, acceleration, and
/// the monomial-basis coefficients `b[0..7]` of the degree-7
/// acceleration polynomial `a(h) = a0 + b0*h + b1*h^2 + ... + b6*h^7`.
fn predict(x0: &[Vec3], v0: &[Vec3], a0: &[Vec3], b: &[[Vec3; 7]], dt: f64, h: f64) -> (Vec<Vec3>, Vec<Vec3>) {
    let n = x0.len();
    let mut x = vec![vector::ZERO; n];
    let mut v = vec![vector::ZERO; n];
    for i in 0..n {
        for k in 0..3 {
            let mut sx = 0.0;
            let mut sv = 0.0;
            let mut h_pow = h * h * h;
            for term in 0..7 {
                sx += b[i][term][k] * h_pow / ((term + 2) as f64 * (term + 3) as f64);
                sv += b[i][term][k] * h_pow / h / (term + 2) as f64;
                h_pow *= h;
            }
            x[i][k] = x0[i][k] + dt * h * v0[i][k] + dt * dt * h * h / 2.0 * a0[i][k] + dt * dt * sx;
            v[i][k] = v0[i][k] + dt * h * a0[i][k] + dt * sv;
        }
    }
    (x, v)
}

/// Convert Newton divided-difference coefficients `g[0..7]` into the
/// monomial-basis coefficients `b[0..7]` the predictor expects (§4.E.2's
/// r/c/d/s conversion), by expanding the nested Newton form
/// `g0*h + g1*h*(h-h1) + ... + g6*h*(h-h1)*...*(h-h6)` into powers of
/// `h`. A pure function of the fixed substep nodes `H`, so it carries
/// no per-step state.
fn newton_to_monomial(g: &[f64; 7]) -> [f64; 7] {
    // `poly[d]` is the coefficient of `h^d` in the running product
    // `h * (h-h1) * ... * (h-h_{k})`, the factor multiplying `g[k]` in
    // the Newton form (k=0 has no `(h-hi)` factors beyond the leading `h`).
    let mut poly = [0.0; 8];
    poly[1] = 1.0;
    let mut degree = 1;
    let mut b = [0.0; 7];
    for k in 0..7 {
        for d in 1..=degree {
            b[d - 1] += g[k] * poly[d];
        }
        if k < 6 {
            let root = H[k + 1];
            let mut next = [0.0; 8];
            for d in 0..=degree {
                next[d + 1] += poly[d];
                next[d] -= poly[d] * root;
            }
            degree += 1;
            poly = next;
        }
    }
    b
}

/// Apply [`newton_to_monomial`] component-wise across all bodies.
fn g_to_b(g: &[[Vec3; 7]]) -> Vec<[Vec3; 7]> {
    g.iter()
        .map(|gi| {
            let mut bi = [vector::ZERO; 7];
            for k in 0..3 {
                let gk = [gi[0][k], gi[1][k], gi[2][k], gi[3][k], gi[4][k], gi[5][k], gi[6][k]];
                let bk = newton_to_monomial(&gk);
                for term in 0..7 {
                    bi[term][k] = bk[term];
                }
            }
            bi
        })
        .collect()
}

pub struct Ias15 {
    /// Per-body divided-difference coefficients `g[0..7]` from the
    /// previous step, reused as the predictor seed for the next one.
    g: Vec<[Vec3; 7]>,
    /// Running Kahan compensation term for `state.t`, so that millions
    /// of small accepted steps do not accrue rounding drift.
    t_comp: f64,
}

impl Ias15 {
    pub fn new(n: usize) -> Self {
        Ias15 {
            g: vec![[vector::ZERO; 7]; n],
            t_comp: 0.0,
        }
    }

    /// Compensated addition of `dt` onto `state.t`.
    fn advance_time(&mut self, t: f64, dt: f64) -> f64 {
        let y = dt - self.t_comp;
        let t_new = t + y;
        self.t_comp = (t_new - t) - y;
        t_new
    }

    /// Divided differences of the 8 substep accelerations `a[0..=7]`
    /// (index 0 is the step-start acceleration) for a single body's
    /// single component. `g[k] = f[h0, h1, ..., h_{k+1}]`, the Newton
    /// divided difference anchored at the step start and extended
    /// through substep `k+1`.
    fn compute_g_component(&self, a: &[f64; 8]) -> [f64; 7] {
        let mut table = *a;
        let mut g = [0.0; 7];
        for order in 1..8 {
            for i in (order..8).rev() {
                table[i] = (table[i] - table[i - 1]) / (H[i] - H[i - order]);
            }
            g[order - 1] = table[order];
        }
        g
    }

    /// Advance `state` by one adaptive IAS15 step. On return,
    /// `state.dt` holds the step size to try next.
    pub fn step(
        &mut self,
        state: &mut State,
        m: &[f64],
        g_const: f64,
        tolerance: f64,
        expected_time_scale: f64,
    ) -> Result<(), SimError> {
        let n = state.n();
        let dt = state.dt;
        let x0 = state.x.clone();
        let v0 = state.v.clone();
        let a0 = acceleration(&x0, m, g_const);
        if !all_finite(&a0) {
            return Err(SimError::NonFinite {
                field: "acceleration",
                step: 0,
            });
        }

        let mut g: Vec<[Vec3; 7]> = self.g.clone();
        let mut b: Vec<[Vec3; 7]> = g_to_b(&g);
        let mut substep_accel = vec![[vector::ZERO; 8]; n];
        for i in 0..n {
            substep_accel[i][0] = a0[i];
        }

        let mut last_g7_norm = f64::INFINITY;
        for _iter in 0..CORRECTOR_MAX_ITER {
            for node in 1..8 {
                let hn = H[node];
                let (x_pred, _) = predict(&x0, &v0, &a0, &b, dt, hn);
                let a_node = acceleration(&x_pred, m, g_const);
                if !all_finite(&a_node) {
                    return Err(SimError::NonFinite {
                        field: "acceleration",
                        step: node as u64,
                    });
                }
                for i in 0..n {
                    substep_accel[i][node] = a_node[i];
                }
            }

            let mut max_delta: f64 = 0.0;
            let mut new_g = g.clone();
            for i in 0..n {
                for k in 0..3 {
                    let mut a_comp = [0.0; 8];
                    for node in 0..8 {
                        a_comp[node] = substep_accel[i][node][k];
                    }
                    let gk = self.compute_g_component(&a_comp);
                    for term in 0..7 {
                        max_delta = max_delta.max((gk[term] - g[i][term][k]).abs());
                        new_g[i][term][k] = gk[term];
                    }
                }
            }
            g = new_g;
            b = g_to_b(&g);

            // b6 == g6 always: the degree-7 Newton term is the only one
            // that reaches the h^7 monomial coefficient, so the leading
            // divided difference doubles as the leading monomial one.
            let g7_norm: f64 = g.iter().map(|gi| vector::norm(gi[6])).fold(0.0, f64::max);
            if max_delta < CORRECTOR_TOL || (g7_norm - last_g7_norm).abs() < CORRECTOR_TOL {
                last_g7_norm = g7_norm;
                break;
            }
            last_g7_norm = g7_norm;
        }

        let (x1, v1) = predict(&x0, &v0, &a0, &b, dt, 1.0);
        let max_a = a0
            .iter()
            .flat_map(|a| a.iter().copied())
            .fold(0.0_f64, |acc, v| acc.max(v.abs()));

        // err = max|b6| / max|a| (component 4.E.5); the b6 proxy is the
        // converged g6 divided-difference norm.
        let error = last_g7_norm / max_a.max(1e-300);
        let floor = expected_time_scale * 1e-12;

        // Acceptance scales the raw error by (dt / expected_time_scale)^7
        // before comparing to tolerance (4.E.5); the step-size update
        // itself uses the raw (unscaled) error (4.E.7).
        let scaled_error = error * (dt / expected_time_scale).powi(7);
        let accepted = scaled_error <= tolerance || dt <= floor;

        let dt_new = if error > 0.0 {
            dt * (tolerance / error).powf(1.0 / 7.0)
        } else {
            dt * SAFETY_FAC
        };
        // 1/safety_fac <= new_dt/dt <= safety_fac (4.E.7).
        let mut dt_new = dt_new.clamp(dt / SAFETY_FAC, dt * SAFETY_FAC).max(floor);

        if accepted {
            if scaled_error > tolerance {
                log::warn!(
                    "IAS15 step floor reached at t={}, error={error:.3e}, force-accepting",
                    state.t
                );
            }
            state.t = self.advance_time(state.t, dt);
            state.x = x1;
            state.v = v1;
            self.g = g;
        } else {
            // On rejection, discard the b-update and retry with at most
            // half the previous step (4.E.8): the outer driver calls
            // `step` again from the same (t, x, v) with this `dt`.
            dt_new = dt_new.min(dt * 0.5);
            log::debug!("IAS15 step rejected at t={}, error={error:.3e}", state.t);
        }
        state.dt = dt_new;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::G;

    fn two_body() -> State {
        State::new(
            vec![1.0 / G, 1.0 / G],
            vec![[1.0, 0.0, 0.0], [-1.0, 0.0, 0.0]],
            vec![[0.0, 0.5, 0.0], [0.0, -0.5, 0.0]],
            0.05,
        )
        .unwrap()
    }

    #[test]
    fn step_advances_time_and_conserves_energy_roughly() {
        use crate::diagnostics::total_energy;
        let mut state = two_body();
        let m = vec![1.0 / G, 1.0 / G];
        let mut integrator = Ias15::new(state.n());
        let e0 = total_energy(&state.x, &state.v, &m, G).unwrap();
        for _ in 0..200 {
            integrator.step(&mut state, &m, G, 1e-9, 1.0).unwrap();
        }
        let e1 = total_energy(&state.x, &state.v, &m, G).unwrap();
        assert!(state.t > 0.0);
        assert!(((e1 - e0) / e0).abs() < 1e-6);
    }
}
