//! State container for N-body simulation (component 4.B)
//!
//! Owns the current (t, x, v, dt), the immutable mass vector, and
//! nothing else — mutation only happens through an accepted
//! integrator step. Positions and velocities are stored as parallel
//! `Vec<[f64; 3]>` rather than an array of per-body structs, so the
//! acceleration kernel and the integrators can walk them as flat,
//! contiguous slices.

use crate::error::SimError;
use crate::vector::Vec3;

/// Mutable simulation state: time, step, and the body arrays.
#[derive(Debug, Clone)]
pub struct State {
    /// Current simulation time (days).
    pub t: f64,
    /// Current step size (days). Meaningful for adaptive integrators;
    /// fixed-step integrators still record it for the trajectory buffer.
    pub dt: f64,
    /// Positions, one 3-vector per body (AU).
    pub x: Vec<Vec3>,
    /// Velocities, one 3-vector per body (AU/day).
    pub v: Vec<Vec3>,
    /// Masses, one scalar per body (solar masses). Immutable after
    /// construction.
    pub m: Vec<f64>,
}

impl State {
    /// Build a new state, validating the invariants from the data model:
    /// equal-length arrays and strictly positive masses.
    pub fn new(m: Vec<f64>, x: Vec<Vec3>, v: Vec<Vec3>, dt: f64) -> Result<Self, SimError> {
        let n = m.len();
        if n == 0 {
            return Err(SimError::InvalidInput("N must be >= 1".into()));
        }
        if x.len() != n || v.len() != n {
            return Err(SimError::InvalidInput(format!(
                "mismatched array lengths: m={}, x={}, v={}",
                n,
                x.len(),
                v.len()
            )));
        }
        if let Some(bad) = m.iter().position(|&mi| !(mi > 0.0)) {
            return Err(SimError::InvalidInput(format!(
                "mass of body {bad} must be positive, got {}",
                m[bad]
            )));
        }
        if dt <= 0.0 {
            return Err(SimError::InvalidInput(format!("dt must be positive, got {dt}")));
        }
        Ok(State { t: 0.0, dt, x, v, m })
    }

    pub fn n(&self) -> usize {
        self.m.len()
    }

    /// Flatten into the trajectory sample layout: [x1..xn, v1..vn], length 6N.
    pub fn flatten(&self) -> Vec<f64> {
        let n = self.n();
        let mut out = Vec::with_capacity(6 * n);
        for p in &self.x {
            out.extend_from_slice(p);
        }
        for v in &self.v {
            out.extend_from_slice(v);
        }
        out
    }

    /// Subtract the mass-weighted barycenter from position and velocity
    /// so that `sum(m*x) = 0` and `sum(m*v) = 0` (data model invariant 6).
    pub fn recenter_barycenter(&mut self) {
        let total_mass: f64 = self.m.iter().sum();
        let mut r_cm = [0.0; 3];
        let mut v_cm = [0.0; 3];
        for i in 0..self.n() {
            for k in 0..3 {
                r_cm[k] += self.m[i] * self.x[i][k];
                v_cm[k] += self.m[i] * self.v[i][k];
            }
        }
        for k in 0..3 {
            r_cm[k] /= total_mass;
            v_cm[k] /= total_mass;
        }
        for i in 0..self.n() {
            for k in 0..3 {
                self.x[i][k] -= r_cm[k];
                self.v[i][k] -= v_cm[k];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_mass() {
        let err = State::new(vec![1.0, -1.0], vec![[0.0; 3]; 2], vec![[0.0; 3]; 2], 1.0);
        assert!(matches!(err, Err(SimError::InvalidInput(_))));
    }

    #[test]
    fn rejects_mismatched_lengths() {
        let err = State::new(vec![1.0, 1.0], vec![[0.0; 3]; 1], vec![[0.0; 3]; 2], 1.0);
        assert!(matches!(err, Err(SimError::InvalidInput(_))));
    }

    #[test]
    fn flatten_packs_positions_then_velocities() {
        let s = State::new(
            vec![1.0, 1.0],
            vec![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]],
            vec![[7.0, 8.0, 9.0], [10.0, 11.0, 12.0]],
            1.0,
        )
        .unwrap();
        assert_eq!(
            s.flatten(),
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0]
        );
    }

    #[test]
    fn recenter_zeroes_barycenter() {
        let mut s = State::new(
            vec![1.0, 1.0],
            vec![[0.0, 0.0, 0.0], [10.0, 0.0, 0.0]],
            vec![[0.0, 0.0, 0.0], [0.0, 2.0, 0.0]],
            1.0,
        )
        .unwrap();
        s.recenter_barycenter();
        let mut r_cm = [0.0; 3];
        let mut v_cm = [0.0; 3];
        for i in 0..2 {
            for k in 0..3 {
                r_cm[k] += s.m[i] * s.x[i][k];
                v_cm[k] += s.m[i] * s.v[i][k];
            }
        }
        for k in 0..3 {
            assert!(r_cm[k].abs() < 1e-12);
            assert!(v_cm[k].abs() < 1e-12);
        }
    }
}
