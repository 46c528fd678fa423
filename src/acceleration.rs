//! Pairwise gravitational acceleration kernel (component 4.A)
//!
//! Direct O(N^2) summation exploiting Newton's third law: each
//! unordered pair is visited once, contributing `+f/m_i` to body `i`
//! and `-f/m_j` to body `j`. No softening; a coincident pair produces
//! a non-finite acceleration, which callers must treat as fatal.

use crate::vector::{self, Vec3};

/// Compute `a_i = G * sum_{j != i} m_j (x_j - x_i) / |x_j - x_i|^3`.
pub fn acceleration(x: &[Vec3], m: &[f64], g: f64) -> Vec<Vec3> {
    let n = x.len();
    let mut a = vec![vector::ZERO; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let r_vec = vector::sub(x[j], x[i]);
            let r = vector::norm(r_vec);
            let inv_r3 = 1.0 / (r * r * r);
            let f = vector::scale(r_vec, g * inv_r3);
            a[i] = vector::add(a[i], vector::scale(f, m[j]));
            a[j] = vector::sub(a[j], vector::scale(f, m[i]));
        }
    }
    a
}

/// `true` iff every component of every acceleration is finite.
pub fn all_finite(a: &[Vec3]) -> bool {
    a.iter().all(|v| vector::is_finite(*v))
}

/// Index of the first coincident pair, if any (distance exactly zero).
pub fn find_coincidence(x: &[Vec3]) -> Option<(usize, usize)> {
    let n = x.len();
    for i in 0..n {
        for j in (i + 1)..n {
            if vector::norm(vector::sub(x[j], x[i])) == 0.0 {
                return Some((i, j));
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_body_accelerations_are_antiparallel() {
        let x = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]];
        let m = vec![2.0, 3.0];
        let a = acceleration(&x, &m, 1.0);
        assert!((a[0][0] - 3.0).abs() < 1e-12);
        assert!((a[1][0] + 2.0).abs() < 1e-12);
    }

    #[test]
    fn newtons_third_law_momentum_sum_is_zero() {
        let x = vec![
            [0.0, 0.0, 0.0],
            [1.3, -0.4, 0.2],
            [-0.9, 1.1, 0.5],
            [2.0, 2.0, -1.0],
        ];
        let m = vec![1.0, 2.5, 0.7, 3.3];
        let a = acceleration(&x, &m, 1.0);
        let mut sum = vector::ZERO;
        let mut max_term: f64 = 0.0;
        for i in 0..m.len() {
            let term = vector::scale(a[i], m[i]);
            sum = vector::add(sum, term);
            max_term = max_term.max(vector::norm(term));
        }
        assert!(vector::norm(sum) <= 1e-12 * max_term.max(1.0));
    }

    #[test]
    fn swapping_two_bodies_permutes_accelerations() {
        let x = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 2.0, 0.0]];
        let m = vec![1.0, 2.0, 3.0];
        let a = acceleration(&x, &m, 1.0);

        let x_swapped = vec![x[1], x[0], x[2]];
        let m_swapped = vec![m[1], m[0], m[2]];
        let a_swapped = acceleration(&x_swapped, &m_swapped, 1.0);

        for k in 0..3 {
            assert!((a[0][k] - a_swapped[1][k]).abs() < 1e-12);
            assert!((a[1][k] - a_swapped[0][k]).abs() < 1e-12);
            assert!((a[2][k] - a_swapped[2][k]).abs() < 1e-12);
        }
    }

    #[test]
    fn coincident_bodies_are_detected() {
        let x = vec![[1.0, 1.0, 1.0], [1.0, 1.0, 1.0]];
        assert_eq!(find_coincidence(&x), Some((0, 1)));
    }

    #[test]
    fn coincident_bodies_yield_non_finite_acceleration() {
        let x = vec![[1.0, 1.0, 1.0], [1.0, 1.0, 1.0]];
        let m = vec![1.0, 1.0];
        let a = acceleration(&x, &m, 1.0);
        assert!(!all_finite(&a));
    }
}
