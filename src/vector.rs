//! Small 3-vector helpers shared by the acceleration kernel, the
//! integrators, and diagnostics.
//!
//! The engine represents per-body vectors as `[f64; 3]` rather than a
//! dedicated `Vec3` newtype, matching how the state arrays are laid
//! out (contiguous `Vec<[f64; 3]>`); these free functions are the
//! generalized form of [`crate::body`]'s original `distance_to` /
//! `vector_to` methods.

pub type Vec3 = [f64; 3];

pub const ZERO: Vec3 = [0.0, 0.0, 0.0];

pub fn add(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

pub fn sub(a: Vec3, b: Vec3) -> Vec3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub fn scale(a: Vec3, s: f64) -> Vec3 {
    [a[0] * s, a[1] * s, a[2] * s]
}

pub fn dot(a: Vec3, b: Vec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

pub fn cross(a: Vec3, b: Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

pub fn norm(a: Vec3) -> f64 {
    dot(a, a).sqrt()
}

pub fn is_finite(a: Vec3) -> bool {
    a[0].is_finite() && a[1].is_finite() && a[2].is_finite()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cross_product_orthogonal() {
        let x = [1.0, 0.0, 0.0];
        let y = [0.0, 1.0, 0.0];
        assert_eq!(cross(x, y), [0.0, 0.0, 1.0]);
    }

    #[test]
    fn norm_matches_pythagoras() {
        assert!((norm([3.0, 4.0, 0.0]) - 5.0).abs() < 1e-12);
    }
}
