//! Physical and numerical constants shared across the engine.

/// Gravitational constant, AU^3 * M_sun^-1 * day^-2.
pub const G: f64 = 0.00029591220828411;

/// Julian year expressed in days, for callers that accept a `tf_unit`.
pub const DAYS_PER_YEAR: f64 = 365.25;
