//! CLI argument surface (component 4.J)
//!
//! A `clap`-derived struct mirroring the simulation-request record of
//! `SPEC_FULL.md` §6: system, integrator, tf, dt, tolerance,
//! store_every_n, and the optional custom-system/output paths. This
//! is the thin non-interactive driver that replaces the distilled
//! source's interactive text menu.

use std::path::PathBuf;

use clap::Parser;

use crate::error::SimError;
use crate::integrators::IntegratorKind;

/// Run a single N-body integration and optionally save the result.
#[derive(Debug, Parser)]
#[command(name = "nbody-sim", version, about)]
pub struct Cli {
    /// Preset system name, or "custom" to load --custom-system.
    #[arg(long)]
    pub system: String,

    /// Path to a custom-system CSV catalog (required when --system=custom).
    #[arg(long)]
    pub custom_system: Option<PathBuf>,

    /// Name of the row to load from --custom-system.
    #[arg(long)]
    pub custom_name: Option<String>,

    /// Integrator to use.
    #[arg(long, value_enum)]
    pub integrator: IntegratorArg,

    /// Stop time, in days.
    #[arg(long)]
    pub tf: f64,

    /// Step size in days (fixed-step integrators only).
    #[arg(long)]
    pub dt: Option<f64>,

    /// Absolute/relative error tolerance (adaptive integrators only).
    #[arg(long)]
    pub tolerance: Option<f64>,

    /// Record every n-th accepted step.
    #[arg(long, default_value_t = 1)]
    pub store_every_n: u64,

    /// Compute energy/angular-momentum diagnostics after the run.
    #[arg(long, default_value_t = false)]
    pub diagnostics: bool,

    /// Write the trajectory to a result file at this path.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

/// CLI-facing mirror of [`IntegratorKind`]; `clap::ValueEnum` needs a
/// type it can derive string parsing for, so this is kept separate
/// from the engine's own enum rather than leaking derive plumbing
/// into `integrators::mod`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum IntegratorArg {
    Euler,
    EulerCromer,
    Rk4,
    Leapfrog,
    Rkf45,
    Dopri,
    Dverk,
    Rkf78,
    Ias15,
}

impl From<IntegratorArg> for IntegratorKind {
    fn from(arg: IntegratorArg) -> Self {
        match arg {
            IntegratorArg::Euler => IntegratorKind::Euler,
            IntegratorArg::EulerCromer => IntegratorKind::EulerCromer,
            IntegratorArg::Rk4 => IntegratorKind::Rk4,
            IntegratorArg::Leapfrog => IntegratorKind::Leapfrog,
            IntegratorArg::Rkf45 => IntegratorKind::Rkf45,
            IntegratorArg::Dopri => IntegratorKind::Dopri54,
            IntegratorArg::Dverk => IntegratorKind::Dverk65,
            IntegratorArg::Rkf78 => IntegratorKind::Rkf78,
            IntegratorArg::Ias15 => IntegratorKind::Ias15,
        }
    }
}

impl Cli {
    /// Validate the request record before any integration begins
    /// (§7 InvalidInput: no partial state on a rejected request).
    pub fn validate(&self) -> Result<(), SimError> {
        let kind: IntegratorKind = self.integrator.into();
        if self.tf < 0.0 {
            return Err(SimError::InvalidInput(format!("tf must be >= 0, got {}", self.tf)));
        }
        if self.store_every_n < 1 {
            return Err(SimError::InvalidInput("store_every_n must be >= 1".into()));
        }
        if kind.is_adaptive() {
            match self.tolerance {
                Some(tol) if tol > 0.0 => {}
                _ => return Err(SimError::InvalidInput("tolerance must be > 0 for adaptive integrators".into())),
            }
        } else {
            match self.dt {
                Some(dt) if dt > 0.0 => {}
                _ => return Err(SimError::InvalidInput("dt must be > 0 for fixed-step integrators".into())),
            }
        }
        if self.system == "custom" && self.custom_system.is_none() {
            return Err(SimError::InvalidInput("--custom-system is required when --system=custom".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_cli() -> Cli {
        Cli {
            system: "circular_binary_orbit".into(),
            custom_system: None,
            custom_name: None,
            integrator: IntegratorArg::Ias15,
            tf: 50.0,
            dt: None,
            tolerance: Some(1e-9),
            store_every_n: 1,
            diagnostics: true,
            output: None,
        }
    }

    #[test]
    fn adaptive_request_without_tolerance_is_rejected() {
        let mut cli = base_cli();
        cli.tolerance = None;
        assert!(cli.validate().is_err());
    }

    #[test]
    fn fixed_step_request_without_dt_is_rejected() {
        let mut cli = base_cli();
        cli.integrator = IntegratorArg::Leapfrog;
        cli.tolerance = None;
        assert!(cli.validate().is_err());
    }

    #[test]
    fn custom_system_without_path_is_rejected() {
        let mut cli = base_cli();
        cli.system = "custom".into();
        assert!(cli.validate().is_err());
    }

    #[test]
    fn valid_adaptive_request_passes() {
        assert!(base_cli().validate().is_ok());
    }

    #[test]
    fn negative_tf_is_rejected() {
        let mut cli = base_cli();
        cli.tf = -1.0;
        assert!(cli.validate().is_err());
    }
}
