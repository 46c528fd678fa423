//! Non-interactive CLI driver (component 4.J)
//!
//! Parses a simulation-request record from the command line, builds
//! the initial state from the preset catalog or a custom-system CSV,
//! runs the selected integrator to `tf`, optionally computes
//! diagnostics, and optionally writes a result file. This replaces
//! the distilled source's interactive text menu, which is out of
//! scope for this crate.

use std::fs::File;
use std::io::BufReader;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use nbody_sim::catalog::{self, Preset};
use nbody_sim::config::Cli;
use nbody_sim::error::SimError;
use nbody_sim::integrators::{AdaptiveParams, IntegratorKind};
use nbody_sim::progress::LoggingProgress;
use nbody_sim::result_file::{self, CustomSystem, ResultData, ResultMetadata};
use nbody_sim::simulator::{self, CancelFlag, RunOutcome, Simulator};
use nbody_sim::State;

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn load_custom_system(path: &std::path::Path, name: Option<&str>) -> Result<CustomSystem, SimError> {
    let reader = BufReader::new(File::open(path).map_err(SimError::IoFailure)?);
    let systems = result_file::read_custom_catalog(reader)?;
    match name {
        Some(n) => systems
            .into_iter()
            .find(|s| s.name == n)
            .ok_or_else(|| SimError::InvalidInput(format!("no system named '{n}' in {}", path.display()))),
        None => systems
            .into_iter()
            .next()
            .ok_or_else(|| SimError::InvalidInput(format!("{} contains no systems", path.display()))),
    }
}

fn build_initial_state(cli: &Cli, seed_dt: f64) -> Result<State, SimError> {
    if cli.system == "custom" {
        let path = cli
            .custom_system
            .as_ref()
            .ok_or_else(|| SimError::InvalidInput("--custom-system is required when --system=custom".into()))?;
        let system = load_custom_system(path, cli.custom_name.as_deref())?;
        catalog::custom(system.m, system.x, system.v, seed_dt)
    } else {
        let preset = Preset::from_name(&cli.system)?;
        preset.build(seed_dt)
    }
}

fn run(cli: Cli) -> Result<(), SimError> {
    cli.validate()?;

    let kind: IntegratorKind = cli.integrator.into();
    let seed_dt = cli.dt.unwrap_or(1.0);
    let state = build_initial_state(&cli, seed_dt)?;
    let n = state.n();

    let params = AdaptiveParams {
        tolerance: cli.tolerance.unwrap_or(1e-9),
        expected_time_scale: 1.0,
        min_iteration: 1,
        max_iteration: 10_000,
    };
    let sim = Simulator::new(kind, params);
    let cancel = CancelFlag::new();
    let mut progress = LoggingProgress::new(1000);

    let start = Instant::now();
    let outcome: RunOutcome = sim.run(state, cli.tf, cli.store_every_n, &cancel, &mut progress)?;
    let elapsed = start.elapsed().as_secs_f64();

    println!(
        "recorded {} samples, final t = {}",
        outcome.trajectory.len(),
        outcome.trajectory.sol_time.last().copied().unwrap_or(0.0)
    );

    let energy = if cli.diagnostics || cli.output.is_some() {
        let mut diag_progress = LoggingProgress::new(1000);
        let (energy, angular) = simulator::diagnostics_for(&outcome, &mut diag_progress)?;
        if cli.diagnostics {
            let e0 = energy.first().copied().unwrap_or(f64::NAN);
            let e_final = energy.last().copied().unwrap_or(f64::NAN);
            println!("E0 = {e0:e}, E_final = {e_final:e}, relative error = {:e}", ((e_final - e0) / e0).abs());
            println!("L_final = {:e}", angular.last().copied().unwrap_or(f64::NAN));
        }
        energy
    } else {
        vec![0.0; outcome.trajectory.len()]
    };

    if let Some(output_path) = &cli.output {
        let meta = ResultMetadata {
            save_date: "unspecified".into(),
            system_name: cli.system.clone(),
            integrator: format!("{kind:?}"),
            n,
            tf_days: cli.tf,
            dt: seed_dt,
            tolerance: cli.tolerance.unwrap_or(0.0),
            data_size: outcome.trajectory.len(),
            store_every_n: cli.store_every_n,
            run_time_seconds: elapsed,
            masses: outcome.m.clone(),
        };
        let data = ResultData {
            t: outcome.trajectory.sol_time.clone(),
            dt: outcome.trajectory.sol_dt.clone(),
            energy,
            state: outcome.trajectory.sol_state.clone(),
        };
        let file = File::create(output_path).map_err(SimError::IoFailure)?;
        result_file::write_result_file(file, &meta, &data)?;
        log::info!("wrote result file to {}", output_path.display());
    }

    Ok(())
}
