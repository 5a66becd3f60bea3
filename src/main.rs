//! Driver binary for the stratified-flow solver.
//!
//! Parses the run parameters, launches a ring of ranks, and reports the
//! conservation deltas on completion. Snapshot output goes to a NetCDF file
//! when enabled with `--output-freq` (requires the `netcdf` build feature).

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;

use stratus_rs::{run_ensemble, ModelConfig, NetcdfWriter, Scenario};

/// Dry, stratified, compressible, non-hydrostatic flow on a 2D (x, z) grid.
#[derive(Parser)]
#[command(name = "stratus", version, about)]
struct Args {
    /// Total cells in the x-direction (best kept at twice --nz)
    #[arg(long = "nx", default_value_t = 400)]
    nx_glob: usize,

    /// Total cells in the z-direction
    #[arg(long = "nz", default_value_t = 200)]
    nz_glob: usize,

    /// Seconds of model time to simulate
    #[arg(long, default_value_t = 10.0)]
    sim_time: f64,

    /// Output interval in model seconds; negative disables output
    #[arg(long, default_value_t = -1.0, allow_negative_numbers = true)]
    output_freq: f64,

    /// Scenario id: 1=collision, 2=thermal, 3=gravity_waves,
    /// 5=density_current, 6=injection
    #[arg(long, default_value_t = 2)]
    data_spec: i64,

    /// Number of ranks in the x-direction ring
    #[arg(long, default_value_t = 1)]
    ranks: usize,

    /// Snapshot file path
    #[arg(long, default_value = "output.nc")]
    output: PathBuf,

    /// Suppress per-step progress lines
    #[arg(long)]
    quiet: bool,
}

fn run(args: Args) -> anyhow::Result<()> {
    let scenario = Scenario::from_data_spec(args.data_spec)?;
    let config = ModelConfig::new(args.nx_glob, args.nz_glob, args.sim_time, scenario)
        .with_output_freq(args.output_freq)
        .with_verbose(!args.quiet);
    config.validate()?;

    let sink = NetcdfWriter::new(&args.output, args.nx_glob, args.nz_glob);
    run_ensemble(&config, args.ranks, sink)
        .with_context(|| format!("{} run failed", scenario.name()))?;
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("stratus: {err:#}");
            ExitCode::FAILURE
        }
    }
}
