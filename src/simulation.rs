//! The simulation owner and driver loop.
//!
//! A [`Simulation`] value owns everything one rank needs for a run: the two
//! ping-pong state buffers, the flux and tendency scratch arrays, the
//! hydrostatic profiles, the local grid slice, and its endpoint in the rank
//! ring. All arrays are allocated here once and reused for the whole run.
//!
//! [`run_ensemble`] runs a full ring of ranks on scoped threads, which is
//! how multi-rank runs are launched both from the driver binary and from
//! tests; a single-rank run is just `run_ensemble(.., 1, ..)` or a
//! `Simulation` built over [`RingComm::single`].

use std::thread;
use std::time::Instant;

use crate::comm::RingComm;
use crate::config::ModelConfig;
use crate::diagnostics::{reduce_totals, ConservationTracker, Totals};
use crate::error::{ConfigError, ModelError};
use crate::grid::Grid;
use crate::halo::HaloExchange;
use crate::init::{hydro_profiles, initial_state};
use crate::io::{local_snapshot, NullSink, OutputSink, Snapshot};
use crate::state::{FluxField, HydroProfiles, StateField, TendField};

/// One rank's complete simulation state.
pub struct Simulation {
    pub(crate) config: ModelConfig,
    pub(crate) grid: Grid,
    pub(crate) comm: RingComm,
    pub(crate) profiles: HydroProfiles,
    pub(crate) primary: StateField,
    pub(crate) scratch: StateField,
    pub(crate) flux: FluxField,
    pub(crate) tend: TendField,
    pub(crate) halo: HaloExchange,
    pub(crate) dt: f64,
    pub(crate) etime: f64,
    pub(crate) output_counter: f64,
    pub(crate) num_out: usize,
    pub(crate) direction_switch: bool,
}

/// End-of-run report from the main rank.
#[derive(Clone, Copy, Debug)]
pub struct RunSummary {
    /// Domain totals before the first step.
    pub initial: Totals,
    /// Domain totals after the last step.
    pub final_totals: Totals,
    /// Relative mass drift over the run.
    pub d_mass: f64,
    /// Relative total-energy drift over the run.
    pub d_te: f64,
    /// Number of time steps taken.
    pub steps: usize,
    /// Wall-clock seconds spent in the time loop.
    pub wall_seconds: f64,
}

impl Simulation {
    /// Validate the configuration, decompose the grid, and build the
    /// initial cell-averaged state for this rank.
    ///
    /// All ranks synchronize before returning, so a rank can only start
    /// stepping once every other rank has finished initializing.
    pub fn new(config: ModelConfig, comm: RingComm) -> Result<Self, ModelError> {
        config.validate()?;
        let grid = Grid::decompose(&config, comm.rank(), comm.nranks())?;
        let profiles = hydro_profiles(config.scenario, &grid);
        let primary = initial_state(config.scenario, &grid);
        let scratch = primary.clone();
        let flux = FluxField::new(grid.nx, grid.nz);
        let tend = TendField::new(grid.nx, grid.nz);
        let halo = HaloExchange::new(grid.nz);
        let dt = config.dt();

        if comm.is_main() && config.verbose {
            println!("nx_glob, nz_glob: {} {}", config.nx_glob, config.nz_glob);
            println!("dx,dz: {:.6} {:.6}", grid.dx, grid.dz);
            println!("dt: {:.6}", dt);
        }
        comm.barrier();

        Ok(Self {
            config,
            grid,
            comm,
            profiles,
            primary,
            scratch,
            flux,
            tend,
            halo,
            dt,
            etime: 0.0,
            output_counter: 0.0,
            num_out: 0,
            direction_switch: true,
        })
    }

    /// The run configuration.
    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// This rank's grid slice.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// This rank's ring endpoint.
    pub fn comm(&self) -> &RingComm {
        &self.comm
    }

    /// The authoritative (primary) state buffer.
    pub fn state(&self) -> &StateField {
        &self.primary
    }

    /// The fixed CFL time step.
    pub fn dt(&self) -> f64 {
        self.dt
    }

    /// Elapsed model time.
    pub fn etime(&self) -> f64 {
        self.etime
    }

    /// Number of output events emitted so far.
    pub fn outputs_emitted(&self) -> usize {
        self.num_out
    }

    /// Domain-global mass and total energy; synchronizes all ranks.
    pub fn totals(&self) -> Totals {
        reduce_totals(&self.primary, &self.profiles, &self.grid, &self.comm)
    }

    /// This rank's diagnostic fields at cell centers.
    pub fn snapshot(&self) -> Snapshot {
        local_snapshot(&self.primary, &self.profiles, &self.grid, self.etime)
    }

    /// Assemble the global snapshot across all ranks.
    ///
    /// Every rank must call this together; only the main rank receives the
    /// assembled fields.
    pub fn gather_snapshot(&self) -> Option<Snapshot> {
        let local = self.snapshot();
        let (nx_glob, nz_glob) = (self.grid.nx_glob, self.grid.nz_glob);
        let plane = nx_glob * nz_glob;

        // Each rank contributes its block at its global offset; the SUM
        // all-reduce assembles the full fields since blocks are disjoint.
        let mut buf = vec![0.0; 4 * plane];
        for k in 0..self.grid.nz {
            for i in 0..self.grid.nx {
                let l = k * self.grid.nx + i;
                let g = k * nx_glob + self.grid.i_beg + i;
                buf[g] = local.dens[l];
                buf[plane + g] = local.uwnd[l];
                buf[2 * plane + g] = local.wwnd[l];
                buf[3 * plane + g] = local.theta[l];
            }
        }
        let global = self.comm.allreduce_sum(&buf);

        if self.comm.is_main() {
            Some(Snapshot {
                etime: self.etime,
                nx: nx_glob,
                nz: nz_glob,
                dens: global[..plane].to_vec(),
                uwnd: global[plane..2 * plane].to_vec(),
                wwnd: global[2 * plane..3 * plane].to_vec(),
                theta: global[3 * plane..].to_vec(),
            })
        } else {
            None
        }
    }

    /// Emit one output event: gather, hand the main rank's sink the global
    /// snapshot, and agree across ranks on whether it succeeded.
    fn emit_output(&mut self, sink: &mut dyn OutputSink) -> Result<(), ModelError> {
        if self.comm.is_main() && self.config.verbose {
            println!("*** OUTPUT ***");
        }
        let failure = match self.gather_snapshot() {
            Some(snapshot) => sink.write(&snapshot).err(),
            None => None,
        };
        let failed = self
            .comm
            .allreduce_sum_scalar(if failure.is_some() { 1.0 } else { 0.0 });
        self.num_out += 1;
        if let Some(err) = failure {
            return Err(ModelError::Output(err));
        }
        if failed > 0.0 {
            return Err(ModelError::Aborted(
                "output writer failed on the main rank".to_string(),
            ));
        }
        Ok(())
    }

    /// Run the time loop to `sim_time` and report conservation drift.
    ///
    /// The step size is fixed at the CFL value except for the final step,
    /// which is clamped so the loop lands on `sim_time` exactly. Output
    /// events fire every `output_freq` model seconds when enabled, starting
    /// with the initial state.
    pub fn run(&mut self, sink: &mut dyn OutputSink) -> Result<RunSummary, ModelError> {
        let verbose = self.config.verbose && self.comm.is_main();
        let mut tracker = ConservationTracker::new(self.totals());

        if self.config.output_enabled() {
            self.emit_output(sink)?;
        }

        let start = Instant::now();
        let mut steps = 0usize;
        while self.etime < self.config.sim_time {
            let mut dt = self.dt;
            if self.etime + dt > self.config.sim_time {
                dt = self.config.sim_time - self.etime;
            }
            self.step(dt)?;
            if verbose {
                println!("Elapsed Time: {:.6} / {:.6}", self.etime, self.config.sim_time);
            }
            self.etime += dt;
            self.output_counter += dt;
            steps += 1;
            if self.config.output_enabled() && self.output_counter >= self.config.output_freq {
                self.output_counter -= self.config.output_freq;
                self.emit_output(sink)?;
            }
        }
        let wall_seconds = start.elapsed().as_secs_f64();

        if verbose {
            println!("CPU Time: {:.6} sec", wall_seconds);
        }
        tracker.update(self.totals());
        if verbose {
            println!("d_mass: {:e}", tracker.d_mass());
            println!("d_te:   {:e}", tracker.d_te());
        }

        Ok(RunSummary {
            initial: tracker.initial(),
            final_totals: tracker.current(),
            d_mass: tracker.d_mass(),
            d_te: tracker.d_te(),
            steps,
            wall_seconds,
        })
    }
}

/// Run a complete ring of `nranks` ranks on scoped threads.
///
/// The sink receives the globally assembled snapshots on the main rank's
/// thread; the other ranks discard theirs. Returns the main rank's summary,
/// or the first error any rank reported.
pub fn run_ensemble<S>(
    config: &ModelConfig,
    nranks: usize,
    sink: S,
) -> Result<RunSummary, ModelError>
where
    S: OutputSink + Send,
{
    if nranks == 0 || nranks > config.nx_glob {
        return Err(ConfigError::RankLayout {
            nx_glob: config.nx_glob,
            nranks,
        }
        .into());
    }
    let comms = RingComm::ring(nranks);
    let mut sink = Some(sink);

    thread::scope(|scope| {
        let mut handles = Vec::with_capacity(nranks);
        for comm in comms {
            let config = config.clone();
            let main_sink = if comm.is_main() { sink.take() } else { None };
            handles.push(scope.spawn(move || -> Result<Option<RunSummary>, ModelError> {
                let mut sim = Simulation::new(config, comm)?;
                match main_sink {
                    Some(mut sink) => Ok(Some(sim.run(&mut sink)?)),
                    None => {
                        let mut sink = NullSink;
                        sim.run(&mut sink)?;
                        Ok(None)
                    }
                }
            }));
        }

        let mut summary = None;
        let mut first_err = None;
        for handle in handles {
            match handle.join() {
                Ok(Ok(Some(s))) => summary = Some(s),
                Ok(Ok(None)) => {}
                Ok(Err(e)) => {
                    if first_err.is_none() {
                        first_err = Some(e);
                    }
                }
                Err(_) => {
                    if first_err.is_none() {
                        first_err = Some(ModelError::Aborted("a rank panicked".to_string()));
                    }
                }
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => summary
                .ok_or_else(|| ModelError::Aborted("main rank produced no summary".to_string())),
        }
    })
}
