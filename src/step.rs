//! Low-storage three-stage Runge-Kutta with Strang-alternated sweeps.
//!
//! One simulated step applies two dimension sweeps, X then Z or Z then X
//! depending on the alternation flag, toggling the flag afterwards so the
//! splitting is second-order accurate over consecutive steps. Each sweep
//! advances
//!
//! ```text
//! q1 = q + dt/3 * rhs(q)
//! q2 = q + dt/2 * rhs(q1)
//! q  = q + dt/1 * rhs(q2)
//! ```
//!
//! where `rhs` refreshes the swept direction's halos on the forcing buffer
//! and evaluates the directional kernel. Stage outputs ping-pong between the
//! primary and scratch buffers so a stage never reads what it is writing;
//! the final stage of every sweep lands back in the primary buffer.
//!
//! The kernels receive the *sub-stage* dt, which the hyper-viscosity
//! coefficient divides by. Caching that coefficient per step would change
//! the dissipation added by each stage.

use crate::config::Scenario;
#[cfg(not(feature = "parallel"))]
use crate::constants::NUM_VARS;
use crate::constants::{HS, ID_WMOM, XLEN};
use crate::error::ModelError;
use crate::grid::Grid;
use crate::halo::set_halo_z;
use crate::init::sample_ellipse_cosine;
use crate::simulation::Simulation;
use crate::state::{HydroProfiles, StateField, TendField};
#[cfg(not(feature = "parallel"))]
use crate::tendencies::{compute_tendencies_x, compute_tendencies_z};
#[cfg(feature = "parallel")]
use crate::tendencies::{compute_tendencies_x_parallel, compute_tendencies_z_parallel};

/// Which buffer a stage role refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Buf {
    Primary,
    Scratch,
}

/// Sweep direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    X,
    Z,
}

/// Context for per-cell forcing applied during the state update.
struct StageForcing<'a> {
    scenario: Scenario,
    grid: &'a Grid,
    profiles: &'a HydroProfiles,
}

impl Simulation {
    /// Advance the primary state by one full time step.
    ///
    /// A zero dt is a no-op: nothing is computed and the direction
    /// alternation is left untouched.
    pub fn step(&mut self, dt: f64) -> Result<(), ModelError> {
        if dt == 0.0 {
            return Ok(());
        }
        if self.direction_switch {
            self.sweep(Direction::X, dt)?;
            self.sweep(Direction::Z, dt)?;
        } else {
            self.sweep(Direction::Z, dt)?;
            self.sweep(Direction::X, dt)?;
        }
        self.direction_switch = !self.direction_switch;
        Ok(())
    }

    /// One full Runge-Kutta sweep of a single direction.
    fn sweep(&mut self, dir: Direction, dt: f64) -> Result<(), ModelError> {
        self.semi_discrete_step(Buf::Primary, Buf::Primary, Buf::Scratch, dir, dt / 3.0)?;
        self.semi_discrete_step(Buf::Primary, Buf::Scratch, Buf::Scratch, dir, dt / 2.0)?;
        self.semi_discrete_step(Buf::Primary, Buf::Scratch, Buf::Primary, dir, dt / 1.0)?;
        Ok(())
    }

    /// One semi-discrete stage: `out = init + dt * rhs(forcing)`.
    ///
    /// Any aliasing of the three roles onto the two buffers is legal; the
    /// RHS is fully evaluated into the tendency array before the update
    /// loop reads `init`, so `out == init` and `out == forcing` both work.
    pub(crate) fn semi_discrete_step(
        &mut self,
        init: Buf,
        forcing: Buf,
        out: Buf,
        dir: Direction,
        dt: f64,
    ) -> Result<(), ModelError> {
        if dt == 0.0 {
            return Ok(());
        }

        let Simulation {
            config,
            grid,
            comm,
            profiles,
            primary,
            scratch,
            flux,
            tend,
            halo,
            ..
        } = self;

        {
            let forcing_state: &mut StateField = match forcing {
                Buf::Primary => &mut *primary,
                Buf::Scratch => &mut *scratch,
            };
            match dir {
                Direction::X => {
                    halo.exchange_x(forcing_state, comm, profiles, grid, config.scenario)?;
                    #[cfg(feature = "parallel")]
                    compute_tendencies_x_parallel(forcing_state, flux, tend, profiles, grid, dt);
                    #[cfg(not(feature = "parallel"))]
                    compute_tendencies_x(forcing_state, flux, tend, profiles, grid, dt);
                }
                Direction::Z => {
                    set_halo_z(forcing_state, profiles, grid);
                    #[cfg(feature = "parallel")]
                    compute_tendencies_z_parallel(forcing_state, flux, tend, profiles, grid, dt);
                    #[cfg(not(feature = "parallel"))]
                    compute_tendencies_z(forcing_state, flux, tend, profiles, grid, dt);
                }
            }
        }

        let fctx = StageForcing {
            scenario: config.scenario,
            grid,
            profiles,
        };
        match (init == out, out) {
            (true, Buf::Primary) => apply_stage(None, primary, tend, &fctx, dt),
            (true, Buf::Scratch) => apply_stage(None, scratch, tend, &fctx, dt),
            (false, Buf::Primary) => apply_stage(Some(&*scratch), primary, tend, &fctx, dt),
            (false, Buf::Scratch) => apply_stage(Some(&*primary), scratch, tend, &fctx, dt),
        }
        Ok(())
    }
}

/// Tendency for one cell, including the gravity-waves vertical forcing.
#[inline(always)]
fn cell_tendency(tend: &TendField, fctx: &StageForcing, var: usize, k: usize, i: usize) -> f64 {
    let mut value = tend.get(var, k, i);
    if var == ID_WMOM && fctx.scenario == Scenario::GravityWaves {
        let x = fctx.grid.cell_center_x(i + HS);
        let z = fctx.grid.cell_center_z(k + HS);
        let wpert = sample_ellipse_cosine(x, z, 0.01, XLEN / 8.0, 1000.0, 500.0, 500.0);
        value += wpert * fctx.profiles.dens_cell[k + HS];
    }
    value
}

/// Fused state update over the interior; `init == None` updates in place.
fn apply_stage(
    init: Option<&StateField>,
    out: &mut StateField,
    tend: &TendField,
    fctx: &StageForcing,
    dt: f64,
) {
    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;

        let (nx, nz) = (fctx.grid.nx, fctx.grid.nz);
        let row = fctx.grid.padded_nx();
        let col = fctx.grid.padded_nz();
        match init {
            Some(init) => {
                out.data
                    .par_chunks_mut(row)
                    .zip(init.data.par_chunks(row))
                    .enumerate()
                    .for_each(|(idx, (out_row, init_row))| {
                        let var = idx / col;
                        let kp = idx % col;
                        if kp < HS || kp >= nz + HS {
                            return;
                        }
                        let k = kp - HS;
                        for i in 0..nx {
                            out_row[i + HS] =
                                init_row[i + HS] + dt * cell_tendency(tend, fctx, var, k, i);
                        }
                    });
            }
            None => {
                out.data
                    .par_chunks_mut(row)
                    .enumerate()
                    .for_each(|(idx, out_row)| {
                        let var = idx / col;
                        let kp = idx % col;
                        if kp < HS || kp >= nz + HS {
                            return;
                        }
                        let k = kp - HS;
                        for i in 0..nx {
                            out_row[i + HS] += dt * cell_tendency(tend, fctx, var, k, i);
                        }
                    });
            }
        }
    }

    #[cfg(not(feature = "parallel"))]
    {
        let (nx, nz) = (fctx.grid.nx, fctx.grid.nz);
        for var in 0..NUM_VARS {
            for k in 0..nz {
                for i in 0..nx {
                    let base = match init {
                        Some(init) => init.get(var, k + HS, i + HS),
                        None => out.get(var, k + HS, i + HS),
                    };
                    out.set(
                        var,
                        k + HS,
                        i + HS,
                        base + dt * cell_tendency(tend, fctx, var, k, i),
                    );
                }
            }
        }
    }
}
