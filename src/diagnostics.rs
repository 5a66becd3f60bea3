//! Conservation diagnostics.
//!
//! The finite-volume scheme conserves mass to machine precision and loses
//! total energy only through hyper-viscous dissipation, so the domain sums
//! of both are the cheapest meaningful correctness check a run can carry.
//! Sums are accumulated per interior cell, reduced across the rank ring
//! with a deterministic SUM all-reduce, and compared start-to-end.

use crate::comm::RingComm;
use crate::constants::{C0, CP, CV, GAMMA, HS, ID_DENS, ID_RHOT, ID_UMOM, ID_WMOM, P0, RD};
use crate::grid::Grid;
use crate::state::{HydroProfiles, StateField};

/// Domain totals of mass and total (kinetic + internal) energy.
#[derive(Clone, Copy, Debug, Default)]
pub struct Totals {
    /// Total mass (kg per meter of the suppressed y dimension).
    pub mass: f64,
    /// Total energy (J per meter of the suppressed y dimension).
    pub te: f64,
}

/// Mass and energy contributions of one row of interior cells.
fn row_totals(state: &StateField, profiles: &HydroProfiles, grid: &Grid, k: usize) -> Totals {
    let mut mass = 0.0;
    let mut te = 0.0;
    for i in 0..grid.nx {
        let r = state.get(ID_DENS, k + HS, i + HS) + profiles.dens_cell[k + HS];
        let u = state.get(ID_UMOM, k + HS, i + HS) / r;
        let w = state.get(ID_WMOM, k + HS, i + HS) / r;
        let th = (state.get(ID_RHOT, k + HS, i + HS) + profiles.dens_theta_cell[k + HS]) / r;
        let p = C0 * (r * th).powf(GAMMA);
        let t = th / (P0 / p).powf(RD / CP);
        let ke = r * (u * u + w * w);
        let ie = r * CV * t;
        mass += r * grid.dx * grid.dz;
        te += (ke + ie) * grid.dx * grid.dz;
    }
    Totals { mass, te }
}

/// This rank's interior totals.
///
/// Rows are summed in k order regardless of how the row partials are
/// computed, so the result is reproducible.
pub fn local_totals(state: &StateField, profiles: &HydroProfiles, grid: &Grid) -> Totals {
    #[cfg(feature = "parallel")]
    let partials: Vec<Totals> = {
        use rayon::prelude::*;
        (0..grid.nz)
            .into_par_iter()
            .map(|k| row_totals(state, profiles, grid, k))
            .collect()
    };
    #[cfg(not(feature = "parallel"))]
    let partials: Vec<Totals> = (0..grid.nz)
        .map(|k| row_totals(state, profiles, grid, k))
        .collect();

    let mut totals = Totals::default();
    for p in partials {
        totals.mass += p.mass;
        totals.te += p.te;
    }
    totals
}

/// Domain-global totals via the ring's SUM all-reduce.
pub fn reduce_totals(
    state: &StateField,
    profiles: &HydroProfiles,
    grid: &Grid,
    comm: &RingComm,
) -> Totals {
    let local = local_totals(state, profiles, grid);
    let global = comm.allreduce_sum(&[local.mass, local.te]);
    Totals {
        mass: global[0],
        te: global[1],
    }
}

/// Tracks conservation drift relative to the initial totals.
#[derive(Clone, Copy, Debug)]
pub struct ConservationTracker {
    initial: Totals,
    current: Totals,
}

impl ConservationTracker {
    /// Start tracking from the given initial totals.
    pub fn new(initial: Totals) -> Self {
        Self {
            initial,
            current: initial,
        }
    }

    /// Record the most recent totals.
    pub fn update(&mut self, totals: Totals) {
        self.current = totals;
    }

    /// Relative mass drift (mass - mass0) / mass0.
    pub fn d_mass(&self) -> f64 {
        (self.current.mass - self.initial.mass) / self.initial.mass
    }

    /// Relative total-energy drift (te - te0) / te0.
    pub fn d_te(&self) -> f64 {
        (self.current.te - self.initial.te) / self.initial.te
    }

    /// Initial totals.
    pub fn initial(&self) -> Totals {
        self.initial
    }

    /// Most recently recorded totals.
    pub fn current(&self) -> Totals {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ModelConfig, Scenario};
    use crate::init::{hydro_profiles, initial_state};

    fn setup(scenario: Scenario) -> (Grid, HydroProfiles, StateField) {
        let config = ModelConfig::new(50, 25, 1.0, scenario);
        let grid = Grid::decompose(&config, 0, 1).unwrap();
        let profiles = hydro_profiles(scenario, &grid);
        let state = initial_state(scenario, &grid);
        (grid, profiles, state)
    }

    #[test]
    fn test_totals_are_positive_and_finite() {
        for scenario in [
            Scenario::Collision,
            Scenario::Thermal,
            Scenario::GravityWaves,
            Scenario::DensityCurrent,
            Scenario::Injection,
        ] {
            let (grid, profiles, state) = setup(scenario);
            let totals = local_totals(&state, &profiles, &grid);
            assert!(totals.mass > 0.0 && totals.mass.is_finite());
            assert!(totals.te > 0.0 && totals.te.is_finite());
        }
    }

    #[test]
    fn test_mass_matches_background_for_balanced_start() {
        // Injection starts with zero perturbation, so total mass is the
        // column sum of the background density.
        let (grid, profiles, state) = setup(Scenario::Injection);
        let totals = local_totals(&state, &profiles, &grid);
        let mut expected = 0.0;
        for k in 0..grid.nz {
            expected += profiles.dens_cell[k + HS] * grid.dx * grid.dz * grid.nx as f64;
        }
        assert!((totals.mass - expected).abs() / expected < 1e-12);
    }

    #[test]
    fn test_reduce_matches_local_for_single_rank() {
        let (grid, profiles, state) = setup(Scenario::Thermal);
        let comm = RingComm::single();
        let local = local_totals(&state, &profiles, &grid);
        let global = reduce_totals(&state, &profiles, &grid, &comm);
        assert_eq!(local.mass.to_bits(), global.mass.to_bits());
        assert_eq!(local.te.to_bits(), global.te.to_bits());
    }

    #[test]
    fn test_tracker_reports_relative_drift() {
        let initial = Totals {
            mass: 100.0,
            te: 1000.0,
        };
        let mut tracker = ConservationTracker::new(initial);
        assert_eq!(tracker.d_mass(), 0.0);
        tracker.update(Totals {
            mass: 100.0 + 1e-10,
            te: 1000.0 - 1e-4,
        });
        assert!((tracker.d_mass() - 1e-12).abs() < 1e-15);
        assert!((tracker.d_te() + 1e-7).abs() < 1e-12);
    }
}
