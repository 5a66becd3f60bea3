//! Snapshot assembly and file output.
//!
//! The core exposes diagnostic fields at cell centers (perturbation
//! density, u and w winds as momentum over total density, and the potential
//! temperature perturbation relative to the background), bundled with the
//! elapsed model time as a [`Snapshot`]. Writing snapshots to disk is the
//! concern of an [`OutputSink`]; the bundled [`NetcdfWriter`] appends them
//! to a self-describing NetCDF file when the `netcdf` feature is enabled.

mod netcdf_io;

pub use netcdf_io::NetcdfWriter;

use thiserror::Error;

use crate::constants::{HS, ID_DENS, ID_RHOT, ID_UMOM, ID_WMOM};
use crate::grid::Grid;
use crate::state::{HydroProfiles, StateField};

/// Error type for snapshot output.
#[derive(Debug, Error)]
pub enum OutputError {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// NetCDF library error.
    #[cfg(feature = "netcdf")]
    #[error("NetCDF error: {0}")]
    NetCdf(#[from] netcdf::Error),

    /// A snapshot whose shape does not match the writer's grid.
    #[error("invalid snapshot: {0}")]
    InvalidData(String),

    /// The writer was compiled without the `netcdf` feature.
    #[error("netcdf feature not enabled")]
    FeatureDisabled,
}

/// Diagnostic fields at cell centers, row-major over (z, x).
#[derive(Clone, Debug)]
pub struct Snapshot {
    /// Elapsed model time (s).
    pub etime: f64,
    /// x extent of the fields.
    pub nx: usize,
    /// z extent of the fields.
    pub nz: usize,
    /// Perturbation density rho' (kg/m³).
    pub dens: Vec<f64>,
    /// u-wind (m/s).
    pub uwnd: Vec<f64>,
    /// w-wind (m/s).
    pub wwnd: Vec<f64>,
    /// Potential temperature perturbation relative to the background (K).
    pub theta: Vec<f64>,
}

/// Assemble this rank's local snapshot from the conserved state.
pub fn local_snapshot(
    state: &StateField,
    profiles: &HydroProfiles,
    grid: &Grid,
    etime: f64,
) -> Snapshot {
    let (nx, nz) = (grid.nx, grid.nz);
    let mut dens = vec![0.0; nx * nz];
    let mut uwnd = vec![0.0; nx * nz];
    let mut wwnd = vec![0.0; nx * nz];
    let mut theta = vec![0.0; nx * nz];

    for k in 0..nz {
        for i in 0..nx {
            let idx = k * nx + i;
            let rp = state.get(ID_DENS, k + HS, i + HS);
            let rho = profiles.dens_cell[k + HS] + rp;
            dens[idx] = rp;
            uwnd[idx] = state.get(ID_UMOM, k + HS, i + HS) / rho;
            wwnd[idx] = state.get(ID_WMOM, k + HS, i + HS) / rho;
            theta[idx] = (state.get(ID_RHOT, k + HS, i + HS) + profiles.dens_theta_cell[k + HS])
                / rho
                - profiles.dens_theta_cell[k + HS] / profiles.dens_cell[k + HS];
        }
    }

    Snapshot {
        etime,
        nx,
        nz,
        dens,
        uwnd,
        wwnd,
        theta,
    }
}

/// Destination for snapshots emitted by the driver loop.
pub trait OutputSink {
    /// Append one snapshot.
    fn write(&mut self, snapshot: &Snapshot) -> Result<(), OutputError>;
}

/// Discards every snapshot; used by non-main ranks and quiet runs.
pub struct NullSink;

impl OutputSink for NullSink {
    fn write(&mut self, _snapshot: &Snapshot) -> Result<(), OutputError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ModelConfig, Scenario};
    use crate::init::{hydro_profiles, initial_state};

    #[test]
    fn test_local_snapshot_of_balanced_state_is_zero() {
        let config = ModelConfig::new(16, 8, 1.0, Scenario::Injection);
        let grid = Grid::decompose(&config, 0, 1).unwrap();
        let profiles = hydro_profiles(Scenario::Injection, &grid);
        let state = initial_state(Scenario::Injection, &grid);
        let snap = local_snapshot(&state, &profiles, &grid, 0.0);
        assert_eq!(snap.dens.len(), 16 * 8);
        for idx in 0..snap.dens.len() {
            assert!(snap.dens[idx].abs() < 1e-13);
            assert!(snap.uwnd[idx].abs() < 1e-13);
            assert!(snap.wwnd[idx].abs() < 1e-13);
            assert!(snap.theta[idx].abs() < 1e-13);
        }
    }

    #[test]
    fn test_local_snapshot_recovers_uniform_wind() {
        let config = ModelConfig::new(10, 10, 1.0, Scenario::GravityWaves);
        let grid = Grid::decompose(&config, 0, 1).unwrap();
        let profiles = hydro_profiles(Scenario::GravityWaves, &grid);
        let state = initial_state(Scenario::GravityWaves, &grid);
        let snap = local_snapshot(&state, &profiles, &grid, 0.0);
        for &u in &snap.uwnd {
            assert!((u - 15.0).abs() < 1e-9);
        }
    }
}
