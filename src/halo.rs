//! Boundary enforcement: periodic x via neighbor exchange, reflective z.
//!
//! The x-direction is periodic across the rank ring. Before an x sweep each
//! rank packs its two innermost column bands, posts them to both neighbors,
//! waits for the matching bands from the other side, and unpacks them into
//! its halo columns. The z-direction needs no communication: vertical
//! momentum is zeroed at the rigid lid and floor, horizontal momentum is
//! extrapolated preserving mass flux against the hydrostatic density, and
//! the remaining variables copy the nearest interior row.
//!
//! For the injection scenario the leftmost rank overrides part of its left
//! halo after the exchange, driving fast cold air into the domain near the
//! model top. The override must follow the generic exchange: it replaces
//! what periodicity wrote there.

use crate::comm::RingComm;
use crate::config::Scenario;
use crate::constants::{HS, ID_DENS, ID_RHOT, ID_UMOM, ID_WMOM, NUM_VARS, ZLEN};
use crate::error::ModelError;
use crate::grid::Grid;
use crate::state::{HydroProfiles, StateField};

/// Owns the packed send bands for the x exchange.
///
/// Both buffers have length `NUM_VARS * nz * HS` in (variable, z,
/// halo-column) layout and are reused for every exchange.
pub struct HaloExchange {
    send_left: Vec<f64>,
    send_right: Vec<f64>,
}

impl HaloExchange {
    /// Allocate send buffers for a local grid with `nz` interior rows.
    pub fn new(nz: usize) -> Self {
        Self {
            send_left: vec![0.0; NUM_VARS * nz * HS],
            send_right: vec![0.0; NUM_VARS * nz * HS],
        }
    }

    #[inline(always)]
    fn buf_index(nz: usize, var: usize, k: usize, s: usize) -> usize {
        (var * nz + k) * HS + s
    }

    /// Refresh the x halos of `state` from both neighbors.
    pub fn exchange_x(
        &mut self,
        state: &mut StateField,
        comm: &RingComm,
        profiles: &HydroProfiles,
        grid: &Grid,
        scenario: Scenario,
    ) -> Result<(), ModelError> {
        let (nx, nz) = (grid.nx, grid.nz);

        // Pack the inner bands: columns [HS, 2*HS) go left, [nx, nx+HS) go right.
        for var in 0..NUM_VARS {
            for k in 0..nz {
                for s in 0..HS {
                    let idx = Self::buf_index(nz, var, k, s);
                    self.send_left[idx] = state.get(var, k + HS, HS + s);
                    self.send_right[idx] = state.get(var, k + HS, nx + s);
                }
            }
        }

        // Post both sends, then wait on both receives.
        comm.send_left(self.send_left.clone())?;
        comm.send_right(self.send_right.clone())?;
        let from_left = comm.recv_from_left()?;
        let from_right = comm.recv_from_right()?;

        // Unpack: the left neighbor's rightmost band fills our left halo,
        // and symmetrically on the other side.
        for var in 0..NUM_VARS {
            for k in 0..nz {
                for s in 0..HS {
                    let idx = Self::buf_index(nz, var, k, s);
                    state.set(var, k + HS, s, from_left[idx]);
                    state.set(var, k + HS, nx + HS + s, from_right[idx]);
                }
            }
        }

        if scenario == Scenario::Injection && comm.rank() == 0 {
            inject_left_halo(state, profiles, grid);
        }

        Ok(())
    }
}

/// Drive the injection jet into the leftmost rank's left halo.
///
/// Inside the band |z - 3*zlen/4| <= zlen/16 the halo cells get a 50 m/s
/// inflow at 298 K, expressed against the local total density.
fn inject_left_halo(state: &mut StateField, profiles: &HydroProfiles, grid: &Grid) {
    for k in 0..grid.nz {
        let z = grid.cell_center_z(k + HS);
        if (z - 3.0 * ZLEN / 4.0).abs() <= ZLEN / 16.0 {
            for ip in 0..HS {
                let rho = state.get(ID_DENS, k + HS, ip) + profiles.dens_cell[k + HS];
                state.set(ID_UMOM, k + HS, ip, rho * 50.0);
                state.set(
                    ID_RHOT,
                    k + HS,
                    ip,
                    rho * 298.0 - profiles.dens_theta_cell[k + HS],
                );
            }
        }
    }
}

/// Enforce the rigid-lid z boundaries on all columns, halos included.
pub fn set_halo_z(state: &mut StateField, profiles: &HydroProfiles, grid: &Grid) {
    let nz = grid.nz;
    let bottom_interior = HS;
    let top_interior = nz + HS - 1;

    for var in 0..NUM_VARS {
        for ip in 0..grid.padded_nx() {
            match var {
                ID_WMOM => {
                    // No flow through the lid or the floor.
                    state.set(var, 0, ip, 0.0);
                    state.set(var, 1, ip, 0.0);
                    state.set(var, nz + HS, ip, 0.0);
                    state.set(var, nz + HS + 1, ip, 0.0);
                }
                ID_UMOM => {
                    // Extrapolate preserving rho*u / rho_bar.
                    let bottom = state.get(var, bottom_interior, ip)
                        / profiles.dens_cell[bottom_interior];
                    let top = state.get(var, top_interior, ip) / profiles.dens_cell[top_interior];
                    state.set(var, 0, ip, bottom * profiles.dens_cell[0]);
                    state.set(var, 1, ip, bottom * profiles.dens_cell[1]);
                    state.set(var, nz + HS, ip, top * profiles.dens_cell[nz + HS]);
                    state.set(var, nz + HS + 1, ip, top * profiles.dens_cell[nz + HS + 1]);
                }
                _ => {
                    // Density and rho*theta copy the nearest interior row.
                    let bottom = state.get(var, bottom_interior, ip);
                    let top = state.get(var, top_interior, ip);
                    state.set(var, 0, ip, bottom);
                    state.set(var, 1, ip, bottom);
                    state.set(var, nz + HS, ip, top);
                    state.set(var, nz + HS + 1, ip, top);
                }
            }
        }
    }
}
