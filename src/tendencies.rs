//! Directional flux and tendency kernels.
//!
//! Each kernel reconstructs interface values from a four-cell stencil,
//! forms the Euler flux with a hyper-viscous correction, and converts the
//! flux divergence into cell tendencies:
//!
//! - interface value: `-s0/12 + 7*s1/12 + 7*s2/12 - s3/12` (fourth order)
//! - third-derivative proxy: `-s0 + 3*s1 - 3*s2 + s3`
//! - `hv_coef = -hv_beta * delta / (16 * dt)`, with dt the *sub-stage* step
//!   so the dissipation added per full step is stage-independent.
//!
//! The z kernel differs from the x kernel in three ways: it reads the
//! interface background profiles instead of the cell averages, it subtracts
//! the hydrostatic interface pressure so only the perturbation pressure
//! enters the momentum balance, and it pins `w = 0` and the density
//! hyper-viscosity to zero at the lid and floor interfaces so no mass
//! crosses them. Its tendency adds the gravity source `-rho' * g` to
//! vertical momentum; the background is already in balance.
//!
//! Halos must be fresh for the swept direction before either kernel runs.

use crate::constants::{
    C0, GAMMA, GRAV, HS, HV_BETA, ID_DENS, ID_RHOT, ID_UMOM, ID_WMOM, NUM_VARS,
};
use crate::grid::Grid;
use crate::state::{FluxField, HydroProfiles, StateField, TendField};

#[inline(always)]
fn stencil_x(state: &StateField, k: usize, i: usize) -> ([f64; NUM_VARS], [f64; NUM_VARS]) {
    let mut vals = [0.0; NUM_VARS];
    let mut d3 = [0.0; NUM_VARS];
    for var in 0..NUM_VARS {
        let s0 = state.get(var, k + HS, i);
        let s1 = state.get(var, k + HS, i + 1);
        let s2 = state.get(var, k + HS, i + 2);
        let s3 = state.get(var, k + HS, i + 3);
        vals[var] = -s0 / 12.0 + 7.0 * s1 / 12.0 + 7.0 * s2 / 12.0 - s3 / 12.0;
        d3[var] = -s0 + 3.0 * s1 - 3.0 * s2 + s3;
    }
    (vals, d3)
}

#[inline(always)]
fn stencil_z(state: &StateField, k: usize, i: usize) -> ([f64; NUM_VARS], [f64; NUM_VARS]) {
    let mut vals = [0.0; NUM_VARS];
    let mut d3 = [0.0; NUM_VARS];
    for var in 0..NUM_VARS {
        let s0 = state.get(var, k, i + HS);
        let s1 = state.get(var, k + 1, i + HS);
        let s2 = state.get(var, k + 2, i + HS);
        let s3 = state.get(var, k + 3, i + HS);
        vals[var] = -s0 / 12.0 + 7.0 * s1 / 12.0 + 7.0 * s2 / 12.0 - s3 / 12.0;
        d3[var] = -s0 + 3.0 * s1 - 3.0 * s2 + s3;
    }
    (vals, d3)
}

/// Flux vector at x interface (k, i).
#[inline(always)]
fn x_interface_flux(
    state: &StateField,
    profiles: &HydroProfiles,
    hv_coef: f64,
    k: usize,
    i: usize,
) -> [f64; NUM_VARS] {
    let (vals, d3) = stencil_x(state, k, i);
    let r = vals[ID_DENS] + profiles.dens_cell[k + HS];
    let u = vals[ID_UMOM] / r;
    let w = vals[ID_WMOM] / r;
    let t = (vals[ID_RHOT] + profiles.dens_theta_cell[k + HS]) / r;
    let p = C0 * (r * t).powf(GAMMA);
    [
        r * u - hv_coef * d3[ID_DENS],
        r * u * u + p - hv_coef * d3[ID_UMOM],
        r * u * w - hv_coef * d3[ID_WMOM],
        r * u * t - hv_coef * d3[ID_RHOT],
    ]
}

/// Flux vector at z interface (k, i), with the rigid-lid enforcement.
#[inline(always)]
fn z_interface_flux(
    state: &StateField,
    profiles: &HydroProfiles,
    hv_coef: f64,
    nz: usize,
    k: usize,
    i: usize,
) -> [f64; NUM_VARS] {
    let (vals, mut d3) = stencil_z(state, k, i);
    let r = vals[ID_DENS] + profiles.dens_int[k];
    let u = vals[ID_UMOM] / r;
    let mut w = vals[ID_WMOM] / r;
    let t = (vals[ID_RHOT] + profiles.dens_theta_int[k]) / r;
    let p = C0 * (r * t).powf(GAMMA) - profiles.pressure_int[k];
    if k == 0 || k == nz {
        w = 0.0;
        d3[ID_DENS] = 0.0;
    }
    [
        r * w - hv_coef * d3[ID_DENS],
        r * w * u - hv_coef * d3[ID_UMOM],
        r * w * w + p - hv_coef * d3[ID_WMOM],
        r * w * t - hv_coef * d3[ID_RHOT],
    ]
}

/// Compute x-direction fluxes and tendencies for one sub-stage.
pub fn compute_tendencies_x(
    state: &StateField,
    flux: &mut FluxField,
    tend: &mut TendField,
    profiles: &HydroProfiles,
    grid: &Grid,
    dt: f64,
) {
    let (nx, nz) = (grid.nx, grid.nz);
    let hv_coef = -HV_BETA * grid.dx / (16.0 * dt);

    for k in 0..nz {
        for i in 0..=nx {
            let f = x_interface_flux(state, profiles, hv_coef, k, i);
            for (var, &value) in f.iter().enumerate() {
                flux.set(var, k, i, value);
            }
        }
    }

    for var in 0..NUM_VARS {
        for k in 0..nz {
            for i in 0..nx {
                tend.set(
                    var,
                    k,
                    i,
                    -(flux.get(var, k, i + 1) - flux.get(var, k, i)) / grid.dx,
                );
            }
        }
    }
}

/// Row-parallel version of [`compute_tendencies_x`].
#[cfg(feature = "parallel")]
pub fn compute_tendencies_x_parallel(
    state: &StateField,
    flux: &mut FluxField,
    tend: &mut TendField,
    profiles: &HydroProfiles,
    grid: &Grid,
    dt: f64,
) {
    use rayon::prelude::*;

    let (nx, nz) = (grid.nx, grid.nz);
    let hv_coef = -HV_BETA * grid.dx / (16.0 * dt);

    {
        let [fd, fu, fw, ft] = flux.planes_mut();
        fd.par_chunks_mut(nx + 1)
            .zip(fu.par_chunks_mut(nx + 1))
            .zip(fw.par_chunks_mut(nx + 1))
            .zip(ft.par_chunks_mut(nx + 1))
            .enumerate()
            .for_each(|(k, (((fd, fu), fw), ft))| {
                if k >= nz {
                    return;
                }
                for i in 0..=nx {
                    let f = x_interface_flux(state, profiles, hv_coef, k, i);
                    fd[i] = f[ID_DENS];
                    fu[i] = f[ID_UMOM];
                    fw[i] = f[ID_WMOM];
                    ft[i] = f[ID_RHOT];
                }
            });
    }

    let flux = &*flux;
    let [td, tu, tw, tt] = tend.planes_mut();
    td.par_chunks_mut(nx)
        .zip(tu.par_chunks_mut(nx))
        .zip(tw.par_chunks_mut(nx))
        .zip(tt.par_chunks_mut(nx))
        .enumerate()
        .for_each(|(k, (((td, tu), tw), tt))| {
            for i in 0..nx {
                td[i] = -(flux.get(ID_DENS, k, i + 1) - flux.get(ID_DENS, k, i)) / grid.dx;
                tu[i] = -(flux.get(ID_UMOM, k, i + 1) - flux.get(ID_UMOM, k, i)) / grid.dx;
                tw[i] = -(flux.get(ID_WMOM, k, i + 1) - flux.get(ID_WMOM, k, i)) / grid.dx;
                tt[i] = -(flux.get(ID_RHOT, k, i + 1) - flux.get(ID_RHOT, k, i)) / grid.dx;
            }
        });
}

/// Compute z-direction fluxes and tendencies for one sub-stage.
pub fn compute_tendencies_z(
    state: &StateField,
    flux: &mut FluxField,
    tend: &mut TendField,
    profiles: &HydroProfiles,
    grid: &Grid,
    dt: f64,
) {
    let (nx, nz) = (grid.nx, grid.nz);
    let hv_coef = -HV_BETA * grid.dz / (16.0 * dt);

    for k in 0..=nz {
        for i in 0..nx {
            let f = z_interface_flux(state, profiles, hv_coef, nz, k, i);
            for (var, &value) in f.iter().enumerate() {
                flux.set(var, k, i, value);
            }
        }
    }

    for var in 0..NUM_VARS {
        for k in 0..nz {
            for i in 0..nx {
                let mut value = -(flux.get(var, k + 1, i) - flux.get(var, k, i)) / grid.dz;
                if var == ID_WMOM {
                    value -= state.get(ID_DENS, k + HS, i + HS) * GRAV;
                }
                tend.set(var, k, i, value);
            }
        }
    }
}

/// Row-parallel version of [`compute_tendencies_z`].
#[cfg(feature = "parallel")]
pub fn compute_tendencies_z_parallel(
    state: &StateField,
    flux: &mut FluxField,
    tend: &mut TendField,
    profiles: &HydroProfiles,
    grid: &Grid,
    dt: f64,
) {
    use rayon::prelude::*;

    let (nx, nz) = (grid.nx, grid.nz);
    let hv_coef = -HV_BETA * grid.dz / (16.0 * dt);

    {
        let [fd, fu, fw, ft] = flux.planes_mut();
        fd.par_chunks_mut(nx + 1)
            .zip(fu.par_chunks_mut(nx + 1))
            .zip(fw.par_chunks_mut(nx + 1))
            .zip(ft.par_chunks_mut(nx + 1))
            .enumerate()
            .for_each(|(k, (((fd, fu), fw), ft))| {
                for i in 0..nx {
                    let f = z_interface_flux(state, profiles, hv_coef, nz, k, i);
                    fd[i] = f[ID_DENS];
                    fu[i] = f[ID_UMOM];
                    fw[i] = f[ID_WMOM];
                    ft[i] = f[ID_RHOT];
                }
            });
    }

    let flux = &*flux;
    let [td, tu, tw, tt] = tend.planes_mut();
    td.par_chunks_mut(nx)
        .zip(tu.par_chunks_mut(nx))
        .zip(tw.par_chunks_mut(nx))
        .zip(tt.par_chunks_mut(nx))
        .enumerate()
        .for_each(|(k, (((td, tu), tw), tt))| {
            for i in 0..nx {
                td[i] = -(flux.get(ID_DENS, k + 1, i) - flux.get(ID_DENS, k, i)) / grid.dz;
                tu[i] = -(flux.get(ID_UMOM, k + 1, i) - flux.get(ID_UMOM, k, i)) / grid.dz;
                tw[i] = -(flux.get(ID_WMOM, k + 1, i) - flux.get(ID_WMOM, k, i)) / grid.dz
                    - state.get(ID_DENS, k + HS, i + HS) * GRAV;
                tt[i] = -(flux.get(ID_RHOT, k + 1, i) - flux.get(ID_RHOT, k, i)) / grid.dz;
            }
        });
}
