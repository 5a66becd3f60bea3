//! Closed-form initial conditions and the hydrostatic background.
//!
//! Every scenario is defined by a pointwise sample: given a physical
//! location (x, z) it returns the perturbation state (rho', u, w, theta')
//! together with the hydrostatic background (rho_bar, theta_bar) at that
//! height. Cell averages are then built by 3x3 Gauss-Legendre quadrature of
//! those samples, so the initial state is a genuine finite-volume average
//! rather than a midpoint value.
//!
//! Two analytic hydrostatic profiles cover all scenarios:
//! - constant potential temperature theta0 = 300 K (thermally neutral), via
//!   the Exner pressure pi = 1 - g*z/(cp*theta0);
//! - constant Brunt-Vaisala frequency N, with theta = theta0*exp(N^2*z/g).

use crate::config::Scenario;
use crate::constants::{
    C0, CP, GAMMA, GRAV, ID_DENS, ID_RHOT, ID_UMOM, ID_WMOM, NQPOINTS, NUM_VARS, P0, QPOINTS,
    QWEIGHTS, RD, XLEN,
};
use crate::grid::Grid;
use crate::state::{HydroProfiles, StateField};

/// Pointwise sample of a scenario: perturbations plus background.
#[derive(Clone, Copy, Debug, Default)]
pub struct PointSample {
    /// Density perturbation rho' (kg/m³).
    pub r: f64,
    /// u-wind (m/s).
    pub u: f64,
    /// w-wind (m/s).
    pub w: f64,
    /// Potential temperature perturbation theta' (K).
    pub t: f64,
    /// Hydrostatic background density rho_bar (kg/m³).
    pub hr: f64,
    /// Hydrostatic background potential temperature theta_bar (K).
    pub ht: f64,
}

/// Background potential temperature at the surface (K).
const THETA0: f64 = 300.0;

/// Cosine-squared bump on an ellipse.
///
/// Returns `amp * cos^2(d * pi/2)` where d is the scaled elliptical distance
/// from (x0, z0) with radii (xrad, zrad), and 0 outside the unit ellipse.
pub fn sample_ellipse_cosine(
    x: f64,
    z: f64,
    amp: f64,
    x0: f64,
    z0: f64,
    xrad: f64,
    zrad: f64,
) -> f64 {
    let dist = (((x - x0) / xrad).powi(2) + ((z - z0) / zrad).powi(2)).sqrt()
        * std::f64::consts::PI
        / 2.0;
    if dist <= std::f64::consts::PI / 2.0 {
        amp * dist.cos().powi(2)
    } else {
        0.0
    }
}

/// Hydrostatic balance for a constant potential temperature atmosphere.
///
/// Returns (rho_bar, theta_bar) at height z.
pub fn hydro_const_theta(z: f64) -> (f64, f64) {
    let t = THETA0;
    let exner = 1.0 - GRAV * z / (CP * THETA0);
    let p = P0 * exner.powf(CP / RD);
    let rt = (p / C0).powf(1.0 / GAMMA);
    (rt / t, t)
}

/// Hydrostatic balance for a constant Brunt-Vaisala frequency atmosphere.
///
/// Returns (rho_bar, theta_bar) at height z.
pub fn hydro_const_bvfreq(z: f64, bv_freq0: f64) -> (f64, f64) {
    let t = THETA0 * (bv_freq0 * bv_freq0 / GRAV * z).exp();
    let exner = 1.0 - GRAV * GRAV / (CP * bv_freq0 * bv_freq0) * (t - THETA0) / (t * THETA0);
    let p = P0 * exner.powf(CP / RD);
    let rt = (p / C0).powf(1.0 / GAMMA);
    (rt / t, t)
}

impl Scenario {
    /// Sample this scenario's initial state at a physical location.
    pub fn sample(&self, x: f64, z: f64) -> PointSample {
        match self {
            Scenario::Collision => {
                let (hr, ht) = hydro_const_theta(z);
                let t = sample_ellipse_cosine(x, z, 20.0, XLEN / 2.0, 2000.0, 2000.0, 2000.0)
                    + sample_ellipse_cosine(x, z, -20.0, XLEN / 2.0, 8000.0, 2000.0, 2000.0);
                PointSample {
                    t,
                    hr,
                    ht,
                    ..Default::default()
                }
            }
            Scenario::Thermal => {
                let (hr, ht) = hydro_const_theta(z);
                let t = sample_ellipse_cosine(x, z, 3.0, XLEN / 2.0, 2000.0, 2000.0, 2000.0);
                PointSample {
                    t,
                    hr,
                    ht,
                    ..Default::default()
                }
            }
            Scenario::GravityWaves => {
                let (hr, ht) = hydro_const_bvfreq(z, 0.02);
                PointSample {
                    u: 15.0,
                    hr,
                    ht,
                    ..Default::default()
                }
            }
            Scenario::DensityCurrent => {
                let (hr, ht) = hydro_const_theta(z);
                let t = sample_ellipse_cosine(x, z, -20.0, XLEN / 2.0, 5000.0, 4000.0, 2000.0);
                PointSample {
                    t,
                    hr,
                    ht,
                    ..Default::default()
                }
            }
            Scenario::Injection => {
                let (hr, ht) = hydro_const_theta(z);
                PointSample {
                    hr,
                    ht,
                    ..Default::default()
                }
            }
        }
    }
}

/// Precompute the hydrostatic background over this rank's vertical extent.
///
/// Cell averages use the 3-point Gauss-Legendre rule within each cell;
/// interface values are sampled directly at the interface height, and the
/// interface pressure follows from the equation of state.
pub fn hydro_profiles(scenario: Scenario, grid: &Grid) -> HydroProfiles {
    let nz = grid.nz;
    let mut dens_cell = vec![0.0; grid.padded_nz()];
    let mut dens_theta_cell = vec![0.0; grid.padded_nz()];
    let mut dens_int = vec![0.0; nz + 1];
    let mut dens_theta_int = vec![0.0; nz + 1];
    let mut pressure_int = vec![0.0; nz + 1];

    for kp in 0..grid.padded_nz() {
        let z_center = grid.cell_center_z(kp);
        for qk in 0..NQPOINTS {
            let z = z_center + (QPOINTS[qk] - 0.5) * grid.dz;
            let s = scenario.sample(0.0, z);
            dens_cell[kp] += s.hr * QWEIGHTS[qk];
            dens_theta_cell[kp] += s.hr * s.ht * QWEIGHTS[qk];
        }
    }

    for k in 0..=nz {
        let z = (grid.k_beg + k) as f64 * grid.dz;
        let s = scenario.sample(0.0, z);
        dens_int[k] = s.hr;
        dens_theta_int[k] = s.hr * s.ht;
        pressure_int[k] = C0 * (s.hr * s.ht).powf(GAMMA);
    }

    HydroProfiles {
        dens_cell,
        dens_theta_cell,
        dens_int,
        dens_theta_int,
        pressure_int,
    }
}

/// Build the cell-averaged initial state for this rank, halos included.
///
/// Each padded cell accumulates the 3x3 tensor-product quadrature of
/// (rho', (rho'+rho_bar)*u, (rho'+rho_bar)*w,
/// (rho'+rho_bar)*(theta'+theta_bar) - rho_bar*theta_bar), storing density
/// and rho*theta as perturbations from the background.
pub fn initial_state(scenario: Scenario, grid: &Grid) -> StateField {
    let mut state = StateField::new(grid.nx, grid.nz);

    for kp in 0..grid.padded_nz() {
        for ip in 0..grid.padded_nx() {
            let x_center = grid.cell_center_x(ip);
            let z_center = grid.cell_center_z(kp);
            let mut cell = [0.0; NUM_VARS];
            for qk in 0..NQPOINTS {
                for qi in 0..NQPOINTS {
                    let x = x_center + (QPOINTS[qi] - 0.5) * grid.dx;
                    let z = z_center + (QPOINTS[qk] - 0.5) * grid.dz;
                    let s = scenario.sample(x, z);
                    let w_q = QWEIGHTS[qi] * QWEIGHTS[qk];
                    cell[ID_DENS] += s.r * w_q;
                    cell[ID_UMOM] += (s.r + s.hr) * s.u * w_q;
                    cell[ID_WMOM] += (s.r + s.hr) * s.w * w_q;
                    cell[ID_RHOT] += ((s.r + s.hr) * (s.t + s.ht) - s.hr * s.ht) * w_q;
                }
            }
            for (var, &value) in cell.iter().enumerate() {
                state.set(var, kp, ip, value);
            }
        }
    }

    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelConfig;
    use crate::constants::{HS, ZLEN};

    const TOL: f64 = 1e-12;

    fn grid(nx: usize, nz: usize) -> Grid {
        let config = ModelConfig::new(nx, nz, 1.0, Scenario::Thermal);
        Grid::decompose(&config, 0, 1).unwrap()
    }

    #[test]
    fn test_bump_peak_and_support() {
        // Peak value at the center, zero outside the ellipse
        let peak = sample_ellipse_cosine(5000.0, 2000.0, 3.0, 5000.0, 2000.0, 2000.0, 2000.0);
        assert!((peak - 3.0).abs() < TOL);
        let outside = sample_ellipse_cosine(9000.0, 2000.0, 3.0, 5000.0, 2000.0, 2000.0, 2000.0);
        assert!(outside.abs() < TOL);
        // Halfway to the edge in x only: d = 1/2, cos^2(pi/4) = 1/2
        let half = sample_ellipse_cosine(6000.0, 2000.0, 3.0, 5000.0, 2000.0, 2000.0, 2000.0);
        assert!((half - 1.5).abs() < 1e-10);
    }

    #[test]
    fn test_const_theta_surface_values() {
        let (r, t) = hydro_const_theta(0.0);
        assert!((t - 300.0).abs() < TOL);
        // p = p0 at the surface, so rho*theta = (p0/C0)^(1/gamma)
        let rt = (P0 / C0).powf(1.0 / GAMMA);
        assert!((r - rt / 300.0).abs() < 1e-10);
    }

    #[test]
    fn test_const_theta_decreases_with_height() {
        let (r0, _) = hydro_const_theta(0.0);
        let (r5, _) = hydro_const_theta(5000.0);
        let (r10, _) = hydro_const_theta(ZLEN);
        assert!(r0 > r5 && r5 > r10);
        assert!(r10 > 0.0);
    }

    #[test]
    fn test_const_bvfreq_theta_grows_with_height() {
        let (_, t0) = hydro_const_bvfreq(0.0, 0.02);
        let (_, t10) = hydro_const_bvfreq(ZLEN, 0.02);
        assert!((t0 - 300.0).abs() < TOL);
        assert!(t10 > t0);
        // theta(z) = theta0 * exp(N^2 z / g)
        let expected = 300.0 * (0.02f64 * 0.02 / GRAV * ZLEN).exp();
        assert!((t10 - expected).abs() < 1e-9);
    }

    #[test]
    fn test_hydrostatic_pressure_balance_at_interfaces() {
        // dp/dz ~ -rho*g between adjacent interfaces, to discretization error
        let g = grid(20, 100);
        let profiles = hydro_profiles(Scenario::Thermal, &g);
        for k in 0..g.nz {
            let dpdz = (profiles.pressure_int[k + 1] - profiles.pressure_int[k]) / g.dz;
            let rho_mid = 0.5 * (profiles.dens_int[k] + profiles.dens_int[k + 1]);
            let rel = (dpdz + rho_mid * GRAV).abs() / (rho_mid * GRAV);
            assert!(rel < 1e-3, "imbalance {rel} at interface {k}");
        }
    }

    #[test]
    fn test_injection_starts_balanced() {
        // No bumps, no winds: every perturbation cell average is zero
        let g = grid(8, 8);
        let state = initial_state(Scenario::Injection, &g);
        assert!(state.max_abs() < TOL);
    }

    #[test]
    fn test_thermal_bump_is_warm_and_centered() {
        let g = grid(100, 50);
        let state = initial_state(Scenario::Thermal, &g);
        // rho*theta perturbation is positive at the bubble center (x=10000, z=2000)
        let ip = HS + 50;
        let kp = HS + 10;
        assert!(state.get(ID_RHOT, kp, ip) > 0.0);
        // and zero far away
        assert!(state.get(ID_RHOT, HS + 40, HS + 5).abs() < TOL);
        // no initial winds anywhere
        assert!(state.get(ID_UMOM, kp, ip).abs() < TOL);
        assert!(state.get(ID_WMOM, kp, ip).abs() < TOL);
    }

    #[test]
    fn test_gravity_waves_uniform_wind() {
        let g = grid(10, 10);
        let state = initial_state(Scenario::GravityWaves, &g);
        let profiles = hydro_profiles(Scenario::GravityWaves, &g);
        for kp in HS..HS + g.nz {
            for ip in HS..HS + g.nx {
                let rho = state.get(ID_DENS, kp, ip) + profiles.dens_cell[kp];
                let u = state.get(ID_UMOM, kp, ip) / rho;
                assert!((u - 15.0).abs() < 1e-10, "u = {u} at ({kp}, {ip})");
            }
        }
    }
}
