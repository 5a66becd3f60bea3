//! Physical and numerical constants.
//!
//! The dry-air thermodynamic constants are tied together by the equation of
//! state `p = C0 * (rho * theta)^gamma`, so they must be changed as a set or
//! not at all. Everything here is fixed at compile time; run-size parameters
//! (grid extents, simulation length, scenario) live in [`crate::config`].

/// Gravitational acceleration (m/s²).
pub const GRAV: f64 = 9.8;
/// Specific heat of dry air at constant pressure (J/(kg·K)).
pub const CP: f64 = 1004.0;
/// Specific heat of dry air at constant volume (J/(kg·K)).
pub const CV: f64 = 717.0;
/// Dry air gas constant (J/(kg·K)).
pub const RD: f64 = 287.0;
/// Surface reference pressure (Pa).
pub const P0: f64 = 1.0e5;
/// Equation-of-state constant in `p = C0 * (rho * theta)^gamma`.
pub const C0: f64 = 27.562_941_092_972_592_131_057_297_448_2;
/// Ratio cp/cv for dry air as used by the equation of state.
pub const GAMMA: f64 = 1.400_278_940_027_894_002_789_400_278_94;

/// Domain length in the x-direction (m).
pub const XLEN: f64 = 2.0e4;
/// Domain height in the z-direction (m).
pub const ZLEN: f64 = 1.0e4;
/// Hyper-viscosity strength, in [0, 1].
pub const HV_BETA: f64 = 0.05;
/// Courant number for the fixed time step.
pub const CFL: f64 = 1.5;
/// Assumed maximum wave speed (sound + wind) for the CFL bound (m/s).
pub const MAX_SPEED: f64 = 450.0;

/// Halo width: ghost cells needed on each side for a full reconstruction
/// stencil at boundary interfaces.
pub const HS: usize = 2;
/// Width of the interface reconstruction stencil.
pub const STEN_SIZE: usize = 4;

/// Number of conserved variables.
pub const NUM_VARS: usize = 4;
/// Density perturbation rho'.
pub const ID_DENS: usize = 0;
/// x-momentum rho*u.
pub const ID_UMOM: usize = 1;
/// z-momentum rho*w.
pub const ID_WMOM: usize = 2;
/// Density * potential temperature perturbation (rho*theta)'.
pub const ID_RHOT: usize = 3;

/// Number of Gauss-Legendre quadrature points per direction.
pub const NQPOINTS: usize = 3;
/// Gauss-Legendre abscissae on [0, 1].
pub const QPOINTS: [f64; NQPOINTS] = [
    0.112_701_665_379_258_311_482_073_460_022,
    0.500_000_000_000_000_000_000_000_000_000,
    0.887_298_334_620_741_688_517_926_539_980,
];
/// Gauss-Legendre weights matching [`QPOINTS`].
pub const QWEIGHTS: [f64; NQPOINTS] = [
    0.277_777_777_777_777_777_777_777_777_779,
    0.444_444_444_444_444_444_444_444_444_444,
    0.277_777_777_777_777_777_777_777_777_779,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quadrature_weights_normalized() {
        let sum: f64 = QWEIGHTS.iter().sum();
        assert!((sum - 1.0).abs() < 1e-14);
    }

    #[test]
    fn test_quadrature_points_symmetric() {
        assert!((QPOINTS[0] + QPOINTS[2] - 1.0).abs() < 1e-14);
        assert!((QPOINTS[1] - 0.5).abs() < 1e-14);
    }

    #[test]
    fn test_gamma_matches_heat_capacities() {
        // gamma = cp / (cp - rd) for the rho*theta equation of state
        assert!((GAMMA - CP / (CP - RD)).abs() < 1e-12);
    }
}
