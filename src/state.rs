//! Dense field storage for the conserved state, interface fluxes, and
//! tendencies.
//!
//! All three containers use a flat `Vec<f64>` in (variable, z, x) order so a
//! single variable's rows are contiguous, which is the access pattern of the
//! directional stencil kernels. The conserved state is padded by [`HS`] halo
//! cells on every side; fluxes live on cell interfaces and tendencies on
//! cell interiors, neither padded.
//!
//! For density and density*theta the stored values are perturbations from
//! the hydrostatic background held in [`HydroProfiles`]; momenta are stored
//! in full.

use crate::constants::{HS, NUM_VARS};

/// Padded conserved-variable field of shape (NUM_VARS, nz+2*HS, nx+2*HS).
///
/// Indices are *padded*: interior cells occupy `[HS, nx+HS) x [HS, nz+HS)`
/// and the surrounding rows/columns are halos.
#[derive(Clone)]
pub struct StateField {
    /// Values in (variable, z, x) layout.
    pub data: Vec<f64>,
    nx: usize,
    nz: usize,
}

impl StateField {
    /// Allocate a zeroed field for an `nx` by `nz` interior.
    pub fn new(nx: usize, nz: usize) -> Self {
        Self {
            data: vec![0.0; NUM_VARS * (nz + 2 * HS) * (nx + 2 * HS)],
            nx,
            nz,
        }
    }

    /// Interior x extent.
    #[inline(always)]
    pub fn nx(&self) -> usize {
        self.nx
    }

    /// Interior z extent.
    #[inline(always)]
    pub fn nz(&self) -> usize {
        self.nz
    }

    /// Padded row length.
    #[inline(always)]
    pub fn row_len(&self) -> usize {
        self.nx + 2 * HS
    }

    /// Padded column height.
    #[inline(always)]
    pub fn col_len(&self) -> usize {
        self.nz + 2 * HS
    }

    #[inline(always)]
    fn index(&self, var: usize, kp: usize, ip: usize) -> usize {
        (var * self.col_len() + kp) * self.row_len() + ip
    }

    /// Value at padded indices (var, kp, ip).
    #[inline(always)]
    pub fn get(&self, var: usize, kp: usize, ip: usize) -> f64 {
        self.data[self.index(var, kp, ip)]
    }

    /// Store a value at padded indices (var, kp, ip).
    #[inline(always)]
    pub fn set(&mut self, var: usize, kp: usize, ip: usize, value: f64) {
        let idx = self.index(var, kp, ip);
        self.data[idx] = value;
    }

    /// One padded row of a single variable.
    #[inline(always)]
    pub fn row(&self, var: usize, kp: usize) -> &[f64] {
        let start = self.index(var, kp, 0);
        &self.data[start..start + self.row_len()]
    }

    /// Mutable padded row of a single variable.
    #[inline(always)]
    pub fn row_mut(&mut self, var: usize, kp: usize) -> &mut [f64] {
        let start = self.index(var, kp, 0);
        let len = self.row_len();
        &mut self.data[start..start + len]
    }

    /// Copy every value from another field of identical shape.
    pub fn copy_from(&mut self, other: &Self) {
        assert_eq!(self.data.len(), other.data.len());
        self.data.copy_from_slice(&other.data);
    }

    /// Maximum absolute value over the whole padded array.
    pub fn max_abs(&self) -> f64 {
        self.data.iter().map(|v| v.abs()).fold(0.0, f64::max)
    }
}

/// Interface fluxes of shape (NUM_VARS, nz+1, nx+1).
pub struct FluxField {
    /// Values in (variable, z, x) layout.
    pub data: Vec<f64>,
    nx: usize,
    nz: usize,
}

impl FluxField {
    /// Allocate a zeroed flux field for an `nx` by `nz` interior.
    pub fn new(nx: usize, nz: usize) -> Self {
        Self {
            data: vec![0.0; NUM_VARS * (nz + 1) * (nx + 1)],
            nx,
            nz,
        }
    }

    #[inline(always)]
    fn index(&self, var: usize, k: usize, i: usize) -> usize {
        (var * (self.nz + 1) + k) * (self.nx + 1) + i
    }

    /// Flux at interface (var, k, i).
    #[inline(always)]
    pub fn get(&self, var: usize, k: usize, i: usize) -> f64 {
        self.data[self.index(var, k, i)]
    }

    /// Store a flux at interface (var, k, i).
    #[inline(always)]
    pub fn set(&mut self, var: usize, k: usize, i: usize, value: f64) {
        let idx = self.index(var, k, i);
        self.data[idx] = value;
    }

    /// Split into one mutable plane per variable for row-parallel fills.
    pub fn planes_mut(&mut self) -> [&mut [f64]; NUM_VARS] {
        let plane = (self.nz + 1) * (self.nx + 1);
        let (dens, rest) = self.data.split_at_mut(plane);
        let (umom, rest) = rest.split_at_mut(plane);
        let (wmom, rhot) = rest.split_at_mut(plane);
        [dens, umom, wmom, rhot]
    }
}

/// Cell tendencies of shape (NUM_VARS, nz, nx).
pub struct TendField {
    /// Values in (variable, z, x) layout.
    pub data: Vec<f64>,
    nx: usize,
    nz: usize,
}

impl TendField {
    /// Allocate a zeroed tendency field for an `nx` by `nz` interior.
    pub fn new(nx: usize, nz: usize) -> Self {
        Self {
            data: vec![0.0; NUM_VARS * nz * nx],
            nx,
            nz,
        }
    }

    #[inline(always)]
    fn index(&self, var: usize, k: usize, i: usize) -> usize {
        (var * self.nz + k) * self.nx + i
    }

    /// Tendency at cell (var, k, i).
    #[inline(always)]
    pub fn get(&self, var: usize, k: usize, i: usize) -> f64 {
        self.data[self.index(var, k, i)]
    }

    /// Store a tendency at cell (var, k, i).
    #[inline(always)]
    pub fn set(&mut self, var: usize, k: usize, i: usize, value: f64) {
        let idx = self.index(var, k, i);
        self.data[idx] = value;
    }

    /// Split into one mutable plane per variable for row-parallel fills.
    pub fn planes_mut(&mut self) -> [&mut [f64]; NUM_VARS] {
        let plane = self.nz * self.nx;
        let (dens, rest) = self.data.split_at_mut(plane);
        let (umom, rest) = rest.split_at_mut(plane);
        let (wmom, rhot) = rest.split_at_mut(plane);
        [dens, umom, wmom, rhot]
    }
}

/// Precomputed hydrostatic background profiles.
///
/// Cell-average profiles span the padded vertical extent; interface
/// profiles span the nz+1 interior interfaces. Computed once at init and
/// read-only afterwards.
#[derive(Clone)]
pub struct HydroProfiles {
    /// Hydrostatic density, vertical cell averages (length nz+2*HS).
    pub dens_cell: Vec<f64>,
    /// Hydrostatic rho*theta, vertical cell averages (length nz+2*HS).
    pub dens_theta_cell: Vec<f64>,
    /// Hydrostatic density at cell interfaces (length nz+1).
    pub dens_int: Vec<f64>,
    /// Hydrostatic rho*theta at cell interfaces (length nz+1).
    pub dens_theta_int: Vec<f64>,
    /// Hydrostatic pressure at cell interfaces (length nz+1).
    pub pressure_int: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{ID_DENS, ID_RHOT};

    #[test]
    fn test_state_field_shape() {
        let s = StateField::new(10, 5);
        assert_eq!(s.data.len(), NUM_VARS * (5 + 2 * HS) * (10 + 2 * HS));
        assert_eq!(s.row_len(), 14);
        assert_eq!(s.col_len(), 9);
    }

    #[test]
    fn test_state_field_get_set() {
        let mut s = StateField::new(4, 3);
        s.set(ID_RHOT, 2, 3, 7.5);
        assert!((s.get(ID_RHOT, 2, 3) - 7.5).abs() < 1e-14);
        assert!(s.get(ID_DENS, 2, 3).abs() < 1e-14);
    }

    #[test]
    fn test_state_field_rows_are_contiguous() {
        let mut s = StateField::new(4, 3);
        for ip in 0..s.row_len() {
            s.set(ID_DENS, 1, ip, ip as f64);
        }
        let row = s.row(ID_DENS, 1);
        for (ip, &v) in row.iter().enumerate() {
            assert!((v - ip as f64).abs() < 1e-14);
        }
    }

    #[test]
    fn test_flux_field_planes_disjoint() {
        let mut f = FluxField::new(4, 3);
        {
            let [dens, _, _, rhot] = f.planes_mut();
            dens[0] = 1.0;
            rhot[0] = 2.0;
        }
        assert!((f.get(ID_DENS, 0, 0) - 1.0).abs() < 1e-14);
        assert!((f.get(ID_RHOT, 0, 0) - 2.0).abs() < 1e-14);
    }

    #[test]
    fn test_tend_field_indexing() {
        let mut t = TendField::new(4, 3);
        t.set(ID_RHOT, 2, 3, -1.25);
        assert!((t.get(ID_RHOT, 2, 3) + 1.25).abs() < 1e-14);
        assert_eq!(t.data.len(), NUM_VARS * 3 * 4);
    }

    #[test]
    fn test_copy_from() {
        let mut a = StateField::new(3, 3);
        let mut b = StateField::new(3, 3);
        b.set(ID_DENS, 1, 1, 4.0);
        a.copy_from(&b);
        assert!((a.get(ID_DENS, 1, 1) - 4.0).abs() < 1e-14);
    }
}
