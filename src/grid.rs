//! Local grid geometry and the 1-D x decomposition.
//!
//! The global grid is split into contiguous column blocks along x, one block
//! per rank; z is never decomposed, so every rank holds full columns. Rank r
//! of N owns columns `[floor(r*nx_glob/N), floor((r+1)*nx_glob/N))`, which
//! spreads any remainder evenly across the ring.

use crate::config::ModelConfig;
use crate::constants::HS;
use crate::error::ConfigError;

/// Geometry of one rank's slice of the global grid.
#[derive(Clone, Debug)]
pub struct Grid {
    /// Total cells in x across all ranks.
    pub nx_glob: usize,
    /// Total cells in z.
    pub nz_glob: usize,
    /// Local cells in x.
    pub nx: usize,
    /// Local cells in z (always `nz_glob`).
    pub nz: usize,
    /// Global index of this rank's first x column.
    pub i_beg: usize,
    /// Global index of this rank's first z row (always 0).
    pub k_beg: usize,
    /// Grid spacing in x (m).
    pub dx: f64,
    /// Grid spacing in z (m).
    pub dz: f64,
}

impl Grid {
    /// Compute this rank's slice of the global grid.
    pub fn decompose(config: &ModelConfig, rank: usize, nranks: usize) -> Result<Self, ConfigError> {
        if nranks == 0 || nranks > config.nx_glob {
            return Err(ConfigError::RankLayout {
                nx_glob: config.nx_glob,
                nranks,
            });
        }
        let i_beg = rank * config.nx_glob / nranks;
        let i_end = (rank + 1) * config.nx_glob / nranks;
        Ok(Self {
            nx_glob: config.nx_glob,
            nz_glob: config.nz_glob,
            nx: i_end - i_beg,
            nz: config.nz_glob,
            i_beg,
            k_beg: 0,
            dx: config.dx(),
            dz: config.dz(),
        })
    }

    /// Local x extent including halos.
    #[inline(always)]
    pub fn padded_nx(&self) -> usize {
        self.nx + 2 * HS
    }

    /// Local z extent including halos.
    #[inline(always)]
    pub fn padded_nz(&self) -> usize {
        self.nz + 2 * HS
    }

    /// Physical x of the center of padded column `ip` (halo columns sit
    /// outside the local block, possibly outside the global domain).
    #[inline(always)]
    pub fn cell_center_x(&self, ip: usize) -> f64 {
        ((self.i_beg + ip) as f64 - HS as f64 + 0.5) * self.dx
    }

    /// Physical z of the center of padded row `kp`.
    #[inline(always)]
    pub fn cell_center_z(&self, kp: usize) -> f64 {
        ((self.k_beg + kp) as f64 - HS as f64 + 0.5) * self.dz
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Scenario;

    fn config(nx: usize, nz: usize) -> ModelConfig {
        ModelConfig::new(nx, nz, 1.0, Scenario::Thermal)
    }

    #[test]
    fn test_single_rank_owns_everything() {
        let g = Grid::decompose(&config(100, 50), 0, 1).unwrap();
        assert_eq!(g.nx, 100);
        assert_eq!(g.nz, 50);
        assert_eq!(g.i_beg, 0);
        assert_eq!(g.k_beg, 0);
    }

    #[test]
    fn test_even_split() {
        for rank in 0..4 {
            let g = Grid::decompose(&config(100, 50), rank, 4).unwrap();
            assert_eq!(g.nx, 25);
            assert_eq!(g.i_beg, rank * 25);
        }
    }

    #[test]
    fn test_uneven_split_covers_all_columns() {
        let nranks = 3;
        let mut total = 0;
        let mut next = 0;
        for rank in 0..nranks {
            let g = Grid::decompose(&config(100, 50), rank, nranks).unwrap();
            assert_eq!(g.i_beg, next, "blocks must be contiguous");
            assert!(g.nx > 0);
            next = g.i_beg + g.nx;
            total += g.nx;
        }
        assert_eq!(total, 100);
    }

    #[test]
    fn test_too_many_ranks_rejected() {
        assert!(matches!(
            Grid::decompose(&config(4, 4), 0, 5),
            Err(ConfigError::RankLayout { .. })
        ));
    }

    #[test]
    fn test_cell_centers() {
        let g = Grid::decompose(&config(100, 50), 0, 1).unwrap();
        // dx = dz = 200; padded index HS is the first interior cell
        assert!((g.cell_center_x(HS) - 100.0).abs() < 1e-12);
        assert!((g.cell_center_z(HS) - 100.0).abs() < 1e-12);
        // halo cells sit outside the domain
        assert!(g.cell_center_x(0) < 0.0);
    }
}
