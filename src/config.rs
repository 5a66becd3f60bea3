//! Run configuration and scenario selection.
//!
//! A [`ModelConfig`] carries everything that varies between runs: global grid
//! extents, simulation length, output cadence, and the initial-condition
//! scenario. Grid spacing and the fixed CFL time step are derived from it.

use crate::constants::{CFL, MAX_SPEED, XLEN, ZLEN};
use crate::error::ConfigError;

/// Initial-condition scenario.
///
/// The numeric ids mirror the conventional `data_spec` values used on the
/// command line (4 is unassigned and rejected).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scenario {
    /// Two thermals, warm below cold, that rise/sink and collide.
    Collision,
    /// A single warm bubble rising through a neutral atmosphere.
    Thermal,
    /// Uniform 15 m/s flow in a constant-stability atmosphere with a
    /// localized vertical-momentum forcing.
    GravityWaves,
    /// A cold blob that falls and spreads along the model floor.
    DensityCurrent,
    /// Balanced start; fast cold air driven in at the left boundary near
    /// the model top.
    Injection,
}

impl Scenario {
    /// Parse a numeric `data_spec` id.
    pub fn from_data_spec(id: i64) -> Result<Self, ConfigError> {
        match id {
            1 => Ok(Self::Collision),
            2 => Ok(Self::Thermal),
            3 => Ok(Self::GravityWaves),
            5 => Ok(Self::DensityCurrent),
            6 => Ok(Self::Injection),
            other => Err(ConfigError::UnknownDataSpec(other)),
        }
    }

    /// The numeric id for this scenario.
    pub fn data_spec(&self) -> i64 {
        match self {
            Self::Collision => 1,
            Self::Thermal => 2,
            Self::GravityWaves => 3,
            Self::DensityCurrent => 5,
            Self::Injection => 6,
        }
    }

    /// Human-readable scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Collision => "collision",
            Self::Thermal => "thermal",
            Self::GravityWaves => "gravity_waves",
            Self::DensityCurrent => "density_current",
            Self::Injection => "injection",
        }
    }
}

/// Configuration for a simulation run.
#[derive(Clone, Debug)]
pub struct ModelConfig {
    /// Total cells in the x-direction.
    pub nx_glob: usize,
    /// Total cells in the z-direction.
    pub nz_glob: usize,
    /// How many seconds of model time to simulate.
    pub sim_time: f64,
    /// Output interval in model seconds; negative disables output.
    pub output_freq: f64,
    /// Initial-condition scenario.
    pub scenario: Scenario,
    /// Whether the main rank prints progress to stdout.
    pub verbose: bool,
}

impl ModelConfig {
    /// Create a configuration with output disabled and quiet progress.
    pub fn new(nx_glob: usize, nz_glob: usize, sim_time: f64, scenario: Scenario) -> Self {
        Self {
            nx_glob,
            nz_glob,
            sim_time,
            output_freq: -1.0,
            scenario,
            verbose: false,
        }
    }

    /// Set the output interval (negative disables output).
    pub fn with_output_freq(mut self, output_freq: f64) -> Self {
        self.output_freq = output_freq;
        self
    }

    /// Enable or disable progress printing on the main rank.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nx_glob == 0 || self.nz_glob == 0 {
            return Err(ConfigError::NonPositiveExtent {
                nx_glob: self.nx_glob,
                nz_glob: self.nz_glob,
            });
        }
        if !(self.sim_time.is_finite() && self.sim_time > 0.0) {
            return Err(ConfigError::InvalidSimTime(self.sim_time));
        }
        if self.output_freq.is_nan() {
            return Err(ConfigError::InvalidOutputFreq);
        }
        Ok(())
    }

    /// Grid spacing in x (m).
    pub fn dx(&self) -> f64 {
        XLEN / self.nx_glob as f64
    }

    /// Grid spacing in z (m).
    pub fn dz(&self) -> f64 {
        ZLEN / self.nz_glob as f64
    }

    /// The fixed CFL-limited time step (s).
    pub fn dt(&self) -> f64 {
        self.dx().min(self.dz()) / MAX_SPEED * CFL
    }

    /// Whether file output is enabled.
    pub fn output_enabled(&self) -> bool {
        self.output_freq >= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_round_trip() {
        for id in [1, 2, 3, 5, 6] {
            let s = Scenario::from_data_spec(id).unwrap();
            assert_eq!(s.data_spec(), id);
        }
    }

    #[test]
    fn test_scenario_rejects_unassigned_ids() {
        for id in [0, 4, 7, -1] {
            assert!(matches!(
                Scenario::from_data_spec(id),
                Err(ConfigError::UnknownDataSpec(_))
            ));
        }
    }

    #[test]
    fn test_derived_spacing_and_dt() {
        let config = ModelConfig::new(100, 50, 2.0, Scenario::Thermal);
        assert!((config.dx() - 200.0).abs() < 1e-12);
        assert!((config.dz() - 200.0).abs() < 1e-12);
        // dt = min(dx, dz) / max_speed * cfl = 200 / 450 * 1.5
        assert!((config.dt() - 200.0 / 450.0 * 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_validate_rejects_bad_inputs() {
        let base = ModelConfig::new(100, 50, 2.0, Scenario::Thermal);

        let mut c = base.clone();
        c.nx_glob = 0;
        assert!(c.validate().is_err());

        let mut c = base.clone();
        c.sim_time = -1.0;
        assert!(c.validate().is_err());

        let mut c = base.clone();
        c.sim_time = f64::INFINITY;
        assert!(c.validate().is_err());

        let mut c = base.clone();
        c.output_freq = f64::NAN;
        assert!(c.validate().is_err());

        assert!(base.validate().is_ok());
    }
}
