//! Error types for model setup and execution.
//!
//! Startup problems (bad extents, unknown scenario id, impossible rank
//! layout) surface as [`ConfigError`] before any state is allocated.
//! Everything that can go wrong while a run is in flight folds into
//! [`ModelError`].

use thiserror::Error;

use crate::io::OutputError;

/// A rejected run configuration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// Grid extents must both be at least one cell.
    #[error("grid extents must be positive, got nx_glob={nx_glob}, nz_glob={nz_glob}")]
    NonPositiveExtent { nx_glob: usize, nz_glob: usize },

    /// Unknown scenario id on the command line.
    #[error(
        "unknown data_spec {0} (valid: 1=collision, 2=thermal, 3=gravity_waves, \
         5=density_current, 6=injection)"
    )]
    UnknownDataSpec(i64),

    /// Simulation length must be a positive finite number of seconds.
    #[error("sim_time must be positive and finite, got {0}")]
    InvalidSimTime(f64),

    /// A NaN output interval can never trigger or disable output.
    #[error("output_freq must not be NaN")]
    InvalidOutputFreq,

    /// More ranks than columns leaves at least one rank without cells.
    #[error("cannot split nx_glob={nx_glob} columns across {nranks} ranks")]
    RankLayout { nx_glob: usize, nranks: usize },
}

/// Any failure during setup or the time loop.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Invalid configuration, detected at startup.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The output writer failed.
    #[error("output error: {0}")]
    Output(#[from] OutputError),

    /// A neighbor rank went away mid-exchange.
    #[error("halo exchange failed: {0}")]
    Exchange(String),

    /// Another rank requested a cooperative shutdown.
    #[error("run aborted: {0}")]
    Aborted(String),
}
