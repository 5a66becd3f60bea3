//! # stratus-rs
//!
//! A finite-volume solver for dry, stratified, compressible,
//! non-hydrostatic flow on a two-dimensional (x, z) grid.
//!
//! The crate advances the Euler equations for density, horizontal and
//! vertical momentum, and density-weighted potential temperature, stored as
//! perturbations from an analytic hydrostatic background:
//! - fourth-order finite-volume interface reconstruction with
//!   hyper-viscous stabilization
//! - low-storage three-stage Runge-Kutta time integration with
//!   Strang-alternated dimensional splitting
//! - periodic x boundaries via two-cell halo exchange across a ring of
//!   ranks; rigid, reflective z boundaries
//! - five classic test scenarios (thermal, colliding thermals, density
//!   current, gravity waves, boundary injection)
//! - conservation diagnostics and optional NetCDF snapshot output
//!
//! Ranks are threads connected by message channels; the `parallel` feature
//! additionally parallelizes each rank's kernels with rayon.

pub mod comm;
pub mod config;
pub mod constants;
pub mod diagnostics;
pub mod error;
pub mod grid;
pub mod halo;
pub mod init;
pub mod io;
pub mod simulation;
pub mod state;
pub mod step;
pub mod tendencies;

// Re-export the main types for convenience
pub use comm::RingComm;
pub use config::{ModelConfig, Scenario};
pub use diagnostics::{local_totals, reduce_totals, ConservationTracker, Totals};
pub use error::{ConfigError, ModelError};
pub use grid::Grid;
pub use halo::{set_halo_z, HaloExchange};
pub use init::{
    hydro_const_bvfreq, hydro_const_theta, hydro_profiles, initial_state, sample_ellipse_cosine,
    PointSample,
};
pub use io::{local_snapshot, NetcdfWriter, NullSink, OutputError, OutputSink, Snapshot};
pub use simulation::{run_ensemble, RunSummary, Simulation};
pub use state::{FluxField, HydroProfiles, StateField, TendField};
pub use step::Direction;
pub use tendencies::{compute_tendencies_x, compute_tendencies_z};
#[cfg(feature = "parallel")]
pub use tendencies::{compute_tendencies_x_parallel, compute_tendencies_z_parallel};
