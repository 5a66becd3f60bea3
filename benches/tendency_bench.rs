//! Benchmarks for the directional flux/tendency kernels.
//!
//! Run with: `cargo bench --bench tendency_bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use stratus_rs::{
    compute_tendencies_x, compute_tendencies_z, hydro_profiles, initial_state, set_halo_z, Grid,
    HaloExchange, ModelConfig, RingComm, Scenario,
};

fn setup(
    nx: usize,
    nz: usize,
) -> (
    Grid,
    stratus_rs::HydroProfiles,
    stratus_rs::StateField,
    stratus_rs::FluxField,
    stratus_rs::TendField,
) {
    let config = ModelConfig::new(nx, nz, 1.0, Scenario::Collision);
    let grid = Grid::decompose(&config, 0, 1).unwrap();
    let profiles = hydro_profiles(Scenario::Collision, &grid);
    let mut state = initial_state(Scenario::Collision, &grid);

    let comm = RingComm::single();
    let mut halo = HaloExchange::new(grid.nz);
    halo.exchange_x(&mut state, &comm, &profiles, &grid, Scenario::Collision)
        .unwrap();
    set_halo_z(&mut state, &profiles, &grid);

    let flux = stratus_rs::FluxField::new(grid.nx, grid.nz);
    let tend = stratus_rs::TendField::new(grid.nx, grid.nz);
    (grid, profiles, state, flux, tend)
}

fn bench_kernels(c: &mut Criterion) {
    let mut group = c.benchmark_group("tendencies");

    for &(nx, nz) in &[(100usize, 50usize), (400, 200)] {
        let (grid, profiles, state, mut flux, mut tend) = setup(nx, nz);
        let dt = ModelConfig::new(nx, nz, 1.0, Scenario::Collision).dt();

        group.bench_with_input(BenchmarkId::new("x", format!("{nx}x{nz}")), &nx, |b, _| {
            b.iter(|| {
                compute_tendencies_x(
                    black_box(&state),
                    &mut flux,
                    &mut tend,
                    &profiles,
                    &grid,
                    dt,
                );
            })
        });

        group.bench_with_input(BenchmarkId::new("z", format!("{nx}x{nz}")), &nx, |b, _| {
            b.iter(|| {
                compute_tendencies_z(
                    black_box(&state),
                    &mut flux,
                    &mut tend,
                    &profiles,
                    &grid,
                    dt,
                );
            })
        });

        #[cfg(feature = "parallel")]
        group.bench_with_input(
            BenchmarkId::new("x_parallel", format!("{nx}x{nz}")),
            &nx,
            |b, _| {
                b.iter(|| {
                    stratus_rs::compute_tendencies_x_parallel(
                        black_box(&state),
                        &mut flux,
                        &mut tend,
                        &profiles,
                        &grid,
                        dt,
                    );
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_kernels);
criterion_main!(benches);
