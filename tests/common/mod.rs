//! Common test utilities
#![allow(dead_code)]

use radixr::runtime::Runtime;
use radixr::runtime::cpu::{CpuClient, CpuDevice, CpuRuntime};
use radixr::tiling::{ScanStrategy, TilingConfig};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Create a CPU client and device for testing
pub fn create_cpu_client() -> (CpuClient, CpuDevice) {
    let device = CpuDevice::new();
    let client = CpuRuntime::default_client(&device);
    (client, device)
}

/// Create a CPU client and device with an explicit tiling configuration
pub fn client_with(config: TilingConfig) -> (CpuClient, CpuDevice) {
    let device = CpuDevice::with_config(config);
    let client = CpuRuntime::default_client(&device);
    (client, device)
}

/// Multi-tile configuration: `workers` threads, fixed `tile` size
pub fn tiled(workers: usize, tile: usize, scan: ScanStrategy) -> TilingConfig {
    TilingConfig::default()
        .with_workers(workers)
        .with_tile_elems(tile)
        .with_scan(scan)
}

/// Both scan strategies, for tests that must agree across them
pub const SCANS: [ScanStrategy; 2] = [ScanStrategy::DecoupledLookBack, ScanStrategy::TwoPhase];

/// Seeded RNG for reproducible inputs
pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Install a fmt subscriber honouring `RUST_LOG`, once per test binary
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Stable reference argsort of every row of a row-major buffer
///
/// Keys are compared with `partial_cmp`, so inputs must not contain NaN.
pub fn reference_argsort<T: PartialOrd + Copy>(data: &[T], axis: usize, descending: bool) -> Vec<i64> {
    let mut out = Vec::with_capacity(data.len());
    for row in data.chunks(axis) {
        let mut order: Vec<usize> = (0..row.len()).collect();
        order.sort_by(|&a, &b| {
            let ord = row[a].partial_cmp(&row[b]).expect("NaN in reference input");
            if descending { ord.reverse() } else { ord }
        });
        out.extend(order.into_iter().map(|i| i as i64));
    }
    out
}

/// Gather `data` by per-row indices
pub fn take_rows<T: Copy>(data: &[T], axis: usize, indices: &[i64], out_axis: usize) -> Vec<T> {
    indices
        .chunks(out_axis)
        .enumerate()
        .flat_map(|(row, idx)| idx.iter().map(move |&i| data[row * axis + i as usize]))
        .collect()
}

/// Reference top-k indices: stable sort, first `k` of each row
pub fn reference_topk<T: PartialOrd + Copy>(
    data: &[T],
    axis: usize,
    k: usize,
    largest: bool,
) -> Vec<i64> {
    reference_argsort(data, axis, largest)
        .chunks(axis)
        .flat_map(|row| row[..k].to_vec())
        .collect()
}
