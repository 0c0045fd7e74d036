//! Tiling configuration

use crate::error::{Error, Result};

/// Default per-worker scratchpad budget in bytes
pub const DEFAULT_SCRATCHPAD_BYTES: usize = 192 * 1024;

/// How tiles of a row obtain their cross-tile exclusive prefix
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ScanStrategy {
    /// Lock-free chained scan: each tile publishes its aggregate and walks
    /// back over its predecessors' records until it meets a resolved prefix.
    ///
    /// Needs every worker to make independent progress, which the CPU
    /// backend provides by running each worker on its own OS thread.
    #[default]
    DecoupledLookBack,
    /// Barrier-based scan: all tiles publish, one worker per row resolves
    /// the chain serially, all tiles read back after a second barrier.
    TwoPhase,
}

/// Launch configuration consumed by the tiling planner
///
/// # Example
///
/// ```
/// use radixr::tiling::{ScanStrategy, TilingConfig};
///
/// let config = TilingConfig::default()
///     .with_workers(4)
///     .with_tile_elems(4096)
///     .with_scan(ScanStrategy::TwoPhase);
/// assert_eq!(config.workers, 4);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TilingConfig {
    /// Maximum number of concurrent workers per launch
    pub workers: usize,
    /// Per-worker on-chip budget used to size tiles
    pub scratchpad_bytes: usize,
    /// Fixed tile size, bypassing scratchpad-based sizing
    pub tile_elems: Option<usize>,
    /// Cross-tile scan strategy
    pub scan: ScanStrategy,
}

impl Default for TilingConfig {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism()
                .map(std::num::NonZero::get)
                .unwrap_or(1),
            scratchpad_bytes: DEFAULT_SCRATCHPAD_BYTES,
            tile_elems: None,
            scan: ScanStrategy::default(),
        }
    }
}

impl TilingConfig {
    /// Set the worker count
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the scratchpad budget
    pub fn with_scratchpad_bytes(mut self, bytes: usize) -> Self {
        self.scratchpad_bytes = bytes;
        self
    }

    /// Force a tile size
    pub fn with_tile_elems(mut self, tile_elems: usize) -> Self {
        self.tile_elems = Some(tile_elems);
        self
    }

    /// Set the scan strategy
    pub fn with_scan(mut self, scan: ScanStrategy) -> Self {
        self.scan = scan;
        self
    }

    /// Check the configuration can produce a plan
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::invalid_argument(
                "workers",
                "at least one worker is required",
            ));
        }
        if self.tile_elems == Some(0) {
            return Err(Error::invalid_argument(
                "tile_elems",
                "tile size must be positive",
            ));
        }
        Ok(())
    }
}
