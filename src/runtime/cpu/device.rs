//! CPU device implementation

use crate::runtime::Device;
use crate::tiling::TilingConfig;

/// CPU device (there's only one: the host CPU)
///
/// The device carries the tiling configuration the planner uses for every
/// launch on it: worker count, scratchpad budget, tile override and scan
/// strategy.
#[derive(Clone, Debug, Default)]
pub struct CpuDevice {
    id: usize,
    config: TilingConfig,
}

impl CpuDevice {
    /// Create a new CPU device with the default tiling configuration
    pub fn new() -> Self {
        Self {
            id: 0,
            config: TilingConfig::default(),
        }
    }

    /// Create a CPU device with an explicit tiling configuration
    pub fn with_config(config: TilingConfig) -> Self {
        Self { id: 0, config }
    }

    /// Tiling configuration used for launches on this device
    pub fn config(&self) -> &TilingConfig {
        &self.config
    }
}

impl Device for CpuDevice {
    fn id(&self) -> usize {
        self.id
    }

    fn name(&self) -> String {
        "cpu".to_string()
    }
}
