//! CPU client implementation

use super::device::CpuDevice;
use super::runtime::CpuRuntime;
use crate::runtime::RuntimeClient;
use crate::tiling::TilingConfig;

/// CPU client for operation dispatch
#[derive(Clone, Debug)]
pub struct CpuClient {
    pub(crate) device: CpuDevice,
}

impl CpuClient {
    /// Create a new CPU client
    pub fn new(device: CpuDevice) -> Self {
        Self { device }
    }

    /// Tiling configuration of the client's device
    pub fn config(&self) -> &TilingConfig {
        self.device.config()
    }
}

impl RuntimeClient<CpuRuntime> for CpuClient {
    fn device(&self) -> &CpuDevice {
        &self.device
    }

    fn synchronize(&self) {
        // Launches join their workers before returning, nothing to do
    }
}
