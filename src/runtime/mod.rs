//! Runtime backends for tensor computation
//!
//! This module defines the `Runtime` trait and the CPU backend that hosts the
//! radix sort / radix-select engine.
//!
//! # Architecture
//!
//! ```text
//! Runtime (backend identity, memory movement)
//! ├── Device (identifies a compute unit and carries its tiling configuration)
//! └── Client (dispatches operations)
//! ```

#[cfg(feature = "cpu")]
pub mod cpu;

use crate::error::{Error, Result};

/// Core trait for compute backends
///
/// `Runtime` abstracts over compute devices. It uses static dispatch via
/// generics, so a tensor is always tied to one backend at compile time.
///
/// # Example
///
/// ```ignore
/// let device = CpuRuntime::default_device();
/// let ptr = CpuRuntime::allocate(1024, &device)?;
/// // ... use memory ...
/// CpuRuntime::deallocate(ptr, 1024, &device);
/// ```
pub trait Runtime: Clone + Send + Sync + 'static {
    /// Device identifier type
    type Device: Device;

    /// Client for dispatching operations
    type Client: RuntimeClient<Self>;

    /// Human-readable name of this runtime
    fn name() -> &'static str;

    /// Allocate zeroed device memory
    ///
    /// Returns a device pointer (u64) that can be used for operations.
    /// Returns `Err(OutOfMemory)` if allocation fails.
    fn allocate(size_bytes: usize, device: &Self::Device) -> Result<u64>;

    /// Deallocate device memory
    fn deallocate(ptr: u64, size_bytes: usize, device: &Self::Device);

    /// Copy data from host to device
    fn copy_to_device(src: &[u8], dst: u64, device: &Self::Device) -> Result<()>;

    /// Copy data from device to host
    fn copy_from_device(src: u64, dst: &mut [u8], device: &Self::Device) -> Result<()>;

    /// Get the default device
    fn default_device() -> Self::Device;

    /// Get the default client for a device
    fn default_client(device: &Self::Device) -> Self::Client;
}

/// Trait for device identification
pub trait Device: Clone + Send + Sync + 'static {
    /// Unique identifier for this device
    fn id(&self) -> usize;

    /// Check if two devices are the same
    fn is_same(&self, other: &Self) -> bool {
        self.id() == other.id()
    }

    /// Human-readable name
    fn name(&self) -> String {
        format!("Device({})", self.id())
    }
}

/// Trait for runtime clients that handle operation dispatch
pub trait RuntimeClient<R: Runtime>: Clone + Send + Sync {
    /// Get the device this client operates on
    fn device(&self) -> &R::Device;

    /// Synchronize: wait for all pending operations to complete
    fn synchronize(&self);
}

/// Normalize a possibly negative dimension index against `ndim`.
pub fn normalize_dim(dim: isize, ndim: usize) -> Result<usize> {
    let idx = if dim < 0 { ndim as isize + dim } else { dim };
    if idx < 0 || idx as usize >= ndim {
        return Err(Error::InvalidDimension { dim, ndim });
    }
    Ok(idx as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_dim() {
        assert_eq!(normalize_dim(0, 2).unwrap(), 0);
        assert_eq!(normalize_dim(-1, 2).unwrap(), 1);
        assert_eq!(normalize_dim(-2, 2).unwrap(), 0);
        assert!(matches!(
            normalize_dim(2, 2),
            Err(Error::InvalidDimension { dim: 2, ndim: 2 })
        ));
        assert!(normalize_dim(-3, 2).is_err());
        assert!(normalize_dim(0, 0).is_err());
    }
}
