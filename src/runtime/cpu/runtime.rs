//! CPU runtime implementation

use super::client::CpuClient;
use super::device::CpuDevice;
use crate::error::{Error, Result};
use crate::runtime::Runtime;
use std::alloc::{Layout as AllocLayout, alloc_zeroed, dealloc};

/// Alignment of every host allocation (one cache line)
const ALIGN: usize = 64;

/// CPU compute runtime
///
/// Memory is allocated on the heap using the system allocator.
#[derive(Clone, Debug, Default)]
pub struct CpuRuntime;

impl Runtime for CpuRuntime {
    type Device = CpuDevice;
    type Client = CpuClient;

    fn name() -> &'static str {
        "cpu"
    }

    fn allocate(size_bytes: usize, _device: &Self::Device) -> Result<u64> {
        if size_bytes == 0 {
            return Ok(0);
        }

        let layout = AllocLayout::from_size_align(size_bytes, ALIGN)
            .map_err(|_| Error::OutOfMemory { size: size_bytes })?;

        let ptr = unsafe { alloc_zeroed(layout) };
        if ptr.is_null() {
            return Err(Error::OutOfMemory { size: size_bytes });
        }

        Ok(ptr as u64)
    }

    fn deallocate(ptr: u64, size_bytes: usize, _device: &Self::Device) {
        if ptr == 0 || size_bytes == 0 {
            return;
        }

        // The layout was valid when the block was allocated.
        if let Ok(layout) = AllocLayout::from_size_align(size_bytes, ALIGN) {
            unsafe {
                dealloc(ptr as *mut u8, layout);
            }
        }
    }

    fn copy_to_device(src: &[u8], dst: u64, _device: &Self::Device) -> Result<()> {
        if src.is_empty() || dst == 0 {
            return Ok(());
        }

        unsafe {
            std::ptr::copy_nonoverlapping(src.as_ptr(), dst as *mut u8, src.len());
        }
        Ok(())
    }

    fn copy_from_device(src: u64, dst: &mut [u8], _device: &Self::Device) -> Result<()> {
        if dst.is_empty() || src == 0 {
            return Ok(());
        }

        unsafe {
            std::ptr::copy_nonoverlapping(src as *const u8, dst.as_mut_ptr(), dst.len());
        }
        Ok(())
    }

    fn default_device() -> Self::Device {
        CpuDevice::new()
    }

    fn default_client(device: &Self::Device) -> Self::Client {
        CpuClient::new(device.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tensor::Tensor;

    #[test]
    fn test_allocate_zeroed_and_round_trip() {
        let device = CpuRuntime::default_device();
        let ptr = CpuRuntime::allocate(16, &device).unwrap();
        assert_ne!(ptr, 0);

        let mut out = [0xffu8; 16];
        CpuRuntime::copy_from_device(ptr, &mut out, &device).unwrap();
        assert_eq!(out, [0u8; 16]);

        CpuRuntime::copy_to_device(&[7u8; 16], ptr, &device).unwrap();
        CpuRuntime::copy_from_device(ptr, &mut out, &device).unwrap();
        assert_eq!(out, [7u8; 16]);

        CpuRuntime::deallocate(ptr, 16, &device);
    }

    #[test]
    fn test_zero_size_allocation_is_null() {
        let device = CpuDevice::new();
        assert_eq!(CpuRuntime::allocate(0, &device).unwrap(), 0);
    }

    #[test]
    fn test_tensor_storage_shared_on_clone() {
        let device = CpuDevice::new();
        let a = Tensor::<CpuRuntime>::from_slice(&[1.0f32, 2.0, 3.0], &[3], &device);
        assert!(a.storage().is_unique());
        let b = a.clone();
        assert!(!a.storage().is_unique());
        assert_eq!(b.to_vec::<f32>(), vec![1.0, 2.0, 3.0]);
    }
}
