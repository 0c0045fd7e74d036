//! Core Tensor type

use super::{Shape, Storage};
use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use crate::runtime::Runtime;
use std::fmt;

/// N-dimensional array stored on a compute device
///
/// `Tensor` consists of:
/// - **Storage**: Reference-counted device memory
/// - **Shape**: Row-major dimensions; the innermost one is the sort axis
/// - **DType**: Element type (determined at runtime)
///
/// Tensors are always contiguous. Cloning shares the storage.
///
/// # Example
///
/// ```ignore
/// use radixr::prelude::*;
///
/// let device = CpuDevice::new();
/// let a = Tensor::<CpuRuntime>::from_slice(&[3i32, 1, 2, 4], &[2, 2], &device);
/// assert_eq!(a.shape(), &[2, 2]);
/// ```
pub struct Tensor<R: Runtime> {
    /// Device memory
    storage: Storage<R>,
    /// Dimensions
    shape: Shape,
}

impl<R: Runtime> Tensor<R> {
    /// Create a tensor from a slice of data
    ///
    /// # Panics
    ///
    /// Panics if `data.len()` does not equal the product of the `shape` dimensions.
    /// For a fallible alternative, use [`Self::try_from_slice`].
    pub fn from_slice<T: Element>(data: &[T], shape: &[usize], device: &R::Device) -> Self {
        Self::try_from_slice(data, shape, device).expect("Tensor::from_slice failed")
    }

    /// Create a tensor from a slice of data (fallible version)
    ///
    /// Returns an error if `data.len()` does not equal the product of the `shape` dimensions,
    /// or if memory allocation fails.
    pub fn try_from_slice<T: Element>(
        data: &[T],
        shape: &[usize],
        device: &R::Device,
    ) -> Result<Self> {
        let expected_len: usize = shape.iter().product();
        if data.len() != expected_len {
            return Err(Error::ShapeMismatch {
                expected: shape.to_vec(),
                got: vec![data.len()],
            });
        }

        Ok(Self {
            storage: Storage::from_slice(data, device)?,
            shape: Shape::from(shape),
        })
    }

    /// Create a tensor from raw bytes with an explicit dtype
    pub fn try_from_bytes(
        data: &[u8],
        shape: &[usize],
        dtype: DType,
        device: &R::Device,
    ) -> Result<Self> {
        let expected_len: usize = shape.iter().product::<usize>() * dtype.size_in_bytes();
        if data.len() != expected_len {
            return Err(Error::ShapeMismatch {
                expected: shape.to_vec(),
                got: vec![data.len() / dtype.size_in_bytes()],
            });
        }

        Ok(Self {
            storage: Storage::from_bytes(data, dtype, device)?,
            shape: Shape::from(shape),
        })
    }

    /// Create a zero-filled tensor
    ///
    /// # Panics
    ///
    /// Panics if allocation fails. See [`Self::try_empty`].
    pub fn empty(shape: &[usize], dtype: DType, device: &R::Device) -> Self {
        Self::try_empty(shape, dtype, device).expect("Tensor::empty failed")
    }

    /// Create a zero-filled tensor (fallible version)
    pub fn try_empty(shape: &[usize], dtype: DType, device: &R::Device) -> Result<Self> {
        let len: usize = shape.iter().product();
        Ok(Self {
            storage: Storage::new(len, dtype, device)?,
            shape: Shape::from(shape),
        })
    }

    /// Dimensions of the tensor
    #[inline]
    pub fn shape(&self) -> &[usize] {
        self.shape.as_slice()
    }

    /// Dimensions as a [`Shape`]
    #[inline]
    pub fn dims(&self) -> &Shape {
        &self.shape
    }

    /// Number of dimensions
    #[inline]
    pub fn ndim(&self) -> usize {
        self.shape.ndim()
    }

    /// Total number of elements
    #[inline]
    pub fn numel(&self) -> usize {
        self.shape.numel()
    }

    /// Element type
    #[inline]
    pub fn dtype(&self) -> DType {
        self.storage.dtype()
    }

    /// Device holding the data
    #[inline]
    pub fn device(&self) -> &R::Device {
        self.storage.device()
    }

    /// Underlying storage
    #[inline]
    pub fn storage(&self) -> &Storage<R> {
        &self.storage
    }

    /// Copy the data to the host
    ///
    /// # Panics
    ///
    /// Panics if the device copy fails. See [`Self::try_to_vec`].
    pub fn to_vec<T: bytemuck::Pod>(&self) -> Vec<T> {
        self.try_to_vec().expect("Tensor::to_vec failed")
    }

    /// Copy the data to the host (fallible version)
    pub fn try_to_vec<T: bytemuck::Pod>(&self) -> Result<Vec<T>> {
        self.storage.try_to_vec()
    }
}

impl<R: Runtime> Clone for Tensor<R> {
    fn clone(&self) -> Self {
        Self {
            storage: self.storage.clone(),
            shape: self.shape.clone(),
        }
    }
}

impl<R: Runtime> fmt::Debug for Tensor<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tensor")
            .field("shape", &self.shape)
            .field("dtype", &self.dtype())
            .field("storage", &self.storage)
            .finish()
    }
}
