//! Sorting and top-k operations trait.

use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::runtime::Runtime;
use crate::tensor::Tensor;

/// Sorting and selection operations trait
///
/// Sorts run along the innermost dimension with a stable LSD radix sort;
/// top-k uses radix-select. Indices are `I64` unless an `_as` variant asks
/// for `I32`.
pub trait SortingOps<R: Runtime> {
    /// Sort tensor along a dimension.
    ///
    /// Returns the sorted values. For both values and indices, use `sort_with_indices`.
    ///
    /// # Arguments
    ///
    /// * `a` - Input tensor
    /// * `dim` - Dimension along which to sort (supports negative indexing, must be the last)
    /// * `descending` - If true, sort in descending order
    ///
    /// # Returns
    ///
    /// Tensor with same shape as input, containing sorted values along the specified dimension.
    /// `-0.0` is returned as `+0.0`.
    ///
    /// # Example
    ///
    /// ```
    /// # use radixr::prelude::*;
    /// # use radixr::ops::SortingOps;
    /// # let device = CpuDevice::new();
    /// # let client = CpuRuntime::default_client(&device);
    /// let a = Tensor::<CpuRuntime>::from_slice(&[3.0f32, 1.0, 4.0, 1.0, 5.0], &[5], &device);
    /// let sorted = client.sort(&a, 0, false)?;
    /// assert_eq!(sorted.to_vec::<f32>(), vec![1.0, 1.0, 3.0, 4.0, 5.0]);
    /// # Ok::<(), radixr::error::Error>(())
    /// ```
    fn sort(&self, a: &Tensor<R>, dim: isize, descending: bool) -> Result<Tensor<R>> {
        let _ = (a, dim, descending);
        Err(Error::NotImplemented {
            feature: "SortingOps::sort",
        })
    }

    /// Sort tensor along a dimension, returning both sorted values and indices.
    ///
    /// The sort is stable: equal keys keep their input order.
    ///
    /// # Arguments
    ///
    /// * `a` - Input tensor
    /// * `dim` - Dimension along which to sort (supports negative indexing, must be the last)
    /// * `descending` - If true, sort in descending order
    ///
    /// # Returns
    ///
    /// Tuple of (sorted_values, indices) where:
    /// - `sorted_values`: Tensor with same shape and dtype as input, containing sorted values
    /// - `indices`: I64 tensor with same shape, containing original indices
    ///
    /// # Example
    ///
    /// ```
    /// # use radixr::prelude::*;
    /// # use radixr::ops::SortingOps;
    /// # let device = CpuDevice::new();
    /// # let client = CpuRuntime::default_client(&device);
    /// let a = Tensor::<CpuRuntime>::from_slice(&[3.0f32, 1.0, 4.0], &[3], &device);
    /// let (values, indices) = client.sort_with_indices(&a, 0, false)?;
    /// assert_eq!(values.to_vec::<f32>(), vec![1.0, 3.0, 4.0]);
    /// assert_eq!(indices.to_vec::<i64>(), vec![1, 0, 2]);
    /// # Ok::<(), radixr::error::Error>(())
    /// ```
    fn sort_with_indices(
        &self,
        a: &Tensor<R>,
        dim: isize,
        descending: bool,
    ) -> Result<(Tensor<R>, Tensor<R>)> {
        self.sort_with_indices_as(a, dim, descending, DType::I64)
    }

    /// Like [`SortingOps::sort_with_indices`], with an explicit `I32` or `I64`
    /// index dtype.
    ///
    /// # Errors
    ///
    /// `UnsupportedDType` for any other index dtype; `InvalidArgument` for
    /// `I32` indices on an axis longer than `i32::MAX`.
    fn sort_with_indices_as(
        &self,
        a: &Tensor<R>,
        dim: isize,
        descending: bool,
        index_dtype: DType,
    ) -> Result<(Tensor<R>, Tensor<R>)> {
        let _ = (a, dim, descending, index_dtype);
        Err(Error::NotImplemented {
            feature: "SortingOps::sort_with_indices_as",
        })
    }

    /// Sort into caller-allocated tensors.
    ///
    /// `values_out` must match the input's shape and dtype; `indices_out`
    /// must match its shape, with an `I32` or `I64` dtype. Neither may share
    /// storage with the input or with each other.
    ///
    /// # Example
    ///
    /// ```
    /// # use radixr::prelude::*;
    /// # use radixr::ops::SortingOps;
    /// # let device = CpuDevice::new();
    /// # let client = CpuRuntime::default_client(&device);
    /// let a = Tensor::<CpuRuntime>::from_slice(&[2i32, -1, 7], &[3], &device);
    /// let values = Tensor::<CpuRuntime>::empty(&[3], DType::I32, &device);
    /// let indices = Tensor::<CpuRuntime>::empty(&[3], DType::I32, &device);
    /// client.sort_with_indices_into(&a, -1, true, &values, &indices)?;
    /// assert_eq!(values.to_vec::<i32>(), vec![7, 2, -1]);
    /// assert_eq!(indices.to_vec::<i32>(), vec![2, 0, 1]);
    /// # Ok::<(), radixr::error::Error>(())
    /// ```
    fn sort_with_indices_into(
        &self,
        a: &Tensor<R>,
        dim: isize,
        descending: bool,
        values_out: &Tensor<R>,
        indices_out: &Tensor<R>,
    ) -> Result<()> {
        let _ = (a, dim, descending, values_out, indices_out);
        Err(Error::NotImplemented {
            feature: "SortingOps::sort_with_indices_into",
        })
    }

    /// Sort tensor along a dimension, carrying caller-supplied indices.
    ///
    /// Each key travels with the preset index at the same position, so the
    /// returned indices are `indices` permuted into sorted order. The sort is
    /// stable: equal keys keep the input order of their presets. Preset
    /// values are carried as-is and need not be positions.
    ///
    /// # Arguments
    ///
    /// * `a` - Input tensor
    /// * `indices` - `I32` or `I64` tensor with the same shape as `a`
    /// * `dim` - Dimension along which to sort (must be the last)
    /// * `descending` - If true, sort in descending order
    ///
    /// # Returns
    ///
    /// Tuple of (sorted_values, permuted_indices); the indices keep the
    /// dtype of `indices`.
    ///
    /// # Example
    ///
    /// ```
    /// # use radixr::prelude::*;
    /// # use radixr::ops::SortingOps;
    /// # let device = CpuDevice::new();
    /// # let client = CpuRuntime::default_client(&device);
    /// let a = Tensor::<CpuRuntime>::from_slice(&[3u8, 1, 2], &[3], &device);
    /// let ids = Tensor::<CpuRuntime>::from_slice(&[30i32, 10, 20], &[3], &device);
    /// let (values, indices) = client.sort_with_preset_indices(&a, &ids, -1, false)?;
    /// assert_eq!(values.to_vec::<u8>(), vec![1, 2, 3]);
    /// assert_eq!(indices.to_vec::<i32>(), vec![10, 20, 30]);
    /// # Ok::<(), radixr::error::Error>(())
    /// ```
    fn sort_with_preset_indices(
        &self,
        a: &Tensor<R>,
        indices: &Tensor<R>,
        dim: isize,
        descending: bool,
    ) -> Result<(Tensor<R>, Tensor<R>)> {
        let _ = (a, indices, dim, descending);
        Err(Error::NotImplemented {
            feature: "SortingOps::sort_with_preset_indices",
        })
    }

    /// Return indices that would sort the tensor along a dimension.
    ///
    /// Equivalent to `sort_with_indices(...).1`, but skips writing the values.
    ///
    /// # Arguments
    ///
    /// * `a` - Input tensor
    /// * `dim` - Dimension along which to compute sort indices (must be the last)
    /// * `descending` - If true, return indices for descending order
    ///
    /// # Returns
    ///
    /// I64 tensor with same shape as input, containing indices that would sort the tensor.
    ///
    /// # Example
    ///
    /// ```
    /// # use radixr::prelude::*;
    /// # use radixr::ops::SortingOps;
    /// # let device = CpuDevice::new();
    /// # let client = CpuRuntime::default_client(&device);
    /// let a = Tensor::<CpuRuntime>::from_slice(&[3.0f32, 1.0, 4.0], &[3], &device);
    /// let indices = client.argsort(&a, 0, false)?;
    /// assert_eq!(indices.to_vec::<i64>(), vec![1, 0, 2]);
    /// # Ok::<(), radixr::error::Error>(())
    /// ```
    fn argsort(&self, a: &Tensor<R>, dim: isize, descending: bool) -> Result<Tensor<R>> {
        let _ = (a, dim, descending);
        Err(Error::NotImplemented {
            feature: "SortingOps::argsort",
        })
    }

    /// Return top K largest (or smallest) values and their indices along a dimension.
    ///
    /// # Arguments
    ///
    /// * `a` - Input tensor
    /// * `k` - Number of top elements to return, clamped to the dimension size
    /// * `dim` - Dimension along which to find top-k (must be the last)
    /// * `largest` - If true, return largest elements; if false, return smallest
    /// * `sorted` - If true, return in sorted order; if false, in ascending index order
    ///
    /// # Returns
    ///
    /// Tuple of (values, indices) where:
    /// - `values`: Tensor with shape [..., k] (dim replaced with k), same dtype as input
    /// - `indices`: I64 tensor with same shape as values, containing original indices
    ///
    /// Among equal keys at the boundary the lowest indices win.
    ///
    /// # Example
    ///
    /// ```
    /// # use radixr::prelude::*;
    /// # use radixr::ops::SortingOps;
    /// # let device = CpuDevice::new();
    /// # let client = CpuRuntime::default_client(&device);
    /// let a = Tensor::<CpuRuntime>::from_slice(&[3.0f32, 1.0, 4.0, 1.0, 5.0], &[5], &device);
    /// let (values, indices) = client.topk(&a, 2, 0, true, true)?;
    /// assert_eq!(values.to_vec::<f32>(), vec![5.0, 4.0]);
    /// assert_eq!(indices.to_vec::<i64>(), vec![4, 2]);
    /// # Ok::<(), radixr::error::Error>(())
    /// ```
    fn topk(
        &self,
        a: &Tensor<R>,
        k: usize,
        dim: isize,
        largest: bool,
        sorted: bool,
    ) -> Result<(Tensor<R>, Tensor<R>)> {
        self.topk_as(a, k, dim, largest, sorted, DType::I64)
    }

    /// Like [`SortingOps::topk`], with an explicit `I32` or `I64` index dtype.
    fn topk_as(
        &self,
        a: &Tensor<R>,
        k: usize,
        dim: isize,
        largest: bool,
        sorted: bool,
        index_dtype: DType,
    ) -> Result<(Tensor<R>, Tensor<R>)> {
        let _ = (a, k, dim, largest, sorted, index_dtype);
        Err(Error::NotImplemented {
            feature: "SortingOps::topk_as",
        })
    }
}
