//! CPU implementation of sorting operations.

use crate::dtype::DType;
use crate::error::Result;
use crate::ops::SortingOps;
use crate::runtime::cpu::{CpuClient, CpuRuntime};
use crate::tensor::Tensor;

/// SortingOps implementation for CPU runtime.
impl SortingOps<CpuRuntime> for CpuClient {
    fn sort(
        &self,
        a: &Tensor<CpuRuntime>,
        dim: isize,
        descending: bool,
    ) -> Result<Tensor<CpuRuntime>> {
        crate::runtime::cpu::sort::sort_impl(self, a, dim, descending)
    }

    fn sort_with_indices_as(
        &self,
        a: &Tensor<CpuRuntime>,
        dim: isize,
        descending: bool,
        index_dtype: DType,
    ) -> Result<(Tensor<CpuRuntime>, Tensor<CpuRuntime>)> {
        crate::runtime::cpu::sort::sort_with_indices_impl(self, a, dim, descending, index_dtype)
    }

    fn sort_with_indices_into(
        &self,
        a: &Tensor<CpuRuntime>,
        dim: isize,
        descending: bool,
        values_out: &Tensor<CpuRuntime>,
        indices_out: &Tensor<CpuRuntime>,
    ) -> Result<()> {
        crate::runtime::cpu::sort::sort_with_indices_into_impl(
            self,
            a,
            dim,
            descending,
            values_out,
            indices_out,
        )
    }

    fn sort_with_preset_indices(
        &self,
        a: &Tensor<CpuRuntime>,
        indices: &Tensor<CpuRuntime>,
        dim: isize,
        descending: bool,
    ) -> Result<(Tensor<CpuRuntime>, Tensor<CpuRuntime>)> {
        crate::runtime::cpu::sort::sort_with_preset_indices_impl(self, a, indices, dim, descending)
    }

    fn argsort(
        &self,
        a: &Tensor<CpuRuntime>,
        dim: isize,
        descending: bool,
    ) -> Result<Tensor<CpuRuntime>> {
        crate::runtime::cpu::sort::argsort_impl(self, a, dim, descending)
    }

    fn topk_as(
        &self,
        a: &Tensor<CpuRuntime>,
        k: usize,
        dim: isize,
        largest: bool,
        sorted: bool,
        index_dtype: DType,
    ) -> Result<(Tensor<CpuRuntime>, Tensor<CpuRuntime>)> {
        crate::runtime::cpu::sort::topk_impl(self, a, k, dim, largest, sorted, index_dtype)
    }
}
