//! Sorting and top-k operations for CPU runtime

use super::helpers::{dispatch_index, dispatch_key, host_slice, host_slice_mut};
use super::{CpuClient, CpuRuntime, kernels};
use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::tensor::{Shape, Tensor};
use crate::tiling::{
    IndexWidth, OutputSpec, PresetIndices, SortRequest, TopkRequest, plan_sort, plan_topk,
};

/// Tensors read and written by one sort launch
struct SortOutputs<'a> {
    values: Option<&'a Tensor<CpuRuntime>>,
    indices: Option<&'a Tensor<CpuRuntime>>,
    presets: Option<&'a Tensor<CpuRuntime>>,
}

/// Plan and run one sort launch
fn radix_sort(
    client: &CpuClient,
    request: &SortRequest,
    a: &Tensor<CpuRuntime>,
    outputs: SortOutputs<'_>,
    op: &'static str,
) -> Result<()> {
    let plan = plan_sort(request, client.config())?;

    dispatch_key!(plan.dtype, K => {
        dispatch_index!(plan, I, O => {
            // SAFETY: dtypes were checked by the planner, and outputs never
            // share storage with the input or the presets.
            let (input, presets, values, indices) = unsafe {
                (
                    host_slice::<K>(a),
                    outputs.presets.map(|t| host_slice::<O>(t)),
                    outputs.values.map(|t| host_slice_mut::<K>(t)),
                    outputs.indices.map(|t| host_slice_mut::<O>(t)),
                )
            };
            let seeds = presets.map(kernels::seed_indices::<I, O>).transpose()?;
            kernels::sort_rows::<K, I, O>(&plan, input, seeds.as_deref(), values, indices)?;
        }, op);
    }, op);

    Ok(())
}

/// Sort tensor along a dimension (values only)
pub fn sort_impl(
    client: &CpuClient,
    a: &Tensor<CpuRuntime>,
    dim: isize,
    descending: bool,
) -> Result<Tensor<CpuRuntime>> {
    let request = SortRequest::new(a.shape(), a.dtype())
        .dim(dim)
        .descending(descending);
    let out = Tensor::<CpuRuntime>::try_empty(a.shape(), a.dtype(), &client.device)?;
    let outputs = SortOutputs {
        values: Some(&out),
        indices: None,
        presets: None,
    };
    radix_sort(client, &request, a, outputs, "sort")?;
    Ok(out)
}

/// Sort tensor along a dimension, returning both values and indices
pub fn sort_with_indices_impl(
    client: &CpuClient,
    a: &Tensor<CpuRuntime>,
    dim: isize,
    descending: bool,
    index_dtype: DType,
) -> Result<(Tensor<CpuRuntime>, Tensor<CpuRuntime>)> {
    let out_values = Tensor::<CpuRuntime>::try_empty(a.shape(), a.dtype(), &client.device)?;
    let out_indices = Tensor::<CpuRuntime>::try_empty(a.shape(), index_dtype, &client.device)?;
    let request = SortRequest::new(a.shape(), a.dtype())
        .dim(dim)
        .descending(descending)
        .index_dtype(index_dtype);
    let outputs = SortOutputs {
        values: Some(&out_values),
        indices: Some(&out_indices),
        presets: None,
    };
    radix_sort(client, &request, a, outputs, "sort_with_indices")?;
    Ok((out_values, out_indices))
}

/// Sort values while carrying caller-supplied indices
pub fn sort_with_preset_indices_impl(
    client: &CpuClient,
    a: &Tensor<CpuRuntime>,
    indices: &Tensor<CpuRuntime>,
    dim: isize,
    descending: bool,
) -> Result<(Tensor<CpuRuntime>, Tensor<CpuRuntime>)> {
    let request = SortRequest::new(a.shape(), a.dtype())
        .dim(dim)
        .descending(descending)
        .index_dtype(indices.dtype())
        .presets(PresetIndices {
            shape: indices.dims().clone(),
            dtype: indices.dtype(),
        });
    let out_values = Tensor::<CpuRuntime>::try_empty(a.shape(), a.dtype(), &client.device)?;
    let out_indices = Tensor::<CpuRuntime>::try_empty(a.shape(), indices.dtype(), &client.device)?;
    let outputs = SortOutputs {
        values: Some(&out_values),
        indices: Some(&out_indices),
        presets: Some(indices),
    };
    radix_sort(client, &request, a, outputs, "sort_with_preset_indices")?;
    Ok((out_values, out_indices))
}

/// Sort into caller-allocated value and index tensors
pub fn sort_with_indices_into_impl(
    client: &CpuClient,
    a: &Tensor<CpuRuntime>,
    dim: isize,
    descending: bool,
    values_out: &Tensor<CpuRuntime>,
    indices_out: &Tensor<CpuRuntime>,
) -> Result<()> {
    let shares_storage = |t: &Tensor<CpuRuntime>| {
        t.numel() > 0 && t.storage().ptr() == a.storage().ptr()
    };
    if shares_storage(values_out) || shares_storage(indices_out) {
        return Err(Error::invalid_argument(
            "out",
            "outputs must not share storage with the input",
        ));
    }
    if values_out.numel() > 0 && values_out.storage().ptr() == indices_out.storage().ptr() {
        return Err(Error::invalid_argument(
            "indices_out",
            "values and indices outputs must not share storage",
        ));
    }

    let request = SortRequest::new(a.shape(), a.dtype())
        .dim(dim)
        .descending(descending)
        .index_dtype(indices_out.dtype())
        .outputs(OutputSpec {
            values_shape: values_out.dims().clone(),
            values_dtype: values_out.dtype(),
            indices_shape: indices_out.dims().clone(),
            indices_dtype: indices_out.dtype(),
        });
    let outputs = SortOutputs {
        values: Some(values_out),
        indices: Some(indices_out),
        presets: None,
    };
    radix_sort(client, &request, a, outputs, "sort_with_indices_into")
}

/// Return indices that would sort the tensor
pub fn argsort_impl(
    client: &CpuClient,
    a: &Tensor<CpuRuntime>,
    dim: isize,
    descending: bool,
) -> Result<Tensor<CpuRuntime>> {
    let request = SortRequest::new(a.shape(), a.dtype())
        .dim(dim)
        .descending(descending);
    let out = Tensor::<CpuRuntime>::try_empty(a.shape(), DType::I64, &client.device)?;
    let outputs = SortOutputs {
        values: None,
        indices: Some(&out),
        presets: None,
    };
    radix_sort(client, &request, a, outputs, "argsort")?;
    Ok(out)
}

/// Return the top K values and their indices along a dimension
pub fn topk_impl(
    client: &CpuClient,
    a: &Tensor<CpuRuntime>,
    k: usize,
    dim: isize,
    largest: bool,
    sorted: bool,
    index_dtype: DType,
) -> Result<(Tensor<CpuRuntime>, Tensor<CpuRuntime>)> {
    let request = TopkRequest::new(a.shape(), a.dtype(), k)
        .dim(dim)
        .largest(largest)
        .sorted(sorted)
        .index_dtype(index_dtype);
    let plan = plan_topk(&request, client.config())?;
    let out_shape: Shape = plan.out_shape(a.dims());
    let out_values = Tensor::<CpuRuntime>::try_empty(&out_shape, a.dtype(), &client.device)?;
    let out_indices = Tensor::<CpuRuntime>::try_empty(&out_shape, index_dtype, &client.device)?;
    if plan.k == 0 {
        return Ok((out_values, out_indices));
    }

    let base = &plan.base;
    dispatch_key!(base.dtype, K => {
        dispatch_index!(base, I, O => {
            // SAFETY: dtypes were checked by the planner; outputs are fresh.
            let (input, values, indices) = unsafe {
                (
                    host_slice::<K>(a),
                    host_slice_mut::<K>(&out_values),
                    host_slice_mut::<O>(&out_indices),
                )
            };
            kernels::select_rows::<K, I, O>(&plan, client.config(), input, values, indices)?;
        }, "topk");
    }, "topk");

    Ok((out_values, out_indices))
}
