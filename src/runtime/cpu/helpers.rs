//! Helper functions for CPU sorting operations

use super::CpuRuntime;
use crate::dtype::Element;
use crate::tensor::Tensor;

// ============================================================================
// DType Dispatch Macros
// ============================================================================

/// Macro for key dtype dispatch to typed kernel calls
///
/// This macro matches on dtype and executes the code block with the appropriate type.
/// Usage: `dispatch_key!(dtype, K => { code using K }, "op_name")`
///
/// F16 and BF16 are supported when the "f16" feature is enabled. Bool keys,
/// and half-precision keys without the feature, return `UnsupportedDType`.
macro_rules! dispatch_key {
    ($dtype:expr, $K:ident => $body:block, $error_op:expr) => {
        match $dtype {
            DType::F64 => {
                type $K = f64;
                $body
            }
            DType::F32 => {
                type $K = f32;
                $body
            }
            DType::F16 => {
                #[cfg(feature = "f16")]
                {
                    type $K = half::f16;
                    $body
                }
                #[cfg(not(feature = "f16"))]
                {
                    return Err(Error::unsupported_dtype($dtype, $error_op));
                }
            }
            DType::BF16 => {
                #[cfg(feature = "f16")]
                {
                    type $K = half::bf16;
                    $body
                }
                #[cfg(not(feature = "f16"))]
                {
                    return Err(Error::unsupported_dtype($dtype, $error_op));
                }
            }
            DType::I64 => {
                type $K = i64;
                $body
            }
            DType::I32 => {
                type $K = i32;
                $body
            }
            DType::I16 => {
                type $K = i16;
                $body
            }
            DType::I8 => {
                type $K = i8;
                $body
            }
            DType::U64 => {
                type $K = u64;
                $body
            }
            DType::U32 => {
                type $K = u32;
                $body
            }
            DType::U16 => {
                type $K = u16;
                $body
            }
            DType::U8 => {
                type $K = u8;
                $body
            }
            DType::Bool => return Err(Error::unsupported_dtype($dtype, $error_op)),
        }
    };
}

/// Macro for index dispatch: carried index type `I` from the plan's index
/// width, output index type `O` from its index dtype
///
/// Usage: `dispatch_index!(plan, I, O => { code using I and O }, "op_name")`
macro_rules! dispatch_index {
    ($plan:expr, $I:ident, $O:ident => $body:block, $error_op:expr) => {
        match ($plan.index_width, $plan.index_dtype) {
            (IndexWidth::Narrow, DType::I32) => {
                type $I = u32;
                type $O = i32;
                $body
            }
            (IndexWidth::Narrow, DType::I64) => {
                type $I = u32;
                type $O = i64;
                $body
            }
            (IndexWidth::Wide, DType::I32) => {
                type $I = u64;
                type $O = i32;
                $body
            }
            (IndexWidth::Wide, DType::I64) => {
                type $I = u64;
                type $O = i64;
                $body
            }
            (_, dtype) => return Err(Error::unsupported_dtype(dtype, $error_op)),
        }
    };
}

pub(super) use {dispatch_index, dispatch_key};

// ============================================================================
// Host views
// ============================================================================

/// Borrow a tensor's elements
///
/// # Safety
/// The tensor's dtype is `T`.
#[inline]
pub(super) unsafe fn host_slice<T: Element>(tensor: &Tensor<CpuRuntime>) -> &[T] {
    let len = tensor.numel();
    if len == 0 {
        return &[];
    }
    unsafe { std::slice::from_raw_parts(tensor.storage().ptr() as *const T, len) }
}

/// Mutably borrow a tensor's elements
///
/// # Safety
/// The tensor's dtype is `T`, and no other view of its storage is alive
/// while the borrow is used.
#[allow(clippy::mut_from_ref)]
#[inline]
pub(super) unsafe fn host_slice_mut<T: Element>(tensor: &Tensor<CpuRuntime>) -> &mut [T] {
    let len = tensor.numel();
    if len == 0 {
        return &mut [];
    }
    unsafe { std::slice::from_raw_parts_mut(tensor.storage().ptr() as *mut T, len) }
}
