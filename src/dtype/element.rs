//! Element trait for mapping Rust types to DType

use super::DType;
use bytemuck::{Pod, Zeroable};
use std::fmt::Debug;

/// Trait for types that can be elements of a tensor
///
/// This trait connects Rust's type system to radixr's runtime dtype system.
///
/// # Bounds
/// - `Copy + Send + Sync + 'static` - elements cross worker threads by value
/// - `Pod + Zeroable` - safe memory transmutation (bytemuck)
/// - `PartialOrd + Debug` - comparisons and assertions in tests
pub trait Element:
    Copy + Clone + Send + Sync + Pod + Zeroable + 'static + PartialOrd + Debug
{
    /// The corresponding DType for this Rust type
    const DTYPE: DType;
}

macro_rules! impl_element {
    ($($ty:ty => $dtype:ident),* $(,)?) => {
        $(
            impl Element for $ty {
                const DTYPE: DType = DType::$dtype;
            }
        )*
    };
}

impl_element!(
    f64 => F64,
    f32 => F32,
    i64 => I64,
    i32 => I32,
    i16 => I16,
    i8 => I8,
    u64 => U64,
    u32 => U32,
    u16 => U16,
    u8 => U8,
);

// Note: bool doesn't implement Pod, so we can't implement Element for it directly.
// Boolean tensors are built from bytes with `Tensor::try_from_bytes`.

// ============================================================================
// Half-precision floating point types (requires "f16" feature)
// ============================================================================

#[cfg(feature = "f16")]
impl_element!(half::f16 => F16, half::bf16 => BF16);
