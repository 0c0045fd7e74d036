//! # radixr
//!
//! **Tiled multi-pass radix sort and radix-select for Rust tensors.**
//!
//! radixr sorts every row of a tensor along its innermost dimension with a
//! stable least-significant-digit radix sort, and selects the top K keys of
//! every row with radix-select. Long rows are split into tiles shared by
//! several workers, which combine their digit histograms with a lock-free
//! decoupled look-back scan.
//!
//! ## Features
//!
//! - **Sorting**: values, values with indices, indices only, ascending or descending
//! - **Top-k**: largest or smallest, sorted or in index order
//! - **Stable**: equal keys keep their input order, ties in top-k go to the lowest index
//! - **Keys**: i8..i64, u8..u64, f32, f64, and f16/bf16 behind the `f16` feature
//! - **Indices**: `I64` by default, `I32` on request
//!
//! ## Quick Start
//!
//! ```rust
//! use radixr::prelude::*;
//!
//! let device = CpuDevice::new();
//! let client = CpuRuntime::default_client(&device);
//!
//! let a = Tensor::<CpuRuntime>::from_slice(&[5i32, 3, 8, 1, 9, 2], &[2, 3], &device);
//! let (values, indices) = client.sort_with_indices(&a, -1, false)?;
//! assert_eq!(values.to_vec::<i32>(), vec![3, 5, 8, 1, 2, 9]);
//! assert_eq!(indices.to_vec::<i64>(), vec![1, 0, 2, 0, 2, 1]);
//!
//! let (top, at) = client.topk(&a, 1, -1, true, true)?;
//! assert_eq!(top.to_vec::<i32>(), vec![8, 9]);
//! assert_eq!(at.to_vec::<i64>(), vec![2, 1]);
//! # Ok::<(), radixr::error::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `cpu` (default): CPU backend
//! - `rayon` (default): Parallel single-tile rows
//! - `f16`: Half-precision keys (F16, BF16)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dtype;
pub mod error;
pub mod ops;
pub mod runtime;
pub mod tensor;
pub mod tiling;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::dtype::DType;
    pub use crate::error::{Error, Result};
    pub use crate::ops::SortingOps;
    pub use crate::runtime::{Device, Runtime, RuntimeClient};
    pub use crate::tensor::Tensor;
    pub use crate::tiling::{ScanStrategy, TilingConfig};

    #[cfg(feature = "cpu")]
    pub use crate::runtime::cpu::{CpuClient, CpuDevice, CpuRuntime};
}

/// Default runtime based on enabled features
#[cfg(feature = "cpu")]
pub type DefaultRuntime = runtime::cpu::CpuRuntime;
