//! CPU runtime implementation
//!
//! The CPU runtime uses standard heap allocation. Multi-tile radix launches
//! run on scoped OS threads, one per worker of the plan; rows that fit a
//! single tile are spread over rayon's pool when the `rayon` feature is on.

mod client;
mod device;
mod helpers;
pub mod kernels;
mod runtime;
pub(crate) mod sort;

pub use crate::tensor::Tensor;
pub use client::CpuClient;
pub use device::CpuDevice;
pub use runtime::CpuRuntime;
