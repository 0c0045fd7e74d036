//! Tensor types
//!
//! This module provides the core `Tensor` type, an n-dimensional contiguous
//! array stored on a compute device.

mod core;
mod shape;
mod storage;

pub use core::Tensor;
pub use shape::Shape;
pub use storage::Storage;
