//! CPU kernel implementations
//!
//! Kernels take validated plans and raw row-major buffers. All argument
//! checking happens before a kernel is called.

#![allow(unsafe_op_in_unsafe_fn)] // Kernels are already marked unsafe, inner unsafe is redundant

pub mod radix;

pub use radix::{seed_indices, select_rows, sort_rows};
