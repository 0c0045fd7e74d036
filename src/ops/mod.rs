//! Tensor operations
//!
//! Operations are defined as traits that are implemented by `RuntimeClient`.
//! This gives operations access to the device, and through it to the
//! tiling configuration every launch is planned with.
//!
//! ```text
//! RuntimeClient<R>
//!   └── implements SortingOps<R>
//!         ├── sort, sort_with_indices, argsort   (radix sort)
//!         ├── sort_with_indices_into            (caller-allocated outputs)
//!         └── topk                              (radix select)
//! ```

#[cfg(feature = "cpu")]
mod cpu;
mod traits;

pub use traits::SortingOps;
