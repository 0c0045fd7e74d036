//! Operation traits for tensor operations.
//!
//! Implementations are in the backend-specific modules.

mod sorting;

pub use sorting::SortingOps;
