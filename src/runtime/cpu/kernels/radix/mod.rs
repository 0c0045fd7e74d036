//! Tiled LSD radix sort and radix-select kernels
//!
//! Keys are twiddled into unsigned words, then sorted one 8-bit digit per
//! pass. Rows longer than a tile are split across workers that combine
//! their tile histograms with a decoupled look-back scan (or the two-phase
//! barrier scan) before scattering.

mod histogram;
mod index;
mod lookback;
mod scatter;
mod select;
mod shared;
mod sort;
mod twiddle;
mod workspace;

pub use histogram::TileHistogram;
pub use index::{CarriedIndex, OutputIndex, seed_indices};
pub use lookback::{BinRecord, LookbackTable, RecordWord};
pub use scatter::scatter_tile;
pub use select::{Threshold, find_boundary, select_rows};
pub use shared::SharedSlice;
pub use sort::sort_rows;
pub use twiddle::{RadixBits, RadixKey, twiddle, untwiddle};
pub use workspace::RowTotals;
