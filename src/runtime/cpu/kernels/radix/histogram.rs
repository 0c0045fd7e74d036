//! Per-tile digit histograms

use super::twiddle::RadixBits;
use crate::tiling::BIN_NUM;

/// Independent counters used while counting, merged at the end
const LANES: usize = 4;

/// Digit frequencies of one tile and their exclusive scan
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileHistogram {
    /// Elements per digit
    pub counts: [usize; BIN_NUM],
    /// Elements with a smaller digit (`cumulative - counts`)
    pub offsets: [usize; BIN_NUM],
}

impl Default for TileHistogram {
    fn default() -> Self {
        Self {
            counts: [0; BIN_NUM],
            offsets: [0; BIN_NUM],
        }
    }
}

impl TileHistogram {
    /// Histogram of the digit of pass `pass` over `keys`
    pub fn build<B: RadixBits>(keys: &[B], pass: usize) -> Self {
        let mut lanes = [[0usize; BIN_NUM]; LANES];
        let mut chunks = keys.chunks_exact(LANES);
        for chunk in &mut chunks {
            for (lane, key) in chunk.iter().enumerate() {
                lanes[lane][key.digit(pass)] += 1;
            }
        }
        for key in chunks.remainder() {
            lanes[0][key.digit(pass)] += 1;
        }

        let mut hist = Self::default();
        for bin in 0..BIN_NUM {
            hist.counts[bin] = lanes.iter().map(|lane| lane[bin]).sum();
        }
        hist.scan();
        hist
    }

    /// Recompute `offsets` from `counts`
    pub fn scan(&mut self) {
        let mut running = 0;
        for bin in 0..BIN_NUM {
            self.offsets[bin] = running;
            running += self.counts[bin];
        }
    }

    /// Inclusive scan over bins
    pub fn cumulative(&self) -> [usize; BIN_NUM] {
        let mut out = [0; BIN_NUM];
        for (bin, o) in out.iter_mut().enumerate() {
            *o = self.offsets[bin] + self.counts[bin];
        }
        out
    }

    /// Elements counted
    pub fn total(&self) -> usize {
        self.offsets[BIN_NUM - 1] + self.counts[BIN_NUM - 1]
    }
}
