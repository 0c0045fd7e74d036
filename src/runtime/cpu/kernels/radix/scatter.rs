//! Stable scatter of one tile into the alternate buffers

use super::index::CarriedIndex;
use super::shared::SharedSlice;
use super::twiddle::RadixBits;
use crate::tiling::BIN_NUM;

/// Scatter a tile's keys and carried indices by the digit of pass `pass`
///
/// `bases[d]` is the destination of the tile's first element with digit
/// `d`: the row's exclusive bin base plus the counts of digit `d` in lower
/// tiles. Elements with equal digits keep their order.
///
/// # Arguments
/// * `keys` - Twiddled keys of the tile
/// * `indices` - Carried indices of the tile, same length as `keys`
/// * `pass` - Digit pass
/// * `bases` - First destination per digit
/// * `dst_keys` / `dst_indices` - Alternate buffers of the row
///
/// # Safety
/// Every destination `bases[d] .. bases[d] + count(d)` must be in bounds and
/// written by no other tile of the pass.
pub unsafe fn scatter_tile<B: RadixBits, I: CarriedIndex>(
    keys: &[B],
    indices: &[I],
    pass: usize,
    bases: &[usize; BIN_NUM],
    dst_keys: SharedSlice<'_, B>,
    dst_indices: SharedSlice<'_, I>,
) {
    debug_assert_eq!(keys.len(), indices.len());
    let mut next = *bases;
    for (&key, &index) in keys.iter().zip(indices) {
        let slot = &mut next[key.digit(pass)];
        dst_keys.write(*slot, key);
        dst_indices.write(*slot, index);
        *slot += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::cpu::kernels::radix::TileHistogram;

    #[test]
    fn test_single_tile_scatter_is_stable() {
        let keys: Vec<u8> = vec![3, 1, 3, 0, 1, 3];
        let indices: Vec<u32> = (0..6).collect();
        let hist = TileHistogram::build(&keys, 0);

        let mut out_keys = vec![0u8; 6];
        let mut out_indices = vec![0u32; 6];
        unsafe {
            scatter_tile(
                &keys,
                &indices,
                0,
                &hist.offsets,
                SharedSlice::new(&mut out_keys),
                SharedSlice::new(&mut out_indices),
            );
        }
        assert_eq!(out_keys, vec![0, 1, 1, 3, 3, 3]);
        assert_eq!(out_indices, vec![3, 1, 4, 0, 2, 5]);
    }

    #[test]
    fn test_two_tiles_share_a_row() {
        // Row [2, 0, 2 | 0, 1, 2] split in two tiles
        let keys: Vec<u16> = vec![2, 0, 2, 0, 1, 2];
        let indices: Vec<u64> = (0..6).collect();
        let first = TileHistogram::build(&keys[..3], 0);
        let second = TileHistogram::build(&keys[3..], 0);

        let mut row_base = [0usize; BIN_NUM];
        let mut running = 0;
        for bin in 0..BIN_NUM {
            row_base[bin] = running;
            running += first.counts[bin] + second.counts[bin];
        }
        let mut second_bases = row_base;
        for bin in 0..BIN_NUM {
            second_bases[bin] += first.counts[bin];
        }

        let mut out_keys = vec![0u16; 6];
        let mut out_indices = vec![0u64; 6];
        let dk = SharedSlice::new(&mut out_keys);
        let di = SharedSlice::new(&mut out_indices);
        unsafe {
            scatter_tile(&keys[3..], &indices[3..], 0, &second_bases, dk, di);
            scatter_tile(&keys[..3], &indices[..3], 0, &row_base, dk, di);
        }
        assert_eq!(out_keys, vec![0, 0, 1, 2, 2, 2]);
        assert_eq!(out_indices, vec![1, 3, 4, 0, 2, 5]);
    }
}
