//! Radix-select: the K smallest twiddled keys of every row
//!
//! Digits are resolved from the most significant byte down. Each pass
//! counts the keys still tied with the boundary prefix, picks the first bin
//! whose cumulative count exceeds the number of keys still wanted, keeps
//! everything below it and narrows the tie to that bin. After the first
//! pass only the tied keys are kept as candidates, so later passes cost
//! the size of the tie rather than the row. Largest-first selection
//! twiddles in descending order.

use super::histogram::TileHistogram;
use super::index::{CarriedIndex, OutputIndex};
use super::lookback::{LookbackTable, RecordWord};
use super::shared::SharedSlice;
use super::sort::sort_rows;
use super::twiddle::{RadixBits, RadixKey, twiddle, untwiddle};
use super::workspace::{RowTotals, try_filled_vec};
use crate::error::Result;
use crate::tiling::{
    BIN_NUM, RecordWidth, ScanStrategy, Schedule, TilingConfig, TopkPlan, plan_rows,
};
use std::cmp::Ordering;
use std::sync::Barrier;
use std::sync::atomic::{AtomicU32, AtomicU64};
use tracing::{debug, trace};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Bin holding the `remaining`-th smallest candidate
///
/// Returns the first bin whose cumulative count exceeds `remaining`, so that
/// `cumulative[bin - 1] <= remaining < cumulative[bin]`, or `None` when all
/// candidates fit.
pub fn find_boundary(cumulative: &[usize; BIN_NUM], remaining: usize) -> Option<usize> {
    if cumulative[BIN_NUM - 1] <= remaining {
        return None;
    }
    Some(cumulative.partition_point(|&c| c <= remaining))
}

/// Progress of the boundary search of one row
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Threshold<B> {
    /// Tied keys still to take
    pub remaining: usize,
    /// Digits resolved so far
    pub mask: B,
    /// Resolved digits of the boundary key
    pub prefix: B,
    /// Every remaining candidate is selected
    pub all_kept: bool,
}

impl<B: RadixBits> Threshold<B> {
    /// Search for the `k` smallest keys
    pub fn new(k: usize) -> Self {
        Self {
            remaining: k,
            mask: B::ZERO,
            prefix: B::ZERO,
            all_kept: false,
        }
    }

    /// No further pass can change the selection
    pub fn is_resolved(&self) -> bool {
        self.all_kept || self.remaining == 0
    }

    /// Narrow the tie with the candidate histogram of pass `pass`
    pub fn narrow(&mut self, cumulative: &[usize; BIN_NUM], pass: usize) {
        match find_boundary(cumulative, self.remaining) {
            None => self.all_kept = true,
            Some(bin) => {
                if bin > 0 {
                    self.remaining -= cumulative[bin - 1];
                }
                self.mask = self.mask.or(B::digit_mask(pass));
                self.prefix = self.prefix.or(B::from_digit(bin, pass));
            }
        }
    }

    /// `Less`: selected, `Equal`: tied with the boundary, `Greater`: dropped
    #[inline]
    pub fn classify(&self, key: B) -> Ordering {
        key.and(self.mask).cmp(&self.prefix)
    }

    /// Drop the candidates no longer tied with the boundary
    ///
    /// On the pass after the first, `ties` is refilled from the whole tile.
    pub fn compact_ties(&self, tile: &[B], ties: &mut Vec<B>, refill: bool) {
        let tied = |key: &B| self.classify(*key) == Ordering::Equal;
        if refill {
            ties.clear();
            ties.extend(tile.iter().copied().filter(tied));
        } else {
            ties.retain(tied);
        }
    }

    /// Selected and tied key counts of a tile
    pub fn count(&self, keys: &[B]) -> [usize; 2] {
        let mut counts = [0; 2];
        for &key in keys {
            match self.classify(key) {
                Ordering::Less => counts[0] += 1,
                Ordering::Equal => counts[1] += 1,
                Ordering::Greater => {}
            }
        }
        counts
    }
}

/// Write the selected keys of a tile in index order
///
/// `before` holds the selected and tied counts of all lower tiles of the
/// row; ties are taken in index order until `remaining` is used up.
///
/// # Safety
/// `out_base + before[0] + min(before[1], remaining)` onwards, for as many
/// keys as the tile selects, is in bounds and owned by this tile.
#[allow(clippy::too_many_arguments)]
unsafe fn gather_tile<K: RadixKey, I: CarriedIndex>(
    keys: &[K::Bits],
    first: usize,
    threshold: &Threshold<K::Bits>,
    before: [usize; 2],
    descending: bool,
    out_base: usize,
    out_keys: SharedSlice<'_, K>,
    out_indices: SharedSlice<'_, I>,
) {
    let taken_before = before[1].min(threshold.remaining);
    let mut ties_left = threshold.remaining - taken_before;
    let mut cursor = out_base + before[0] + taken_before;
    for (offset, &key) in keys.iter().enumerate() {
        let take = match threshold.classify(key) {
            Ordering::Less => true,
            Ordering::Equal if ties_left > 0 => {
                ties_left -= 1;
                true
            }
            _ => false,
        };
        if take {
            out_keys.write(cursor, untwiddle(key, descending));
            out_indices.write(cursor, I::from_position(first + offset));
            cursor += 1;
        }
    }
}

/// Select the top `plan.k` keys of every row
///
/// # Arguments
/// * `plan` - Selection plan, `plan.base.rows * plan.base.axis == input.len()`
/// * `config` - Tiling used to order the selection when `plan.sorted`
/// * `input` - Row-major keys
/// * `values` - `rows × k` selected keys
/// * `indices` - `rows × k` positions of the selected keys
///
/// Unsorted results list each row's selection in ascending index order;
/// sorted results are ordered by key, ties in index order.
pub fn select_rows<K: RadixKey, I: CarriedIndex, O: OutputIndex>(
    plan: &TopkPlan,
    config: &TilingConfig,
    input: &[K],
    values: &mut [K],
    indices: &mut [O],
) -> Result<()> {
    let base = &plan.base;
    debug_assert_eq!(input.len(), base.rows * base.axis);
    debug_assert_eq!(values.len(), base.rows * plan.k);
    debug_assert_eq!(indices.len(), base.rows * plan.k);
    if plan.k == 0 {
        return Ok(());
    }

    debug!(
        rows = base.rows,
        axis = base.axis,
        k = plan.k,
        schedule = ?base.schedule,
        workers = base.workers,
        "radix select launch"
    );

    let len = base.rows * plan.k;
    let mut picked_keys = try_filled_vec(len, input[0])?;
    let mut picked = try_filled_vec(len, I::from_position(0))?;
    {
        let out_keys = SharedSlice::new(&mut picked_keys);
        let out_indices = SharedSlice::new(&mut picked);
        match base.schedule {
            Schedule::SingleTile => select_single_tile_rows(plan, input, out_keys, out_indices),
            Schedule::MultiTile => match base.record_width {
                RecordWidth::Narrow => select_multi_tile_rows::<K, I, AtomicU32>(
                    plan,
                    input,
                    out_keys,
                    out_indices,
                )?,
                RecordWidth::Wide => select_multi_tile_rows::<K, I, AtomicU64>(
                    plan,
                    input,
                    out_keys,
                    out_indices,
                )?,
            },
        }
    }

    if plan.sorted && plan.k > 1 {
        // Ties stay in index order because the sort is stable.
        let order = plan_rows(
            base.rows,
            plan.k,
            base.dtype,
            base.index_dtype,
            plan.largest,
            config,
        );
        return sort_rows::<K, I, O>(
            &order,
            &picked_keys,
            Some(&picked[..]),
            Some(values),
            Some(indices),
        );
    }

    values.copy_from_slice(&picked_keys);
    for (dst, &index) in indices.iter_mut().zip(&picked) {
        *dst = O::from_carried(index);
    }
    Ok(())
}

fn select_single_tile_rows<K: RadixKey, I: CarriedIndex>(
    plan: &TopkPlan,
    input: &[K],
    out_keys: SharedSlice<'_, K>,
    out_indices: SharedSlice<'_, I>,
) {
    let base = &plan.base;
    let axis = base.axis;
    let select_row = |scratch: &mut SelectScratch<K::Bits>, row: usize| {
        let SelectScratch { keys, ties } = scratch;
        let row_input = &input[row * axis..(row + 1) * axis];
        keys.clear();
        keys.extend(row_input.iter().map(|&k| twiddle(k, base.descending)));

        let mut threshold = Threshold::new(plan.k);
        for (step, pass) in (0..base.passes).rev().enumerate() {
            if threshold.is_resolved() {
                break;
            }
            let candidates = if step == 0 {
                &keys[..]
            } else {
                threshold.compact_ties(&keys[..], ties, step == 1);
                &ties[..]
            };
            let hist = TileHistogram::build(candidates, pass);
            threshold.narrow(&hist.cumulative(), pass);
        }
        // SAFETY: each row owns its `k` outputs
        unsafe {
            gather_tile(
                &keys[..],
                0,
                &threshold,
                [0, 0],
                base.descending,
                row * plan.k,
                out_keys,
                out_indices,
            );
        }
    };

    #[cfg(feature = "rayon")]
    {
        let min_len = base.rows.div_ceil(base.rows_in_flight.max(1)).max(1);
        (0..base.rows)
            .into_par_iter()
            .with_min_len(min_len)
            .for_each_init(|| SelectScratch::new(axis), |scratch, row| select_row(scratch, row));
    }

    #[cfg(not(feature = "rayon"))]
    {
        let mut scratch = SelectScratch::new(axis);
        for row in 0..base.rows {
            select_row(&mut scratch, row);
        }
    }
}

/// Twiddled keys of one row and the candidates still tied with the boundary
struct SelectScratch<B> {
    keys: Vec<B>,
    ties: Vec<B>,
}

impl<B> SelectScratch<B> {
    fn new(axis: usize) -> Self {
        Self {
            keys: Vec::with_capacity(axis),
            ties: Vec::new(),
        }
    }
}

/// State shared by the workers of one multi-tile selection
struct Selection<'a, K: RadixKey, I, W> {
    plan: &'a TopkPlan,
    input: &'a [K],
    keys: SharedSlice<'a, K::Bits>,
    totals: &'a RowTotals,
    records: &'a LookbackTable<W>,
    barrier: &'a Barrier,
    out_keys: SharedSlice<'a, K>,
    out_indices: SharedSlice<'a, I>,
}

fn select_multi_tile_rows<K: RadixKey, I: CarriedIndex, W: RecordWord>(
    plan: &TopkPlan,
    input: &[K],
    out_keys: SharedSlice<'_, K>,
    out_indices: SharedSlice<'_, I>,
) -> Result<()> {
    let base = &plan.base;
    let mut keys = try_filled_vec(base.rows_in_flight * base.axis, K::Bits::ZERO)?;
    let totals = RowTotals::new(2, base.rows_in_flight)?;
    let records = LookbackTable::<W>::new(1, base.rows_in_flight, base.tiles_per_row, 2)?;
    let barrier = Barrier::new(base.workers);

    let selection = Selection {
        plan,
        input,
        keys: SharedSlice::new(&mut keys),
        totals: &totals,
        records: &records,
        barrier: &barrier,
        out_keys,
        out_indices,
    };

    std::thread::scope(|s| {
        for worker in 0..base.workers {
            let selection = &selection;
            s.spawn(move || selection.run(worker));
        }
    });
    Ok(())
}

impl<K: RadixKey, I: CarriedIndex, W: RecordWord> Selection<'_, K, I, W> {
    fn run(&self, worker: usize) {
        let base = &self.plan.base;
        let slot = worker / base.workers_per_row;
        let lane = worker % base.workers_per_row;
        let tiles: Vec<usize> = base.lane_tiles(lane).collect();
        let two_phase = base.scan == ScanStrategy::TwoPhase;
        let mut before = [0usize; 2];
        let mut ties: Vec<Vec<K::Bits>> = vec![Vec::new(); tiles.len()];

        for round in 0..base.row_rounds {
            let row = base.row_of(round, slot);

            if let Some(row) = row {
                for &tile in &tiles {
                    let range = base.tile_range(tile);
                    let start = row * base.axis;
                    let src = &self.input[start + range.start..start + range.end];
                    // SAFETY: tiles of this lane are written by this worker only
                    let dst = unsafe { self.keys.slice_mut(self.buffer_range(slot, tile)) };
                    for (d, &key) in dst.iter_mut().zip(src) {
                        *d = twiddle(key, base.descending);
                    }
                    self.records.clear_tile(0, slot, tile);
                }
                if lane == 0 {
                    self.totals.clear(0, slot);
                }
            }
            self.barrier.wait();

            // Boundary search, most significant digit first. Every worker of
            // a slot derives the same threshold from the same totals.
            let mut threshold = Threshold::new(self.plan.k);
            for (step, pass) in (0..base.passes).rev().enumerate() {
                let region = step % 2;
                let active = row.is_some() && !threshold.is_resolved();
                if active {
                    for (&tile, tile_ties) in tiles.iter().zip(ties.iter_mut()) {
                        // SAFETY: staged keys are read-only during the search
                        let keys = unsafe { self.keys.slice(self.buffer_range(slot, tile)) };
                        let candidates = if step == 0 {
                            keys
                        } else {
                            threshold.compact_ties(keys, tile_ties, step == 1);
                            &tile_ties[..]
                        };
                        let hist = TileHistogram::build(candidates, pass);
                        self.totals.add(region, slot, &hist.counts);
                    }
                    if lane == 0 {
                        self.totals.clear(1 - region, slot);
                    }
                }
                self.barrier.wait();

                if active {
                    threshold.narrow(&self.totals.cumulative(region, slot), pass);
                    if lane == 0 {
                        trace!(
                            row = ?row,
                            pass,
                            remaining = threshold.remaining,
                            "radix select boundary"
                        );
                    }
                }
                self.barrier.wait();
            }

            // Gather: tiles resolve their output offsets with a 2-bin scan.
            if let Some(row) = row {
                let mut counts = Vec::with_capacity(tiles.len());
                for &tile in &tiles {
                    // SAFETY: staged keys are read-only during the gather
                    let keys = unsafe { self.keys.slice(self.buffer_range(slot, tile)) };
                    let tile_counts = threshold.count(keys);
                    if two_phase {
                        self.records.publish_aggregate(0, slot, tile, &tile_counts);
                    }
                    counts.push(tile_counts);
                }

                if two_phase {
                    self.barrier.wait();
                    if lane == 0 {
                        self.records.resolve_serial(0, slot);
                    }
                    self.barrier.wait();
                }

                for (&tile, tile_counts) in tiles.iter().zip(&counts) {
                    if two_phase {
                        self.records.resolved_exclusive(0, slot, tile, &mut before);
                    } else {
                        self.records.look_back(0, slot, tile, tile_counts, &mut before);
                    }
                    let range = base.tile_range(tile);
                    // SAFETY: the 2-bin scan gives each tile its own output range
                    unsafe {
                        gather_tile(
                            self.keys.slice(self.buffer_range(slot, tile)),
                            range.start,
                            &threshold,
                            before,
                            base.descending,
                            row * self.plan.k,
                            self.out_keys,
                            self.out_indices,
                        );
                    }
                }
            } else if two_phase {
                self.barrier.wait();
                self.barrier.wait();
            }
            self.barrier.wait();
        }
    }

    #[inline]
    fn buffer_range(&self, slot: usize, tile: usize) -> std::ops::Range<usize> {
        let range = self.plan.base.tile_range(tile);
        let base = slot * self.plan.base.axis;
        base + range.start..base + range.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtype::DType;
    use crate::tiling::{TopkRequest, plan_topk};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn topk<K: RadixKey>(
        input: &[K],
        shape: &[usize],
        k: usize,
        largest: bool,
        sorted: bool,
        config: &TilingConfig,
    ) -> (Vec<K>, Vec<i64>) {
        let request = TopkRequest::new(shape, K::DTYPE, k)
            .largest(largest)
            .sorted(sorted);
        let plan = plan_topk(&request, config).unwrap();
        let len = plan.base.rows * plan.k;
        let mut values = vec![input[0]; len];
        let mut indices = vec![0i64; len];
        select_rows::<K, u32, i64>(&plan, config, input, &mut values, &mut indices).unwrap();
        (values, indices)
    }

    #[test]
    fn test_find_boundary() {
        let mut cumulative = [0usize; BIN_NUM];
        // counts: bin 2 -> 3, bin 5 -> 4, bin 9 -> 1
        for (bin, c) in cumulative.iter_mut().enumerate() {
            *c = match bin {
                0..=1 => 0,
                2..=4 => 3,
                5..=8 => 7,
                _ => 8,
            };
        }
        assert_eq!(find_boundary(&cumulative, 0), Some(2));
        assert_eq!(find_boundary(&cumulative, 2), Some(2));
        assert_eq!(find_boundary(&cumulative, 3), Some(5));
        assert_eq!(find_boundary(&cumulative, 6), Some(5));
        assert_eq!(find_boundary(&cumulative, 7), Some(9));
        assert_eq!(find_boundary(&cumulative, 8), None);

        for remaining in 0..8 {
            let bin = find_boundary(&cumulative, remaining).unwrap();
            let below = if bin == 0 { 0 } else { cumulative[bin - 1] };
            assert!(below <= remaining && remaining < cumulative[bin]);
        }
    }

    #[test]
    fn test_compact_ties() {
        let tile: Vec<u16> = vec![0x0102, 0x0001, 0x0105, 0x0302, 0x01ff];
        let mut threshold = Threshold::<u16>::new(2);
        threshold.narrow(&TileHistogram::build(&tile, 1).cumulative(), 1);
        // 0x00.. is kept outright; the boundary falls among the 0x01.. keys
        assert_eq!(threshold.remaining, 1);
        assert_eq!(threshold.prefix, 0x0100);

        let mut ties = vec![0xdead];
        threshold.compact_ties(&tile, &mut ties, true);
        assert_eq!(ties, vec![0x0102, 0x0105, 0x01ff]);

        threshold.narrow(&TileHistogram::build(&ties, 0).cumulative(), 0);
        assert_eq!(threshold.prefix, 0x0105);
        assert!(threshold.is_resolved());
        threshold.compact_ties(&tile, &mut ties, false);
        assert_eq!(ties, vec![0x0105]);
        assert_eq!(threshold.count(&tile), [2, 1]);
    }

    #[test]
    fn test_long_tie_is_narrowed() {
        // Most keys share their high bytes; the boundary sits in the low byte.
        let mut input: Vec<u32> = (0..3000).map(|i| 0x0a0b_0c00 | (i % 200)).collect();
        input[17] = 0xffff_ffff;
        input[2999] = 0;
        for tile in [512, 4096] {
            let config = TilingConfig::default().with_workers(3).with_tile_elems(tile);
            let (values, indices) = topk(&input, &[3000], 4, true, true, &config);
            assert_eq!(values, vec![0xffff_ffff, 0x0a0b_0cc7, 0x0a0b_0cc7, 0x0a0b_0cc7]);
            assert_eq!(indices, vec![17, 199, 399, 599]);
        }
    }

    #[test]
    fn test_largest_three() {
        let input: Vec<i32> = vec![5, 3, 8, 1, 9, 2, 7, 4, 6, 0];
        for tile in [4, 1024] {
            let config = TilingConfig::default().with_workers(2).with_tile_elems(tile);
            let (values, indices) = topk(&input, &[10], 3, true, true, &config);
            assert_eq!(values, vec![9, 8, 7]);
            assert_eq!(indices, vec![4, 2, 6]);

            let (values, indices) = topk(&input, &[10], 3, true, false, &config);
            assert_eq!(values, vec![8, 9, 7]);
            assert_eq!(indices, vec![2, 4, 6]);
        }
    }

    #[test]
    fn test_ties_taken_in_index_order() {
        let input: Vec<u8> = vec![4, 7, 4, 1, 4, 7, 4];
        for scan in [ScanStrategy::DecoupledLookBack, ScanStrategy::TwoPhase] {
            let config = TilingConfig::default()
                .with_workers(3)
                .with_tile_elems(2)
                .with_scan(scan);
            let (values, indices) = topk(&input, &[7], 4, true, false, &config);
            assert_eq!(values, vec![4, 7, 4, 7]);
            assert_eq!(indices, vec![0, 1, 2, 5]);

            let (values, indices) = topk(&input, &[7], 3, false, true, &config);
            assert_eq!(values, vec![1, 4, 4]);
            assert_eq!(indices, vec![3, 0, 2]);
        }
    }

    #[test]
    fn test_random_rows_match_reference() {
        let mut rng = StdRng::seed_from_u64(9);
        let (rows, axis, k) = (3, 1000, 37);
        let input: Vec<i16> = (0..rows * axis).map(|_| rng.random_range(-50..50)).collect();
        let config = TilingConfig::default().with_workers(4).with_tile_elems(256);
        let (values, indices) = topk(&input, &[rows, axis], k, true, true, &config);

        for row in 0..rows {
            let src = &input[row * axis..(row + 1) * axis];
            let mut order: Vec<usize> = (0..axis).collect();
            order.sort_by(|&a, &b| src[b].cmp(&src[a]));
            let expected: Vec<i64> = order[..k].iter().map(|&i| i as i64).collect();
            assert_eq!(&indices[row * k..(row + 1) * k], &expected[..]);
            for (v, &i) in values[row * k..(row + 1) * k].iter().zip(&expected) {
                assert_eq!(*v, src[i as usize]);
            }
        }
    }

    #[test]
    fn test_k_covers_row() {
        let input: Vec<f32> = vec![2.0, -1.0, 2.0, 0.5];
        let config = TilingConfig::default().with_workers(2).with_tile_elems(2);
        let (values, indices) = topk(&input, &[4], 9, true, false, &config);
        assert_eq!(values, input);
        assert_eq!(indices, vec![0, 1, 2, 3]);

        let (values, indices) = topk(&input, &[4], 9, true, true, &config);
        assert_eq!(values, vec![2.0, 2.0, 0.5, -1.0]);
        assert_eq!(indices, vec![0, 2, 3, 1]);
    }

    #[test]
    fn test_zero_k_is_empty() {
        let input: Vec<u32> = vec![3, 1, 2];
        let config = TilingConfig::default().with_workers(2);
        let (values, indices) = topk(&input, &[3], 0, true, true, &config);
        assert!(values.is_empty());
        assert!(indices.is_empty());
    }
}
