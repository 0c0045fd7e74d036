//! Pass orchestration of the multi-pass radix sort
//!
//! One launch sorts every row of a `[rows, axis]` input. A pass per key byte
//! moves (key, index) pairs between two buffers:
//!
//! ```text
//! clear ─▶ { histogram ─▶ look-back + scatter } × key bytes ─▶ untwiddle
//! ```
//!
//! Multi-tile launches run on dedicated scoped threads separated by a
//! barrier between stages; single-tile rows are sorted independently.

use super::histogram::TileHistogram;
use super::index::{CarriedIndex, OutputIndex};
use super::lookback::{LookbackTable, RecordWord};
use super::scatter::scatter_tile;
use super::shared::SharedSlice;
use super::twiddle::{RadixBits, RadixKey, twiddle, untwiddle};
use super::workspace::{RowTotals, SortWorkspace};
use crate::error::Result;
use crate::tiling::{BIN_NUM, RecordWidth, ScanStrategy, Schedule, SortPlan};
use std::ops::Range;
use std::sync::Barrier;
use std::sync::atomic::{AtomicU32, AtomicU64};
use tracing::{debug, trace};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Destination of sorted rows
struct RowOutputs<'a, K, O> {
    values: Option<SharedSlice<'a, K>>,
    indices: Option<SharedSlice<'a, O>>,
}

impl<K, O> Clone for RowOutputs<'_, K, O> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, O> Copy for RowOutputs<'_, K, O> {}

impl<'a, K: RadixKey, O: OutputIndex> RowOutputs<'a, K, O> {
    fn new(values: Option<&'a mut [K]>, indices: Option<&'a mut [O]>) -> Self {
        Self {
            values: values.map(SharedSlice::new),
            indices: indices.map(SharedSlice::new),
        }
    }

    /// Untwiddle keys and convert carried indices into `start..start + len`
    ///
    /// # Safety
    /// The range is in bounds of both outputs and owned by the caller.
    unsafe fn write<I: CarriedIndex>(
        &self,
        start: usize,
        keys: &[K::Bits],
        carried: &[I],
        descending: bool,
    ) {
        let range = start..start + keys.len();
        if let Some(values) = self.values {
            let dst = values.slice_mut(range.clone());
            for (d, &bits) in dst.iter_mut().zip(keys) {
                *d = untwiddle(bits, descending);
            }
        }
        if let Some(indices) = self.indices {
            let dst = indices.slice_mut(range);
            for (d, &index) in dst.iter_mut().zip(carried) {
                *d = O::from_carried(index);
            }
        }
    }
}

/// Twiddle input keys and seed their carried indices
///
/// `first` is the position along the axis of `input[0]`.
fn stage<K: RadixKey, I: CarriedIndex>(
    input: &[K],
    seeds: Option<&[I]>,
    first: usize,
    descending: bool,
    keys: &mut [K::Bits],
    indices: &mut [I],
) {
    for (dst, &key) in keys.iter_mut().zip(input) {
        *dst = twiddle(key, descending);
    }
    match seeds {
        Some(seeds) => indices.copy_from_slice(seeds),
        None => {
            for (offset, dst) in indices.iter_mut().enumerate() {
                *dst = I::from_position(first + offset);
            }
        }
    }
}

/// Sort every row of `input` along the innermost axis
///
/// # Arguments
/// * `plan` - Launch plan, `plan.rows * plan.axis == input.len()`
/// * `input` - Row-major keys
/// * `seeds` - Initial carried indices, one per key; positions along the
///   axis when `None`
/// * `values` - Sorted keys, same length as `input`
/// * `indices` - Carried index of each sorted key, same length as `input`
///
/// Equal keys keep their input order. `-0.0` sorts, and comes back, as
/// `+0.0`.
pub fn sort_rows<K: RadixKey, I: CarriedIndex, O: OutputIndex>(
    plan: &SortPlan,
    input: &[K],
    seeds: Option<&[I]>,
    values: Option<&mut [K]>,
    indices: Option<&mut [O]>,
) -> Result<()> {
    debug_assert_eq!(input.len(), plan.rows * plan.axis);
    debug_assert!(seeds.is_none_or(|s| s.len() == input.len()));
    debug_assert!(values.as_ref().is_none_or(|v| v.len() == input.len()));
    debug_assert!(indices.as_ref().is_none_or(|i| i.len() == input.len()));

    debug!(
        rows = plan.rows,
        axis = plan.axis,
        schedule = ?plan.schedule,
        scan = ?plan.scan,
        workers = plan.workers,
        passes = plan.passes,
        "radix sort launch"
    );

    let outputs = RowOutputs::new(values, indices);
    match plan.schedule {
        Schedule::SingleTile => {
            sort_single_tile_rows(plan, input, seeds, outputs);
            Ok(())
        }
        Schedule::MultiTile => match plan.record_width {
            RecordWidth::Narrow => {
                sort_multi_tile_rows::<K, I, O, AtomicU32>(plan, input, seeds, outputs)
            }
            RecordWidth::Wide => {
                sort_multi_tile_rows::<K, I, O, AtomicU64>(plan, input, seeds, outputs)
            }
        },
    }
}

/// Ping-pong buffers of one row sorted by a single worker
struct RowScratch<B, I> {
    keys: [Vec<B>; 2],
    indices: [Vec<I>; 2],
}

impl<B: RadixBits, I: CarriedIndex> RowScratch<B, I> {
    fn new(axis: usize) -> Self {
        let zero = I::from_position(0);
        Self {
            keys: [vec![B::ZERO; axis], vec![B::ZERO; axis]],
            indices: [vec![zero; axis], vec![zero; axis]],
        }
    }
}

fn sort_single_tile_rows<K: RadixKey, I: CarriedIndex, O: OutputIndex>(
    plan: &SortPlan,
    input: &[K],
    seeds: Option<&[I]>,
    outputs: RowOutputs<'_, K, O>,
) {
    let axis = plan.axis;
    let sort_row = |scratch: &mut RowScratch<K::Bits, I>, row: usize| {
        let range = row * axis..(row + 1) * axis;
        let row_seeds = seeds.map(|s| &s[range.clone()]);
        sort_row_in_tile(plan, &input[range.clone()], row_seeds, scratch);

        let last = plan.passes % 2;
        // SAFETY: each row is written by exactly one task
        unsafe {
            outputs.write(
                range.start,
                &scratch.keys[last],
                &scratch.indices[last],
                plan.descending,
            );
        }
    };

    #[cfg(feature = "rayon")]
    {
        let min_len = plan.rows.div_ceil(plan.rows_in_flight.max(1)).max(1);
        (0..plan.rows)
            .into_par_iter()
            .with_min_len(min_len)
            .for_each_init(|| RowScratch::new(axis), |scratch, row| sort_row(scratch, row));
    }

    #[cfg(not(feature = "rayon"))]
    {
        let mut scratch = RowScratch::new(axis);
        for row in 0..plan.rows {
            sort_row(&mut scratch, row);
        }
    }
}

/// Sort one whole row held in a single tile, leaving the result in buffer
/// `plan.passes % 2`
fn sort_row_in_tile<K: RadixKey, I: CarriedIndex>(
    plan: &SortPlan,
    input: &[K],
    seeds: Option<&[I]>,
    scratch: &mut RowScratch<K::Bits, I>,
) {
    let [k0, k1] = &mut scratch.keys;
    let [i0, i1] = &mut scratch.indices;
    stage(input, seeds, 0, plan.descending, k0, i0);

    for pass in 0..plan.passes {
        let (src_keys, dst_keys, src_idx, dst_idx) = if pass % 2 == 0 {
            (&k0[..], &mut k1[..], &i0[..], &mut i1[..])
        } else {
            (&k1[..], &mut k0[..], &i1[..], &mut i0[..])
        };
        let hist = TileHistogram::build(src_keys, pass);
        // SAFETY: with one tile the local offsets partition the row
        unsafe {
            scatter_tile(
                src_keys,
                src_idx,
                pass,
                &hist.offsets,
                SharedSlice::new(dst_keys),
                SharedSlice::new(dst_idx),
            );
        }
    }
}

/// State shared by the workers of one multi-tile launch
struct Launch<'a, K: RadixKey, I, O, W> {
    plan: &'a SortPlan,
    input: &'a [K],
    seeds: Option<&'a [I]>,
    outputs: RowOutputs<'a, K, O>,
    keys: [SharedSlice<'a, K::Bits>; 2],
    indices: [SharedSlice<'a, I>; 2],
    records: &'a LookbackTable<W>,
    totals: &'a RowTotals,
    barrier: &'a Barrier,
}

fn sort_multi_tile_rows<K: RadixKey, I: CarriedIndex, O: OutputIndex, W: RecordWord>(
    plan: &SortPlan,
    input: &[K],
    seeds: Option<&[I]>,
    outputs: RowOutputs<'_, K, O>,
) -> Result<()> {
    let SortWorkspace {
        keys: [mut k0, mut k1],
        indices: [mut i0, mut i1],
        records,
        totals,
    } = SortWorkspace::<K::Bits, I, W>::new(plan)?;
    let barrier = Barrier::new(plan.workers);

    let launch = Launch {
        plan,
        input,
        seeds,
        outputs,
        keys: [SharedSlice::new(&mut k0), SharedSlice::new(&mut k1)],
        indices: [SharedSlice::new(&mut i0), SharedSlice::new(&mut i1)],
        records: &records,
        totals: &totals,
        barrier: &barrier,
    };

    std::thread::scope(|s| {
        for worker in 0..plan.workers {
            let launch = &launch;
            s.spawn(move || launch.run(worker));
        }
    });
    Ok(())
}

impl<K: RadixKey, I: CarriedIndex, O: OutputIndex, W: RecordWord> Launch<'_, K, I, O, W> {
    /// Buffer range of `tile` for the row in `slot`
    #[inline]
    fn buffer_range(&self, slot: usize, tile: usize) -> Range<usize> {
        let range = self.plan.tile_range(tile);
        let base = slot * self.plan.axis;
        base + range.start..base + range.end
    }

    /// Twiddle a tile of the input into buffer 0
    ///
    /// # Safety
    /// The caller owns `tile` of `slot`.
    unsafe fn stage_tile(&self, row: usize, slot: usize, tile: usize) {
        let range = self.plan.tile_range(tile);
        let start = row * self.plan.axis;
        let input = &self.input[start + range.start..start + range.end];
        let seeds = self.seeds.map(|s| &s[start + range.start..start + range.end]);
        let buffer = self.buffer_range(slot, tile);
        stage(
            input,
            seeds,
            range.start,
            self.plan.descending,
            self.keys[0].slice_mut(buffer.clone()),
            self.indices[0].slice_mut(buffer),
        );
    }

    fn run(&self, worker: usize) {
        let plan = self.plan;
        let slot = worker / plan.workers_per_row;
        let lane = worker % plan.workers_per_row;
        let tiles: Vec<usize> = plan.lane_tiles(lane).collect();
        let mut hists = vec![TileHistogram::default(); tiles.len()];
        let mut exclusive = [0usize; BIN_NUM];
        let two_phase = plan.scan == ScanStrategy::TwoPhase;

        for round in 0..plan.row_rounds {
            let row = plan.row_of(round, slot);

            if row.is_some() {
                for &tile in &tiles {
                    self.records.clear_tile(0, slot, tile);
                }
                if lane == 0 {
                    self.totals.clear(0, slot);
                }
            }
            self.barrier.wait();

            for pass in 0..plan.passes {
                let region = pass % 2;
                let next = 1 - region;
                let (src, dst) = (pass % 2, 1 - pass % 2);
                if worker == 0 {
                    trace!(round, pass, "radix pass");
                }

                // Histogram stage
                if let Some(row) = row {
                    for (hist, &tile) in hists.iter_mut().zip(&tiles) {
                        let buffer = self.buffer_range(slot, tile);
                        // SAFETY: tiles of this lane are written by this worker only
                        let keys = unsafe {
                            if pass == 0 {
                                self.stage_tile(row, slot, tile);
                            }
                            self.keys[src].slice(buffer)
                        };
                        *hist = TileHistogram::build(keys, pass);
                        self.totals.add(region, slot, &hist.counts);
                        if two_phase {
                            self.records.publish_aggregate(region, slot, tile, &hist.counts);
                        }
                        self.records.clear_tile(next, slot, tile);
                    }
                    if lane == 0 {
                        self.totals.clear(next, slot);
                    }
                }
                self.barrier.wait();

                if two_phase {
                    if row.is_some() && lane == 0 {
                        self.records.resolve_serial(region, slot);
                    }
                    self.barrier.wait();
                }

                // Look-back and scatter stage
                if row.is_some() {
                    let row_base = self.totals.exclusive(region, slot);
                    let slot_base = slot * plan.axis;
                    for (hist, &tile) in hists.iter().zip(&tiles) {
                        if two_phase {
                            self.records.resolved_exclusive(region, slot, tile, &mut exclusive);
                        } else {
                            self.records.look_back(region, slot, tile, &hist.counts, &mut exclusive);
                        }
                        let mut bases = [0usize; BIN_NUM];
                        for (bin, base) in bases.iter_mut().enumerate() {
                            *base = slot_base + row_base[bin] + exclusive[bin];
                        }

                        let buffer = self.buffer_range(slot, tile);
                        // SAFETY: source buffers are read-only during this stage;
                        // the prefix sums give every element a unique destination
                        // inside the slot's row.
                        unsafe {
                            scatter_tile(
                                self.keys[src].slice(buffer.clone()),
                                self.indices[src].slice(buffer),
                                pass,
                                &bases,
                                self.keys[dst],
                                self.indices[dst],
                            );
                        }
                    }
                }
                self.barrier.wait();
            }

            if let Some(row) = row {
                let last = plan.passes % 2;
                for &tile in &tiles {
                    let range = plan.tile_range(tile);
                    let buffer = self.buffer_range(slot, tile);
                    // SAFETY: the last barrier ordered every scatter before these reads
                    unsafe {
                        self.outputs.write(
                            row * plan.axis + range.start,
                            self.keys[last].slice(buffer.clone()),
                            self.indices[last].slice(buffer),
                            plan.descending,
                        );
                    }
                }
            }
        }
    }
}
