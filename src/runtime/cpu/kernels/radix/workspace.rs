//! Launch scratch: row totals, bin records and ping-pong buffers

use super::index::CarriedIndex;
use super::lookback::{LookbackTable, RecordWord};
use super::twiddle::RadixBits;
use crate::error::{Error, Result};
use crate::tiling::{BIN_NUM, SortPlan};
use std::sync::atomic::{AtomicU64, Ordering};

/// Allocate `len` copies of `value`, reporting allocation failure
pub(crate) fn try_filled_vec<T: Copy>(len: usize, value: T) -> Result<Vec<T>> {
    let mut vec = Vec::new();
    vec.try_reserve_exact(len).map_err(|_| Error::OutOfMemory {
        size: len.saturating_mul(std::mem::size_of::<T>()),
    })?;
    vec.resize(len, value);
    Ok(vec)
}

/// Allocate `count` default values of `T`, reporting allocation failure
///
/// `count` is given as factors so that an overflowing product is reported
/// like any other oversized request.
pub(crate) fn try_default_vec<T: Default>(count: &[usize]) -> Result<Vec<T>> {
    let len = count
        .iter()
        .try_fold(1usize, |acc, &n| acc.checked_mul(n))
        .ok_or(Error::OutOfMemory { size: usize::MAX })?;
    let mut vec = Vec::new();
    vec.try_reserve_exact(len).map_err(|_| Error::OutOfMemory {
        size: len.saturating_mul(std::mem::size_of::<T>()),
    })?;
    vec.resize_with(len, T::default);
    Ok(vec)
}

/// Digit totals of whole rows, accumulated by atomic adds
///
/// Two regions per row slot, so the totals of the next pass can be cleared
/// while the current pass still reads its own.
#[derive(Debug)]
pub struct RowTotals {
    counts: Vec<AtomicU64>,
    slots: usize,
}

impl RowTotals {
    /// Cleared totals for `regions × slots` rows
    pub fn new(regions: usize, slots: usize) -> Result<Self> {
        let counts = try_default_vec(&[regions, slots, BIN_NUM])?;
        Ok(Self { counts, slots })
    }

    #[inline]
    fn region(&self, region: usize, slot: usize) -> &[AtomicU64] {
        let start = (region * self.slots + slot) * BIN_NUM;
        &self.counts[start..start + BIN_NUM]
    }

    /// Add a tile's counts
    pub fn add(&self, region: usize, slot: usize, counts: &[usize; BIN_NUM]) {
        for (total, &count) in self.region(region, slot).iter().zip(counts) {
            if count != 0 {
                total.fetch_add(count as u64, Ordering::Relaxed);
            }
        }
    }

    /// Reset one region of one slot
    pub fn clear(&self, region: usize, slot: usize) {
        for total in self.region(region, slot) {
            total.store(0, Ordering::Relaxed);
        }
    }

    /// Exclusive scan over bins: the row position of each digit's first element
    pub fn exclusive(&self, region: usize, slot: usize) -> [usize; BIN_NUM] {
        let mut out = [0; BIN_NUM];
        let mut running = 0;
        for (o, total) in out.iter_mut().zip(self.region(region, slot)) {
            *o = running;
            running += total.load(Ordering::Relaxed) as usize;
        }
        out
    }

    /// Inclusive scan over bins
    pub fn cumulative(&self, region: usize, slot: usize) -> [usize; BIN_NUM] {
        let mut out = [0; BIN_NUM];
        let mut running = 0;
        for (o, total) in out.iter_mut().zip(self.region(region, slot)) {
            running += total.load(Ordering::Relaxed) as usize;
            *o = running;
        }
        out
    }
}

/// Scratch of one multi-tile sort launch
///
/// Key and index buffers hold one row per slot, `rows_in_flight × axis`
/// elements each.
pub(crate) struct SortWorkspace<B, I, W> {
    pub keys: [Vec<B>; 2],
    pub indices: [Vec<I>; 2],
    pub records: LookbackTable<W>,
    pub totals: RowTotals,
}

impl<B: RadixBits, I: CarriedIndex, W: RecordWord> SortWorkspace<B, I, W> {
    pub fn new(plan: &SortPlan) -> Result<Self> {
        let len = plan.rows_in_flight * plan.axis;
        let zero = I::from_position(0);
        Ok(Self {
            keys: [try_filled_vec(len, B::ZERO)?, try_filled_vec(len, B::ZERO)?],
            indices: [try_filled_vec(len, zero)?, try_filled_vec(len, zero)?],
            records: LookbackTable::new(2, plan.rows_in_flight, plan.tiles_per_row, BIN_NUM)?,
            totals: RowTotals::new(2, plan.rows_in_flight)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    #[test]
    fn test_row_totals_scans() {
        let totals = RowTotals::new(2, 2).unwrap();
        let mut counts = [0usize; BIN_NUM];
        counts[1] = 3;
        counts[4] = 2;
        totals.add(1, 1, &counts);
        totals.add(1, 1, &counts);

        let ex = totals.exclusive(1, 1);
        assert_eq!(ex[1], 0);
        assert_eq!(ex[2], 6);
        assert_eq!(ex[5], 10);

        let cum = totals.cumulative(1, 1);
        assert_eq!(cum[0], 0);
        assert_eq!(cum[1], 6);
        assert_eq!(cum[BIN_NUM - 1], 10);

        assert_eq!(totals.cumulative(0, 1)[BIN_NUM - 1], 0);
        totals.clear(1, 1);
        assert_eq!(totals.cumulative(1, 1)[BIN_NUM - 1], 0);
    }

    #[test]
    fn test_try_filled_vec() {
        let v = try_filled_vec(5, 7u16).unwrap();
        assert_eq!(v, vec![7; 5]);
        assert!(matches!(
            try_filled_vec(usize::MAX, 0u64),
            Err(Error::OutOfMemory { .. })
        ));
    }

    #[test]
    fn test_oversized_tables_are_reported() {
        assert!(matches!(
            RowTotals::new(usize::MAX, 2),
            Err(Error::OutOfMemory { size: usize::MAX })
        ));
        // One record per element of a long row split into one-element tiles
        assert!(matches!(
            LookbackTable::<AtomicU32>::new(2, 1, usize::MAX / 1024, BIN_NUM),
            Err(Error::OutOfMemory { .. })
        ));
        assert!(matches!(
            LookbackTable::<AtomicU64>::new(1, 1, usize::MAX / BIN_NUM, BIN_NUM),
            Err(Error::OutOfMemory { .. })
        ));
        assert!(matches!(
            try_default_vec::<AtomicU64>(&[3, 0, 5]),
            Ok(v) if v.is_empty()
        ));
    }
}
