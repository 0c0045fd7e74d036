//! Decoupled look-back scan over per-tile bin records
//!
//! Every (tile, bin) pair owns one atomic word holding a tri-state record:
//! nothing published yet, the tile's own count, or the inclusive prefix of
//! the tile and all its predecessors. The status lives in the top two bits
//! and the value in the rest, so a record is published and observed with a
//! single release store and acquire load.
//!
//! A tile resolves its exclusive prefix by walking back over its
//! predecessors until it meets a resolved prefix, accumulating aggregates
//! on the way. The walk only terminates if every predecessor's owner keeps
//! running, which holds when each worker is its own OS thread and walks its
//! tiles in ascending order.

use super::workspace::try_default_vec;
use crate::error::Result;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// Busy polls before a waiting worker starts yielding its time slice
const SPIN_LIMIT: u32 = 64;

/// Decoded state of one bin record
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinRecord {
    /// Nothing published yet
    NotReady,
    /// Count of the owning tile alone
    Aggregate(u64),
    /// Inclusive count of the owning tile and every lower tile
    Prefix(u64),
}

/// Atomic word storing a packed [`BinRecord`]
pub trait RecordWord: Default + Send + Sync + 'static {
    /// Largest value a record can carry
    const VALUE_MAX: u64;

    /// Acquire-load and decode
    fn load_record(&self) -> BinRecord;

    /// Encode and release-store
    fn store_record(&self, record: BinRecord);

    /// Reset to [`BinRecord::NotReady`]
    fn clear(&self);
}

macro_rules! impl_record_word {
    ($($atomic:ty => $word:ty),* $(,)?) => {
        $(
            impl RecordWord for $atomic {
                const VALUE_MAX: u64 = (1 << (<$word>::BITS - 2)) - 1;

                #[inline]
                fn load_record(&self) -> BinRecord {
                    const SHIFT: u32 = <$word>::BITS - 2;
                    let word = self.load(Ordering::Acquire);
                    let value = word as u64 & Self::VALUE_MAX;
                    match word >> SHIFT {
                        0 => BinRecord::NotReady,
                        1 => BinRecord::Aggregate(value),
                        _ => BinRecord::Prefix(value),
                    }
                }

                #[inline]
                fn store_record(&self, record: BinRecord) {
                    const SHIFT: u32 = <$word>::BITS - 2;
                    let word = match record {
                        BinRecord::NotReady => 0,
                        BinRecord::Aggregate(value) => {
                            debug_assert!(value <= Self::VALUE_MAX);
                            (1 << SHIFT) | value as $word
                        }
                        BinRecord::Prefix(value) => {
                            debug_assert!(value <= Self::VALUE_MAX);
                            (2 << SHIFT) | value as $word
                        }
                    };
                    self.store(word, Ordering::Release);
                }

                #[inline]
                fn clear(&self) {
                    self.store(0, Ordering::Relaxed);
                }
            }
        )*
    };
}

impl_record_word!(AtomicU32 => u32, AtomicU64 => u64);

/// Poll a record until its owner has published, returning the value and
/// whether it is a resolved prefix
#[inline]
fn wait_published<W: RecordWord>(word: &W) -> (u64, bool) {
    let mut spins = 0;
    loop {
        match word.load_record() {
            BinRecord::Aggregate(value) => return (value, false),
            BinRecord::Prefix(value) => return (value, true),
            BinRecord::NotReady if spins < SPIN_LIMIT => {
                spins += 1;
                std::hint::spin_loop();
            }
            BinRecord::NotReady => std::thread::yield_now(),
        }
    }
}

/// Bin records of every tile, for `regions × slots` independent scans
///
/// Regions let one scan be cleared while the other is in use; slots are the
/// rows processed concurrently.
#[derive(Debug)]
pub struct LookbackTable<W> {
    words: Vec<W>,
    slots: usize,
    tiles: usize,
    bins: usize,
}

impl<W: RecordWord> LookbackTable<W> {
    /// Table with every record cleared
    ///
    /// Returns `OutOfMemory` when the records cannot be allocated.
    pub fn new(regions: usize, slots: usize, tiles: usize, bins: usize) -> Result<Self> {
        let words = try_default_vec(&[regions, slots, tiles, bins])?;
        Ok(Self {
            words,
            slots,
            tiles,
            bins,
        })
    }

    #[inline]
    fn tile_words(&self, region: usize, slot: usize, tile: usize) -> &[W] {
        let start = ((region * self.slots + slot) * self.tiles + tile) * self.bins;
        &self.words[start..start + self.bins]
    }

    /// Current record of one bin
    pub fn record(&self, region: usize, slot: usize, tile: usize, bin: usize) -> BinRecord {
        self.tile_words(region, slot, tile)[bin].load_record()
    }

    /// Reset the records of one tile
    pub fn clear_tile(&self, region: usize, slot: usize, tile: usize) {
        for word in self.tile_words(region, slot, tile) {
            word.clear();
        }
    }

    /// Publish a tile's counts as aggregates
    pub fn publish_aggregate(&self, region: usize, slot: usize, tile: usize, counts: &[usize]) {
        debug_assert_eq!(counts.len(), self.bins);
        for (word, &count) in self.tile_words(region, slot, tile).iter().zip(counts) {
            word.store_record(BinRecord::Aggregate(count as u64));
        }
    }

    /// Resolve the exclusive prefix of `tile` for every bin
    ///
    /// Publishes the tile's aggregates, walks back over lower tiles until a
    /// resolved prefix is met, then publishes the tile's inclusive prefix.
    /// Blocks while a predecessor has not published.
    pub fn look_back(
        &self,
        region: usize,
        slot: usize,
        tile: usize,
        counts: &[usize],
        exclusive: &mut [usize],
    ) {
        debug_assert_eq!(counts.len(), self.bins);
        debug_assert_eq!(exclusive.len(), self.bins);

        let own = self.tile_words(region, slot, tile);
        if tile == 0 {
            for ((word, &count), ex) in own.iter().zip(counts).zip(exclusive.iter_mut()) {
                word.store_record(BinRecord::Prefix(count as u64));
                *ex = 0;
            }
            return;
        }

        self.publish_aggregate(region, slot, tile, counts);
        for bin in 0..self.bins {
            let mut running = 0u64;
            for pred in (0..tile).rev() {
                let (value, resolved) = wait_published(&self.tile_words(region, slot, pred)[bin]);
                running += value;
                if resolved {
                    break;
                }
            }
            exclusive[bin] = running as usize;
            own[bin].store_record(BinRecord::Prefix(running + counts[bin] as u64));
        }
    }

    /// Turn the aggregates of every tile of a scan into inclusive prefixes
    ///
    /// Barrier-based alternative to [`LookbackTable::look_back`]: all tiles
    /// must have published their aggregates before the call.
    pub fn resolve_serial(&self, region: usize, slot: usize) {
        let mut running = vec![0u64; self.bins];
        for tile in 0..self.tiles {
            for (word, sum) in self
                .tile_words(region, slot, tile)
                .iter()
                .zip(running.iter_mut())
            {
                *sum += match word.load_record() {
                    BinRecord::Aggregate(value) | BinRecord::Prefix(value) => value,
                    BinRecord::NotReady => 0,
                };
                word.store_record(BinRecord::Prefix(*sum));
            }
        }
    }

    /// Exclusive prefix of `tile` after [`LookbackTable::resolve_serial`]
    pub fn resolved_exclusive(
        &self,
        region: usize,
        slot: usize,
        tile: usize,
        exclusive: &mut [usize],
    ) {
        if tile == 0 {
            exclusive.fill(0);
            return;
        }
        for (word, ex) in self
            .tile_words(region, slot, tile - 1)
            .iter()
            .zip(exclusive.iter_mut())
        {
            let record = word.load_record();
            debug_assert!(matches!(record, BinRecord::Prefix(_)), "unresolved {record:?}");
            *ex = match record {
                BinRecord::Prefix(value) | BinRecord::Aggregate(value) => value as usize,
                BinRecord::NotReady => 0,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn serial_exclusive(counts: &[Vec<usize>]) -> Vec<Vec<usize>> {
        let bins = counts[0].len();
        let mut running = vec![0; bins];
        counts
            .iter()
            .map(|tile| {
                let ex = running.clone();
                for (sum, c) in running.iter_mut().zip(tile) {
                    *sum += c;
                }
                ex
            })
            .collect()
    }

    fn random_counts(rng: &mut StdRng, tiles: usize, bins: usize) -> Vec<Vec<usize>> {
        (0..tiles)
            .map(|_| (0..bins).map(|_| rng.random_range(0..50)).collect())
            .collect()
    }

    #[test]
    fn test_record_packing() {
        let narrow = AtomicU32::default();
        assert_eq!(narrow.load_record(), BinRecord::NotReady);
        narrow.store_record(BinRecord::Aggregate(AtomicU32::VALUE_MAX));
        assert_eq!(narrow.load_record(), BinRecord::Aggregate((1 << 30) - 1));
        narrow.store_record(BinRecord::Prefix(12));
        assert_eq!(narrow.load_record(), BinRecord::Prefix(12));
        narrow.clear();
        assert_eq!(narrow.load_record(), BinRecord::NotReady);

        let wide = AtomicU64::default();
        wide.store_record(BinRecord::Prefix(1 << 40));
        assert_eq!(wide.load_record(), BinRecord::Prefix(1 << 40));
        assert_eq!(AtomicU64::VALUE_MAX, (1 << 62) - 1);
    }

    #[test]
    fn test_look_back_sequential() {
        let counts = vec![vec![1, 0, 2], vec![3, 1, 0], vec![0, 4, 1]];
        let table = LookbackTable::<AtomicU32>::new(1, 1, 3, 3).unwrap();
        let mut exclusive = vec![0; 3];
        let mut got = Vec::new();
        for (tile, c) in counts.iter().enumerate() {
            table.look_back(0, 0, tile, c, &mut exclusive);
            got.push(exclusive.clone());
        }
        assert_eq!(got, serial_exclusive(&counts));
        assert_eq!(table.record(0, 0, 2, 1), BinRecord::Prefix(5));
    }

    fn check_random_interleavings<W: RecordWord>(seed: u64) {
        let mut rng = StdRng::seed_from_u64(seed);
        for _ in 0..20 {
            let tiles = rng.random_range(1..12);
            let bins = if rng.random_bool(0.5) { 2 } else { 16 };
            let counts = random_counts(&mut rng, tiles, bins);
            let delays: Vec<u32> = (0..tiles).map(|_| rng.random_range(0..2000)).collect();
            let table = LookbackTable::<W>::new(2, 1, tiles, bins).unwrap();

            let results: Vec<Vec<usize>> = std::thread::scope(|s| {
                let handles: Vec<_> = (0..tiles)
                    .map(|tile| {
                        let table = &table;
                        let counts = &counts[tile];
                        let delay = delays[tile];
                        s.spawn(move || {
                            for i in 0..delay {
                                if i % 256 == 0 {
                                    std::thread::yield_now();
                                }
                                std::hint::spin_loop();
                            }
                            let mut exclusive = vec![0; counts.len()];
                            table.look_back(1, 0, tile, counts, &mut exclusive);
                            exclusive
                        })
                    })
                    .collect();
                handles.into_iter().map(|h| h.join().unwrap()).collect()
            });

            assert_eq!(results, serial_exclusive(&counts));
        }
    }

    #[test]
    fn test_look_back_random_interleavings_narrow() {
        check_random_interleavings::<AtomicU32>(7);
    }

    #[test]
    fn test_look_back_random_interleavings_wide() {
        check_random_interleavings::<AtomicU64>(11);
    }

    #[test]
    fn test_resolve_serial_matches_look_back() {
        let mut rng = StdRng::seed_from_u64(3);
        let counts = random_counts(&mut rng, 6, 256);
        let table = LookbackTable::<AtomicU64>::new(1, 2, 6, 256).unwrap();
        for (tile, c) in counts.iter().enumerate() {
            table.publish_aggregate(0, 1, tile, c);
        }
        table.resolve_serial(0, 1);

        let expected = serial_exclusive(&counts);
        let mut exclusive = vec![0; 256];
        for (tile, want) in expected.iter().enumerate() {
            table.resolved_exclusive(0, 1, tile, &mut exclusive);
            assert_eq!(&exclusive, want);
        }
        // Slot 0 is untouched
        assert_eq!(table.record(0, 0, 3, 7), BinRecord::NotReady);
    }

    #[test]
    fn test_clear_tile() {
        let table = LookbackTable::<AtomicU32>::new(2, 1, 2, 4).unwrap();
        table.publish_aggregate(1, 0, 1, &[1, 2, 3, 4]);
        assert_eq!(table.record(1, 0, 1, 2), BinRecord::Aggregate(3));
        table.clear_tile(1, 0, 1);
        assert!((0..4).all(|bin| table.record(1, 0, 1, bin) == BinRecord::NotReady));
    }
}
