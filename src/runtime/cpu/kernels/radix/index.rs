//! Carried and output index types

use super::workspace::try_filled_vec;
use crate::dtype::Element;
use crate::error::Result;
use bytemuck::Pod;
use std::fmt::Debug;

/// Unsigned index carried next to each key through the passes
pub trait CarriedIndex: Copy + Send + Sync + Pod + Debug + 'static {
    /// Index for a position along the sort axis
    fn from_position(position: usize) -> Self;

    /// Position along the sort axis
    fn position(self) -> usize;
}

impl CarriedIndex for u32 {
    #[inline(always)]
    fn from_position(position: usize) -> Self {
        position as u32
    }

    #[inline(always)]
    fn position(self) -> usize {
        self as usize
    }
}

impl CarriedIndex for u64 {
    #[inline(always)]
    fn from_position(position: usize) -> Self {
        position as u64
    }

    #[inline(always)]
    fn position(self) -> usize {
        self as usize
    }
}

/// Signed index dtype written to the caller's indices output
pub trait OutputIndex: Element {
    /// Output index for a carried index
    fn from_carried<I: CarriedIndex>(index: I) -> Self;

    /// Carried index for an output index
    ///
    /// Round-trips through [`OutputIndex::from_carried`] when `I` is at
    /// least as wide as `Self`.
    fn to_carried<I: CarriedIndex>(self) -> I;
}

impl OutputIndex for i32 {
    #[inline(always)]
    fn from_carried<I: CarriedIndex>(index: I) -> Self {
        index.position() as i32
    }

    #[inline(always)]
    fn to_carried<I: CarriedIndex>(self) -> I {
        I::from_position(self as usize)
    }
}

impl OutputIndex for i64 {
    #[inline(always)]
    fn from_carried<I: CarriedIndex>(index: I) -> Self {
        index.position() as i64
    }

    #[inline(always)]
    fn to_carried<I: CarriedIndex>(self) -> I {
        I::from_position(self as usize)
    }
}

/// Carried indices seeding a sort with caller-supplied indices
pub fn seed_indices<I: CarriedIndex, O: OutputIndex>(presets: &[O]) -> Result<Vec<I>> {
    let mut seeds = try_filled_vec(presets.len(), I::from_position(0))?;
    for (seed, &preset) in seeds.iter_mut().zip(presets) {
        *seed = preset.to_carried();
    }
    Ok(seeds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeds_round_trip() {
        let presets = [7i64, -1, i64::MAX, 0];
        let seeds = seed_indices::<u64, i64>(&presets).unwrap();
        let back: Vec<i64> = seeds.iter().map(|&s| i64::from_carried(s)).collect();
        assert_eq!(back, presets);

        let presets = [3i32, -20, i32::MIN];
        let seeds = seed_indices::<u32, i32>(&presets).unwrap();
        let back: Vec<i32> = seeds.iter().map(|&s| i32::from_carried(s)).collect();
        assert_eq!(back, presets);
    }
}
