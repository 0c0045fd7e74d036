//! Order-preserving key twiddling
//!
//! A twiddled key is an unsigned word whose unsigned order matches the key's
//! order, so every key type sorts with the same 8-bit digit machinery.

use crate::dtype::Element;
use bytemuck::Pod;
use std::fmt::Debug;

/// Unsigned word carrying twiddled key bits
pub trait RadixBits: Copy + Send + Sync + Pod + Eq + Ord + Debug + 'static {
    /// Width in bytes, one digit pass per byte
    const BYTES: usize;
    /// All bits clear
    const ZERO: Self;

    /// 8-bit digit of pass `pass` (0 is the least significant byte)
    fn digit(self, pass: usize) -> usize;

    /// Bitwise complement
    fn complement(self) -> Self;

    /// Mask covering the digit of pass `pass`
    fn digit_mask(pass: usize) -> Self;

    /// `digit` placed at pass `pass`
    fn from_digit(digit: usize, pass: usize) -> Self;

    /// Bitwise and
    fn and(self, other: Self) -> Self;

    /// Bitwise or
    fn or(self, other: Self) -> Self;
}

macro_rules! impl_radix_bits {
    ($($ty:ty),* $(,)?) => {
        $(
            impl RadixBits for $ty {
                const BYTES: usize = std::mem::size_of::<$ty>();
                const ZERO: Self = 0;

                #[inline(always)]
                fn digit(self, pass: usize) -> usize {
                    ((self >> (pass * 8)) & 0xff) as usize
                }

                #[inline(always)]
                fn complement(self) -> Self {
                    !self
                }

                #[inline(always)]
                fn digit_mask(pass: usize) -> Self {
                    (0xff as $ty) << (pass * 8)
                }

                #[inline(always)]
                fn from_digit(digit: usize, pass: usize) -> Self {
                    ((digit & 0xff) as $ty) << (pass * 8)
                }

                #[inline(always)]
                fn and(self, other: Self) -> Self {
                    self & other
                }

                #[inline(always)]
                fn or(self, other: Self) -> Self {
                    self | other
                }
            }
        )*
    };
}

impl_radix_bits!(u8, u16, u32, u64);

/// Key type with an order-preserving map onto [`RadixBits`]
pub trait RadixKey: Element {
    /// Word the key is twiddled into
    type Bits: RadixBits;

    /// Ascending twiddle
    fn to_ordered_bits(self) -> Self::Bits;

    /// Inverse of [`RadixKey::to_ordered_bits`]
    fn from_ordered_bits(bits: Self::Bits) -> Self;
}

/// Twiddle `key` so that unsigned order of the result is the requested key order
#[inline(always)]
pub fn twiddle<K: RadixKey>(key: K, descending: bool) -> K::Bits {
    let bits = key.to_ordered_bits();
    if descending { bits.complement() } else { bits }
}

/// Recover the key from bits produced by [`twiddle`] with the same order
#[inline(always)]
pub fn untwiddle<K: RadixKey>(bits: K::Bits, descending: bool) -> K {
    let bits = if descending { bits.complement() } else { bits };
    K::from_ordered_bits(bits)
}

macro_rules! impl_radix_key_unsigned {
    ($($ty:ty),* $(,)?) => {
        $(
            impl RadixKey for $ty {
                type Bits = $ty;

                #[inline(always)]
                fn to_ordered_bits(self) -> $ty {
                    self
                }

                #[inline(always)]
                fn from_ordered_bits(bits: $ty) -> Self {
                    bits
                }
            }
        )*
    };
}

macro_rules! impl_radix_key_signed {
    ($($ty:ty => $bits:ty),* $(,)?) => {
        $(
            impl RadixKey for $ty {
                type Bits = $bits;

                #[inline(always)]
                fn to_ordered_bits(self) -> $bits {
                    (self as $bits) ^ (1 << (<$bits>::BITS - 1))
                }

                #[inline(always)]
                fn from_ordered_bits(bits: $bits) -> Self {
                    (bits ^ (1 << (<$bits>::BITS - 1))) as $ty
                }
            }
        )*
    };
}

// Negative floats have their whole word inverted, positive floats get the
// sign bit set. -0.0 is folded onto +0.0 first.
macro_rules! impl_radix_key_float {
    ($($ty:ty => $bits:ty),* $(,)?) => {
        $(
            impl RadixKey for $ty {
                type Bits = $bits;

                #[inline(always)]
                fn to_ordered_bits(self) -> $bits {
                    const SIGN: $bits = 1 << (<$bits>::BITS - 1);
                    let mut bits = self.to_bits();
                    if bits == SIGN {
                        bits = 0;
                    }
                    if bits & SIGN != 0 { !bits } else { bits | SIGN }
                }

                #[inline(always)]
                fn from_ordered_bits(bits: $bits) -> Self {
                    const SIGN: $bits = 1 << (<$bits>::BITS - 1);
                    let bits = if bits & SIGN != 0 { bits ^ SIGN } else { !bits };
                    <$ty>::from_bits(bits)
                }
            }
        )*
    };
}

impl_radix_key_unsigned!(u8, u16, u32, u64);
impl_radix_key_signed!(i8 => u8, i16 => u16, i32 => u32, i64 => u64);
impl_radix_key_float!(f32 => u32, f64 => u64);

#[cfg(feature = "f16")]
impl_radix_key_float!(half::f16 => u16, half::bf16 => u16);

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn assert_round_trip<K: RadixKey>(key: K)
    where
        K: PartialEq,
    {
        for descending in [false, true] {
            let back: K = untwiddle(twiddle(key, descending), descending);
            assert!(
                bytemuck::bytes_of(&back) == bytemuck::bytes_of(&key),
                "{key:?} came back as {back:?} (descending = {descending})"
            );
        }
    }

    #[test]
    fn test_digits() {
        let bits: u32 = 0x1234_5678;
        assert_eq!(bits.digit(0), 0x78);
        assert_eq!(bits.digit(3), 0x12);
        assert_eq!(u32::digit_mask(1), 0x0000_ff00);
        assert_eq!(u32::from_digit(0xab, 2), 0x00ab_0000);
        assert_eq!(u64::BYTES, 8);
    }

    #[test]
    fn test_round_trip_exhaustive_narrow() {
        for b in 0..=u8::MAX {
            assert_round_trip(b);
            assert_round_trip(b as i8);
        }
        for b in 0..=u16::MAX {
            assert_round_trip(b);
            assert_round_trip(b as i16);
        }
    }

    #[test]
    fn test_round_trip_sampled_wide() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..100_000 {
            let w: u32 = rng.random();
            let d: u64 = rng.random();
            assert_round_trip(w);
            assert_round_trip(w as i32);
            assert_round_trip(d);
            assert_round_trip(d as i64);
            if w != 0x8000_0000 {
                assert_round_trip(f32::from_bits(w));
            }
            if d != 0x8000_0000_0000_0000 {
                assert_round_trip(f64::from_bits(d));
            }
        }
        for edge in [0u32, 1, 0x7fff_ffff, 0x8000_0001, u32::MAX] {
            assert_round_trip(f32::from_bits(edge));
        }
    }

    #[test]
    fn test_order_preserved() {
        let ints = [i32::MIN, -1000, -1, 0, 1, 7, i32::MAX];
        for pair in ints.windows(2) {
            assert!(twiddle(pair[0], false) < twiddle(pair[1], false));
            assert!(twiddle(pair[0], true) > twiddle(pair[1], true));
        }

        let floats = [
            f64::NEG_INFINITY,
            -1.0e300,
            -1.5,
            -f64::MIN_POSITIVE,
            0.0,
            f64::MIN_POSITIVE,
            2.5,
            f64::INFINITY,
        ];
        for pair in floats.windows(2) {
            assert!(twiddle(pair[0], false) < twiddle(pair[1], false));
        }
    }

    #[test]
    fn test_negative_zero_canonicalized() {
        assert_eq!(twiddle(-0.0f32, false), twiddle(0.0f32, false));
        assert_eq!(twiddle(-0.0f64, true), twiddle(0.0f64, true));
        let back: f32 = untwiddle(twiddle(-0.0f32, false), false);
        assert_eq!(back.to_bits(), 0);
    }

    #[test]
    fn test_nan_payload_preserved() {
        let nan = f32::from_bits(0x7fc0_1234);
        let back: f32 = untwiddle(twiddle(nan, false), false);
        assert_eq!(back.to_bits(), 0x7fc0_1234);
        assert!(twiddle(nan, false) > twiddle(f32::INFINITY, false));
    }

    #[cfg(feature = "f16")]
    #[test]
    fn test_round_trip_exhaustive_half() {
        for b in 0..=u16::MAX {
            if b == 0x8000 {
                continue;
            }
            assert_round_trip(half::f16::from_bits(b));
            assert_round_trip(half::bf16::from_bits(b));
        }
    }
}
