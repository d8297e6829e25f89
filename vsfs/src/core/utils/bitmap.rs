// SPDX-License-Identifier: MIT

//! Bit manipulation on byte slices used as allocation bitmaps.

use core::ops::Range;

/// Extension trait for bitmap operations on byte slices.
///
/// Bit ordering matches the on-disk vsfs bitmap: bit `i` lives in byte
/// `i / 8` at position `i % 8`, least significant bit first.
pub trait BitmapOps {
    /// Sets or clears bit `bit`. Out-of-range bits are ignored.
    fn set_bit(&mut self, bit: usize, value: bool);

    /// Returns bit `bit`, or `false` when out of range.
    fn get_bit(&self, bit: usize) -> bool;

    /// Counts set bits over the whole slice.
    fn count_ones(&self) -> usize;

    /// Finds the first clear bit inside `range` (clamped to the slice).
    fn first_zero_in(&self, range: Range<usize>) -> Option<usize>;
}

impl BitmapOps for [u8] {
    #[inline]
    fn set_bit(&mut self, bit: usize, value: bool) {
        if let Some(byte) = self.get_mut(bit / 8) {
            let mask = 1u8 << (bit % 8);
            if value {
                *byte |= mask;
            } else {
                *byte &= !mask;
            }
        }
    }

    #[inline]
    fn get_bit(&self, bit: usize) -> bool {
        self.get(bit / 8)
            .is_some_and(|b| (b & (1 << (bit % 8))) != 0)
    }

    fn count_ones(&self) -> usize {
        self.iter().map(|b| b.count_ones() as usize).sum()
    }

    fn first_zero_in(&self, range: Range<usize>) -> Option<usize> {
        let end = range.end.min(self.len() * 8);
        let mut bit = range.start;
        while bit < end {
            // Whole byte allocated: jump to the next byte boundary
            if bit % 8 == 0 && self[bit / 8] == 0xFF {
                bit += 8;
                continue;
            }
            if !self.get_bit(bit) {
                return Some(bit);
            }
            bit += 1;
        }
        None
    }
}
