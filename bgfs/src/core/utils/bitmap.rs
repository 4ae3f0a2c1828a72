// SPDX-License-Identifier: MIT

//! Free-space bitmaps.
//!
//! [`BitmapOps`] works on raw byte slices, [`Bitmap`] wraps one with a fixed
//! bit count and the allocation queries used by block groups. A clear bit is
//! free, a set bit is used.

#[cfg(all(not(feature = "std"), feature = "alloc"))]
use alloc::vec::Vec;

/// Bit operations on byte slices.
///
/// Bit 0 is the LSB of byte 0, bit 8 the LSB of byte 1, and so on.
pub trait BitmapOps {
    /// Sets or clears a bit. Does nothing if `bit` is past the end.
    fn set_bit(&mut self, bit: usize, value: bool);

    /// Returns `false` if `bit` is past the end.
    fn get_bit(&self, bit: usize) -> bool;

    /// First clear bit at or after `start`.
    fn find_first_zero(&self, start: usize) -> Option<usize>;

    /// Number of set bits in the whole slice.
    fn count_ones(&self) -> usize;
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

    fn find_first_zero(&self, start: usize) -> Option<usize> {
        let first_byte = start / 8;
        for (idx, &byte) in self.iter().enumerate().skip(first_byte) {
            // Mask off the bits before `start` in its own byte
            let masked = if idx == first_byte {
                byte | ((1u16 << (start % 8)) - 1) as u8
            } else {
                byte
            };
            if masked != 0xFF {
                return Some(idx * 8 + (!masked).trailing_zeros() as usize);
            }
        }
        None
    }

    fn count_ones(&self) -> usize {
        self.iter().map(|b| b.count_ones() as usize).sum()
    }
}

/// Fixed-size bit vector, all clear at creation.
///
/// Every index must lie in `[0, len)`: out-of-range indices are a caller bug
/// and panic.
#[derive(Clone, PartialEq, Eq)]
pub struct Bitmap {
    bits: Vec<u8>,
    len: usize,
}

impl Bitmap {
    pub fn new(len: usize) -> Self {
        Self {
            bits: vec![0u8; len.div_ceil(8)],
            len,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bits
    }

    #[inline]
    #[track_caller]
    fn check(&self, i: usize) {
        assert!(
            i < self.len,
            "bitmap index {i} out of range (len {})",
            self.len
        );
    }

    #[inline]
    #[track_caller]
    pub fn set(&mut self, i: usize) {
        self.check(i);
        self.bits.set_bit(i, true);
    }

    #[inline]
    #[track_caller]
    pub fn clear(&mut self, i: usize) {
        self.check(i);
        self.bits.set_bit(i, false);
    }

    #[inline]
    #[track_caller]
    pub fn is_set(&self, i: usize) -> bool {
        self.check(i);
        self.bits.get_bit(i)
    }

    /// Lowest clear bit, without marking it.
    #[inline]
    pub fn find_first_free(&self) -> Option<usize> {
        self.next_free(0)
    }

    /// Lowest clear bit at or after `from`.
    #[inline]
    pub fn next_free(&self, from: usize) -> Option<usize> {
        // Padding bits of the last byte are always clear
        self.bits.find_first_zero(from).filter(|&i| i < self.len)
    }

    /// Marks and returns the lowest clear bit.
    pub fn allocate_first_free(&mut self) -> Option<usize> {
        let i = self.find_first_free()?;
        self.bits.set_bit(i, true);
        Some(i)
    }

    /// Length of the clear run starting at `start`, capped at `limit`.
    pub fn free_run_len(&self, start: usize, limit: usize) -> usize {
        let end = self.len.min(start.saturating_add(limit));
        (start..end)
            .take_while(|&i| !self.bits.get_bit(i))
            .count()
    }

    /// Start of the leftmost run of `length` clear bits. Nothing is marked.
    ///
    /// Returns `None` for a zero length.
    pub fn find_contiguous_free(&self, length: usize) -> Option<usize> {
        if length == 0 || length > self.len {
            return None;
        }
        let mut from = 0;
        while let Some(start) = self.next_free(from) {
            if self.len - start < length {
                return None;
            }
            let run = self.free_run_len(start, length);
            if run == length {
                return Some(start);
            }
            // bit `start + run` is set
            from = start + run + 1;
        }
        None
    }

    /// Lowest-indexed longest clear run as `(start, len)`.
    pub fn largest_free_run(&self) -> Option<(usize, usize)> {
        let mut best: Option<(usize, usize)> = None;
        let mut from = 0;
        while let Some(start) = self.next_free(from) {
            let run = self.free_run_len(start, self.len - start);
            if best.is_none_or(|(_, len)| run > len) {
                best = Some((start, run));
            }
            from = start + run;
        }
        best
    }

    /// Marks `[start, start + n)`; returns how many bits were clear before.
    #[track_caller]
    pub fn set_range(&mut self, start: usize, n: usize) -> usize {
        self.fill_range(start, n, true)
    }

    /// Clears `[start, start + n)`; returns how many bits were set before.
    #[track_caller]
    pub fn clear_range(&mut self, start: usize, n: usize) -> usize {
        self.fill_range(start, n, false)
    }

    #[track_caller]
    fn fill_range(&mut self, start: usize, n: usize, value: bool) -> usize {
        if n == 0 {
            return 0;
        }
        let end = start.checked_add(n).unwrap_or(usize::MAX);
        self.check(end - 1);

        let mut changed = 0;
        for i in start..end {
            if self.bits.get_bit(i) != value {
                self.bits.set_bit(i, value);
                changed += 1;
            }
        }
        changed
    }

    #[inline]
    pub fn count_set(&self) -> usize {
        self.bits.count_ones()
    }

    #[inline]
    pub fn count_free(&self) -> usize {
        self.len - self.count_set()
    }
}

impl core::fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Bitmap[{}/{} set]", self.count_set(), self.len)
    }
}
