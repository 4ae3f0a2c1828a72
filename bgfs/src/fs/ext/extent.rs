// SPDX-License-Identifier: MIT

use core::fmt;
use core::ops::Range;

/// Run of physically contiguous blocks backing part of a file.
///
/// `logical_offset` is the index of the run's first block within the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    pub logical_offset: u32,
    pub physical_start: u32,
    pub len: u32,
}

impl Extent {
    #[inline]
    pub fn new(logical_offset: u32, physical_start: u32, len: u32) -> Self {
        debug_assert!(len > 0, "empty extent");
        Self {
            logical_offset,
            physical_start,
            len,
        }
    }

    /// One past the last physical block.
    #[inline]
    pub fn physical_end(&self) -> u32 {
        self.physical_start + self.len
    }

    /// One past the last logical block.
    #[inline]
    pub fn logical_end(&self) -> u32 {
        self.logical_offset + self.len
    }

    /// Absolute block indices covered, in order.
    #[inline]
    pub fn blocks(&self) -> Range<u32> {
        self.physical_start..self.physical_end()
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}..{}) -> [{}..{})",
            self.logical_offset,
            self.logical_end(),
            self.physical_start,
            self.physical_end()
        )
    }
}
