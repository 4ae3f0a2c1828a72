// SPDX-License-Identifier: MIT

//! Extent allocation strategies.
//!
//! An allocator turns a block count into an ordered list of extents, marking
//! the blocks it hands out in the groups' bitmaps.

#[cfg(all(not(feature = "std"), feature = "alloc"))]
use alloc::vec::Vec;

use crate::core::FsAllocatorError;
use crate::fs::ext::{extent::Extent, group::BlockGroup};

mod smart_fit;
mod worst_fit;

pub use smart_fit::SmartFitAllocator;
pub use worst_fit::WorstFitAllocator;

/// A request the groups could not satisfy.
///
/// `extents` are the blocks the call did mark before running out. They stay
/// marked: the caller owns them and must release them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortGrant {
    pub requested: u32,
    pub extents: Vec<Extent>,
}

impl ShortGrant {
    /// Blocks marked before the failure.
    pub fn granted(&self) -> u32 {
        self.extents.iter().map(|e| e.len).sum()
    }
}

impl From<ShortGrant> for FsAllocatorError {
    #[inline]
    fn from(short: ShortGrant) -> Self {
        FsAllocatorError::DiskFull {
            requested: short.requested,
            granted: short.granted(),
        }
    }
}

/// Block allocation strategy over the groups of one device.
///
/// On success the extents cover exactly `blocks_needed` blocks, with logical
/// offsets running gap-free from 0 and each extent inside a single group.
pub trait ExtentAllocator {
    fn allocate(
        &self,
        groups: &mut [BlockGroup],
        blocks_needed: u32,
    ) -> Result<Vec<Extent>, ShortGrant>;

    /// Short name used in logs and reports.
    fn name(&self) -> &'static str;
}

/// Builds extents with increasing logical offsets until `remaining` is 0.
pub(crate) struct ExtentCursor {
    requested: u32,
    remaining: u32,
    extents: Vec<Extent>,
}

impl ExtentCursor {
    pub(crate) fn new(requested: u32) -> Self {
        Self {
            requested,
            remaining: requested,
            extents: Vec::new(),
        }
    }

    #[inline]
    pub(crate) fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Claims `len` blocks at group-relative `relative` in `group`.
    pub(crate) fn claim(&mut self, group: &mut BlockGroup, relative: u32, len: u32) {
        let logical = self.requested - self.remaining;
        self.extents.push(group.claim_run(relative, len, logical));
        self.remaining -= len;
    }

    pub(crate) fn finish(self) -> Result<Vec<Extent>, ShortGrant> {
        if self.remaining == 0 {
            Ok(self.extents)
        } else {
            Err(ShortGrant {
                requested: self.requested,
                extents: self.extents,
            })
        }
    }
}

#[cfg(test)]
pub(crate) mod test_utils {
    use super::*;
    use crate::fs::ext::{group_layout::GroupLayout, meta::ExtMeta};

    /// `groups` groups of `blocks` blocks each, 4 inodes per group.
    pub fn groups(count: u32, blocks: u32) -> Vec<BlockGroup> {
        let meta = ExtMeta::new_custom((count * blocks) as u64, 1, count, 4).unwrap();
        (0..count)
            .map(|id| BlockGroup::new(&GroupLayout::compute(&meta, id), meta.inodes_per_group))
            .collect()
    }

    /// Marks the group-relative blocks flagged with `1` in `pattern`.
    pub fn occupy(group: &mut BlockGroup, pattern: &str) {
        for (i, c) in pattern.chars().enumerate() {
            if c == '1' {
                group.block_bitmap_mut().set(i);
            }
        }
    }

    /// Checks the shape every successful allocation must have.
    pub fn assert_well_formed(extents: &[Extent], requested: u32) {
        let mut logical = 0;
        for e in extents {
            assert!(e.len > 0);
            assert_eq!(e.logical_offset, logical, "gap or overlap in {extents:?}");
            logical += e.len;
        }
        assert_eq!(logical, requested);
    }
}
