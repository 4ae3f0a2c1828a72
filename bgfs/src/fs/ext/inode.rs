// SPDX-License-Identifier: MIT

#[cfg(all(not(feature = "std"), feature = "alloc"))]
use alloc::vec::Vec;
use core::fmt;

use crate::fs::ext::extent::Extent;

/// Inode address: owning group and slot in that group's inode bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InodeId {
    pub group: u32,
    pub slot: u32,
}

impl InodeId {
    #[inline]
    pub fn new(group: u32, slot: u32) -> Self {
        Self { group, slot }
    }

    /// Flat number `group * inodes_per_group + slot`.
    #[inline]
    pub fn raw(&self, inodes_per_group: u32) -> u64 {
        self.group as u64 * inodes_per_group as u64 + self.slot as u64
    }

    /// Inverse of [`InodeId::raw`]. `None` if the group does not fit in `u32`.
    pub fn from_raw(raw: u64, inodes_per_group: u32) -> Option<Self> {
        if inodes_per_group == 0 {
            return None;
        }
        let group = u32::try_from(raw / inodes_per_group as u64).ok()?;
        let slot = (raw % inodes_per_group as u64) as u32;
        Some(Self { group, slot })
    }
}

impl fmt::Display for InodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.slot)
    }
}

/// A file: its size and the extents holding its blocks, in logical order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inode {
    pub id: InodeId,
    pub size_bytes: u64,
    pub extents: Vec<Extent>,
}

impl Inode {
    pub fn new(id: InodeId, size_bytes: u64, extents: Vec<Extent>) -> Self {
        Self {
            id,
            size_bytes,
            extents,
        }
    }

    /// Blocks held across every extent.
    pub fn block_count(&self) -> u64 {
        self.extents.iter().map(|e| e.len as u64).sum()
    }

    #[inline]
    pub fn is_fragmented(&self) -> bool {
        self.extents.len() > 1
    }

    /// Absolute block indices in file order.
    pub fn blocks(&self) -> impl Iterator<Item = u32> + '_ {
        self.extents.iter().flat_map(|e| e.blocks())
    }
}
