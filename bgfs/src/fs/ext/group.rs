// SPDX-License-Identifier: MIT

use log::{trace, warn};

use crate::core::Bitmap;
use crate::fs::ext::{extent::Extent, group_layout::GroupLayout};

/// One block group: a block bitmap over `[start_block, start_block + total_blocks)`
/// and an inode bitmap of `inodes_per_group` slots.
///
/// Bit `i` of the block bitmap is absolute block `start_block + i`.
#[derive(Debug, Clone)]
pub struct BlockGroup {
    id: u32,
    start_block: u32,
    total_blocks: u32,
    block_bitmap: Bitmap,
    inode_bitmap: Bitmap,
}

impl BlockGroup {
    pub fn new(layout: &GroupLayout, inodes_per_group: u32) -> Self {
        Self {
            id: layout.group_id,
            start_block: layout.group_start,
            total_blocks: layout.blocks(),
            block_bitmap: Bitmap::new(layout.blocks() as usize),
            inode_bitmap: Bitmap::new(inodes_per_group as usize),
        }
    }

    #[inline]
    pub fn id(&self) -> u32 {
        self.id
    }

    #[inline]
    pub fn start_block(&self) -> u32 {
        self.start_block
    }

    #[inline]
    pub fn total_blocks(&self) -> u32 {
        self.total_blocks
    }

    /// One past the last absolute block of the group.
    #[inline]
    pub fn end_block(&self) -> u32 {
        self.start_block + self.total_blocks
    }

    #[inline]
    pub fn contains(&self, block: u32) -> bool {
        (self.start_block..self.end_block()).contains(&block)
    }

    /// Absolute index of group-relative block `relative`.
    #[inline]
    pub fn physical_block(&self, relative: u32) -> u32 {
        self.start_block + relative
    }

    /// Group-relative index of absolute block `block`, if it is in this group.
    #[inline]
    pub fn relative_block(&self, block: u32) -> Option<u32> {
        self.contains(block).then(|| block - self.start_block)
    }

    #[inline]
    pub fn block_bitmap(&self) -> &Bitmap {
        &self.block_bitmap
    }

    #[inline]
    pub fn inode_bitmap(&self) -> &Bitmap {
        &self.inode_bitmap
    }

    #[inline]
    pub fn block_bitmap_mut(&mut self) -> &mut Bitmap {
        &mut self.block_bitmap
    }

    #[inline]
    pub fn inode_bitmap_mut(&mut self) -> &mut Bitmap {
        &mut self.inode_bitmap
    }

    #[inline]
    pub fn free_blocks(&self) -> u32 {
        self.block_bitmap.count_free() as u32
    }

    #[inline]
    pub fn used_blocks(&self) -> u32 {
        self.block_bitmap.count_set() as u32
    }

    #[inline]
    pub fn free_inodes(&self) -> u32 {
        self.inode_bitmap.count_free() as u32
    }

    #[inline]
    pub fn used_inodes(&self) -> u32 {
        self.inode_bitmap.count_set() as u32
    }

    /// Marks `len` blocks from group-relative `relative` and returns them as
    /// an extent placed at `logical_offset` in the file.
    pub fn claim_run(&mut self, relative: u32, len: u32, logical_offset: u32) -> Extent {
        let changed = self.block_bitmap.set_range(relative as usize, len as usize);
        debug_assert_eq!(changed, len as usize, "claimed blocks already in use");

        let extent = Extent::new(logical_offset, self.physical_block(relative), len);
        trace!("group {}: claimed {extent}", self.id);
        extent
    }

    /// Clears `len` blocks starting at absolute `physical_start`.
    ///
    /// Returns how many were actually in use; a shortfall means a double free
    /// and is logged.
    pub fn release_run(&mut self, physical_start: u32, len: u32) -> u32 {
        let Some(relative) = self.relative_block(physical_start) else {
            warn!(
                "group {}: release of block {physical_start} outside the group",
                self.id
            );
            return 0;
        };
        let freed = self
            .block_bitmap
            .clear_range(relative as usize, len as usize) as u32;
        if freed != len {
            warn!(
                "group {}: released {len} blocks at {physical_start} but only {freed} were in use",
                self.id
            );
        }
        freed
    }

    /// Takes the lowest free inode slot.
    #[inline]
    pub fn allocate_inode(&mut self) -> Option<u32> {
        self.inode_bitmap.allocate_first_free().map(|s| s as u32)
    }

    /// Frees an inode slot; `false` if it was not in use.
    pub fn release_inode(&mut self, slot: u32) -> bool {
        let was_set = self.inode_bitmap.is_set(slot as usize);
        if was_set {
            self.inode_bitmap.clear(slot as usize);
        } else {
            warn!("group {}: inode slot {slot} already free", self.id);
        }
        was_set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::ext::meta::ExtMeta;

    fn group(id: u32) -> BlockGroup {
        // 4 groups of 16 blocks, 8 inodes each
        let meta = ExtMeta::new_custom(64 * 512, 512, 4, 8).unwrap();
        BlockGroup::new(&GroupLayout::compute(&meta, id), meta.inodes_per_group)
    }

    #[test]
    fn test_block_mapping() {
        let g = group(2);
        assert_eq!(g.start_block(), 32);
        assert_eq!(g.end_block(), 48);
        assert_eq!(g.physical_block(3), 35);
        assert_eq!(g.relative_block(35), Some(3));
        assert_eq!(g.relative_block(31), None);
        assert_eq!(g.relative_block(48), None);
        assert!(g.contains(47));
    }

    #[test]
    fn test_claim_and_release() {
        let mut g = group(1);
        let ext = g.claim_run(4, 3, 7);
        assert_eq!(ext, Extent::new(7, 20, 3));
        assert_eq!(g.used_blocks(), 3);
        assert!(g.block_bitmap().is_set(4));
        assert!(g.block_bitmap().is_set(6));

        assert_eq!(g.release_run(20, 3), 3);
        assert_eq!(g.free_blocks(), 16);

        // Double free is reported, not fatal
        assert_eq!(g.release_run(20, 3), 0);
        assert_eq!(g.release_run(0, 1), 0);
    }

    #[test]
    fn test_inode_slots() {
        let mut g = group(0);
        assert_eq!(g.allocate_inode(), Some(0));
        assert_eq!(g.allocate_inode(), Some(1));
        assert_eq!(g.used_inodes(), 2);

        assert!(g.release_inode(0));
        assert!(!g.release_inode(0));
        assert_eq!(g.allocate_inode(), Some(0));

        for _ in 2..8 {
            assert!(g.allocate_inode().is_some());
        }
        assert_eq!(g.allocate_inode(), None);
        assert_eq!(g.free_inodes(), 0);
    }
}
