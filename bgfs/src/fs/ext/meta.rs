// SPDX-License-Identifier: MIT

use crate::core::{FsFormatterError, FsFormatterResult};
use crate::fs::ext::constant::*;

/// Format parameters and the geometry derived from them.
///
/// `blocks_per_group = block_count / group_count`; the remainder blocks at
/// the end of the device belong to no group and are never allocated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtMeta {
    pub volume_size_bytes: u64,
    pub block_size: u32,
    pub block_count: u32,
    pub group_count: u32,
    pub blocks_per_group: u32,
    pub inodes_per_group: u32,
}

impl ExtMeta {
    /// Default geometry: 4 KiB blocks, 4 groups, 1024 inodes per group.
    pub fn new(size_bytes: u64) -> FsFormatterResult<Self> {
        Self::new_custom(
            size_bytes,
            EXT_DEFAULT_BLOCK_SIZE,
            EXT_DEFAULT_GROUP_COUNT,
            EXT_DEFAULT_INODES_PER_GROUP,
        )
    }

    pub fn new_custom(
        volume_size_bytes: u64,
        block_size: u32,
        group_count: u32,
        inodes_per_group: u32,
    ) -> FsFormatterResult<Self> {
        crate::ensure!(
            block_size > 0,
            FsFormatterError::Invalid("block size must be > 0")
        );
        crate::ensure!(
            group_count > 0,
            FsFormatterError::Invalid("group count must be > 0")
        );
        crate::ensure!(
            inodes_per_group > 0,
            FsFormatterError::Invalid("inodes per group must be > 0")
        );

        let block_count = u32::try_from(volume_size_bytes / block_size as u64)
            .map_err(|_| FsFormatterError::Invalid("volume has more than u32::MAX blocks"))?;
        let blocks_per_group = block_count / group_count;
        crate::ensure!(
            blocks_per_group > 0,
            FsFormatterError::Invalid("volume too small for the group count")
        );

        Ok(Self {
            volume_size_bytes,
            block_size,
            block_count,
            group_count,
            blocks_per_group,
            inodes_per_group,
        })
    }

    /// Blocks covered by some group.
    #[inline]
    pub fn group_blocks(&self) -> u32 {
        self.blocks_per_group * self.group_count
    }

    /// Tail blocks left out of every group.
    #[inline]
    pub fn unused_blocks(&self) -> u32 {
        self.block_count - self.group_blocks()
    }

    #[inline]
    pub fn inode_count(&self) -> u64 {
        self.group_count as u64 * self.inodes_per_group as u64
    }

    /// Bytes the block store spans on the device.
    #[inline]
    pub fn device_bytes(&self) -> u64 {
        self.block_count as u64 * self.block_size as u64
    }

    /// `ceil(len / block_size)`.
    #[inline]
    pub fn blocks_for(&self, len: u64) -> u64 {
        len.div_ceil(self.block_size as u64)
    }

    #[inline]
    pub fn block_offset(&self, block: u32) -> u64 {
        block as u64 * self.block_size as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_geometry() {
        let meta = ExtMeta::new(64 * 1024 * 1024).unwrap();
        assert_eq!(meta.block_size, 4096);
        assert_eq!(meta.block_count, 16384);
        assert_eq!(meta.group_count, 4);
        assert_eq!(meta.blocks_per_group, 4096);
        assert_eq!(meta.inodes_per_group, 1024);
        assert_eq!(meta.unused_blocks(), 0);
        assert_eq!(meta.inode_count(), 4096);
    }

    #[test]
    fn test_remainder_blocks_are_unused() {
        let meta = ExtMeta::new_custom(10 * 512 + 100, 512, 3, 8).unwrap();
        assert_eq!(meta.block_count, 10);
        assert_eq!(meta.blocks_per_group, 3);
        assert_eq!(meta.group_blocks(), 9);
        assert_eq!(meta.unused_blocks(), 1);
        assert_eq!(meta.device_bytes(), 5120);
    }

    #[test]
    fn test_blocks_for_rounds_up() {
        let meta = ExtMeta::new_custom(40, 4, 1, 10).unwrap();
        assert_eq!(meta.blocks_for(0), 0);
        assert_eq!(meta.blocks_for(1), 1);
        assert_eq!(meta.blocks_for(4), 1);
        assert_eq!(meta.blocks_for(17), 5);
        assert_eq!(meta.block_offset(3), 12);
    }

    #[test]
    fn test_invalid_parameters() {
        let invalid =
            |r: FsFormatterResult<ExtMeta>| matches!(r, Err(FsFormatterError::Invalid(_)));

        assert!(invalid(ExtMeta::new_custom(4096, 0, 1, 1)));
        assert!(invalid(ExtMeta::new_custom(4096, 512, 0, 1)));
        assert!(invalid(ExtMeta::new_custom(4096, 512, 1, 0)));
        // 3 blocks cannot feed 4 groups
        assert!(invalid(ExtMeta::new_custom(3 * 512, 512, 4, 1)));
    }
}
