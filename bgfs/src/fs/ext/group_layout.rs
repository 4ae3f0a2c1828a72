// SPDX-License-Identifier: MIT

use crate::fs::ext::meta::ExtMeta;

/// Position of one block group on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupLayout {
    pub group_id: u32,
    pub group_start: u32, // First absolute block of the group
    pub group_end: u32,   // One past the last absolute block
}

impl GroupLayout {
    pub fn compute(meta: &ExtMeta, group_id: u32) -> Self {
        let group_start = group_id * meta.blocks_per_group;
        Self {
            group_id,
            group_start,
            group_end: group_start + meta.blocks_per_group,
        }
    }

    #[inline]
    pub fn blocks(&self) -> u32 {
        self.group_end - self.group_start
    }

    /// Group whose range holds absolute block `block`, if any.
    ///
    /// Blocks in the unused tail of the device belong to no group.
    pub fn owning_group(meta: &ExtMeta, block: u32) -> Option<u32> {
        let group = block / meta.blocks_per_group;
        (group < meta.group_count).then_some(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_layout_computation() {
        let meta = ExtMeta::new_custom(32 * 1024 * 1024, 4096, 4, 128).unwrap();

        let mut expected_start = 0;
        for group_id in 0..meta.group_count {
            let layout = GroupLayout::compute(&meta, group_id);
            assert_eq!(
                layout.group_start, expected_start,
                "Group {group_id}: group_start mismatch"
            );
            assert_eq!(layout.blocks(), meta.blocks_per_group);
            expected_start = layout.group_end;

            println!(
                "✓ Group {group_id}: start={}, end={}",
                layout.group_start, layout.group_end
            );
        }
        assert_eq!(expected_start, meta.group_blocks());
    }

    #[test]
    fn test_owning_group() {
        // 10 blocks, 3 groups of 3, block 9 unused
        let meta = ExtMeta::new_custom(10, 1, 3, 1).unwrap();
        assert_eq!(GroupLayout::owning_group(&meta, 0), Some(0));
        assert_eq!(GroupLayout::owning_group(&meta, 2), Some(0));
        assert_eq!(GroupLayout::owning_group(&meta, 3), Some(1));
        assert_eq!(GroupLayout::owning_group(&meta, 8), Some(2));
        assert_eq!(GroupLayout::owning_group(&meta, 9), None);
        assert_eq!(GroupLayout::owning_group(&meta, u32::MAX), None);
    }
}
