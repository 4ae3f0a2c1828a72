// SPDX-License-Identifier: MIT

#[cfg(all(not(feature = "std"), feature = "alloc"))]
use alloc::vec::Vec;
use core::fmt;

use crate::fs::ext::{group::BlockGroup, inode::Inode, meta::ExtMeta};

/// Occupancy of one block group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroupUsage {
    pub id: u32,
    pub start_block: u32,
    pub used_blocks: u32,
    pub total_blocks: u32,
    pub used_inodes: u32,
    pub total_inodes: u32,
    /// Longest run of free blocks, 0 when the group is full.
    pub largest_free_run: u32,
}

/// Snapshot of space usage across the device.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageReport {
    pub block_size: u32,
    pub groups: Vec<GroupUsage>,
    pub files: usize,
    pub used_blocks: u64,
    /// Blocks covered by groups; the unused tail is excluded.
    pub total_blocks: u64,
    pub unused_blocks: u32,
    pub fragmented_files: usize,
    pub extents: usize,
}

impl UsageReport {
    pub fn collect<'i>(
        meta: &ExtMeta,
        groups: &[BlockGroup],
        inodes: impl Iterator<Item = &'i Inode>,
    ) -> Self {
        let groups: Vec<GroupUsage> = groups
            .iter()
            .map(|g| GroupUsage {
                id: g.id(),
                start_block: g.start_block(),
                used_blocks: g.used_blocks(),
                total_blocks: g.total_blocks(),
                used_inodes: g.used_inodes(),
                total_inodes: g.inode_bitmap().len() as u32,
                largest_free_run: g
                    .block_bitmap()
                    .largest_free_run()
                    .map_or(0, |(_, len)| len as u32),
            })
            .collect();

        let (mut files, mut fragmented_files, mut extents) = (0, 0, 0);
        for inode in inodes {
            files += 1;
            extents += inode.extents.len();
            if inode.is_fragmented() {
                fragmented_files += 1;
            }
        }

        Self {
            block_size: meta.block_size,
            used_blocks: groups.iter().map(|g| g.used_blocks as u64).sum(),
            total_blocks: groups.iter().map(|g| g.total_blocks as u64).sum(),
            unused_blocks: meta.unused_blocks(),
            groups,
            files,
            fragmented_files,
            extents,
        }
    }

    /// Used share of the grouped blocks, in percent.
    pub fn usage_percent(&self) -> f64 {
        if self.total_blocks == 0 {
            return 0.0;
        }
        self.used_blocks as f64 * 100.0 / self.total_blocks as f64
    }

    pub fn free_blocks(&self) -> u64 {
        self.total_blocks - self.used_blocks
    }
}

impl fmt::Display for UsageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "  ┌───────┬────────────┬───────────────────────┬───────────────────┬────────────┐"
        )?;
        writeln!(
            f,
            "  | Group | Start      | Blocks used/total     | Inodes used/total | Largest    |"
        )?;
        writeln!(
            f,
            "  ├───────┼────────────┼───────────────────────┼───────────────────┼────────────┤"
        )?;
        for g in &self.groups {
            writeln!(
                f,
                "  | {id:<5} | {start:>10} | {blocks:>21} | {inodes:>17} | {run:>10} |",
                id = g.id,
                start = g.start_block,
                blocks = format!("{}/{}", g.used_blocks, g.total_blocks),
                inodes = format!("{}/{}", g.used_inodes, g.total_inodes),
                run = g.largest_free_run,
            )?;
        }
        writeln!(
            f,
            "  └───────┴────────────┴───────────────────────┴───────────────────┴────────────┘"
        )?;
        writeln!(
            f,
            "  Files: {} ({} fragmented, {} extents)",
            self.files, self.fragmented_files, self.extents
        )?;
        writeln!(
            f,
            "  Blocks: {}/{} used, {} unused, {} bytes each",
            self.used_blocks, self.total_blocks, self.unused_blocks, self.block_size
        )?;
        writeln!(f, "  Global usage: {:.2}%", self.usage_percent())
    }
}
