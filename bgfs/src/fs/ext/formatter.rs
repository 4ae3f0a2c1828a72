// SPDX-License-Identifier: MIT

#[cfg(all(not(feature = "std"), feature = "alloc"))]
use alloc::vec::Vec;

use bgio::prelude::*;
use log::debug;

use crate::core::{FsFormatterError, FsFormatterResult, formatter::FsFormatter};
use crate::fs::ext::{group::BlockGroup, group_layout::GroupLayout, meta::ExtMeta};

/// Checks the device against the geometry and lays out the block groups.
pub struct ExtFormatter<'a, IO: BgIO + ?Sized> {
    io: &'a mut IO,
    meta: &'a ExtMeta,
}

impl<'a, IO: BgIO + ?Sized> FsFormatter for ExtFormatter<'a, IO> {
    type Layout = Vec<BlockGroup>;

    fn format(&mut self, full_format: bool) -> FsFormatterResult<Vec<BlockGroup>> {
        Self::check_device(self.io, self.meta)?;

        if full_format {
            self.io.zero_fill(0, self.meta.device_bytes())?;
        }

        let groups = Self::build_groups(self.meta);
        self.io.flush()?;

        debug!(
            "formatted {} groups x {} blocks of {} bytes ({} unused), {} inodes per group",
            self.meta.group_count,
            self.meta.blocks_per_group,
            self.meta.block_size,
            self.meta.unused_blocks(),
            self.meta.inodes_per_group
        );
        Ok(groups)
    }
}

impl<'a, IO: BgIO + ?Sized> ExtFormatter<'a, IO> {
    pub fn new(io: &'a mut IO, meta: &'a ExtMeta) -> Self {
        Self { io, meta }
    }

    fn check_device(io: &IO, meta: &ExtMeta) -> FsFormatterResult {
        if let Some(capacity) = io.capacity()
            && capacity < meta.device_bytes()
        {
            return Err(FsFormatterError::DeviceTooSmall {
                needed: meta.device_bytes(),
                capacity,
            });
        }
        Ok(())
    }

    fn build_groups(meta: &ExtMeta) -> Vec<BlockGroup> {
        (0..meta.group_count)
            .map(|id| BlockGroup::new(&GroupLayout::compute(meta, id), meta.inodes_per_group))
            .collect()
    }
}
