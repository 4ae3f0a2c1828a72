// SPDX-License-Identifier: MIT

#[cfg(all(not(feature = "std"), feature = "alloc"))]
use alloc::vec::Vec;

use log::trace;

use super::{ExtentAllocator, ExtentCursor, ShortGrant};
use crate::fs::ext::{extent::Extent, group::BlockGroup};

/// Carves each piece out of the largest free run on the whole device.
///
/// Ties go to the lowest group, then the lowest block. Leaves big holes
/// for later files at the cost of scattering small ones.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorstFitAllocator;

impl WorstFitAllocator {
    /// `(group index, relative start, len)` of the device's largest free run.
    fn largest_run(groups: &[BlockGroup]) -> Option<(usize, usize, usize)> {
        groups
            .iter()
            .enumerate()
            .filter_map(|(g, group)| {
                group
                    .block_bitmap()
                    .largest_free_run()
                    .map(|(start, len)| (g, start, len))
            })
            .fold(None, |best, run| match best {
                Some((_, _, len)) if len >= run.2 => best,
                _ => Some(run),
            })
    }
}

impl ExtentAllocator for WorstFitAllocator {
    fn allocate(
        &self,
        groups: &mut [BlockGroup],
        blocks_needed: u32,
    ) -> Result<Vec<Extent>, ShortGrant> {
        let mut cursor = ExtentCursor::new(blocks_needed);

        while cursor.remaining() > 0 {
            let Some((g, start, len)) = Self::largest_run(groups) else {
                break;
            };
            let take = (len as u32).min(cursor.remaining());
            trace!("worst-fit: group {g} run of {len} at {start}, taking {take}");
            cursor.claim(&mut groups[g], start as u32, take);
        }

        cursor.finish()
    }

    fn name(&self) -> &'static str {
        "worst-fit"
    }
}
