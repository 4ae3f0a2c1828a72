// SPDX-License-Identifier: MIT

#[cfg(all(not(feature = "std"), feature = "alloc"))]
use alloc::vec::Vec;

use log::trace;

use super::{ExtentAllocator, ExtentCursor, ShortGrant};
use crate::fs::ext::{extent::Extent, group::BlockGroup};

/// Contiguous-first allocation with fragmented fallback.
///
/// Groups are visited in order. In each one the whole remaining request is
/// first placed as a single run if the group has one; otherwise the group is
/// drained run by run from its lowest free block, each run capped at what is
/// still needed. The next group is only touched once this one has nothing
/// left to give.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmartFitAllocator;

impl ExtentAllocator for SmartFitAllocator {
    fn allocate(
        &self,
        groups: &mut [BlockGroup],
        blocks_needed: u32,
    ) -> Result<Vec<Extent>, ShortGrant> {
        let mut cursor = ExtentCursor::new(blocks_needed);

        for group in groups.iter_mut() {
            if cursor.remaining() == 0 {
                break;
            }

            let wanted = cursor.remaining() as usize;
            if let Some(start) = group.block_bitmap().find_contiguous_free(wanted) {
                trace!("smart-fit: group {} fits {wanted} blocks at {start}", group.id());
                cursor.claim(group, start as u32, wanted as u32);
                break;
            }

            while cursor.remaining() > 0 {
                let bitmap = group.block_bitmap();
                let Some(start) = bitmap.find_first_free() else {
                    break;
                };
                let run = bitmap.free_run_len(start, cursor.remaining() as usize) as u32;
                cursor.claim(group, start as u32, run);
            }
        }

        cursor.finish()
    }

    fn name(&self) -> &'static str {
        "smart-fit"
    }
}
