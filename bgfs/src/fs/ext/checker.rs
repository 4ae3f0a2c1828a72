// SPDX-License-Identifier: MIT

#[cfg(all(not(feature = "std"), feature = "alloc"))]
use alloc::{collections::BTreeMap, string::String, vec::Vec};
#[cfg(feature = "std")]
use std::collections::BTreeMap;

pub use crate::core::checker::*;

use crate::core::Bitmap;
use crate::fs::ext::{group::BlockGroup, group_layout::GroupLayout, inode::Inode, meta::ExtMeta};

/// Phase selection and fail-fast; nothing filesystem-specific to add.
pub type ExtCheckOptions = VerifyOptions;

/// Verifies groups, extents and bitmaps of a live file table against each other.
pub struct ExtChecker<'a> {
    meta: &'a ExtMeta,
    groups: &'a [BlockGroup],
    directory: &'a BTreeMap<String, Inode>,
}

impl<'a> ExtChecker<'a> {
    pub fn new(
        meta: &'a ExtMeta,
        groups: &'a [BlockGroup],
        directory: &'a BTreeMap<String, Inode>,
    ) -> Self {
        Self {
            meta,
            groups,
            directory,
        }
    }

    /// Group holding the whole of `[start, start + len)`, if any.
    fn group_of_run(&self, start: u32, len: u32) -> Option<usize> {
        let g = GroupLayout::owning_group(self.meta, start)? as usize;
        let group = self.groups.get(g)?;
        let last = start.checked_add(len)?.checked_sub(1)?;
        group.contains(last).then_some(g)
    }
}

impl<'a> FsChecker for ExtChecker<'a> {
    type Options = ExtCheckOptions;

    fn check_geometry(&mut self, _opt: &Self::Options, rep: &mut VerifyReport) -> FsCheckerResult {
        let meta = self.meta;

        if self.groups.len() != meta.group_count as usize {
            rep.push(Finding::err(
                "GEO.COUNT",
                format!("{} groups, expected {}", self.groups.len(), meta.group_count),
            ));
        }

        let mut errors = 0usize;
        let mut expected_start = 0u32;
        for (i, g) in self.groups.iter().enumerate() {
            let mut bad = |code: &'static str, msg: String| {
                errors += 1;
                rep.push(Finding::err(code, msg));
            };

            if g.id() != i as u32 {
                bad("GEO.ID", format!("group #{i} has id {}", g.id()));
            }
            if g.start_block() != expected_start {
                bad(
                    "GEO.START",
                    format!("group {i} starts at {}, expected {expected_start}", g.start_block()),
                );
            }
            if g.total_blocks() != meta.blocks_per_group {
                bad(
                    "GEO.SIZE",
                    format!(
                        "group {i} has {} blocks, expected {}",
                        g.total_blocks(),
                        meta.blocks_per_group
                    ),
                );
            }
            if g.block_bitmap().len() != g.total_blocks() as usize {
                bad(
                    "GEO.BITMAP",
                    format!("group {i}: block bitmap of {} bits", g.block_bitmap().len()),
                );
            }
            if g.inode_bitmap().len() != meta.inodes_per_group as usize {
                bad(
                    "GEO.INODES",
                    format!("group {i}: inode bitmap of {} bits", g.inode_bitmap().len()),
                );
            }
            if g.end_block() > meta.block_count {
                bad(
                    "GEO.BOUNDS",
                    format!(
                        "group {i} ends at {} past the device ({})",
                        g.end_block(),
                        meta.block_count
                    ),
                );
            }
            expected_start = g.end_block();
        }

        if meta.unused_blocks() > 0 {
            rep.push(Finding::warn(
                "GEO.TAIL",
                format!(
                    "{} trailing block(s) after block {expected_start} belong to no group",
                    meta.unused_blocks()
                ),
            ));
        }

        if errors == 0 {
            rep.push(Finding::info(
                "GEO.OK",
                format!(
                    "{} groups x {} blocks, {} unused",
                    meta.group_count,
                    meta.blocks_per_group,
                    meta.unused_blocks()
                ),
            ));
        }
        Ok(())
    }

    fn check_extents(&mut self, _opt: &Self::Options, rep: &mut VerifyReport) -> FsCheckerResult {
        let mut errors = 0usize;
        let mut extents = 0usize;

        for (name, inode) in self.directory {
            let mut bad = |code: &'static str, msg: String| {
                errors += 1;
                rep.push(Finding::err(code, msg));
            };

            if inode.id.group >= self.meta.group_count
                || inode.id.slot >= self.meta.inodes_per_group
            {
                bad("EXT.INODE", format!("'{name}': inode {} out of range", inode.id));
            }

            let mut logical = 0u64;
            for e in &inode.extents {
                extents += 1;
                if e.len == 0 {
                    bad("EXT.EMPTY", format!("'{name}': empty extent {e}"));
                }
                if e.logical_offset as u64 != logical {
                    bad(
                        "EXT.GAP",
                        format!(
                            "'{name}': extent {e} starts at logical {}, expected {logical}",
                            e.logical_offset
                        ),
                    );
                }
                if self.group_of_run(e.physical_start, e.len).is_none() {
                    bad("EXT.SPAN", format!("'{name}': extent {e} not inside one group"));
                }
                logical = e.logical_end() as u64;
            }

            let expected = self.meta.blocks_for(inode.size_bytes);
            if inode.block_count() != expected {
                bad(
                    "EXT.COUNT",
                    format!(
                        "'{name}': {} blocks for {} bytes, expected {expected}",
                        inode.block_count(),
                        inode.size_bytes
                    ),
                );
            }
        }

        if errors == 0 {
            rep.push(Finding::info(
                "EXT.OK",
                format!("{} files, {extents} extents", self.directory.len()),
            ));
        }
        Ok(())
    }

    fn check_cross_reference(
        &mut self,
        _opt: &Self::Options,
        rep: &mut VerifyReport,
    ) -> FsCheckerResult {
        // Shadow bitmaps rebuilt from the inodes alone
        let mut blocks: Vec<Bitmap> = self
            .groups
            .iter()
            .map(|g| Bitmap::new(g.block_bitmap().len()))
            .collect();
        let mut inodes: Vec<Bitmap> = self
            .groups
            .iter()
            .map(|g| Bitmap::new(g.inode_bitmap().len()))
            .collect();
        let mut errors = 0usize;

        for (name, inode) in self.directory {
            let (g, slot) = (inode.id.group as usize, inode.id.slot as usize);
            match (self.groups.get(g), inodes.get_mut(g)) {
                (Some(group), Some(seen)) if slot < seen.len() => {
                    if seen.is_set(slot) {
                        errors += 1;
                        rep.push(Finding::err(
                            "XREF.INODE.DUP",
                            format!("'{name}': inode {} used twice", inode.id),
                        ));
                    }
                    seen.set(slot);
                    if !group.inode_bitmap().is_set(slot) {
                        errors += 1;
                        rep.push(Finding::err(
                            "XREF.INODE.FREE",
                            format!("'{name}': inode {} not marked", inode.id),
                        ));
                    }
                }
                // Reported by the extents phase
                _ => {}
            }

            for e in &inode.extents {
                let Some(g) = self.group_of_run(e.physical_start, e.len) else {
                    continue;
                };
                let group = &self.groups[g];
                for block in e.blocks() {
                    let rel = (block - group.start_block()) as usize;
                    if blocks[g].is_set(rel) {
                        errors += 1;
                        rep.push(Finding::err(
                            "XREF.DUP",
                            format!("'{name}': block {block} owned twice"),
                        ));
                    }
                    blocks[g].set(rel);
                    if !group.block_bitmap().is_set(rel) {
                        errors += 1;
                        rep.push(Finding::err(
                            "XREF.FREE",
                            format!("'{name}': block {block} not marked"),
                        ));
                    }
                }
            }
        }

        for (g, group) in self.groups.iter().enumerate() {
            let orphan_blocks = orphans(group.block_bitmap(), &blocks[g]);
            if orphan_blocks > 0 {
                errors += 1;
                rep.push(Finding::err(
                    "XREF.ORPHAN",
                    format!("group {g}: {orphan_blocks} marked blocks owned by no file"),
                ));
            }
            let orphan_inodes = orphans(group.inode_bitmap(), &inodes[g]);
            if orphan_inodes > 0 {
                errors += 1;
                rep.push(Finding::err(
                    "XREF.INODE.ORPHAN",
                    format!("group {g}: {orphan_inodes} marked inodes owned by no file"),
                ));
            }
        }

        if errors == 0 {
            rep.push(Finding::info(
                "XREF.OK",
                "bitmaps match the live extents and inodes",
            ));
        }
        Ok(())
    }
}

/// Bits set in `marked` but not in `owned`.
fn orphans(marked: &Bitmap, owned: &Bitmap) -> usize {
    (0..marked.len().min(owned.len()))
        .filter(|&i| marked.is_set(i) && !owned.is_set(i))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::ext::{extent::Extent, inode::InodeId};

    struct Fixture {
        meta: ExtMeta,
        groups: Vec<BlockGroup>,
        directory: BTreeMap<String, Inode>,
    }

    impl Fixture {
        /// 2 groups of 8 blocks (4-byte blocks), 4 inodes each.
        fn new() -> Self {
            let meta = ExtMeta::new_custom(16 * 4, 4, 2, 4).unwrap();
            let groups = (0..2)
                .map(|id| BlockGroup::new(&GroupLayout::compute(&meta, id), 4))
                .collect();
            Self {
                meta,
                groups,
                directory: BTreeMap::new(),
            }
        }

        /// Registers a file and marks its inode slot and blocks.
        fn add(&mut self, name: &str, id: InodeId, size: u64, extents: Vec<Extent>) {
            self.groups[id.group as usize].inode_bitmap_mut().set(id.slot as usize);
            for e in &extents {
                for b in e.blocks() {
                    let g = (b / self.meta.blocks_per_group) as usize;
                    let rel = (b - self.groups[g].start_block()) as usize;
                    self.groups[g].block_bitmap_mut().set(rel);
                }
            }
            self.directory
                .insert(name.to_string(), Inode::new(id, size, extents));
        }

        fn check(&self, opt: &ExtCheckOptions) -> VerifyReport {
            ExtChecker::new(&self.meta, &self.groups, &self.directory)
                .check_with(opt)
                .unwrap()
        }

        fn check_all(&self) -> VerifyReport {
            self.check(&ExtCheckOptions::default())
        }
    }

    #[test]
    fn test_consistent_state_passes() {
        let mut fx = Fixture::new();
        fx.add("a", InodeId::new(0, 0), 10, vec![Extent::new(0, 0, 3)]);
        fx.add(
            "b",
            InodeId::new(0, 1),
            20,
            vec![Extent::new(0, 3, 2), Extent::new(2, 8, 3)],
        );
        fx.add("empty", InodeId::new(1, 0), 0, vec![]);

        let rep = fx.check_all();
        assert!(rep.ok(), "{rep}");
        assert_eq!(rep.count(Severity::Warn), 0);
        assert_eq!(rep.with_code("GEO.OK").count(), 1);
        assert_eq!(rep.with_code("EXT.OK").count(), 1);
        assert_eq!(rep.with_code("XREF.OK").count(), 1);
    }

    #[test]
    fn test_orphan_bits_detected() {
        let mut fx = Fixture::new();
        fx.add("a", InodeId::new(0, 0), 4, vec![Extent::new(0, 0, 1)]);
        fx.groups[1].block_bitmap_mut().set(5);
        fx.groups[1].inode_bitmap_mut().set(2);

        let rep = fx.check_all();
        assert_eq!(rep.with_code("XREF.ORPHAN").count(), 1);
        assert_eq!(rep.with_code("XREF.INODE.ORPHAN").count(), 1);
    }

    #[test]
    fn test_unmarked_and_shared_blocks_detected() {
        let mut fx = Fixture::new();
        fx.add("a", InodeId::new(0, 0), 8, vec![Extent::new(0, 0, 2)]);
        fx.add("b", InodeId::new(0, 1), 4, vec![Extent::new(0, 1, 1)]);
        fx.groups[0].block_bitmap_mut().clear(0);

        let rep = fx.check_all();
        assert_eq!(rep.with_code("XREF.FREE").count(), 1);
        assert_eq!(rep.with_code("XREF.DUP").count(), 1);
    }

    #[test]
    fn test_extent_shape_errors() {
        let mut fx = Fixture::new();
        // Logical gap between the two extents
        fx.add(
            "gap",
            InodeId::new(0, 0),
            12,
            vec![Extent::new(0, 0, 1), Extent::new(2, 2, 2)],
        );
        // 3 blocks for a 1-block size
        fx.add("fat", InodeId::new(0, 1), 4, vec![Extent::new(0, 4, 3)]);
        // Crosses from group 0 into group 1
        fx.directory.insert(
            "span".into(),
            Inode::new(InodeId::new(0, 2), 8, vec![Extent::new(0, 7, 2)]),
        );

        let rep = fx.check_all();
        assert_eq!(rep.with_code("EXT.GAP").count(), 1);
        assert_eq!(rep.with_code("EXT.COUNT").count(), 1);
        assert_eq!(rep.with_code("EXT.SPAN").count(), 1);
        assert_eq!(rep.with_code("EXT.OK").count(), 0);
    }

    #[test]
    fn test_fail_fast_skips_later_phases() {
        let mut fx = Fixture::new();
        fx.add("fat", InodeId::new(0, 0), 4, vec![Extent::new(0, 0, 3)]);
        fx.groups[1].block_bitmap_mut().set(0);

        let rep = fx.check(&ExtCheckOptions::default().stop_on_error());
        assert_eq!(rep.with_code("EXT.COUNT").count(), 1);
        assert_eq!(rep.with_code("XREF.ORPHAN").count(), 0);
        assert!(!rep.ran().contains(VerifyPhases::CROSSREF));

        let rep = fx.check(&ExtCheckOptions::only(VerifyPhases::CROSSREF));
        assert_eq!(rep.with_code("GEO.OK").count(), 0);
        assert_eq!(rep.with_code("XREF.ORPHAN").count(), 1);
        assert_eq!(rep.in_phase(VerifyPhases::CROSSREF).count(), rep.findings.len());
    }

    #[test]
    fn test_tail_blocks_warned_not_failed() {
        // 17 blocks over 2 groups: block 16 belongs to no group
        let meta = ExtMeta::new_custom(17 * 4, 4, 2, 4).unwrap();
        let groups: Vec<BlockGroup> = (0..2)
            .map(|id| BlockGroup::new(&GroupLayout::compute(&meta, id), 4))
            .collect();
        let directory = BTreeMap::new();

        let rep = ExtChecker::new(&meta, &groups, &directory).check_all().unwrap();
        assert!(rep.ok(), "{rep}");
        let tail: Vec<_> = rep.with_code("GEO.TAIL").collect();
        assert_eq!(tail.len(), 1);
        assert_eq!(tail[0].sev, Severity::Warn);
        assert_eq!(tail[0].phase, VerifyPhases::GEOMETRY);
        assert!(tail[0].msg.starts_with("1 trailing block(s) after block 16"));
    }
}
