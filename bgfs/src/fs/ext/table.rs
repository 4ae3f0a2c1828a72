// SPDX-License-Identifier: MIT

//! Flat name -> inode table over one block store.

#[cfg(all(not(feature = "std"), feature = "alloc"))]
use alloc::{
    collections::BTreeMap,
    string::{String, ToString},
    vec::Vec,
};
#[cfg(feature = "std")]
use std::collections::BTreeMap;

use bgio::prelude::*;
use log::{debug, warn};

use crate::core::{FsAllocatorError, FsResult, FsTableError, FsTableResult};
use crate::core::checker::{FsChecker, FsCheckerResult, VerifyReport};
use crate::core::formatter::FsFormatter;
use crate::fs::ext::{
    allocator::{ExtentAllocator, SmartFitAllocator},
    checker::ExtChecker,
    extent::Extent,
    formatter::ExtFormatter,
    group::BlockGroup,
    group_layout::GroupLayout,
    inode::{Inode, InodeId},
    meta::ExtMeta,
    report::UsageReport,
};

/// Files of one formatted device.
///
/// Owns the block groups and the directory, and borrows the backend through
/// a [`BlockStore`]. Every operation takes `&mut self`: callers sharing a
/// table across threads must serialize access themselves.
pub struct ExtFileTable<'a, IO: BgIO + ?Sized, A: ExtentAllocator = SmartFitAllocator> {
    store: BlockStore<'a, IO>,
    meta: &'a ExtMeta,
    groups: Vec<BlockGroup>,
    directory: BTreeMap<String, Inode>,
    allocator: A,
}

impl<'a, IO: BgIO + ?Sized> ExtFileTable<'a, IO, SmartFitAllocator> {
    /// Formats `io` with `meta` and opens an empty table on it.
    pub fn format(io: &'a mut IO, meta: &'a ExtMeta) -> FsResult<Self> {
        Self::format_with(io, meta, SmartFitAllocator, false)
    }
}

impl<'a, IO: BgIO + ?Sized, A: ExtentAllocator> ExtFileTable<'a, IO, A> {
    /// Like [`ExtFileTable::format`] with a chosen allocator. `full_format`
    /// zeroes the whole device first.
    pub fn format_with(
        io: &'a mut IO,
        meta: &'a ExtMeta,
        allocator: A,
        full_format: bool,
    ) -> FsResult<Self> {
        let groups = ExtFormatter::new(&mut *io, meta).format(full_format)?;
        let store = BlockStore::init(io, meta.block_count, meta.block_size as usize)?;

        debug!("file table ready, allocator: {}", allocator.name());
        Ok(Self {
            store,
            meta,
            groups,
            directory: BTreeMap::new(),
            allocator,
        })
    }

    /// Stores `content` under `name` and returns the new inode id.
    ///
    /// On any failure nothing stays claimed: the partial block grant and the
    /// inode slot are released and the directory is left unchanged.
    pub fn create(&mut self, name: &str, content: &[u8]) -> FsTableResult<InodeId> {
        crate::ensure!(!name.is_empty(), FsTableError::InvalidName);
        crate::ensure!(
            !self.directory.contains_key(name),
            FsTableError::AlreadyExists
        );

        // Saturates: a request that large can never be satisfied anyway
        let blocks_needed =
            u32::try_from(self.meta.blocks_for(content.len() as u64)).unwrap_or(u32::MAX);

        let id = self.claim_inode()?;

        let extents = match self.allocator.allocate(&mut self.groups, blocks_needed) {
            Ok(extents) => extents,
            Err(short) => {
                warn!(
                    "create '{name}': disk full ({} of {} blocks), rolling back",
                    short.granted(),
                    short.requested
                );
                self.release_extents(&short.extents);
                self.release_inode(id);
                crate::bail!(FsAllocatorError::from(short));
            }
        };

        if let Err(e) = self.write_payload(&extents, content) {
            warn!("create '{name}': write failed ({e}), rolling back");
            self.release_extents(&extents);
            self.release_inode(id);
            crate::bail!(e);
        }

        debug!(
            "create '{name}': inode {id}, {} bytes in {} extent(s)",
            content.len(),
            extents.len()
        );
        let inode = Inode::new(id, content.len() as u64, extents);
        self.directory.insert(name.to_string(), inode);
        Ok(id)
    }

    /// Content of `name`, or `None` if there is no such file.
    pub fn read(&mut self, name: &str) -> FsTableResult<Option<Vec<u8>>> {
        let Some(inode) = self.directory.get(name) else {
            return Ok(None);
        };

        let block_size = self.store.block_size();
        let mut out = Vec::with_capacity(inode.block_count() as usize * block_size);
        let mut block = vec![0u8; block_size];
        for index in inode.blocks() {
            self.store.read_block_into(index, &mut block)?;
            out.extend_from_slice(&block);
        }
        out.truncate(inode.size_bytes as usize);
        Ok(Some(out))
    }

    /// Removes `name`, returning its blocks and inode slot to their groups.
    ///
    /// Returns `false` if there was no such file.
    pub fn delete(&mut self, name: &str) -> bool {
        let Some(inode) = self.directory.remove(name) else {
            return false;
        };

        let freed = self.release_extents(&inode.extents);
        self.release_inode(inode.id);
        debug!("delete '{name}': inode {}, {freed} blocks freed", inode.id);
        true
    }

    pub fn stat(&self, name: &str) -> Option<&Inode> {
        self.directory.get(name)
    }

    /// Flat number of `id` on this device: `group * inodes_per_group + slot`.
    #[inline]
    pub fn inode_number(&self, id: InodeId) -> u64 {
        id.raw(self.meta.inodes_per_group)
    }

    /// The file holding inode `number`, if any.
    pub fn by_inode_number(&self, number: u64) -> Option<(&str, &Inode)> {
        let id = InodeId::from_raw(number, self.meta.inodes_per_group)?;
        self.files().find(|(_, inode)| inode.id == id)
    }

    /// File names in ascending order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.directory.keys().map(String::as_str)
    }

    /// Files with their inodes, by ascending name.
    pub fn files(&self) -> impl Iterator<Item = (&str, &Inode)> + '_ {
        self.directory.iter().map(|(n, i)| (n.as_str(), i))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.directory.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.directory.is_empty()
    }

    #[inline]
    pub fn groups(&self) -> &[BlockGroup] {
        &self.groups
    }

    #[inline]
    pub fn meta(&self) -> &ExtMeta {
        self.meta
    }

    #[inline]
    pub fn allocator(&self) -> &A {
        &self.allocator
    }

    pub fn free_blocks(&self) -> u64 {
        self.groups.iter().map(|g| g.free_blocks() as u64).sum()
    }

    pub fn used_blocks(&self) -> u64 {
        self.groups.iter().map(|g| g.used_blocks() as u64).sum()
    }

    pub fn free_inodes(&self) -> u64 {
        self.groups.iter().map(|g| g.free_inodes() as u64).sum()
    }

    pub fn usage(&self) -> UsageReport {
        UsageReport::collect(self.meta, &self.groups, self.directory.values())
    }

    pub fn check(&self) -> FsCheckerResult<VerifyReport> {
        ExtChecker::new(self.meta, &self.groups, &self.directory).check_all()
    }

    pub fn flush(&mut self) -> FsTableResult {
        self.store.flush()?;
        Ok(())
    }

    /// Lowest free slot of the first group that has one.
    fn claim_inode(&mut self) -> FsTableResult<InodeId> {
        self.groups
            .iter_mut()
            .find_map(|g| g.allocate_inode().map(|slot| InodeId::new(g.id(), slot)))
            .ok_or(FsTableError::NoInodes)
    }

    fn release_inode(&mut self, id: InodeId) {
        match self.groups.get_mut(id.group as usize) {
            Some(group) => {
                group.release_inode(id.slot);
            }
            None => warn!("inode {id}: no group {}", id.group),
        }
    }

    /// Clears every extent in the group owning its first block.
    fn release_extents(&mut self, extents: &[Extent]) -> u64 {
        let mut freed = 0u64;
        for extent in extents {
            match GroupLayout::owning_group(self.meta, extent.physical_start) {
                Some(g) => {
                    freed += self.groups[g as usize].release_run(extent.physical_start, extent.len)
                        as u64
                }
                None => warn!("extent {extent} lies outside every group"),
            }
        }
        freed
    }

    /// Writes `content` across the extents, zero-padding the last block.
    fn write_payload(&mut self, extents: &[Extent], content: &[u8]) -> FsTableResult {
        let block_size = self.store.block_size();
        let mut chunks = content.chunks(block_size);
        let mut tail = Vec::new();

        for index in extents.iter().flat_map(Extent::blocks) {
            let chunk = chunks.next().unwrap_or(&[]);
            if chunk.len() == block_size {
                self.store.write_block(index, chunk)?;
            } else {
                tail.clear();
                tail.extend_from_slice(chunk);
                tail.resize(block_size, 0);
                self.store.write_block(index, &tail)?;
            }
        }
        Ok(())
    }
}
