// SPDX-License-Identifier: MIT

//! Fixed-size block store on top of a [`BgIO`] backend.
//!
//! Blocks are addressed by absolute index in `[0, total_blocks)`. Any index
//! outside that range is rejected with [`BgIOError::OutOfBounds`].

#[cfg(all(not(feature = "std"), feature = "alloc"))]
use alloc::{vec, vec::Vec};

use log::debug;

use crate::{BgIO, BgIOError, BgIOResult};

/// Array of `total_blocks` blocks of `block_size` bytes each.
#[derive(Debug)]
pub struct BlockStore<'a, IO: BgIO + ?Sized> {
    io: &'a mut IO,
    block_size: usize,
    total_blocks: u32,
}

impl<'a, IO: BgIO + ?Sized> BlockStore<'a, IO> {
    /// Binds a store of `total_blocks` x `block_size` bytes to `io`.
    ///
    /// Fails with `Invalid` for a zero block size and with `OutOfBounds` when
    /// a fixed-size backend is too small to hold every block.
    pub fn init(io: &'a mut IO, total_blocks: u32, block_size: usize) -> BgIOResult<Self> {
        if block_size == 0 {
            return Err(BgIOError::Invalid("block size must be > 0"));
        }

        let needed = total_blocks as u64 * block_size as u64;
        if let Some(capacity) = io.capacity()
            && needed > capacity
        {
            return Err(BgIOError::OutOfBounds);
        }

        debug!("block store: {total_blocks} blocks of {block_size} bytes ({needed} bytes)");

        Ok(Self {
            io,
            block_size,
            total_blocks,
        })
    }

    #[inline]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    #[inline]
    pub fn total_blocks(&self) -> u32 {
        self.total_blocks
    }

    /// Byte offset of block `index` on the backend.
    #[inline]
    pub fn block_offset(&self, index: u32) -> u64 {
        index as u64 * self.block_size as u64
    }

    #[inline]
    fn check_index(&self, index: u32) -> BgIOResult {
        if index >= self.total_blocks {
            return Err(BgIOError::OutOfBounds);
        }
        Ok(())
    }

    /// Writes at most `block_size` bytes of `data` to block `index`.
    ///
    /// A shorter `data` only overwrites the head of the block.
    pub fn write_block(&mut self, index: u32, data: &[u8]) -> BgIOResult {
        self.check_index(index)?;
        let len = data.len().min(self.block_size);
        let offset = self.block_offset(index);
        self.io.write_at(offset, &data[..len])
    }

    /// Reads block `index` into `buf`, which must be exactly `block_size` long.
    pub fn read_block_into(&mut self, index: u32, buf: &mut [u8]) -> BgIOResult {
        self.check_index(index)?;
        if buf.len() != self.block_size {
            return Err(BgIOError::Invalid("read_block_into: buffer length mismatch"));
        }
        let offset = self.block_offset(index);
        self.io.read_at(offset, buf)
    }

    /// Reads block `index` into a fresh `block_size` buffer.
    #[cfg(feature = "alloc")]
    pub fn read_block(&mut self, index: u32) -> BgIOResult<Vec<u8>> {
        let mut buf = vec![0u8; self.block_size];
        self.read_block_into(index, &mut buf)?;
        Ok(buf)
    }

    pub fn flush(&mut self) -> BgIOResult {
        self.io.flush()
    }
}

#[cfg(all(test, feature = "mem"))]
mod tests {
    use super::*;
    use crate::prelude::*;

    #[test]
    fn test_block_rw() {
        let mut buf = [0u8; 40];
        let mut io = MemBgIO::new(&mut buf);
        let mut store = BlockStore::init(&mut io, 10, 4).unwrap();

        store.write_block(3, &[1, 2, 3, 4]).unwrap();
        assert_eq!(store.read_block(3).unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(store.read_block(2).unwrap(), vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_write_truncates_to_block_size() {
        let mut buf = [0u8; 16];
        let mut io = MemBgIO::new(&mut buf);
        let mut store = BlockStore::init(&mut io, 4, 4).unwrap();

        store.write_block(0, &[9; 7]).unwrap();
        assert_eq!(store.read_block(0).unwrap(), vec![9; 4]);
        assert_eq!(store.read_block(1).unwrap(), vec![0; 4]);
    }

    #[test]
    fn test_short_write_keeps_tail() {
        let mut buf = [0xEEu8; 8];
        let mut io = MemBgIO::new(&mut buf);
        let mut store = BlockStore::init(&mut io, 2, 4).unwrap();

        store.write_block(1, &[1, 2]).unwrap();
        assert_eq!(store.read_block(1).unwrap(), vec![1, 2, 0xEE, 0xEE]);
    }

    #[test]
    fn test_out_of_range() {
        let mut buf = [0u8; 16];
        let mut io = MemBgIO::new(&mut buf);
        let mut store = BlockStore::init(&mut io, 4, 4).unwrap();

        assert_eq!(store.write_block(4, &[0; 4]), Err(BgIOError::OutOfBounds));
        assert_eq!(store.read_block(4), Err(BgIOError::OutOfBounds));
        assert_eq!(store.read_block(u32::MAX), Err(BgIOError::OutOfBounds));
    }

    #[test]
    fn test_init_rejects_small_backend() {
        let mut buf = [0u8; 15];
        let mut io = MemBgIO::new(&mut buf);
        assert!(matches!(
            BlockStore::init(&mut io, 4, 4),
            Err(BgIOError::OutOfBounds)
        ));
    }

    #[test]
    fn test_init_rejects_zero_block_size() {
        let mut buf = [0u8; 16];
        let mut io = MemBgIO::new(&mut buf);
        assert!(matches!(
            BlockStore::init(&mut io, 4, 0),
            Err(BgIOError::Invalid(_))
        ));
    }
}
