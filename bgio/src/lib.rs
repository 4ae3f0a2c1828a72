// SPDX-License-Identifier: MIT
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

// Core modules
pub mod block;
pub mod errors;
pub mod stats;

// Backend modules
#[cfg(feature = "mem")]
mod mem;

#[cfg(feature = "std")]
mod std;

// Prelude re-exports (central entrypoint)
pub mod prelude {
    pub use super::BgIO;
    pub use super::BgIOExt;
    pub use super::block::BlockStore;
    pub use super::errors::*;
    pub use super::stats::*;

    #[cfg(feature = "mem")]
    pub use super::mem::MemBgIO;

    #[cfg(feature = "std")]
    pub use super::std::StdBgIO;
}

use errors::*;

/// Stack buffer size for fills. One page, and the default block size.
pub const FILL_BUF_SIZE: usize = 4096;

/// Byte-addressed device. Offsets are absolute from the start of the device.
pub trait BgIO {
    fn write_at(&mut self, offset: u64, data: &[u8]) -> BgIOResult;

    /// Fills all of `buf` or fails; short reads are `OutOfBounds`.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> BgIOResult;

    fn flush(&mut self) -> BgIOResult;

    /// Size in bytes for fixed-size devices, `None` for growable ones.
    fn capacity(&self) -> Option<u64> {
        None
    }
}

/// Helpers available on every [`BgIO`].
pub trait BgIOExt: BgIO {
    /// Writes `len` copies of `byte` starting at `offset`.
    fn fill(&mut self, offset: u64, len: u64, byte: u8) -> BgIOResult {
        let chunk_buf = [byte; FILL_BUF_SIZE];
        let end = offset.checked_add(len).ok_or(BgIOError::OutOfBounds)?;
        let mut off = offset;
        while off < end {
            let chunk = (end - off).min(FILL_BUF_SIZE as u64) as usize;
            self.write_at(off, &chunk_buf[..chunk])?;
            off += chunk as u64;
        }
        Ok(())
    }

    #[inline]
    fn zero_fill(&mut self, offset: u64, len: u64) -> BgIOResult {
        self.fill(offset, len, 0)
    }
}

impl<T: BgIO + ?Sized> BgIOExt for T {}
