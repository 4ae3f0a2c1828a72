// SPDX-License-Identifier: MIT

use crate::{BgIO, BgIOResult};

/// Simple counters, no_std friendly.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct IoStats {
    pub reads: u64,
    pub read_bytes: u64,
    pub writes: u64,
    pub write_bytes: u64,
    pub flushes: u64,

    // Largest single transfers, to see the granularity the caller uses
    pub max_read: u64,
    pub max_write: u64,
}

impl IoStats {
    #[inline]
    pub fn reset(&mut self) {
        *self = IoStats::default();
    }
}

/// Transparent instrumentation wrapper.
pub struct IOCounter<'a, IO: BgIO + ?Sized> {
    inner: &'a mut IO,
    pub stats: IoStats,
}

impl<'a, IO: BgIO + ?Sized> IOCounter<'a, IO> {
    #[inline]
    pub fn new(inner: &'a mut IO) -> Self {
        Self {
            inner,
            stats: IoStats::default(),
        }
    }

    #[inline]
    pub fn snapshot(&self) -> IoStats {
        self.stats
    }
}

impl<'a, IO: BgIO + ?Sized> BgIO for IOCounter<'a, IO> {
    #[inline]
    fn write_at(&mut self, offset: u64, data: &[u8]) -> BgIOResult {
        self.stats.writes += 1;
        self.stats.write_bytes += data.len() as u64;
        self.stats.max_write = self.stats.max_write.max(data.len() as u64);

        self.inner.write_at(offset, data)
    }

    #[inline]
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> BgIOResult {
        self.stats.reads += 1;
        self.stats.read_bytes += buf.len() as u64;
        self.stats.max_read = self.stats.max_read.max(buf.len() as u64);

        self.inner.read_at(offset, buf)
    }

    #[inline]
    fn flush(&mut self) -> BgIOResult {
        self.stats.flushes += 1;
        self.inner.flush()
    }

    #[inline]
    fn capacity(&self) -> Option<u64> {
        self.inner.capacity()
    }
}

#[cfg(all(test, feature = "mem"))]
mod tests {
    use super::*;
    use crate::prelude::*;

    #[test]
    fn test_counts_transfers() {
        let mut buf = [0u8; 64];
        let mut mem = MemBgIO::new(&mut buf);
        let mut io = IOCounter::new(&mut mem);

        io.write_at(0, &[1; 16]).unwrap();
        io.write_at(16, &[2; 4]).unwrap();
        let mut out = [0u8; 8];
        io.read_at(0, &mut out).unwrap();
        io.flush().unwrap();

        let stats = io.snapshot();
        assert_eq!(stats.writes, 2);
        assert_eq!(stats.write_bytes, 20);
        assert_eq!(stats.max_write, 16);
        assert_eq!(stats.reads, 1);
        assert_eq!(stats.read_bytes, 8);
        assert_eq!(stats.flushes, 1);
        assert_eq!(io.capacity(), Some(64));

        io.stats.reset();
        assert_eq!(io.snapshot(), IoStats::default());
    }
}
