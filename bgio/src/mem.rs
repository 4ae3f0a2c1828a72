// SPDX-License-Identifier: MIT

use core::ops::Range;

use crate::{BgIO, BgIOError, BgIOResult};

/// Device over a borrowed byte slice. Its capacity is the slice length.
#[derive(Debug)]
pub struct MemBgIO<'a> {
    buffer: &'a mut [u8],
}

impl<'a> MemBgIO<'a> {
    #[inline]
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self { buffer }
    }

    /// The backing bytes, for inspecting a device after a run.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        self.buffer
    }

    /// Buffer range of `len` bytes at `offset`, or `OutOfBounds`.
    #[inline]
    fn span(&self, offset: u64, len: usize) -> BgIOResult<Range<usize>> {
        let start = usize::try_from(offset).map_err(|_| BgIOError::OutOfBounds)?;
        let end = start.checked_add(len).ok_or(BgIOError::OutOfBounds)?;
        if end > self.buffer.len() {
            return Err(BgIOError::OutOfBounds);
        }
        Ok(start..end)
    }
}

impl<'a> BgIO for MemBgIO<'a> {
    #[inline(always)]
    fn write_at(&mut self, offset: u64, data: &[u8]) -> BgIOResult {
        let span = self.span(offset, data.len())?;
        self.buffer[span].copy_from_slice(data);
        Ok(())
    }

    #[inline(always)]
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> BgIOResult {
        let span = self.span(offset, buf.len())?;
        buf.copy_from_slice(&self.buffer[span]);
        Ok(())
    }

    #[inline]
    fn flush(&mut self) -> BgIOResult {
        Ok(())
    }

    #[inline]
    fn capacity(&self) -> Option<u64> {
        Some(self.buffer.len() as u64)
    }
}

#[cfg(all(test, feature = "std"))]
mod test {
    use super::*;
    use crate::FILL_BUF_SIZE;
    use crate::prelude::*;

    #[test]
    fn test_rw() {
        let mut buf = [0u8; 256];
        let mut io = MemBgIO::new(&mut buf);
        io.write_at(10, &[1, 2, 3, 4]).unwrap();

        let mut output = [0u8; 4];
        io.read_at(10, &mut output).unwrap();
        assert_eq!(output, [1, 2, 3, 4]);
    }

    #[test]
    fn test_bounds() {
        let mut buf = [0u8; 16];
        let mut io = MemBgIO::new(&mut buf);
        assert_eq!(io.write_at(14, &[0; 4]), Err(BgIOError::OutOfBounds));
        assert_eq!(io.write_at(u64::MAX, &[0; 1]), Err(BgIOError::OutOfBounds));
        assert_eq!(io.capacity(), Some(16));
        assert!(io.as_slice().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_fill_crosses_buffer_chunks() {
        let mut buf = vec![0u8; 3 * FILL_BUF_SIZE];
        let mut io = MemBgIO::new(&mut buf);

        io.fill(100, 2 * FILL_BUF_SIZE as u64 + 7, 0x5A).unwrap();
        assert_eq!(io.fill(u64::MAX, 2, 1), Err(BgIOError::OutOfBounds));

        let bytes = io.as_slice();
        assert_eq!(bytes[99], 0);
        assert!(bytes[100..100 + 2 * FILL_BUF_SIZE + 7].iter().all(|&b| b == 0x5A));
        assert_eq!(bytes[100 + 2 * FILL_BUF_SIZE + 7], 0);
    }

    #[test]
    fn test_zero_fill() {
        let mut buf = [0xFF; 64];
        let mut io = MemBgIO::new(&mut buf);

        io.zero_fill(10, 8).unwrap();

        let mut output = [0xAA; 8];
        io.read_at(10, &mut output).unwrap();
        assert_eq!(output, [0u8; 8]);

        io.read_at(18, &mut output[..1]).unwrap();
        assert_eq!(output[0], 0xFF);
    }
}
