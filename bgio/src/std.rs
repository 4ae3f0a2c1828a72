// SPDX-License-Identifier: MIT

use std::io::{Error, ErrorKind, Read, Seek, SeekFrom, Write};

use crate::{BgIO, BgIOError, BgIOResult};

/// `BgIO` over any `Read + Write + Seek` handle (files, cursors).
///
/// The handle position is remembered so back-to-back block transfers skip the
/// seek. Nothing else may move the handle while it is wrapped.
#[derive(Debug)]
pub struct StdBgIO<'a, T: Read + Write + Seek> {
    io: &'a mut T,
    pos: Option<u64>,
    limit: Option<u64>,
}

impl<'a, T: Read + Write + Seek> StdBgIO<'a, T> {
    /// Growable device: writes past the end extend the file.
    #[inline]
    pub fn new(io: &'a mut T) -> Self {
        Self {
            io,
            pos: None,
            limit: None,
        }
    }

    /// Fixed-size device of `bytes`; accesses past it fail with `OutOfBounds`.
    #[inline]
    pub fn with_capacity(io: &'a mut T, bytes: u64) -> Self {
        Self {
            limit: Some(bytes),
            ..Self::new(io)
        }
    }

    fn seek_to(&mut self, offset: u64, len: usize) -> BgIOResult {
        if let Some(limit) = self.limit {
            let end = offset
                .checked_add(len as u64)
                .ok_or(BgIOError::OutOfBounds)?;
            if end > limit {
                return Err(BgIOError::OutOfBounds);
            }
        }
        if self.pos != Some(offset) {
            // Unknown until the seek succeeds
            self.pos = None;
            self.io.seek(SeekFrom::Start(offset))?;
        }
        Ok(())
    }

    fn advance(&mut self, offset: u64, len: usize, res: std::io::Result<()>) -> BgIOResult {
        match res {
            Ok(()) => {
                self.pos = Some(offset + len as u64);
                Ok(())
            }
            Err(e) => {
                self.pos = None;
                Err(e.into())
            }
        }
    }
}

impl<'a, T: Read + Write + Seek> BgIO for StdBgIO<'a, T> {
    fn write_at(&mut self, offset: u64, data: &[u8]) -> BgIOResult {
        self.seek_to(offset, data.len())?;
        let res = self.io.write_all(data);
        self.advance(offset, data.len(), res)
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> BgIOResult {
        self.seek_to(offset, buf.len())?;
        let res = self.io.read_exact(buf);
        self.advance(offset, buf.len(), res)
    }

    fn flush(&mut self) -> BgIOResult {
        self.io.flush()?;
        Ok(())
    }

    fn capacity(&self) -> Option<u64> {
        self.limit
    }
}

impl From<Error> for BgIOError {
    #[cold]
    #[inline(never)]
    fn from(e: Error) -> Self {
        match e.kind() {
            ErrorKind::UnexpectedEof => BgIOError::OutOfBounds,
            ErrorKind::Unsupported => BgIOError::Unsupported,
            ErrorKind::InvalidInput => BgIOError::Invalid("I/O error: invalid seek or argument"),
            ErrorKind::PermissionDenied => BgIOError::Other("I/O error: permission denied"),
            ErrorKind::WriteZero => BgIOError::Other("I/O error: device accepted no bytes"),
            _ => BgIOError::Other("I/O error"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::prelude::*;
    use std::io::Cursor;
    use tempfile::tempfile;

    #[test]
    fn test_rw() {
        let mut file = tempfile().unwrap();
        let mut io = StdBgIO::new(&mut file);
        io.write_at(10, &[1, 2, 3, 4]).unwrap();

        let mut output = [0u8; 4];
        io.read_at(10, &mut output).unwrap();
        assert_eq!(output, [1, 2, 3, 4]);
    }

    #[test]
    fn test_read_past_end() {
        let mut file = tempfile().unwrap();
        let mut io = StdBgIO::new(&mut file);
        io.write_at(0, &[1, 2]).unwrap();

        let mut output = [0u8; 4];
        assert_eq!(io.read_at(0, &mut output), Err(BgIOError::OutOfBounds));
        assert_eq!(io.capacity(), None);

        // Position is forgotten after the failed read
        io.write_at(2, &[3, 4]).unwrap();
        io.read_at(0, &mut output).unwrap();
        assert_eq!(output, [1, 2, 3, 4]);
    }

    #[test]
    fn test_sequential_and_random_access() {
        let mut cursor = Cursor::new(vec![0u8; 32]);
        let mut io = StdBgIO::with_capacity(&mut cursor, 32);

        io.write_at(0, &[1; 8]).unwrap();
        io.write_at(8, &[2; 8]).unwrap();
        io.write_at(24, &[4; 8]).unwrap();
        io.write_at(16, &[3; 8]).unwrap();

        let mut out = [0u8; 32];
        io.read_at(0, &mut out).unwrap();
        assert_eq!(&out[..8], &[1; 8]);
        assert_eq!(&out[16..24], &[3; 8]);
        assert_eq!(&out[24..], &[4; 8]);

        assert_eq!(io.write_at(30, &[0; 4]), Err(BgIOError::OutOfBounds));
        assert_eq!(io.capacity(), Some(32));
    }

    #[test]
    fn test_block_store_on_file() {
        let mut file = tempfile().unwrap();
        file.set_len(64).unwrap();
        let mut io = StdBgIO::with_capacity(&mut file, 64);
        let mut store = BlockStore::init(&mut io, 8, 8).unwrap();

        store.write_block(7, b"blocks!!").unwrap();
        assert_eq!(store.read_block(7).unwrap(), b"blocks!!".to_vec());
        assert_eq!(store.read_block(8), Err(BgIOError::OutOfBounds));
    }
}
