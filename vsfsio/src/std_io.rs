// SPDX-License-Identifier: MIT

use std::io::{Error, ErrorKind, Read, Seek, SeekFrom, Write};

use crate::{BlockIO, BlockIOError, BlockIOResult};

/// `BlockIO` over any seekable `std::io` stream (files, cursors).
///
/// A file opened read-only still satisfies the `Write` bound; writes then fail
/// at runtime, which is what a checker wants.
#[derive(Debug)]
pub struct StdBlockIO<'a, T: Read + Write + Seek> {
    io: &'a mut T,
}

impl<'a, T: Read + Write + Seek> StdBlockIO<'a, T> {
    #[inline]
    pub fn new(io: &'a mut T) -> Self {
        Self { io }
    }

    #[inline]
    fn seek_to(&mut self, offset: u64) -> BlockIOResult {
        self.io.seek(SeekFrom::Start(offset))?;
        Ok(())
    }
}

impl<'a, T: Read + Write + Seek> BlockIO for StdBlockIO<'a, T> {
    fn write_at(&mut self, offset: u64, data: &[u8]) -> BlockIOResult {
        self.seek_to(offset)?;
        self.io.write_all(data)?;
        Ok(())
    }

    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> BlockIOResult {
        let len = buf.len();
        self.seek_to(offset)?;
        self.io.read_exact(buf).map_err(|e| match e.kind() {
            ErrorKind::UnexpectedEof => BlockIOError::OutOfBounds { offset, len },
            _ => BlockIOError::from(e),
        })
    }

    fn flush(&mut self) -> BlockIOResult {
        self.io.flush()?;
        Ok(())
    }
}

impl From<Error> for BlockIOError {
    #[cold]
    #[inline(never)]
    fn from(e: Error) -> Self {
        // Leak the string to produce a 'static str. Only hit on fatal paths.
        let leaked_str: &'static str = Box::leak(e.to_string().into_boxed_str());
        BlockIOError::Other(leaked_str)
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
        let mut io = StdBlockIO::new(&mut file);
        io.write_at(10, &[1, 2, 3, 4]).unwrap();

        let mut output = [0u8; 4];
        io.read_at(10, &mut output).unwrap();
        assert_eq!(output, [1, 2, 3, 4]);
    }

    #[test]
    fn test_short_read_is_out_of_bounds() {
        let mut cursor = Cursor::new(vec![0u8; 1000]);
        let mut io = StdBlockIO::new(&mut cursor);

        assert!(io.read_block::<512>(0).is_ok());
        assert_eq!(
            io.read_block::<512>(1),
            Err(BlockIOError::OutOfBounds {
                offset: 512,
                len: 512
            })
        );
    }

    #[test]
    fn test_block_rw_on_file() {
        let mut file = tempfile().unwrap();
        let mut io = StdBlockIO::new(&mut file);

        io.zero_fill(0, 4 * 512).unwrap();
        io.write_block::<512>(3, &[0x5A; 512]).unwrap();
        io.flush().unwrap();

        let block: [u8; 512] = io.read_block(3).unwrap();
        assert_eq!(block, [0x5A; 512]);
        let block: [u8; 512] = io.read_block(2).unwrap();
        assert_eq!(block, [0u8; 512]);
    }
}
