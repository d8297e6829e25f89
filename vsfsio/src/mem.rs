// SPDX-License-Identifier: MIT

use crate::{BlockIO, BlockIOError, BlockIOResult};

/// In-memory implementation of `BlockIO`.
///
/// Used for fully loaded images, tests and synthesized fixtures.
#[derive(Debug)]
pub struct MemBlockIO<'a> {
    buffer: &'a mut [u8],
}

impl<'a> MemBlockIO<'a> {
    #[inline]
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self { buffer }
    }

    /// Total length of the backing buffer in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Checked byte range of the backing buffer for a request.
    #[inline]
    fn range(&self, offset: u64, len: usize) -> BlockIOResult<core::ops::Range<usize>> {
        let end = offset
            .checked_add(len as u64)
            .ok_or(BlockIOError::Overflow)?;
        if end > self.buffer.len() as u64 {
            return Err(BlockIOError::OutOfBounds { offset, len });
        }
        Ok(offset as usize..end as usize)
    }
}

impl<'a> BlockIO for MemBlockIO<'a> {
    #[inline(always)]
    fn write_at(&mut self, offset: u64, data: &[u8]) -> BlockIOResult {
        let range = self.range(offset, data.len())?;
        self.buffer[range].copy_from_slice(data);
        Ok(())
    }

    #[inline(always)]
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> BlockIOResult {
        let range = self.range(offset, buf.len())?;
        buf.copy_from_slice(&self.buffer[range]);
        Ok(())
    }

    #[inline]
    fn flush(&mut self) -> BlockIOResult {
        Ok(())
    }
}
