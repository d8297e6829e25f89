// SPDX-License-Identifier: MIT

use crate::{BlockIO, BlockIOResult};

/// Simple counters, no_std friendly.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct IoStats {
    pub reads: u64,
    pub read_bytes: u64,
    pub writes: u64,
    pub write_bytes: u64,
    pub flushes: u64,

    // Largest single request, useful to diagnose granularity
    pub max_read: u64,
}

/// Transparent instrumentation wrapper.
///
/// Counts every request forwarded to the inner device. A read-only consumer
/// can be verified by asserting `stats.writes == 0` afterwards.
pub struct IOCounter<'a, IO: BlockIO + ?Sized> {
    inner: &'a mut IO,
    pub stats: IoStats,
}

impl<'a, IO: BlockIO + ?Sized> IOCounter<'a, IO> {
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

impl<'a, IO: BlockIO + ?Sized> BlockIO for IOCounter<'a, IO> {
    #[inline]
    fn write_at(&mut self, offset: u64, data: &[u8]) -> BlockIOResult {
        self.stats.writes += 1;
        self.stats.write_bytes += data.len() as u64;
        self.inner.write_at(offset, data)
    }

    #[inline]
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> BlockIOResult {
        self.stats.reads += 1;
        self.stats.read_bytes += buf.len() as u64;
        self.stats.max_read = self.stats.max_read.max(buf.len() as u64);
        self.inner.read_at(offset, buf)
    }

    #[inline]
    fn flush(&mut self) -> BlockIOResult {
        self.stats.flushes += 1;
        self.inner.flush()
    }
}

#[cfg(all(test, feature = "mem"))]
mod tests {
    use super::*;
    use crate::prelude::*;

    #[test]
    fn test_counts_reads_and_writes() {
        let mut buf = [0u8; 2048];
        let mut mem = MemBlockIO::new(&mut buf);
        let mut io = IOCounter::new(&mut mem);

        io.write_block::<512>(1, &[1; 512]).unwrap();
        let _: [u8; 512] = io.read_block(1).unwrap();
        let _: [u8; 512] = io.read_block(2).unwrap();

        let stats = io.snapshot();
        assert_eq!(stats.writes, 1);
        assert_eq!(stats.write_bytes, 512);
        assert_eq!(stats.reads, 2);
        assert_eq!(stats.read_bytes, 1024);
        assert_eq!(stats.max_read, 512);
        assert_eq!(stats.flushes, 0);
    }
}
