// SPDX-License-Identifier: MIT
#![cfg_attr(not(feature = "std"), no_std)]

// Core modules
pub mod errors;
#[macro_use]
mod macros;
pub mod stats;

// Backend modules
#[cfg(feature = "mem")]
mod mem;

#[cfg(feature = "std")]
mod std_io;

// Prelude re-exports (central entrypoint)
pub mod prelude {
    pub use super::BlockIO;
    pub use super::BlockIOExt;
    pub use super::BlockIOStructExt;
    pub use super::errors::*;
    pub use super::stats::*;

    #[cfg(feature = "mem")]
    pub use super::mem::MemBlockIO;

    #[cfg(feature = "std")]
    pub use super::std_io::StdBlockIO;
}

// Internal use
use errors::*;

// Constants

/// Scratch buffer size for zero fill and struct reads, kept small enough for
/// no_std stacks.
const BLOCK_BUF_SIZE: usize = 4096;

// Traits

/// Block IO abstraction trait.
///
/// Allows read/write/flush at arbitrary offsets.
/// Implementations may target RAM, files or block devices.
pub trait BlockIO {
    /// Writes `data` at `offset` (absolute).
    fn write_at(&mut self, offset: u64, data: &[u8]) -> BlockIOResult;

    /// Reads `buf.len()` bytes into `buf` from `offset` (absolute).
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> BlockIOResult;

    /// Flushes any buffered data (may be a no-op).
    fn flush(&mut self) -> BlockIOResult;
}

/// Extension helpers for BlockIO.
///
/// Provides:
/// - fixed-size block reads/writes addressed by block number
/// - zero fill and `u32` reads/writes
pub trait BlockIOExt: BlockIO {
    /// Reads block `index` of a device formatted with `N`-byte blocks.
    ///
    /// The whole block must lie inside the backing store, otherwise the
    /// backend reports `BlockIOError::OutOfBounds`.
    #[inline]
    fn read_block<const N: usize>(&mut self, index: u64) -> BlockIOResult<[u8; N]> {
        let offset = index.checked_mul(N as u64).ok_or(BlockIOError::Overflow)?;
        let mut buf = [0u8; N];
        self.read_at(offset, &mut buf)?;
        Ok(buf)
    }

    /// Writes `block` as block `index` of a device formatted with `N`-byte blocks.
    #[inline]
    fn write_block<const N: usize>(&mut self, index: u64, block: &[u8; N]) -> BlockIOResult {
        let offset = index.checked_mul(N as u64).ok_or(BlockIOError::Overflow)?;
        self.write_at(offset, block)
    }

    /// Fills a region with zeroes.
    #[inline(always)]
    fn zero_fill(&mut self, offset: u64, len: usize) -> BlockIOResult {
        const ZERO_BUF: [u8; BLOCK_BUF_SIZE] = [0u8; BLOCK_BUF_SIZE];
        let mut remaining = len;
        let mut off = offset;
        while remaining > 0 {
            let chunk = remaining.min(ZERO_BUF.len());
            self.write_at(off, &ZERO_BUF[..chunk])?;
            off += chunk as u64;
            remaining -= chunk;
        }
        Ok(())
    }

    // Block pointers are little-endian u32
    blockio_impl_primitive_rw!(u32);
}

impl<T: BlockIO + ?Sized> BlockIOExt for T {}

/// Extension trait for reading and writing structs using zerocopy.
///
/// Requires the struct to implement zerocopy traits for safe conversion.
pub trait BlockIOStructExt: BlockIO {
    /// Reads a struct of type `T` from the given offset.
    fn read_struct<T: zerocopy::FromBytes + zerocopy::KnownLayout + zerocopy::Immutable>(
        &mut self,
        offset: u64,
    ) -> BlockIOResult<T> {
        let size = core::mem::size_of::<T>();
        if size > BLOCK_BUF_SIZE {
            return Err(BlockIOError::Other("read_struct: type too large"));
        }
        let mut buf = [0u8; BLOCK_BUF_SIZE];
        self.read_at(offset, &mut buf[..size])?;
        T::read_from_bytes(&buf[..size]).map_err(|_| BlockIOError::Other("read_struct failed"))
    }

    /// Writes a struct of type `T` at the given offset.
    fn write_struct<T: zerocopy::IntoBytes + zerocopy::KnownLayout + zerocopy::Immutable>(
        &mut self,
        offset: u64,
        val: &T,
    ) -> BlockIOResult {
        self.write_at(offset, val.as_bytes())
    }
}

impl<T: BlockIO + ?Sized> BlockIOStructExt for T {}
