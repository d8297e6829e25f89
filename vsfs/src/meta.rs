// SPDX-License-Identifier: MIT

use core::ops::Range;

use vsfsio::prelude::*;

use crate::constant::*;
use crate::core::{FsckError, FsckResult};
use crate::types::VsfsSuperblock;

/// Block number known to lie in `[data_start, size)` of the image it was
/// checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DataBlock(u32);

impl DataBlock {
    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }
}

/// Superblock values plus the block layout derived from them.
///
/// ```text
/// | 0: unused | 1: super | 2..: inodes | gap | bitmap | data ...    |
///                                           ^ bitmap_start          ^ size
///                                                    ^ data_start
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VsfsMeta {
    /// Total blocks in the image
    pub size: u32,
    /// Data blocks declared by the superblock
    pub nblocks: u32,
    pub ninodes: u32,

    pub inode_start: u32,
    pub bitmap_start: u32,
    pub data_start: u32,
}

impl VsfsMeta {
    /// Computes the layout for the given superblock values.
    ///
    /// Fails with `FsckError::Format` when the values cannot describe an image:
    /// no inodes, an inode table larger than the image, a data region starting
    /// past the end, or more data blocks than the data region holds.
    pub fn new(size: u32, nblocks: u32, ninodes: u32) -> FsckResult<Self> {
        ensure!(size > SUPERBLOCK_BLOCK, "image too small to hold a superblock");
        ensure!(ninodes > 0, "superblock declares no inodes");
        ensure!(
            ninodes as u64 * INODE_SIZE as u64 <= size as u64 * BSIZE as u64,
            "inode table larger than image"
        );

        let inode_blocks = ninodes.div_ceil(IPB);
        let bitmap_start = inode_blocks + BITMAP_GAP_BLOCKS;
        let data_start = bitmap_start as u64 + size.div_ceil(BPB) as u64;
        ensure!(
            data_start <= size as u64,
            "data region starts past end of image"
        );
        let data_start = data_start as u32;
        ensure!(
            nblocks <= size - data_start,
            "superblock declares more data blocks than the data region holds"
        );

        Ok(Self {
            size,
            nblocks,
            ninodes,
            inode_start: INODE_START_BLOCK,
            bitmap_start,
            data_start,
        })
    }

    /// Layout for a fresh image where every block after the bitmap is data.
    pub fn for_image(size: u32, ninodes: u32) -> FsckResult<Self> {
        let mut meta = Self::new(size, 0, ninodes)?;
        meta.nblocks = meta.size - meta.data_start;
        Ok(meta)
    }

    pub fn from_superblock(sb: &VsfsSuperblock) -> FsckResult<Self> {
        Self::new(sb.size(), sb.nblocks(), sb.ninodes())
    }

    /// Reads the superblock from block 1 and validates the layout against the
    /// backing store: the last declared block must be readable.
    pub fn from_io<IO: BlockIO + ?Sized>(io: &mut IO) -> FsckResult<Self> {
        let sb: VsfsSuperblock = io.read_struct(SUPERBLOCK_BLOCK as u64 * BSIZE as u64)?;
        let meta = Self::from_superblock(&sb)?;

        match io.read_block::<BSIZE>(meta.size as u64 - 1) {
            Ok(_) => {}
            Err(BlockIOError::OutOfBounds { .. }) => {
                return Err(FsckError::Format("image shorter than superblock size"));
            }
            Err(e) => return Err(e.into()),
        }

        log::debug!(
            "superblock: size={} nblocks={} ninodes={} -> bitmap@{} data@{}",
            meta.size,
            meta.nblocks,
            meta.ninodes,
            meta.bitmap_start,
            meta.data_start
        );
        Ok(meta)
    }

    pub fn superblock(&self) -> VsfsSuperblock {
        VsfsSuperblock::new(self.size, self.nblocks, self.ninodes)
    }

    #[inline]
    pub fn size_bytes(&self) -> u64 {
        self.size as u64 * BSIZE as u64
    }

    #[inline]
    pub fn inode_blocks(&self) -> u32 {
        self.ninodes.div_ceil(IPB)
    }

    /// Inode-table block and slot within it holding inode `inum`.
    #[inline]
    pub fn inode_location(&self, inum: u32) -> (u32, usize) {
        (self.inode_start + inum / IPB, (inum % IPB) as usize)
    }

    /// Byte offset of inode `inum` in the image.
    #[inline]
    pub fn inode_offset(&self, inum: u32) -> u64 {
        let (block, slot) = self.inode_location(inum);
        block as u64 * BSIZE as u64 + (slot * INODE_SIZE) as u64
    }

    #[inline]
    pub fn bitmap_blocks(&self) -> u32 {
        self.data_start - self.bitmap_start
    }

    /// Bitmap block, byte within it and bit mask holding the bit of `block`.
    #[inline]
    pub fn bitmap_location(&self, block: u32) -> (u32, usize, u8) {
        let bit = block % BPB;
        (self.bitmap_start + block / BPB, (bit / 8) as usize, 1 << (bit % 8))
    }

    /// Valid data block numbers: `[data_start, size)`.
    #[inline]
    pub fn data_blocks(&self) -> Range<u32> {
        self.data_start..self.size
    }

    #[inline]
    pub fn is_data_block(&self, block: u32) -> bool {
        self.data_blocks().contains(&block)
    }

    /// Range-checks `block` against the data region.
    ///
    /// This is the only way to obtain a [`DataBlock`], so anything indexed by
    /// one has been validated first.
    #[inline]
    pub fn data_block(&self, block: u32) -> Option<DataBlock> {
        self.is_data_block(block).then_some(DataBlock(block))
    }

    #[inline]
    pub fn is_valid_inum(&self, inum: u32) -> bool {
        inum < self.ninodes
    }
}
