// SPDX-License-Identifier: MIT

use vsfsio::prelude::*;
use zerocopy::IntoBytes;

pub use crate::core::errors::{FsFormatterError, FsFormatterResult};

use crate::constant::*;
use crate::meta::VsfsMeta;
use crate::types::*;

/// VsfsFormatter:
/// - Zeroes the whole image, then writes the superblock.
/// - Creates the root directory (inode `ROOT_INO`, `.` and `..` naming itself)
///   in the first data block.
/// - Marks every metadata block plus the root block in the bitmap, so a fresh
///   image passes a full check.
pub struct VsfsFormatter<'a, IO: BlockIO + ?Sized> {
    io: &'a mut IO,
    meta: &'a VsfsMeta,
}

impl<'a, IO: BlockIO + ?Sized> VsfsFormatter<'a, IO> {
    pub fn new(io: &'a mut IO, meta: &'a VsfsMeta) -> Self {
        Self { io, meta }
    }

    fn write_superblock(&mut self) -> FsFormatterResult {
        let offset = SUPERBLOCK_BLOCK as u64 * BSIZE as u64;
        self.io.write_struct(offset, &self.meta.superblock())?;
        Ok(())
    }

    fn write_root_dir(&mut self) -> FsFormatterResult {
        let block = self.meta.data_start;
        let root = u16::try_from(ROOT_INO).map_err(|_| "root inode does not fit a dirent")?;

        let mut raw = [0u8; BSIZE];
        raw[..DIRENT_SIZE].copy_from_slice(Dirent::new(root, b".").as_bytes());
        raw[DIRENT_SIZE..2 * DIRENT_SIZE].copy_from_slice(Dirent::new(root, b"..").as_bytes());
        self.io.write_block(block as u64, &raw)?;

        let mut inode = DInode::new(InodeType::Dir, 1);
        inode.set_addr(0, block);
        inode.set_size((2 * DIRENT_SIZE) as u32);
        self.io.write_struct(self.meta.inode_offset(ROOT_INO), &inode)?;
        Ok(())
    }

    /// Marks `[0, data_start]`: metadata plus the root directory block.
    fn write_bitmap(&mut self) -> FsFormatterResult {
        let used = self.meta.data_start + 1;
        for block in 0..used {
            let (bitmap_block, byte, mask) = self.meta.bitmap_location(block);
            let offset = bitmap_block as u64 * BSIZE as u64 + byte as u64;
            let mut b = [0u8; 1];
            self.io.read_at(offset, &mut b)?;
            b[0] |= mask;
            self.io.write_at(offset, &b)?;
        }
        Ok(())
    }

    pub fn format(&mut self) -> FsFormatterResult {
        if self.meta.data_start >= self.meta.size {
            return Err(FsFormatterError::Invalid("no data block left for the root directory"));
        }
        if ROOT_INO >= self.meta.ninodes {
            return Err(FsFormatterError::Invalid("inode table too small for the root inode"));
        }

        self.io.zero_fill(0, self.meta.size_bytes() as usize)?;
        self.write_superblock()?;
        self.write_root_dir()?;
        self.write_bitmap()?;
        self.io.flush()?;

        log::debug!(
            "formatted {} blocks, {} inodes, root dir at block {}",
            self.meta.size,
            self.meta.ninodes,
            self.meta.data_start
        );
        Ok(())
    }
}
