// SPDX-License-Identifier: MIT
// vsfs/constant.rs

// === Geometry ===

// Block size (bytes); fixed, never stored on disk
pub const BSIZE: usize = 512;

// Block 0 is unused, block 1 holds the superblock
pub const SUPERBLOCK_BLOCK: u32 = 1;

// First block of the inode table
pub const INODE_START_BLOCK: u32 = 2;

// Blocks between the end of the inode table and the bitmap (ceil(ninodes / IPB) + 3)
pub const BITMAP_GAP_BLOCKS: u32 = 3;

// === Inode ===

pub const ROOT_INO: u32 = 1;

// On-disk inode record size
pub const INODE_SIZE: usize = 64;

// Inodes per block
pub const IPB: u32 = (BSIZE / INODE_SIZE) as u32;

// Direct block slots, followed by one indirect slot
pub const NDIRECT: usize = 12;
pub const INDIRECT_SLOT: usize = NDIRECT;

// Block addresses held by one indirect block
pub const NINDIRECT: usize = BSIZE / core::mem::size_of::<u32>();

pub const MAX_FILE_BLOCKS: usize = NDIRECT + NINDIRECT;

// === Inode types (`DInode::ty`) ===

pub const T_FREE: i16 = 0;
pub const T_DIR: i16 = 1;
pub const T_FILE: i16 = 2;
pub const T_DEV: i16 = 3;

// === Bitmap ===

// Bits (blocks) covered by one bitmap block
pub const BPB: u32 = (BSIZE * 8) as u32;

// === Directory entries ===

pub const DIRSIZ: usize = 14;
pub const DIRENT_SIZE: usize = 16;

// Entries per directory block
pub const DPB: usize = BSIZE / DIRENT_SIZE;
