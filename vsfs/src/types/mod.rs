// SPDX-License-Identifier: MIT
//! On-disk vsfs records.

pub mod dirent;
pub mod inode;
pub mod superblock;

pub use dirent::*;
pub use inode::*;
pub use superblock::*;

/// One raw block of the image.
pub type Block = [u8; crate::constant::BSIZE];
