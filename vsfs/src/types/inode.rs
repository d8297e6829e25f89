// SPDX-License-Identifier: MIT
//! vsfs on-disk inode

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::constant::*;
use crate::types::Block;

/// Legal inode types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InodeType {
    Free,
    Dir,
    File,
    Device,
}

impl InodeType {
    #[inline]
    pub fn is_free(self) -> bool {
        self == InodeType::Free
    }

    pub fn raw(self) -> i16 {
        match self {
            InodeType::Free => T_FREE,
            InodeType::Dir => T_DIR,
            InodeType::File => T_FILE,
            InodeType::Device => T_DEV,
        }
    }
}

impl TryFrom<i16> for InodeType {
    type Error = i16;

    fn try_from(raw: i16) -> Result<Self, Self::Error> {
        match raw {
            T_FREE => Ok(InodeType::Free),
            T_DIR => Ok(InodeType::Dir),
            T_FILE => Ok(InodeType::File),
            T_DEV => Ok(InodeType::Device),
            other => Err(other),
        }
    }
}

/// On-disk inode (64 bytes, 8 per block), little-endian.
///
/// `addrs[0..12]` are direct block numbers, `addrs[12]` names an indirect
/// block of further block numbers. Zero means "unused slot".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, IntoBytes, FromBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct DInode {
    /// File type
    pub ty: i16,
    /// Major device number (T_DEV only)
    pub major: i16,
    /// Minor device number (T_DEV only)
    pub minor: i16,
    /// Number of links to inode in file system
    pub nlink: i16,
    /// Size of file (bytes)
    pub size: u32,
    /// Data block addresses
    pub addrs: [u32; NDIRECT + 1],
}

const _: () = assert!(core::mem::size_of::<DInode>() == INODE_SIZE);

impl DInode {
    pub fn new(ty: InodeType, nlink: i16) -> Self {
        Self {
            ty: ty.raw().to_le(),
            nlink: nlink.to_le(),
            ..Default::default()
        }
    }

    pub fn device(major: i16, minor: i16) -> Self {
        Self {
            major: major.to_le(),
            minor: minor.to_le(),
            ..Self::new(InodeType::Device, 1)
        }
    }

    /// Decodes inode `slot` (0..IPB) of an inode-table block.
    pub fn from_table_block(block: &Block, slot: usize) -> Option<Self> {
        let start = slot.checked_mul(INODE_SIZE)?;
        let bytes = block.get(start..start + INODE_SIZE)?;
        Self::read_from_bytes(bytes).ok()
    }

    #[inline]
    pub fn raw_type(&self) -> i16 {
        i16::from_le(self.ty)
    }

    /// Decoded type, or the raw value when it is not a legal type.
    #[inline]
    pub fn kind(&self) -> Result<InodeType, i16> {
        InodeType::try_from(self.raw_type())
    }

    #[inline]
    pub fn nlink(&self) -> i16 {
        i16::from_le(self.nlink)
    }

    /// Link count used for reconciliation: the declared `nlink` clamped to at
    /// least 1, so an in-use inode declaring 0 (or less) is treated as 1.
    #[inline]
    pub fn effective_nlink(&self) -> u32 {
        self.nlink().max(1) as u32
    }

    #[inline]
    pub fn size(&self) -> u32 {
        u32::from_le(self.size)
    }

    #[inline]
    pub fn addr(&self, slot: usize) -> u32 {
        u32::from_le(self.addrs[slot])
    }

    #[inline]
    pub fn set_addr(&mut self, slot: usize, block: u32) {
        self.addrs[slot] = block.to_le();
    }

    #[inline]
    pub fn set_nlink(&mut self, nlink: i16) {
        self.nlink = nlink.to_le();
    }

    #[inline]
    pub fn set_size(&mut self, size: u32) {
        self.size = size.to_le();
    }
}

/// Decodes the block numbers held by an indirect block.
pub fn indirect_entries(block: &Block) -> [u32; NINDIRECT] {
    let mut out = [0u32; NINDIRECT];
    for (dst, chunk) in out.iter_mut().zip(block.chunks_exact(4)) {
        *dst = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    out
}
