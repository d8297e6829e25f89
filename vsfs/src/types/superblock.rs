// SPDX-License-Identifier: MIT
//! vsfs superblock (block 1)

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Superblock as stored on disk, little-endian.
///
/// Fields are kept raw; use the accessors to read host-order values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, IntoBytes, FromBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct VsfsSuperblock {
    /// Size of the file system image (blocks)
    pub size: u32,
    /// Number of data blocks
    pub nblocks: u32,
    /// Number of inodes
    pub ninodes: u32,
}

impl VsfsSuperblock {
    pub fn new(size: u32, nblocks: u32, ninodes: u32) -> Self {
        Self {
            size: size.to_le(),
            nblocks: nblocks.to_le(),
            ninodes: ninodes.to_le(),
        }
    }

    #[inline]
    pub fn size(&self) -> u32 {
        u32::from_le(self.size)
    }

    #[inline]
    pub fn nblocks(&self) -> u32 {
        u32::from_le(self.nblocks)
    }

    #[inline]
    pub fn ninodes(&self) -> u32 {
        u32::from_le(self.ninodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_superblock_wire_format() {
        let sb = VsfsSuperblock::new(1024, 941, 200);
        let bytes = sb.as_bytes();
        assert_eq!(bytes.len(), 12);
        assert_eq!(&bytes[0..4], &1024u32.to_le_bytes());
        assert_eq!(&bytes[8..12], &200u32.to_le_bytes());

        let back = VsfsSuperblock::read_from_bytes(bytes).unwrap();
        assert_eq!((back.size(), back.nblocks(), back.ninodes()), (1024, 941, 200));
    }
}
