// SPDX-License-Identifier: MIT
//! vsfs directory entry

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::constant::*;
use crate::types::Block;

/// Fixed-size directory entry (16 bytes, 32 per block).
///
/// `inum == 0` marks an empty slot. The name is NUL-padded only when shorter
/// than `DIRSIZ`; a 14-byte name has no terminator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, IntoBytes, FromBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct Dirent {
    pub inum: u16,
    pub name: [u8; DIRSIZ],
}

const _: () = assert!(core::mem::size_of::<Dirent>() == DIRENT_SIZE);

impl Dirent {
    /// Builds an entry; names longer than `DIRSIZ` are truncated.
    pub fn new(inum: u16, name: &[u8]) -> Self {
        let mut buf = [0u8; DIRSIZ];
        let len = name.len().min(DIRSIZ);
        buf[..len].copy_from_slice(&name[..len]);
        Self {
            inum: inum.to_le(),
            name: buf,
        }
    }

    #[inline]
    pub fn inum(&self) -> u32 {
        u16::from_le(self.inum) as u32
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inum() == 0
    }

    /// Name bytes up to the first NUL (or all `DIRSIZ` bytes).
    pub fn name(&self) -> &[u8] {
        let end = self.name.iter().position(|&b| b == 0).unwrap_or(DIRSIZ);
        &self.name[..end]
    }

    #[inline]
    pub fn is_dot(&self) -> bool {
        self.name() == b"."
    }

    #[inline]
    pub fn is_dotdot(&self) -> bool {
        self.name() == b".."
    }
}

/// Iterates the `DPB` entries of a directory block, empty slots included.
pub fn dirents(block: &Block) -> impl Iterator<Item = Dirent> + '_ {
    block
        .chunks_exact(DIRENT_SIZE)
        .filter_map(|raw| Dirent::read_from_bytes(raw).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_without_terminator() {
        let full = Dirent::new(5, b"fourteen_bytes");
        assert_eq!(full.name(), b"fourteen_bytes");

        let long = Dirent::new(5, b"much_longer_than_fourteen");
        assert_eq!(long.name().len(), DIRSIZ);

        let dot = Dirent::new(1, b".");
        assert!(dot.is_dot());
        assert!(!dot.is_dotdot());
    }

    #[test]
    fn test_block_iteration() {
        let mut block = [0u8; BSIZE];
        block[..DIRENT_SIZE].copy_from_slice(Dirent::new(1, b".").as_bytes());
        block[DIRENT_SIZE..2 * DIRENT_SIZE].copy_from_slice(Dirent::new(1, b"..").as_bytes());

        let entries: Vec<Dirent> = dirents(&block).collect();
        assert_eq!(entries.len(), DPB);
        assert_eq!(entries[0].inum(), 1);
        assert!(entries[1].is_dotdot());
        assert!(entries[2..].iter().all(Dirent::is_empty));
    }
}
