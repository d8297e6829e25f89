// SPDX-License-Identifier: MIT

//! Adds directories, files, device nodes and hard links to a formatted image.
//!
//! Allocation is first-fit: the lowest free inode after the root, the lowest
//! clear bitmap bit in the data region. Directories keep `nlink == 1` and a
//! single name, which is what the checker expects of them.

use vsfsio::prelude::*;
use zerocopy::IntoBytes;

pub use crate::core::errors::{FsInjectorError, FsInjectorResult};

use crate::constant::*;
use crate::core::utils::bitmap::BitmapOps;
use crate::meta::VsfsMeta;
use crate::types::*;

pub struct VsfsInjector<'a, IO: BlockIO + ?Sized> {
    io: &'a mut IO,
    meta: &'a VsfsMeta,
}

impl<'a, IO: BlockIO + ?Sized> VsfsInjector<'a, IO> {
    pub fn new(io: &'a mut IO, meta: &'a VsfsMeta) -> Self {
        Self { io, meta }
    }

    // --- Inodes ---

    pub fn read_inode(&mut self, inum: u32) -> FsInjectorResult<DInode> {
        if !self.meta.is_valid_inum(inum) {
            return Err(FsInjectorError::Invalid("inode number out of range"));
        }
        Ok(self.io.read_struct(self.meta.inode_offset(inum))?)
    }

    pub fn write_inode(&mut self, inum: u32, inode: &DInode) -> FsInjectorResult {
        if !self.meta.is_valid_inum(inum) {
            return Err(FsInjectorError::Invalid("inode number out of range"));
        }
        self.io.write_struct(self.meta.inode_offset(inum), inode)?;
        Ok(())
    }

    fn alloc_inode(&mut self, inode: &DInode) -> FsInjectorResult<u32> {
        for inum in (ROOT_INO + 1)..self.meta.ninodes {
            if self.read_inode(inum)?.raw_type() == T_FREE {
                self.write_inode(inum, inode)?;
                return Ok(inum);
            }
        }
        Err(FsInjectorError::OutOfInodes)
    }

    // --- Blocks ---

    /// Claims the lowest free data block and zeroes it.
    pub fn alloc_block(&mut self) -> FsInjectorResult<u32> {
        let data = self.meta.data_blocks();
        for bitmap_block in self.meta.bitmap_start..self.meta.data_start {
            let first = (bitmap_block - self.meta.bitmap_start) * BPB;
            let start = first.max(data.start);
            let end = first.saturating_add(BPB).min(data.end);
            if start >= end {
                continue;
            }

            let mut raw: Block = self.io.read_block(bitmap_block as u64)?;
            let Some(bit) = raw.first_zero_in((start - first) as usize..(end - first) as usize)
            else {
                continue;
            };
            raw.set_bit(bit, true);
            self.io.write_block(bitmap_block as u64, &raw)?;

            let block = first + bit as u32;
            self.io.write_block(block as u64, &[0u8; BSIZE])?;
            log::trace!("allocated block {block}");
            return Ok(block);
        }
        Err(FsInjectorError::OutOfBlocks)
    }

    /// Block number backing file block `index` of `inode`, allocating it
    /// (and the indirect block) on first use.
    fn map_block(&mut self, inode: &mut DInode, index: usize) -> FsInjectorResult<u32> {
        if index < NDIRECT {
            let mut addr = inode.addr(index);
            if addr == 0 {
                addr = self.alloc_block()?;
                inode.set_addr(index, addr);
            }
            return Ok(addr);
        }

        let entry = index - NDIRECT;
        if entry >= NINDIRECT {
            return Err(FsInjectorError::FileTooLarge);
        }

        let mut indirect = inode.addr(INDIRECT_SLOT);
        if indirect == 0 {
            indirect = self.alloc_block()?;
            inode.set_addr(INDIRECT_SLOT, indirect);
        }

        let offset = indirect as u64 * BSIZE as u64 + (entry * 4) as u64;
        let mut addr = self.io.read_u32_at(offset)?;
        if addr == 0 {
            addr = self.alloc_block()?;
            self.io.write_u32_at(offset, addr)?;
        }
        Ok(addr)
    }

    // --- Directories ---

    fn check_name(name: &[u8]) -> FsInjectorResult {
        if name.is_empty() || name.len() > DIRSIZ || name.contains(&0) {
            return Err(FsInjectorError::Invalid("name must be 1 to 14 non-NUL bytes"));
        }
        Ok(())
    }

    fn dirent_inum(inum: u32) -> FsInjectorResult<u16> {
        u16::try_from(inum)
            .map_err(|_| FsInjectorError::Invalid("inode number exceeds dirent range"))
    }

    fn dir_inode(&mut self, dir: u32) -> FsInjectorResult<DInode> {
        let inode = self.read_inode(dir)?;
        if inode.kind() != Ok(InodeType::Dir) {
            return Err(FsInjectorError::NotADirectory(dir));
        }
        Ok(inode)
    }

    /// Appends `name -> inum` in the first empty slot of directory `dir`.
    pub fn add_entry(&mut self, dir: u32, name: &[u8], inum: u32) -> FsInjectorResult {
        Self::check_name(name)?;
        let entry = Dirent::new(Self::dirent_inum(inum)?, name);

        let mut inode = self.dir_inode(dir)?;
        for index in 0..MAX_FILE_BLOCKS {
            let block = self.map_block(&mut inode, index)?;
            let raw: Block = self.io.read_block(block as u64)?;
            let Some(slot) = dirents(&raw).position(|e| e.is_empty()) else {
                continue;
            };

            let offset = block as u64 * BSIZE as u64 + (slot * DIRENT_SIZE) as u64;
            self.io.write_at(offset, entry.as_bytes())?;

            let end = ((index * DPB + slot + 1) * DIRENT_SIZE) as u32;
            inode.set_size(inode.size().max(end));
            self.write_inode(dir, &inode)?;
            return Ok(());
        }
        Err(FsInjectorError::FileTooLarge)
    }

    /// Creates an empty directory under `parent`.
    pub fn mkdir(&mut self, parent: u32, name: &[u8]) -> FsInjectorResult<u32> {
        Self::check_name(name)?;
        let parent16 = Self::dirent_inum(parent)?;
        self.dir_inode(parent)?;

        let inum = self.alloc_inode(&DInode::new(InodeType::Dir, 1))?;
        let block = self.alloc_block()?;

        let mut raw = [0u8; BSIZE];
        raw[..DIRENT_SIZE].copy_from_slice(Dirent::new(Self::dirent_inum(inum)?, b".").as_bytes());
        raw[DIRENT_SIZE..2 * DIRENT_SIZE].copy_from_slice(Dirent::new(parent16, b"..").as_bytes());
        self.io.write_block(block as u64, &raw)?;

        let mut inode = DInode::new(InodeType::Dir, 1);
        inode.set_addr(0, block);
        inode.set_size((2 * DIRENT_SIZE) as u32);
        self.write_inode(inum, &inode)?;

        self.add_entry(parent, name, inum)?;
        log::debug!("mkdir {:?} -> inode {inum}", core::str::from_utf8(name));
        Ok(inum)
    }

    /// Creates a regular file holding `data` under `parent`.
    pub fn create_file(
        &mut self,
        parent: u32,
        name: &[u8],
        data: &[u8],
    ) -> FsInjectorResult<u32> {
        Self::check_name(name)?;
        if data.len().div_ceil(BSIZE) > MAX_FILE_BLOCKS {
            return Err(FsInjectorError::FileTooLarge);
        }
        self.dir_inode(parent)?;

        let inum = self.alloc_inode(&DInode::new(InodeType::File, 1))?;
        let mut inode = DInode::new(InodeType::File, 1);

        for (index, chunk) in data.chunks(BSIZE).enumerate() {
            let block = self.map_block(&mut inode, index)?;
            let mut raw = [0u8; BSIZE];
            raw[..chunk.len()].copy_from_slice(chunk);
            self.io.write_block(block as u64, &raw)?;
        }
        inode.set_size(data.len() as u32);
        self.write_inode(inum, &inode)?;

        self.add_entry(parent, name, inum)?;
        log::debug!(
            "create {:?} ({} bytes) -> inode {inum}",
            core::str::from_utf8(name),
            data.len()
        );
        Ok(inum)
    }

    /// Creates a device node under `parent`.
    pub fn mknod(
        &mut self,
        parent: u32,
        name: &[u8],
        major: i16,
        minor: i16,
    ) -> FsInjectorResult<u32> {
        Self::check_name(name)?;
        self.dir_inode(parent)?;
        let inum = self.alloc_inode(&DInode::device(major, minor))?;
        self.add_entry(parent, name, inum)?;
        Ok(inum)
    }

    /// Adds a second name for `target` under `parent` and bumps its `nlink`.
    pub fn link(&mut self, parent: u32, name: &[u8], target: u32) -> FsInjectorResult {
        let mut inode = self.read_inode(target)?;
        if inode.raw_type() == T_FREE {
            return Err(FsInjectorError::Invalid("link target is a free inode"));
        }

        self.add_entry(parent, name, target)?;
        inode.set_nlink(inode.nlink().saturating_add(1));
        self.write_inode(target, &inode)?;
        Ok(())
    }

    pub fn flush(&mut self) -> FsInjectorResult {
        self.io.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;
    use crate::formatter::VsfsFormatter;

    fn image(size: u32, ninodes: u32) -> (VsfsMeta, Vec<u8>) {
        let meta = VsfsMeta::for_image(size, ninodes).unwrap();
        let mut buf = vec![0u8; meta.size_bytes() as usize];
        VsfsFormatter::new(&mut MemBlockIO::new(&mut buf), &meta)
            .format()
            .unwrap();
        (meta, buf)
    }

    #[test]
    fn test_first_fit_allocation() {
        let (meta, mut buf) = image(256, 32);
        let mut io = MemBlockIO::new(&mut buf);
        let mut inj = VsfsInjector::new(&mut io, &meta);

        let root_block = meta.data_start;
        assert_eq!(inj.alloc_block().unwrap(), root_block + 1);
        assert_eq!(inj.alloc_block().unwrap(), root_block + 2);

        let a = inj.mkdir(ROOT_INO, b"a").unwrap();
        let f = inj.create_file(a, b"f", &[7u8; 3 * BSIZE]).unwrap();
        assert_eq!((a, f), (2, 3));

        let file = inj.read_inode(f).unwrap();
        assert_eq!(file.size(), 3 * BSIZE as u32);
        assert_eq!(file.addr(0), root_block + 4);
        assert_eq!(file.addr(2), root_block + 6);
    }

    #[test]
    fn test_large_file_uses_indirect_block() {
        let (meta, mut buf) = image(512, 16);
        let mut io = MemBlockIO::new(&mut buf);
        let mut inj = VsfsInjector::new(&mut io, &meta);

        let data: Vec<u8> = (0..(NDIRECT + 3) * BSIZE).map(|i| i as u8).collect();
        let f = inj.create_file(ROOT_INO, b"big", &data).unwrap();
        let inode = inj.read_inode(f).unwrap();

        let indirect = inode.addr(INDIRECT_SLOT);
        assert_ne!(indirect, 0);
        let entries = indirect_entries(&io.read_block(indirect as u64).unwrap());
        assert!(entries[..3].iter().all(|&b| b != 0));
        assert!(entries[3..].iter().all(|&b| b == 0));

        let last: Block = io.read_block(entries[2] as u64).unwrap();
        assert_eq!(last[..], data[(NDIRECT + 2) * BSIZE..]);
    }

    #[test]
    fn test_directory_grows_past_one_block() {
        let (meta, mut buf) = image(256, 64);
        let mut io = MemBlockIO::new(&mut buf);
        let mut inj = VsfsInjector::new(&mut io, &meta);

        // Two slots of the first block hold "." and ".."
        for i in 0..DPB - 1 {
            let name = format!("n{i}");
            inj.mknod(ROOT_INO, name.as_bytes(), 1, i as i16).unwrap();
        }
        let root = inj.read_inode(ROOT_INO).unwrap();
        assert_ne!(root.addr(1), 0);
        assert_eq!(root.size(), ((DPB + 1) * DIRENT_SIZE) as u32);
    }

    #[test]
    fn test_errors() {
        let (meta, mut buf) = image(64, 8);
        let mut io = MemBlockIO::new(&mut buf);
        let mut inj = VsfsInjector::new(&mut io, &meta);

        let f = inj.create_file(ROOT_INO, b"f", b"x").unwrap();
        assert_eq!(
            inj.mkdir(f, b"d").unwrap_err(),
            FsInjectorError::NotADirectory(f)
        );
        assert!(matches!(
            inj.mknod(ROOT_INO, b"fifteen_bytes__", 1, 1),
            Err(FsInjectorError::Invalid(_))
        ));
        assert!(matches!(
            inj.link(ROOT_INO, b"ghost", 7),
            Err(FsInjectorError::Invalid(_))
        ));
        assert_eq!(
            inj.create_file(ROOT_INO, b"huge", &vec![0u8; (MAX_FILE_BLOCKS + 1) * BSIZE])
                .unwrap_err(),
            FsInjectorError::FileTooLarge
        );

        while inj.mknod(ROOT_INO, b"dev", 1, 1).is_ok() {}
        assert_eq!(
            inj.mknod(ROOT_INO, b"dev", 1, 1).unwrap_err(),
            FsInjectorError::OutOfInodes
        );
    }

    #[test]
    fn test_link_bumps_nlink() {
        let (meta, mut buf) = image(128, 16);
        let mut io = MemBlockIO::new(&mut buf);
        let mut inj = VsfsInjector::new(&mut io, &meta);

        let f = inj.create_file(ROOT_INO, b"f", b"data").unwrap();
        inj.link(ROOT_INO, b"g", f).unwrap();
        assert_eq!(inj.read_inode(f).unwrap().nlink(), 2);
    }
}
