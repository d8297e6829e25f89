// SPDX-License-Identifier: MIT

use vsfsio::prelude::*;

use crate::checker::{AddressCursor, BitmapIndex, DirectoryGraph};
use crate::constant::*;
use crate::core::checker::WalkerStats;
use crate::core::{FsckError, FsckResult};
use crate::meta::VsfsMeta;
use crate::types::{Block, DInode, InodeType};

/// Drives the inode-table pass: type legality, block claims, directory parsing.
pub struct VsfsWalker<'a, IO: BlockIO + ?Sized> {
    io: &'a mut IO,
    meta: &'a VsfsMeta,
    pub stats: WalkerStats,
}

impl<'a, IO: BlockIO + ?Sized> VsfsWalker<'a, IO> {
    pub fn new(io: &'a mut IO, meta: &'a VsfsMeta) -> Self {
        Self {
            io,
            meta,
            stats: WalkerStats::new(),
        }
    }

    /// Visits every inode slot in index order.
    ///
    /// Fails with `MissingRoot` right after the root slot if the root's
    /// self-parent header has not been seen by then.
    pub fn scan_inodes(
        &mut self,
        bitmap: &mut BitmapIndex,
        graph: &mut DirectoryGraph,
        root: u32,
    ) -> FsckResult<()> {
        for table_block in 0..self.meta.inode_blocks() {
            let raw: Block = self
                .io
                .read_block((self.meta.inode_start + table_block) as u64)?;

            for slot in 0..IPB as usize {
                let inum = table_block * IPB + slot as u32;
                if inum >= self.meta.ninodes {
                    break;
                }
                let Some(inode) = DInode::from_table_block(&raw, slot) else {
                    bail!(FsckError::Format("inode record crosses block boundary"));
                };

                self.check_inode(inum, &inode, bitmap, graph)?;

                if inum == root {
                    ensure!(graph.root_seen(), FsckError::MissingRoot);
                }
            }
        }

        // Root index past the end of the table
        ensure!(graph.root_seen(), FsckError::MissingRoot);
        Ok(())
    }

    fn check_inode(
        &mut self,
        inum: u32,
        inode: &DInode,
        bitmap: &mut BitmapIndex,
        graph: &mut DirectoryGraph,
    ) -> FsckResult<()> {
        self.stats.inodes_scanned += 1;

        let kind = inode
            .kind()
            .map_err(|raw| FsckError::InvalidInodeType { inum, raw })?;

        match kind {
            InodeType::Free => return Ok(()),
            InodeType::Dir => self.stats.dirs_visited += 1,
            InodeType::File => self.stats.files_found += 1,
            InodeType::Device => self.stats.devices_found += 1,
        }
        self.stats.inodes_checked += 1;
        log::trace!("inode {inum}: {kind:?}, nlink {}", inode.nlink());

        graph.record_inode(inum, kind, inode.effective_nlink());

        let is_dir = kind == InodeType::Dir;
        if is_dir {
            graph.begin_directory(inum);
        }

        let mut cursor = AddressCursor::new(self.meta, inum, inode);
        cursor.for_each_block(self.io, bitmap, |io, slot, block| {
            if is_dir {
                let data: Block = io.read_block(block as u64)?;
                graph.scan_block(slot, &data)?;
            }
            Ok(())
        })?;
        self.stats.blocks_referenced += cursor.claimed();

        if is_dir {
            graph.end_directory()?;
        }
        self.stats.entries_scanned = graph.entries_scanned();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;
    use crate::formatter::VsfsFormatter;
    use crate::injector::VsfsInjector;

    fn walk(buf: &mut [u8], meta: &VsfsMeta) -> (FsckResult<()>, WalkerStats) {
        let mut io = MemBlockIO::new(buf);
        let data = meta.data_blocks();
        let mut bitmap = BitmapIndex::load(&mut io, meta).unwrap();
        let mut graph = DirectoryGraph::new(meta.ninodes, ROOT_INO);
        assert_eq!(bitmap.len(), data.len());

        let mut walker = VsfsWalker::new(&mut io, meta);
        let res = walker.scan_inodes(&mut bitmap, &mut graph, ROOT_INO);
        (res, walker.stats)
    }

    fn image() -> (VsfsMeta, Vec<u8>) {
        let meta = VsfsMeta::for_image(256, 64).unwrap();
        let mut buf = vec![0u8; meta.size_bytes() as usize];
        {
            let mut io = MemBlockIO::new(&mut buf);
            VsfsFormatter::new(&mut io, &meta).format().unwrap();
            let mut inj = VsfsInjector::new(&mut io, &meta);
            let dir = inj.mkdir(ROOT_INO, b"etc").unwrap();
            inj.create_file(dir, b"motd", b"hello").unwrap();
            inj.mknod(ROOT_INO, b"console", 1, 1).unwrap();
        }
        (meta, buf)
    }

    #[test]
    fn test_walk_counts_objects() {
        let (meta, mut buf) = image();
        let (res, stats) = walk(&mut buf, &meta);
        res.unwrap();

        assert_eq!(stats.inodes_scanned, 64);
        assert_eq!(stats.inodes_checked, 4);
        assert_eq!(stats.dirs_visited, 2);
        assert_eq!(stats.files_found, 1);
        assert_eq!(stats.devices_found, 1);
        // root dir block, etc dir block, motd data block
        assert_eq!(stats.blocks_referenced, 3);
        // etc + console in root, motd in etc
        assert_eq!(stats.entries_scanned, 3);
    }

    #[test]
    fn test_invalid_type() {
        let (meta, mut buf) = image();
        let off = meta.inode_offset(9) as usize;
        buf[off..off + 2].copy_from_slice(&7i16.to_le_bytes());

        let (res, _) = walk(&mut buf, &meta);
        assert_eq!(res, Err(FsckError::InvalidInodeType { inum: 9, raw: 7 }));
    }

    #[test]
    fn test_root_not_a_directory() {
        let (meta, mut buf) = image();
        let off = meta.inode_offset(ROOT_INO) as usize;
        buf[off..off + 2].copy_from_slice(&T_FILE.to_le_bytes());

        let (res, _) = walk(&mut buf, &meta);
        assert_eq!(res, Err(FsckError::MissingRoot));
    }
}
