// SPDX-License-Identifier: MIT

//! Reference graph built from directory contents.
//!
//! Every directory's first data block must open with `.` (itself) and `..`
//! (its declared parent). Every other non-empty entry, in any block of the
//! directory, counts as one reference to the inode it names and records the
//! directory as that inode's observed parent.

use alloc::vec::Vec;

use crate::checker::Slot;
use crate::core::{FsckError, FsckResult};
use crate::types::{Block, Dirent, InodeType, dirents};

/// What the walk learned about one inode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InodeLinks {
    pub in_use: bool,
    pub is_dir: bool,
    /// Effective link count (declared `nlink` clamped to at least 1).
    pub nlink: u32,
    /// Directory entries naming this inode, system-wide.
    pub refs: u32,
    /// Target of this directory's `..` entry.
    pub declared_parent: Option<u32>,
    /// Last directory seen holding an entry for this inode.
    pub observed_parent: Option<u32>,
}

#[derive(Debug, Clone, Copy)]
struct OpenDir {
    inum: u32,
    header_seen: bool,
}

#[derive(Debug, Clone)]
pub struct DirectoryGraph {
    root: u32,
    links: Vec<InodeLinks>,
    root_seen: bool,
    open: Option<OpenDir>,
    entries_scanned: usize,
}

impl DirectoryGraph {
    pub fn new(ninodes: u32, root: u32) -> Self {
        Self {
            root,
            links: vec![InodeLinks::default(); ninodes as usize],
            root_seen: false,
            open: None,
            entries_scanned: 0,
        }
    }

    #[inline]
    pub fn ninodes(&self) -> u32 {
        self.links.len() as u32
    }

    /// Whether the root's `.`/`..` self-reference has been seen.
    #[inline]
    pub fn root_seen(&self) -> bool {
        self.root_seen
    }

    #[inline]
    pub fn entries_scanned(&self) -> usize {
        self.entries_scanned
    }

    pub fn links(&self, inum: u32) -> Option<&InodeLinks> {
        self.links.get(inum as usize)
    }

    /// `(inum, links)` for every inode slot, in index order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &InodeLinks)> + '_ {
        self.links.iter().enumerate().map(|(i, l)| (i as u32, l))
    }

    /// Registers an in-use inode found by the walk.
    pub fn record_inode(&mut self, inum: u32, kind: InodeType, nlink: u32) {
        if let Some(l) = self.links.get_mut(inum as usize) {
            l.in_use = !kind.is_free();
            l.is_dir = kind == InodeType::Dir;
            l.nlink = nlink;
        }
    }

    pub fn begin_directory(&mut self, inum: u32) {
        self.open = Some(OpenDir {
            inum,
            header_seen: false,
        });
    }

    /// Closes the current directory; it must have had a header block.
    pub fn end_directory(&mut self) -> FsckResult<()> {
        let Some(dir) = self.open.take() else {
            return Ok(());
        };
        ensure!(
            dir.header_seen,
            FsckError::MalformedDirectory {
                inum: dir.inum,
                reason: "no first data block",
            }
        );
        Ok(())
    }

    /// Parses one data block of the directory opened by `begin_directory`.
    pub fn scan_block(&mut self, slot: Slot, block: &Block) -> FsckResult<()> {
        let Some(mut dir) = self.open else {
            bail!(FsckError::Format("directory block scanned outside a directory"));
        };

        let mut entries = dirents(block);
        if !dir.header_seen {
            ensure!(
                slot.is_first(),
                FsckError::MalformedDirectory {
                    inum: dir.inum,
                    reason: "first direct slot is empty",
                }
            );
            let dot = entries.next().unwrap_or_default();
            let dotdot = entries.next().unwrap_or_default();
            self.read_header(dir.inum, &dot, &dotdot)?;
            dir.header_seen = true;
            self.open = Some(dir);
        }

        for entry in entries {
            self.count_entry(dir.inum, &entry)?;
        }
        Ok(())
    }

    fn read_header(&mut self, inum: u32, dot: &Dirent, dotdot: &Dirent) -> FsckResult<()> {
        ensure!(
            dot.is_dot() && dot.inum() == inum,
            FsckError::MalformedDirectory {
                inum,
                reason: "first entry is not '.' naming itself",
            }
        );
        let parent = dotdot.inum();
        ensure!(
            dotdot.is_dotdot() && parent != 0 && parent < self.ninodes(),
            FsckError::MalformedDirectory {
                inum,
                reason: "second entry is not '..' naming a valid inode",
            }
        );

        if let Some(l) = self.links.get_mut(inum as usize) {
            l.declared_parent = Some(parent);
        }

        // The root is its own parent; its sentinel stands for the one name it has
        if inum == self.root && parent == self.root && !self.root_seen {
            self.root_seen = true;
            self.add_reference(self.root, self.root);
        }
        Ok(())
    }

    fn count_entry(&mut self, dir: u32, entry: &Dirent) -> FsckResult<()> {
        if entry.is_empty() {
            return Ok(());
        }
        let target = entry.inum();
        ensure!(
            target < self.ninodes(),
            FsckError::MalformedDirectory {
                inum: dir,
                reason: "entry names an inode past the table",
            }
        );
        self.entries_scanned += 1;
        self.add_reference(target, dir);
        Ok(())
    }

    fn add_reference(&mut self, target: u32, from: u32) {
        if let Some(l) = self.links.get_mut(target as usize) {
            l.refs = l.refs.saturating_add(1);
            l.observed_parent = Some(from);
        }
    }
}
