// SPDX-License-Identifier: MIT

mod bitmap_index;
mod dir_graph;
mod reconcile;
mod resolver;
mod walker;

pub use bitmap_index::BitmapIndex;
pub use dir_graph::{DirectoryGraph, InodeLinks};
pub use reconcile::{check_links, check_usage, reconcile};
pub use resolver::{AddressCursor, AddressIter, Slot};
pub use walker::VsfsWalker;

pub use crate::core::checker::*;

use vsfsio::prelude::*;

use crate::constant::ROOT_INO;
use crate::meta::VsfsMeta;

#[derive(Clone, Debug)]
pub struct VsfsCheckOptions {
    pub phases: VerifyPhases,
    /// Inode number whose directory must name itself as `.` and `..`.
    pub root_inode: u32,
}

impl Default for VsfsCheckOptions {
    fn default() -> Self {
        Self {
            phases: VerifyPhases::ALL,
            root_inode: ROOT_INO,
        }
    }
}

impl VsfsCheckOptions {
    /// Geometry and bitmap load only.
    pub fn fast() -> Self {
        Self {
            phases: VerifyPhases::GEOMETRY | VerifyPhases::BITMAP,
            ..Default::default()
        }
    }
}

impl VerifierOptionsLike for VsfsCheckOptions {
    fn phases(&self) -> VerifyPhases {
        self.phases
    }
}

/// Read-only consistency checker for one vsfs image.
///
/// Tables are sized from `meta` and owned by the checker for the length of
/// a run; every run starts from a freshly loaded bitmap.
pub struct VsfsChecker<'a, IO: BlockIO + ?Sized> {
    io: &'a mut IO,
    meta: &'a VsfsMeta,
    bitmap: Option<BitmapIndex>,
    graph: Option<DirectoryGraph>,
    stats: WalkerStats,
}

impl<'a, IO: BlockIO + ?Sized> VsfsChecker<'a, IO> {
    pub fn new(io: &'a mut IO, meta: &'a VsfsMeta) -> Self {
        Self {
            io,
            meta,
            bitmap: None,
            graph: None,
            stats: WalkerStats::new(),
        }
    }

    /// Statistics of the last inode walk.
    pub fn stats(&self) -> WalkerStats {
        self.stats
    }

    pub fn bitmap(&self) -> Option<&BitmapIndex> {
        self.bitmap.as_ref()
    }

    pub fn graph(&self) -> Option<&DirectoryGraph> {
        self.graph.as_ref()
    }
}

/* ========================= FsChecker impl ========================= */

impl<'a, IO: BlockIO + ?Sized> FsChecker for VsfsChecker<'a, IO> {
    type Options = VsfsCheckOptions;

    fn fast_check(&mut self) -> FsckResult {
        self.check_with(&VsfsCheckOptions::fast()).map(|_| ())
    }

    fn check_geometry(&mut self, _opt: &Self::Options, rep: &mut VerifyReport) -> FsckResult<()> {
        let on_disk = VsfsMeta::from_io(self.io)?;
        ensure!(
            on_disk == *self.meta,
            FsckError::Format("superblock does not match the layout being checked")
        );

        let m = self.meta;
        rep.push(Finding::info(
            "LAYOUT",
            format!(
                "size={} nblocks={} ninodes={} inodes@{} bitmap@{} data@{}",
                m.size, m.nblocks, m.ninodes, m.inode_start, m.bitmap_start, m.data_start
            ),
        ));
        Ok(())
    }

    fn check_bitmap(&mut self, _opt: &Self::Options, rep: &mut VerifyReport) -> FsckResult<()> {
        let bitmap = BitmapIndex::load(self.io, self.meta)?;
        rep.push(Finding::info(
            "BITMAP",
            format!(
                "{} of {} data blocks marked allocated",
                bitmap.allocated(),
                bitmap.len()
            ),
        ));
        self.bitmap = Some(bitmap);
        self.graph = None;
        Ok(())
    }

    fn check_inodes(&mut self, opt: &Self::Options, rep: &mut VerifyReport) -> FsckResult<()> {
        // A bitmap already claimed by an earlier walk is stale
        let mut bitmap = match (self.bitmap.take(), self.graph.take()) {
            (Some(bitmap), None) => bitmap,
            _ => BitmapIndex::load(self.io, self.meta)?,
        };
        let mut graph = DirectoryGraph::new(self.meta.ninodes, opt.root_inode);

        let mut walker = VsfsWalker::new(self.io, self.meta);
        walker.scan_inodes(&mut bitmap, &mut graph, opt.root_inode)?;
        self.stats = walker.stats;

        let s = self.stats;
        rep.push(Finding::info(
            "WALK",
            format!(
                "{} inodes in use ({} dirs, {} files, {} devices), {} blocks, {} entries",
                s.inodes_checked,
                s.dirs_visited,
                s.files_found,
                s.devices_found,
                s.blocks_referenced,
                s.entries_scanned
            ),
        ));

        self.bitmap = Some(bitmap);
        self.graph = Some(graph);
        Ok(())
    }

    fn check_reconcile(&mut self, _opt: &Self::Options, rep: &mut VerifyReport) -> FsckResult<()> {
        let (Some(bitmap), Some(graph)) = (&self.bitmap, &self.graph) else {
            rep.push(Finding::warn("RECONCILE", "skipped: inode walk did not run"));
            return Ok(());
        };

        reconcile(bitmap, graph)?;
        rep.push(Finding::info("RECONCILE", "bitmap, link counts and parents agree"));
        Ok(())
    }
}
