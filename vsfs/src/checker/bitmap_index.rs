// SPDX-License-Identifier: MIT

//! Per-block allocation tracking for the data region.
//!
//! Holds, for every data block, the allocation bit persisted in the on-disk
//! bitmap and a counter of the inode slots observed naming it during the walk.

use alloc::vec::Vec;

use vsfsio::prelude::*;

use crate::constant::*;
use crate::core::utils::bitmap::BitmapOps;
use crate::core::{FsckError, FsckResult};
use crate::meta::{DataBlock, VsfsMeta};
use crate::types::Block;

#[derive(Debug, Clone)]
pub struct BitmapIndex {
    base: u32,
    persisted: Vec<u8>,
    uses: Vec<u32>,
}

impl BitmapIndex {
    /// Empty index for `count` blocks starting at `base` (all bits clear).
    pub fn new(base: u32, count: usize) -> Self {
        Self {
            base,
            persisted: vec![0u8; count.div_ceil(8)],
            uses: vec![0u32; count],
        }
    }

    /// Loads the persisted bit of every block in `[data_start, size)`.
    ///
    /// Each bitmap block is read once; only the bits covering the data
    /// region are kept.
    pub fn load<IO: BlockIO + ?Sized>(io: &mut IO, meta: &VsfsMeta) -> FsckResult<Self> {
        let data = meta.data_blocks();
        let mut index = Self::new(data.start, data.len());

        for bitmap_block in meta.bitmap_start..meta.data_start {
            let first = (bitmap_block - meta.bitmap_start) * BPB;
            let covered = first.max(data.start)..first.saturating_add(BPB).min(data.end);
            if covered.is_empty() {
                continue;
            }

            let raw: Block = io.read_block(bitmap_block as u64)?;
            for block in covered {
                let (_, byte, mask) = meta.bitmap_location(block);
                if raw[byte] & mask != 0 {
                    index.set_persisted(block, true);
                }
            }
        }

        log::debug!(
            "bitmap: {} of {} data blocks marked allocated",
            index.allocated(),
            index.len()
        );
        Ok(index)
    }

    #[inline]
    fn index(&self, block: u32) -> Option<usize> {
        let idx = block.checked_sub(self.base)? as usize;
        (idx < self.uses.len()).then_some(idx)
    }

    /// Number of tracked blocks.
    #[inline]
    pub fn len(&self) -> usize {
        self.uses.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.uses.is_empty()
    }

    pub fn set_persisted(&mut self, block: u32, value: bool) {
        if let Some(idx) = self.index(block) {
            self.persisted.set_bit(idx, value);
        }
    }

    /// Allocation bit read from the on-disk bitmap.
    #[inline]
    pub fn initial_state(&self, block: u32) -> bool {
        self.index(block)
            .is_some_and(|idx| self.persisted.get_bit(idx))
    }

    /// Number of slots observed naming `block` so far.
    #[inline]
    pub fn use_count(&self, block: u32) -> u32 {
        self.index(block).map_or(0, |idx| self.uses[idx])
    }

    /// Blocks whose persisted bit is set.
    pub fn allocated(&self) -> usize {
        self.persisted.count_ones()
    }

    /// Records one more slot naming `block`.
    ///
    /// Fails on the second use of a block (`DoubleAllocation`, reported once
    /// however many further uses follow since the walk stops there) and on
    /// the first use of a block the bitmap marks free (`UnmarkedInUse`).
    pub fn mark_used(&mut self, block: DataBlock) -> FsckResult<()> {
        let b = block.get();
        let Some(idx) = self.index(b) else {
            bail!(FsckError::Format("block outside the indexed data region"));
        };

        let uses = self.uses[idx].saturating_add(1);
        self.uses[idx] = uses;

        ensure!(uses <= 1, FsckError::DoubleAllocation { block: b, uses });
        ensure!(
            self.persisted.get_bit(idx),
            FsckError::UnmarkedInUse { block: b }
        );
        Ok(())
    }

    /// Post-walk check: every block marked allocated must have been used.
    pub fn reconcile(&self) -> FsckResult<()> {
        for (idx, &uses) in self.uses.iter().enumerate() {
            if uses == 0 && self.persisted.get_bit(idx) {
                bail!(FsckError::AllocatedButUnused {
                    block: self.base + idx as u32
                });
            }
        }
        Ok(())
    }
}
