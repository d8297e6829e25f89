// SPDX-License-Identifier: MIT

//! Expansion of an inode's block pointers into data block numbers.
//!
//! The cursor walks the 12 direct slots in order, then the entries of the
//! indirect block. Every nonzero address is range-checked against the data
//! region and only then claimed in the [`BitmapIndex`]; zero addresses are
//! skipped. The first error fuses the cursor.

use vsfsio::prelude::*;

use crate::checker::BitmapIndex;
use crate::constant::*;
use crate::core::{FsckError, FsckResult};
use crate::meta::VsfsMeta;
use crate::types::{Block, DInode, indirect_entries};

/// Where a yielded block number came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Direct slot `0..NDIRECT` of the inode.
    Direct(usize),
    /// Entry `0..NINDIRECT` of the indirect block.
    Indirect(usize),
}

impl Slot {
    #[inline]
    pub fn is_first(self) -> bool {
        self == Slot::Direct(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Direct(usize),
    Indirect,
    Entries(usize),
    Done,
}

/// Single-pass cursor over the data blocks of one inode.
#[derive(Debug)]
pub struct AddressCursor<'a> {
    meta: &'a VsfsMeta,
    inum: u32,
    addrs: [u32; NDIRECT + 1],
    entries: [u32; NINDIRECT],
    stage: Stage,
    claimed: usize,
}

impl<'a> AddressCursor<'a> {
    pub fn new(meta: &'a VsfsMeta, inum: u32, inode: &DInode) -> Self {
        let mut addrs = [0u32; NDIRECT + 1];
        for (slot, addr) in addrs.iter_mut().enumerate() {
            *addr = inode.addr(slot);
        }
        Self {
            meta,
            inum,
            addrs,
            entries: [0u32; NINDIRECT],
            stage: Stage::Direct(0),
            claimed: 0,
        }
    }

    /// Blocks claimed so far, the indirect pointer block included.
    #[inline]
    pub fn claimed(&self) -> usize {
        self.claimed
    }

    /// Validates `block`, then records its use.
    fn claim(&mut self, bitmap: &mut BitmapIndex, block: u32, indirect: bool) -> FsckResult<u32> {
        let Some(data) = self.meta.data_block(block) else {
            self.stage = Stage::Done;
            bail!(FsckError::BadBlockAddress {
                inum: self.inum,
                block,
                indirect,
            });
        };
        if let Err(e) = bitmap.mark_used(data) {
            self.stage = Stage::Done;
            return Err(e);
        }
        self.claimed += 1;
        log::trace!("inode {}: block {block}", self.inum);
        Ok(block)
    }

    /// Loads the indirect block named by the indirect slot.
    fn enter_indirect<IO>(&mut self, io: &mut IO, bitmap: &mut BitmapIndex) -> FsckResult<bool>
    where
        IO: BlockIO + ?Sized,
    {
        let addr = self.addrs[INDIRECT_SLOT];
        if addr == 0 {
            return Ok(false);
        }
        let block = self.claim(bitmap, addr, true)?;
        let raw: Block = io.read_block(block as u64).inspect_err(|_| {
            self.stage = Stage::Done;
        })?;
        self.entries = indirect_entries(&raw);
        Ok(true)
    }

    /// One iteration step.
    pub fn next_with<IO>(
        &mut self,
        io: &mut IO,
        bitmap: &mut BitmapIndex,
    ) -> Option<FsckResult<(Slot, u32)>>
    where
        IO: BlockIO + ?Sized,
    {
        loop {
            match self.stage {
                Stage::Direct(i) if i < NDIRECT => {
                    self.stage = Stage::Direct(i + 1);
                    let addr = self.addrs[i];
                    if addr != 0 {
                        return Some(
                            self.claim(bitmap, addr, false)
                                .map(|b| (Slot::Direct(i), b)),
                        );
                    }
                }
                Stage::Direct(_) => self.stage = Stage::Indirect,
                Stage::Indirect => match self.enter_indirect(io, bitmap) {
                    Ok(true) => self.stage = Stage::Entries(0),
                    Ok(false) => self.stage = Stage::Done,
                    Err(e) => return Some(Err(e)),
                },
                Stage::Entries(i) if i < NINDIRECT => {
                    self.stage = Stage::Entries(i + 1);
                    let addr = self.entries[i];
                    if addr != 0 {
                        return Some(
                            self.claim(bitmap, addr, true)
                                .map(|b| (Slot::Indirect(i), b)),
                        );
                    }
                }
                Stage::Entries(_) => self.stage = Stage::Done,
                Stage::Done => return None,
            }
        }
    }

    /// Iterate block by block via callback.
    pub fn for_each_block<IO, F>(
        &mut self,
        io: &mut IO,
        bitmap: &mut BitmapIndex,
        mut f: F,
    ) -> FsckResult<()>
    where
        IO: BlockIO + ?Sized,
        F: FnMut(&mut IO, Slot, u32) -> FsckResult<()>,
    {
        while let Some(res) = self.next_with(io, bitmap) {
            let (slot, block) = res?;
            f(io, slot, block)?;
        }
        Ok(())
    }

    /// Creates a block-by-block iterator.
    pub fn iter<'b, IO>(
        &'b mut self,
        io: &'b mut IO,
        bitmap: &'b mut BitmapIndex,
    ) -> AddressIter<'a, 'b, IO>
    where
        IO: BlockIO + ?Sized,
    {
        AddressIter {
            cursor: self,
            io,
            bitmap,
        }
    }
}

/// Block-by-block iterator borrowing the cursor, the image and the index.
pub struct AddressIter<'a, 'b, IO: ?Sized> {
    cursor: &'b mut AddressCursor<'a>,
    io: &'b mut IO,
    bitmap: &'b mut BitmapIndex,
}

impl<IO: BlockIO + ?Sized> Iterator for AddressIter<'_, '_, IO> {
    type Item = FsckResult<(Slot, u32)>;

    fn next(&mut self) -> Option<Self::Item> {
        self.cursor.next_with(self.io, self.bitmap)
    }
}
