// SPDX-License-Identifier: MIT

//! Post-walk agreement checks between the bitmap, the inode table and the
//! directory graph.

use crate::checker::{BitmapIndex, DirectoryGraph};
use crate::core::{FsckError, FsckResult};

/// Runs the three reconciliation passes in order.
pub fn reconcile(bitmap: &BitmapIndex, graph: &DirectoryGraph) -> FsckResult<()> {
    bitmap.reconcile()?;
    check_links(graph)?;
    check_usage(graph)
}

/// Directories: one name, one link, `..` pointing back at the holder.
/// Other in-use inodes: as many names as links.
pub fn check_links(graph: &DirectoryGraph) -> FsckResult<()> {
    for (inum, l) in graph.iter() {
        if l.is_dir {
            ensure!(
                l.refs <= 1 && l.nlink <= 1,
                FsckError::DuplicateDirectoryLink {
                    inum,
                    refs: l.refs.max(l.nlink),
                }
            );
            if l.refs > 0 {
                ensure!(
                    l.declared_parent == l.observed_parent,
                    FsckError::ParentMismatch {
                        inum,
                        declared: l.declared_parent.unwrap_or(0),
                        observed: l.observed_parent.unwrap_or(0),
                    }
                );
            }
        } else if l.in_use {
            ensure!(
                l.refs == l.nlink,
                FsckError::LinkCountMismatch {
                    inum,
                    refs: l.refs,
                    nlink: l.nlink,
                }
            );
        }
    }
    Ok(())
}

/// Named inodes must be in use, in-use inodes must be named.
pub fn check_usage(graph: &DirectoryGraph) -> FsckResult<()> {
    for (inum, l) in graph.iter() {
        ensure!(
            !(l.refs > 0 && !l.in_use),
            FsckError::ReferencedButMarkedFree { inum }
        );
        ensure!(
            !(l.refs == 0 && l.in_use),
            FsckError::MarkedUseButUnreferenced { inum }
        );
    }
    Ok(())
}
