// SPDX-License-Identifier: MIT

/// Statistics collected during the inode walk.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WalkerStats {
    /// Number of inode slots examined (free ones included).
    pub inodes_scanned: usize,
    /// Number of in-use inodes checked.
    pub inodes_checked: usize,
    /// Number of directories visited.
    pub dirs_visited: usize,
    /// Number of regular files found.
    pub files_found: usize,
    /// Number of device nodes found.
    pub devices_found: usize,
    /// Data blocks referenced (direct, indirect pointer blocks and indirect entries).
    pub blocks_referenced: usize,
    /// Number of non-empty directory entries scanned.
    pub entries_scanned: usize,
}

impl WalkerStats {
    pub fn new() -> Self {
        Self::default()
    }
}
