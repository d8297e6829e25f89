// SPDX-License-Identifier: MIT

use core::fmt;

pub use vsfsio::errors::*;

/// First inconsistency (or I/O failure) found while checking an image.
///
/// Every variant is fatal: the checker stops at the first one it detects.
/// `msg()` gives the fixed diagnostic for the kind, `Display` appends the
/// inode/block numbers involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsckError {
    IO(BlockIOError),
    /// Superblock or layout cannot describe a valid image.
    Format(&'static str),
    InvalidInodeType {
        inum: u32,
        raw: i16,
    },
    BadBlockAddress {
        inum: u32,
        block: u32,
        indirect: bool,
    },
    DoubleAllocation {
        block: u32,
        uses: u32,
    },
    UnmarkedInUse {
        block: u32,
    },
    AllocatedButUnused {
        block: u32,
    },
    MalformedDirectory {
        inum: u32,
        reason: &'static str,
    },
    MissingRoot,
    ParentMismatch {
        inum: u32,
        declared: u32,
        observed: u32,
    },
    DuplicateDirectoryLink {
        inum: u32,
        refs: u32,
    },
    LinkCountMismatch {
        inum: u32,
        refs: u32,
        nlink: u32,
    },
    ReferencedButMarkedFree {
        inum: u32,
    },
    MarkedUseButUnreferenced {
        inum: u32,
    },
}

impl FsckError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsckError::IO(_) => "IO error",
            FsckError::Format(msg) => msg,
            FsckError::InvalidInodeType { .. } => "bad inode type",
            FsckError::BadBlockAddress {
                indirect: false, ..
            } => "bad direct address in inode",
            FsckError::BadBlockAddress { indirect: true, .. } => {
                "bad indirect address in inode"
            }
            FsckError::DoubleAllocation { .. } => "address used more than once",
            FsckError::UnmarkedInUse { .. } => "address used by inode but marked free in bitmap",
            FsckError::AllocatedButUnused { .. } => {
                "bitmap marks block in use but it is not in use"
            }
            FsckError::MalformedDirectory { .. } => "directory not properly formatted",
            FsckError::MissingRoot => "root directory does not exist",
            FsckError::ParentMismatch { .. } => "parent directory mismatch",
            FsckError::DuplicateDirectoryLink { .. } => {
                "directory appears more than once in file system"
            }
            FsckError::LinkCountMismatch { .. } => "bad reference count for file",
            FsckError::ReferencedButMarkedFree { .. } => {
                "inode referred to in directory but marked free"
            }
            FsckError::MarkedUseButUnreferenced { .. } => {
                "inode marked use but not found in a directory"
            }
        }
    }

    /// Stable name of the violated invariant.
    pub fn kind(&self) -> &'static str {
        match self {
            FsckError::IO(_) => "IOError",
            FsckError::Format(_) => "FormatError",
            FsckError::InvalidInodeType { .. } => "InvalidInodeType",
            FsckError::BadBlockAddress { .. } => "BadBlockAddress",
            FsckError::DoubleAllocation { .. } => "DoubleAllocation",
            FsckError::UnmarkedInUse { .. } => "UnmarkedInUse",
            FsckError::AllocatedButUnused { .. } => "AllocatedButUnused",
            FsckError::MalformedDirectory { .. } => "MalformedDirectory",
            FsckError::MissingRoot => "MissingRoot",
            FsckError::ParentMismatch { .. } => "ParentMismatch",
            FsckError::DuplicateDirectoryLink { .. } => "DuplicateDirectoryLink",
            FsckError::LinkCountMismatch { .. } => "LinkCountMismatch",
            FsckError::ReferencedButMarkedFree { .. } => "ReferencedButMarkedFree",
            FsckError::MarkedUseButUnreferenced { .. } => "MarkedUseButUnreferenced",
        }
    }

    pub fn source(&self) -> Option<BlockIOError> {
        match self {
            FsckError::IO(e) => Some(*e),
            _ => None,
        }
    }
}

impl fmt::Display for FsckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg())?;
        match *self {
            FsckError::IO(e) => write!(f, ": {e}")?,
            FsckError::InvalidInodeType { inum, raw } => {
                write!(f, " (inode: {inum}, type: {raw})")?
            }
            FsckError::BadBlockAddress { inum, block, .. } => {
                write!(f, " (inode: {inum}, block: {block})")?
            }
            FsckError::DoubleAllocation { block, uses } => {
                write!(f, " (block: {block}, uses: {uses})")?
            }
            FsckError::UnmarkedInUse { block } | FsckError::AllocatedButUnused { block } => {
                write!(f, " (block: {block})")?
            }
            FsckError::MalformedDirectory { inum, reason } => {
                write!(f, " (inode: {inum}: {reason})")?
            }
            FsckError::ParentMismatch {
                inum,
                declared,
                observed,
            } => write!(
                f,
                " (inode: {inum}, '..' names {declared}, linked from {observed})"
            )?,
            FsckError::DuplicateDirectoryLink { inum, refs } => {
                write!(f, " (inode: {inum}, references: {refs})")?
            }
            FsckError::LinkCountMismatch { inum, refs, nlink } => {
                write!(f, " (inode: {inum}, references: {refs}, nlink: {nlink})")?
            }
            FsckError::ReferencedButMarkedFree { inum }
            | FsckError::MarkedUseButUnreferenced { inum } => write!(f, " (inode: {inum})")?,
            FsckError::Format(_) | FsckError::MissingRoot => {}
        }
        Ok(())
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FsckError {}

// === impl From ===

impl From<BlockIOError> for FsckError {
    #[inline]
    fn from(e: BlockIOError) -> Self {
        FsckError::IO(e)
    }
}

impl From<&'static str> for FsckError {
    #[inline]
    fn from(msg: &'static str) -> Self {
        FsckError::Format(msg)
    }
}

// === type Fsck*Result ===

pub type FsckResult<T = ()> = Result<T, FsckError>;

/// Failure while writing a fresh image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsFormatterError {
    IO(BlockIOError),
    Invalid(&'static str),
}

impl FsFormatterError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsFormatterError::IO(_) => "IO error",
            FsFormatterError::Invalid(msg) => msg,
        }
    }
}

impl fmt::Display for FsFormatterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FsFormatterError::IO(e) => write!(f, "{}: {e}", self.msg()),
            _ => write!(f, "{}", self.msg()),
        }
    }
}

/// Failure while adding objects to a formatted image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsInjectorError {
    IO(BlockIOError),
    OutOfBlocks,
    OutOfInodes,
    NotADirectory(u32),
    FileTooLarge,
    Invalid(&'static str),
}

impl FsInjectorError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsInjectorError::IO(_) => "IO error",
            FsInjectorError::OutOfBlocks => "No free data block",
            FsInjectorError::OutOfInodes => "No free inode",
            FsInjectorError::NotADirectory(_) => "Not a directory",
            FsInjectorError::FileTooLarge => "File exceeds direct and indirect capacity",
            FsInjectorError::Invalid(msg) => msg,
        }
    }
}

impl fmt::Display for FsInjectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FsInjectorError::IO(e) => write!(f, "{}: {e}", self.msg()),
            FsInjectorError::NotADirectory(inum) => write!(f, "{} (inode: {inum})", self.msg()),
            _ => write!(f, "{}", self.msg()),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FsFormatterError {}

#[cfg(feature = "std")]
impl std::error::Error for FsInjectorError {}

impl From<BlockIOError> for FsFormatterError {
    #[inline]
    fn from(e: BlockIOError) -> Self {
        FsFormatterError::IO(e)
    }
}

impl From<&'static str> for FsFormatterError {
    #[inline]
    fn from(msg: &'static str) -> Self {
        FsFormatterError::Invalid(msg)
    }
}

impl From<BlockIOError> for FsInjectorError {
    #[inline]
    fn from(e: BlockIOError) -> Self {
        FsInjectorError::IO(e)
    }
}

impl From<&'static str> for FsInjectorError {
    #[inline]
    fn from(msg: &'static str) -> Self {
        FsInjectorError::Invalid(msg)
    }
}

pub type FsFormatterResult<T = ()> = Result<T, FsFormatterError>;
pub type FsInjectorResult<T = ()> = Result<T, FsInjectorError>;
