// SPDX-License-Identifier: MIT

use core::fmt;

/// Result type for BlockIO operations.
pub type BlockIOResult<T = ()> = core::result::Result<T, BlockIOError>;

/// Error type for BlockIO operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockIOError {
    /// Access past the end of the backing store (`offset`, `len` of the request).
    OutOfBounds { offset: u64, len: usize },
    /// Offset arithmetic overflowed `u64`.
    Overflow,
    Other(&'static str),
}

impl BlockIOError {
    pub fn msg(&self) -> &'static str {
        match self {
            BlockIOError::OutOfBounds { .. } => "Read past end of image",
            BlockIOError::Overflow => "Offset overflow",
            BlockIOError::Other(msg) => msg,
        }
    }
}

impl From<&'static str> for BlockIOError {
    #[inline]
    fn from(msg: &'static str) -> Self {
        BlockIOError::Other(msg)
    }
}

impl fmt::Display for BlockIOError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.msg())?;
        if let BlockIOError::OutOfBounds { offset, len } = self {
            write!(f, " (offset: {offset:#x}, len: {len})")?;
        }
        Ok(())
    }
}
