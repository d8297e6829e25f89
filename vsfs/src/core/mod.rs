// === Sub-modules ===
#[macro_use]
pub mod macros;
pub mod checker;
pub mod errors;
pub mod utils;

// === Core Traits ===
pub mod traits {
    pub use super::checker::{FsChecker, VerifierOptionsLike};
}

// === Error types ===
pub use errors::*;
