#![cfg_attr(not(feature = "std"), no_std)]

#[macro_use]
extern crate alloc;

// Core Modules
#[macro_use]
pub mod core;

// vsfs on-disk format
pub mod constant;
pub mod meta;
pub mod types;

// Checker, formatter and injector
pub mod checker;
pub mod formatter;
pub mod injector;

// Reusable types and traits
pub use crate::core::errors::*;
pub use crate::core::traits::*;

/// Everything needed to format, populate and check a vsfs image.
///
/// See [`checker::VsfsChecker`], [`formatter::VsfsFormatter`] and [`injector::VsfsInjector`].
pub mod prelude {
    pub use super::checker::{VsfsCheckOptions, VsfsChecker};
    pub use super::constant::*;
    pub use crate::core::checker::*;
    pub use crate::core::errors::*;
    pub use super::formatter::VsfsFormatter;
    pub use super::injector::VsfsInjector;
    pub use super::meta::VsfsMeta;
    pub use super::types::*;
    pub use vsfsio::prelude::*;
}
