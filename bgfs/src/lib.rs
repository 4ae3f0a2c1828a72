// SPDX-License-Identifier: MIT
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
#[macro_use]
extern crate alloc;

// Core Modules
pub mod core;
pub mod fs;

// Reusable types and traits
pub use core::traits::*;

// Filesystem APIs
#[cfg(feature = "ext")]
/// Block-group extent filesystem.
///
/// See [`ext::ExtFileTable`], [`ext::SmartFitAllocator`] and [`ext::ExtChecker`].
pub mod ext {
    pub use super::fs::ext::prelude::*;
}
