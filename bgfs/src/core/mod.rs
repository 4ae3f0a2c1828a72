// SPDX-License-Identifier: MIT

// === Sub-modules ===
pub mod checker;
pub mod errors;
pub mod formatter;
mod macros;
pub mod utils;

// === Core Traits ===
pub mod traits {
    pub use super::checker::FsChecker;
    pub use super::formatter::FsFormatter;
    pub use super::utils::bitmap::BitmapOps;
}

// === Error types ===
pub use errors::*;

// === Utilities ===
pub use utils::bitmap::Bitmap;
