// SPDX-License-Identifier: MIT

use crate::core::FsFormatterResult;

/// Prepares a device and builds the in-memory structures that describe it.
pub trait FsFormatter {
    /// What a successful format hands back (group tables, descriptors...).
    type Layout;

    /// Formats the device. `full_format` also zeroes every data block.
    fn format(&mut self, full_format: bool) -> FsFormatterResult<Self::Layout>;
}
