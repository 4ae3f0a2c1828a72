// SPDX-License-Identifier: MIT
pub mod allocator;
pub mod checker;
pub mod constant;
pub mod extent;
pub mod formatter;
pub mod group;
pub mod group_layout;
pub mod inode;
pub mod meta;
pub mod report;
pub mod table;

// Public Interface
pub mod traits {
    pub use super::allocator::{
        ExtentAllocator, ShortGrant, SmartFitAllocator, WorstFitAllocator,
    };
    pub use super::checker::{ExtCheckOptions, ExtChecker};
    pub use super::extent::Extent;
    pub use super::formatter::ExtFormatter;
    pub use super::group::BlockGroup;
    pub use super::group_layout::GroupLayout;
    pub use super::inode::{Inode, InodeId};
    pub use super::meta::ExtMeta;
    pub use super::report::{GroupUsage, UsageReport};
    pub use super::table::ExtFileTable;
}

pub mod prelude {
    pub use super::traits::*;
    pub use crate::core::Bitmap;
    pub use crate::core::checker::{
        Finding, ReportDisplayOpts, Severity, VerifyOptions, VerifyPhases, VerifyReport,
    };
    pub use crate::core::errors::*;
    pub use crate::core::traits::*;
    pub use bgio::prelude::*;
}
