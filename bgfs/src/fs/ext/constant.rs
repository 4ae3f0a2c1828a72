// SPDX-License-Identifier: MIT

// === Block Size ===

pub const EXT_DEFAULT_BLOCK_SIZE: u32 = 4096;

// === Block Groups ===

pub const EXT_DEFAULT_GROUP_COUNT: u32 = 4;
pub const EXT_DEFAULT_INODES_PER_GROUP: u32 = 1024;
