// SPDX-License-Identifier: MIT

#[cfg(feature = "ext")]
pub mod ext;
