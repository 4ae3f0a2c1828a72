// SPDX-License-Identifier: MIT

use core::fmt;

pub type BgIOResult<T = ()> = core::result::Result<T, BgIOError>;

/// Device-level failure. `OutOfBounds` covers both byte offsets past a
/// fixed-size device and block indices past a block store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BgIOError {
    Other(&'static str),
    Invalid(&'static str),
    OutOfBounds,
    Unsupported,
}

impl BgIOError {
    pub fn msg(&self) -> &'static str {
        match self {
            BgIOError::Other(msg) => msg,
            BgIOError::Invalid(msg) => msg,
            BgIOError::OutOfBounds => "Access outside the device",
            BgIOError::Unsupported => "Unsupported operation",
        }
    }
}

impl From<&'static str> for BgIOError {
    #[inline]
    fn from(msg: &'static str) -> Self {
        BgIOError::Other(msg)
    }
}

impl fmt::Display for BgIOError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.msg())
    }
}
