// SPDX-License-Identifier: MIT

use core::fmt;

pub use bgio::errors::*;

/// Failure of an allocation strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsAllocatorError {
    /// The groups ran out after `granted` of `requested` blocks. The partial
    /// grant has already been handed back to the caller.
    DiskFull { requested: u32, granted: u32 },
    Other(&'static str),
}

impl FsAllocatorError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsAllocatorError::DiskFull { .. } => "Disk full",
            FsAllocatorError::Other(msg) => msg,
        }
    }
}

impl fmt::Display for FsAllocatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FsAllocatorError::DiskFull { requested, granted } => {
                write!(f, "Disk full: {granted} of {requested} blocks available")
            }
            FsAllocatorError::Other(msg) => f.write_str(msg),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsFormatterError {
    IO(BgIOError),
    /// Geometry parameters rejected before touching the device.
    Invalid(&'static str),
    /// The backend holds fewer bytes than the geometry covers.
    DeviceTooSmall { needed: u64, capacity: u64 },
    Other(&'static str),
}

impl FsFormatterError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsFormatterError::IO(_) => "IO error",
            FsFormatterError::Invalid(msg) | FsFormatterError::Other(msg) => msg,
            FsFormatterError::DeviceTooSmall { .. } => "Device smaller than the group layout",
        }
    }

    pub fn source(&self) -> Option<FsError> {
        match self {
            FsFormatterError::IO(e) => Some(FsError::IO(*e)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsTableError {
    IO(BgIOError),
    Allocator(FsAllocatorError),
    /// Every inode slot of every group is taken.
    NoInodes,
    AlreadyExists,
    InvalidName,
    Other(&'static str),
}

impl FsTableError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsTableError::IO(_) => "Block store error",
            FsTableError::Allocator(_) => "Block allocation failed",
            FsTableError::NoInodes => "No free inode slot",
            FsTableError::AlreadyExists => "A file with this name already exists",
            FsTableError::InvalidName => "File names must not be empty",
            FsTableError::Other(msg) => msg,
        }
    }

    pub fn source(&self) -> Option<FsError> {
        match self {
            FsTableError::IO(e) => Some(FsError::IO(*e)),
            FsTableError::Allocator(e) => Some(FsError::Allocator(*e)),
            _ => None,
        }
    }

    #[inline]
    pub fn is_disk_full(&self) -> bool {
        matches!(self, FsTableError::Allocator(FsAllocatorError::DiskFull { .. }))
    }

    /// Out of blocks or out of inode slots: the device state is unchanged
    /// and the request may succeed after a delete.
    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.is_disk_full() || *self == FsTableError::NoInodes
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsCheckerError {
    IO(BgIOError),
    Other(&'static str),
}

impl FsCheckerError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsCheckerError::IO(_) => "IO error",
            FsCheckerError::Other(msg) => msg,
        }
    }

    pub fn source(&self) -> Option<FsError> {
        match self {
            FsCheckerError::IO(e) => Some(FsError::IO(*e)),
            FsCheckerError::Other(_) => None,
        }
    }
}

/// Top-level error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    IO(BgIOError),
    Allocator(FsAllocatorError),
    Formatter(FsFormatterError),
    Table(FsTableError),
    Checker(FsCheckerError),
    Other(&'static str),
}

impl FsError {
    pub fn msg(&self) -> &'static str {
        match self {
            FsError::IO(e) => e.msg(),
            FsError::Allocator(e) => e.msg(),
            FsError::Formatter(e) => e.msg(),
            FsError::Table(e) => e.msg(),
            FsError::Checker(e) => e.msg(),
            FsError::Other(msg) => msg,
        }
    }

    pub fn source(&self) -> Option<FsError> {
        match self {
            FsError::Formatter(e) => e.source(),
            FsError::Table(e) => e.source(),
            FsError::Checker(e) => e.source(),
            FsError::IO(_) | FsError::Allocator(_) | FsError::Other(_) => None,
        }
    }
}

pub type FsResult<T = ()> = Result<T, FsError>;

pub type FsAllocatorResult<T = ()> = Result<T, FsAllocatorError>;
pub type FsFormatterResult<T = ()> = Result<T, FsFormatterError>;
pub type FsTableResult<T = ()> = Result<T, FsTableError>;
pub type FsCheckerResult<T = ()> = Result<T, FsCheckerError>;

crate::fs_error_display!(FsFormatterError, FsTableError, FsCheckerError, FsError);

crate::fs_error_wiring! {
    top => FsError {
        BgIOError        : IO,
        FsAllocatorError : Allocator,
        FsFormatterError : Formatter,
        FsTableError     : Table,
        FsCheckerError   : Checker,
    },
    str_into => [
        FsAllocatorError,
        FsFormatterError,
        FsTableError,
        FsCheckerError,
    ],
    sub => {
        BgIOError        => [ FsFormatterError::IO, FsTableError::IO, FsCheckerError::IO ],
        FsAllocatorError => [ FsTableError::Allocator ],
    },
}
