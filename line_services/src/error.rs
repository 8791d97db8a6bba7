// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::collections::TryReserveError;

/// Result codes produced by the engine.
///
/// The numeric values returned by [`LsErr::code`] are stable and may be
/// reported to users as diagnostics.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum LsErr {
    /// Growing an internal buffer failed.
    OutOfMemory,
    /// A parameter passed to the engine was rejected.
    InvalidParameter,
    /// A run returned by the client was malformed.
    InvalidRun,
    /// A client callback reported failure.
    ClientAbort,
    /// The object has already been released.
    Disposed,
}

impl LsErr {
    /// The numeric result code.
    pub fn code(self) -> i32 {
        match self {
            Self::OutOfMemory => -1,
            Self::InvalidParameter => -2,
            Self::InvalidRun => -3,
            Self::ClientAbort => -100,
            Self::Disposed => -101,
        }
    }
}

impl core::fmt::Display for LsErr {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let message = match self {
            Self::OutOfMemory => "out of memory",
            Self::InvalidParameter => "invalid parameter",
            Self::InvalidRun => "malformed run",
            Self::ClientAbort => "aborted by client callback",
            Self::Disposed => "object already released",
        };
        write!(f, "{message} (code {})", self.code())
    }
}

impl core::error::Error for LsErr {}

impl From<TryReserveError> for LsErr {
    fn from(_: TryReserveError) -> Self {
        Self::OutOfMemory
    }
}

