// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::boxed::Box;

use line_services::LsErr;

/// Error reported by a client callback such as [`TextSource::get_text_run`].
///
/// [`TextSource::get_text_run`]: crate::TextSource::get_text_run
pub type ClientError = Box<dyn core::error::Error + Send + Sync>;

/// Error type for formatting operations.
///
/// Carries a non-exhaustive [`ErrorKind`] plus the name of the offending
/// parameter, the engine result code and the client error that caused the
/// failure, when any of them apply.
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    parameter: Option<&'static str>,
    code: Option<i32>,
    source: Option<ClientError>,
}

impl Error {
    /// The machine-readable category for this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Name of the rejected parameter for argument errors.
    pub fn parameter(&self) -> Option<&'static str> {
        self.parameter
    }

    /// The line services result code, when the engine reported the failure.
    pub fn code(&self) -> Option<i32> {
        self.code
    }

    pub(crate) fn invalid_argument(parameter: &'static str) -> Self {
        Self {
            kind: ErrorKind::InvalidArgument,
            parameter: Some(parameter),
            code: None,
            source: None,
        }
    }

    pub(crate) fn out_of_range(parameter: &'static str) -> Self {
        Self {
            kind: ErrorKind::ArgumentOutOfRange,
            parameter: Some(parameter),
            code: None,
            source: None,
        }
    }

    pub(crate) fn disposed() -> Self {
        Self {
            kind: ErrorKind::Disposed,
            parameter: None,
            code: None,
            source: None,
        }
    }

    pub(crate) fn in_use() -> Self {
        Self {
            kind: ErrorKind::FormatterInUse,
            parameter: None,
            code: None,
            source: None,
        }
    }

    /// Translates an engine result code.
    ///
    /// A pending client error takes precedence over the code it caused.
    pub(crate) fn from_ls(err: LsErr, pending: Option<ClientError>) -> Self {
        let kind = match (err, &pending) {
            (_, Some(_)) => ErrorKind::ClientCallback,
            (LsErr::OutOfMemory, None) => ErrorKind::OutOfMemory,
            (LsErr::Disposed, None) => ErrorKind::Disposed,
            _ => ErrorKind::LineServices,
        };
        Self {
            kind,
            parameter: None,
            code: Some(err.code()),
            source: pending,
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self.kind {
            ErrorKind::InvalidArgument => {
                write!(f, "invalid argument `{}`", self.parameter.unwrap_or("?"))
            }
            ErrorKind::ArgumentOutOfRange => write!(
                f,
                "argument `{}` is out of range",
                self.parameter.unwrap_or("?")
            ),
            ErrorKind::LineServices => write!(
                f,
                "line formatting failed with code {}",
                self.code.unwrap_or_default()
            ),
            ErrorKind::OutOfMemory => f.write_str("out of memory while formatting"),
            ErrorKind::ClientCallback => match &self.source {
                Some(source) => write!(
                    f,
                    "text source callback failed (code {}): {source}",
                    self.code.unwrap_or_default()
                ),
                None => f.write_str("text source callback failed"),
            },
            ErrorKind::Disposed => f.write_str("object has been disposed"),
            ErrorKind::FormatterInUse => f.write_str("formatter is already in use"),
        }
    }
}

impl core::error::Error for Error {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|source| source as &(dyn core::error::Error + 'static))
    }
}

/// The non-exhaustive category of an error.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A required argument was missing or not a number.
    InvalidArgument,

    /// An argument was outside of its valid range.
    ArgumentOutOfRange,

    /// The line services engine reported a failure.
    LineServices,

    /// The engine ran out of memory.
    OutOfMemory,

    /// A client callback failed; the client error is available through
    /// [`source`](core::error::Error::source).
    ClientCallback,

    /// The object was used after being disposed.
    Disposed,

    /// An exclusive formatter was used while already formatting.
    FormatterInUse,
}
