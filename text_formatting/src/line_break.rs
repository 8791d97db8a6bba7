// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::sync::Arc;

use line_services::BreakRecord;

use crate::{Error, TextModifierScope};

/// Continuation state from one formatted line to the next.
///
/// Pass it as the previous line break when formatting the line that follows.
/// The engine record is owned by this value; [`dispose`](Self::dispose)
/// releases it early.
#[derive(Debug)]
pub struct TextLineBreak {
    scope: Option<Arc<TextModifierScope>>,
    record: Option<BreakRecord>,
    disposed: bool,
}

impl TextLineBreak {
    pub(crate) fn new(scope: Option<Arc<TextModifierScope>>, record: BreakRecord) -> Self {
        Self {
            scope,
            record: Some(record),
            disposed: false,
        }
    }

    /// Modifier scopes still open at the break.
    pub fn text_modifier_scope(&self) -> Option<&Arc<TextModifierScope>> {
        self.scope.as_ref()
    }

    /// Character position at which the next line starts.
    pub fn text_source_character_index(&self) -> Option<usize> {
        self.record.as_ref().map(BreakRecord::cp)
    }

    /// Whether the line that produced the break ended with a hyphen.
    pub fn is_hyphenated(&self) -> bool {
        self.record.as_ref().is_some_and(BreakRecord::is_hyphenated)
    }

    /// Releases the engine record. Calling it again does nothing.
    pub fn dispose(&mut self) {
        if !self.disposed {
            self.disposed = true;
            self.record = None;
        }
    }

    /// Returns `true` once the break has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub(crate) fn record(&self) -> Result<&BreakRecord, Error> {
        self.record.as_ref().ok_or_else(Error::disposed)
    }
}

impl Clone for TextLineBreak {
    /// Duplicates the engine record; the modifier scopes are shared.
    fn clone(&self) -> Self {
        Self {
            scope: self.scope.clone(),
            record: self.record.as_ref().map(BreakRecord::duplicate),
            disposed: self.disposed,
        }
    }
}
