// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use smallvec::SmallVec;

/// Continuation state carried from one line to the next.
///
/// A record is produced for every line that does not end its paragraph.
/// Passing it to the next [`create_line`](crate::LsContext::create_line) call
/// restores the directional embeddings that were still open at the break.
#[derive(Debug, PartialEq, Eq)]
pub struct BreakRecord {
    pub(crate) cp: usize,
    pub(crate) embeddings: SmallVec<[char; 4]>,
    pub(crate) hyphenated: bool,
}

impl BreakRecord {
    /// Character position at which the next line starts.
    pub fn cp(&self) -> usize {
        self.cp
    }

    /// Whether the line that produced this record ended with a hyphen.
    pub fn is_hyphenated(&self) -> bool {
        self.hyphenated
    }

    /// Depth of directional embeddings open at the break.
    pub fn embedding_depth(&self) -> usize {
        self.embeddings.len()
    }

    /// Creates an independent copy of this record.
    pub fn duplicate(&self) -> Self {
        Self {
            cp: self.cp,
            embeddings: self.embeddings.clone(),
            hyphenated: self.hyphenated,
        }
    }
}

/// Applies a bidi control character to a stack of open embeddings.
pub(crate) fn apply_control(embeddings: &mut SmallVec<[char; 4]>, ch: char) {
    match ch {
        '\u{202A}' | '\u{202B}' | '\u{202D}' | '\u{202E}' => embeddings.push(ch),
        '\u{202C}' => {
            embeddings.pop();
        }
        _ => {}
    }
}
