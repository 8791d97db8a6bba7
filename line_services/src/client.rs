// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec::Vec;

use crate::{Ideal, LsRun};

/// Marker returned by a client callback that failed.
///
/// The engine does not carry the cause; the client keeps it and reports it
/// once the engine call has returned [`LsErr::ClientAbort`](crate::LsErr::ClientAbort).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ClientAbort;

/// Callbacks through which the engine pulls content from its client.
pub trait LsClient {
    /// Returns the run starting at `cp`.
    ///
    /// `remaining_width` is the room left on the line being built, which
    /// width-constrained objects may use to size themselves.
    fn fetch_run(&mut self, cp: usize, remaining_width: Ideal) -> Result<LsRun, ClientAbort>;

    /// Returns a few characters immediately preceding `cp`.
    ///
    /// They are used as context for the break opportunity at the start of a
    /// line and never become part of it.
    fn preceding_text(&mut self, cp: usize) -> Result<Vec<char>, ClientAbort> {
        let _ = cp;
        Ok(Vec::new())
    }

    /// Returns hyphenation opportunities within `word`, which starts at `cp`.
    ///
    /// Each opportunity is an offset `k` in `1..word.len()`: a hyphen may be
    /// inserted between `word[k - 1]` and `word[k]`.
    fn hyphenate(&mut self, cp: usize, word: &[char]) -> Result<Vec<usize>, ClientAbort> {
        let _ = (cp, word);
        Ok(Vec::new())
    }
}
