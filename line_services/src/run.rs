// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec::Vec;

use crate::{Ideal, LsErr, LsResult};

/// Whether a line may end next to an embedded object.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum LsBreakCondition {
    /// A break is allowed if the surrounding text allows one.
    #[default]
    Possible,
    /// A break is not allowed.
    Restrained,
    /// A break is mandatory.
    Always,
}

/// Content of a run handed to the engine.
#[derive(Clone, Debug, PartialEq)]
pub enum LsRunKind {
    /// Shaped characters, one advance per character.
    Text {
        /// The characters of the run.
        chars: Vec<char>,
        /// Advance of every character.
        advances: Vec<Ideal>,
        /// Distance from the baseline to the top of the run.
        ascent: Ideal,
        /// Distance from the baseline to the bottom of the run.
        descent: Ideal,
        /// Whether the run contains any of the engine's special characters.
        ///
        /// Runs without special characters skip tab and soft hyphen handling.
        has_special: bool,
    },
    /// An atomic inline object.
    Object {
        /// Advance of the object.
        width: Ideal,
        /// Extent above the baseline.
        ascent: Ideal,
        /// Extent below the baseline.
        descent: Ideal,
        /// Break condition before the object.
        break_before: LsBreakCondition,
        /// Break condition after the object.
        break_after: LsBreakCondition,
    },
    /// Zero width content that takes part in analysis only through its
    /// optional bidi control character.
    Hidden {
        /// LRE, RLE or PDF when the run opens or closes a directional embedding.
        control: Option<char>,
    },
    /// Explicit end of line.
    EndOfLine,
    /// End of the paragraph.
    EndOfParagraph,
}

/// A run of content returned by [`LsClient::fetch_run`](crate::LsClient::fetch_run).
#[derive(Clone, Debug, PartialEq)]
pub struct LsRun {
    /// Number of character positions consumed by the run.
    pub len: usize,
    /// Opaque client cookie, echoed back in line spans.
    pub tag: usize,
    /// The content.
    pub kind: LsRunKind,
}

impl LsRun {
    /// Returns `true` if the run ends the line.
    pub fn is_terminator(&self) -> bool {
        matches!(self.kind, LsRunKind::EndOfLine | LsRunKind::EndOfParagraph)
    }

    pub(crate) fn validate(&self) -> LsResult<()> {
        match &self.kind {
            LsRunKind::Text {
                chars,
                advances,
                ascent,
                descent,
                ..
            } => {
                if self.len == 0 || chars.len() != self.len || advances.len() != self.len {
                    return Err(LsErr::InvalidRun);
                }
                if *ascent < 0 || *descent < 0 || advances.iter().any(|advance| *advance < 0) {
                    return Err(LsErr::InvalidRun);
                }
            }
            LsRunKind::Object {
                width,
                ascent,
                descent,
                ..
            } => {
                if self.len == 0 || *width < 0 || *ascent < 0 || *descent < 0 {
                    return Err(LsErr::InvalidRun);
                }
            }
            LsRunKind::Hidden { control } => {
                if self.len == 0 {
                    return Err(LsErr::InvalidRun);
                }
                if let Some(control) = control {
                    if !matches!(control, '\u{202A}'..='\u{202E}') {
                        return Err(LsErr::InvalidRun);
                    }
                }
            }
            // An explicit line end must consume input, otherwise the next line
            // would start on the same terminator again.
            LsRunKind::EndOfLine => {
                if self.len == 0 {
                    return Err(LsErr::InvalidRun);
                }
            }
            // An empty paragraph is one empty line.
            LsRunKind::EndOfParagraph => {}
        }
        Ok(())
    }
}
