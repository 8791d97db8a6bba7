// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Optimal paragraph breaking.

use alloc::sync::Arc;
use alloc::vec::Vec;

use line_services::{BreakRestriction, IDEAL_INFINITE_WIDTH, LsBreak, ParaBreakingSession};

use crate::context::with_pooled;
use crate::convert::{real_to_ideal, width_to_ideal};
use crate::fetch::{FetchedRun, scope_at};
use crate::line::LineExtent;
use crate::{Error, TextLineBreak, TextLineMetrics, TextModifierScope, TextParagraphProperties};

/// Costs used to rank the candidate breaks of a line.
#[derive(Clone, Debug, Default)]
pub struct TextPenaltyModule {
    restriction: BreakRestriction,
    disposed: bool,
}

impl TextPenaltyModule {
    /// Creates a module with the default costs and at most eight candidates
    /// per line.
    pub fn new() -> Self {
        Self::default()
    }

    /// Limits the number of candidates returned per line.
    pub fn with_max_variants(mut self, max_variants: usize) -> Self {
        self.restriction.max_variants = max_variants;
        self
    }

    /// Sets the cost of ending a line with a hyphen.
    pub fn with_hyphen_penalty(mut self, penalty: f64) -> Self {
        self.restriction.penalties.hyphen = penalty;
        self
    }

    /// Sets the cost of a last line holding a single word.
    pub fn with_runt_penalty(mut self, penalty: f64) -> Self {
        self.restriction.penalties.runt = penalty;
        self
    }

    /// Maximum number of candidates returned per line.
    pub fn max_variants(&self) -> usize {
        self.restriction.max_variants
    }

    /// Releases the module. Calling it again does nothing.
    pub fn dispose(&mut self) {
        self.disposed = true;
    }

    /// Returns `true` once the module has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn restriction(&self) -> Result<&BreakRestriction, Error> {
        if self.disposed {
            return Err(Error::disposed());
        }
        if self.restriction.max_variants == 0 {
            return Err(Error::out_of_range("max_variants"));
        }
        Ok(&self.restriction)
    }
}

/// A candidate end for a line, produced by
/// [`TextParagraphCache::format_breakpoints`].
#[derive(Debug)]
pub struct TextBreakpoint {
    metrics: TextLineMetrics,
    penalty: f64,
    is_truncated: bool,
    has_overflowed: bool,
    is_hyphenated: bool,
    line_break: Option<TextLineBreak>,
    disposed: bool,
}

impl TextBreakpoint {
    /// Measurements of the line ending at this breakpoint.
    pub fn metrics(&self) -> &TextLineMetrics {
        &self.metrics
    }

    /// Number of character positions of the line.
    pub fn length(&self) -> usize {
        self.metrics.length
    }

    /// Width of the line without trailing whitespace.
    pub fn width(&self) -> f64 {
        self.metrics.width
    }

    /// Cost of the whole paragraph when this breakpoint is taken.
    pub fn penalty(&self) -> f64 {
        self.penalty
    }

    /// A word had to be broken between two characters.
    pub fn is_truncated(&self) -> bool {
        self.is_truncated
    }

    /// The line is wider than the requested width.
    pub fn has_overflowed(&self) -> bool {
        self.has_overflowed
    }

    /// The line ends with a hyphenation break.
    pub fn is_hyphenated(&self) -> bool {
        self.is_hyphenated
    }

    /// Continuation state for the next line; `None` at the paragraph end.
    pub fn get_text_line_break(&self) -> Option<&TextLineBreak> {
        self.line_break.as_ref()
    }

    /// Releases the breakpoint. Calling it again does nothing.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        if let Some(line_break) = &mut self.line_break {
            line_break.dispose();
        }
    }
}

/// Whole paragraph snapshot on which breakpoints are computed.
///
/// The snapshot reflects the content at creation time; edits to the text
/// source require a new cache. Call [`dispose`](Self::dispose) when done.
#[derive(Debug)]
pub struct TextParagraphCache {
    session: ParaBreakingSession,
    props: TextParagraphProperties,
    runs: Vec<FetchedRun>,
    initial_scope: Option<Arc<TextModifierScope>>,
    paragraph_width: f64,
    penalized_as_justified: bool,
    disposed: bool,
}

impl TextParagraphCache {
    pub(crate) fn new(
        session: ParaBreakingSession,
        props: TextParagraphProperties,
        runs: Vec<FetchedRun>,
        initial_scope: Option<Arc<TextModifierScope>>,
        paragraph_width: f64,
        penalized_as_justified: bool,
    ) -> Self {
        Self {
            session,
            props,
            runs,
            initial_scope,
            paragraph_width,
            penalized_as_justified,
            disposed: false,
        }
    }

    /// Width the cache was created for.
    pub fn paragraph_width(&self) -> f64 {
        self.paragraph_width
    }

    /// Whether lines are ranked as if they were justified.
    pub fn is_penalized_as_justified(&self) -> bool {
        self.penalized_as_justified
    }

    /// Ranks the candidate ends of the line starting at `first_cp`.
    ///
    /// Returns the candidates in logical order and the index of the one that
    /// minimizes the cost of the paragraph. `max_line_width` follows the
    /// usual width rules: `NaN` is invalid, `0.0` and infinity mean
    /// unconstrained, and negative or too large widths are out of range.
    pub fn format_breakpoints(
        &mut self,
        first_cp: usize,
        previous_line_break: Option<&TextLineBreak>,
        penalty_module: &TextPenaltyModule,
        max_line_width: f64,
    ) -> Result<(Vec<TextBreakpoint>, usize), Error> {
        if self.disposed {
            return Err(Error::disposed());
        }
        let restriction = penalty_module.restriction()?;
        let width = width_to_ideal(max_line_width, "max_line_width")?;
        let record = previous_line_break.map(TextLineBreak::record).transpose()?;
        let first_line = self.session.first_cp() == Some(first_cp);
        let indent = self
            .props
            .indent_for(first_line && self.props.first_line_in_paragraph);
        let (budget, paragraph_width) = if width == IDEAL_INFINITE_WIDTH {
            (width, None)
        } else {
            ((width - real_to_ideal(indent)).max(0), Some(max_line_width))
        };

        let session = &mut self.session;
        let (breaks, best_fit) = with_pooled(|context| {
            context.create_breaks(session, first_cp, record, restriction, budget)
        })?;
        let breakpoints = breaks
            .into_iter()
            .map(|candidate| self.breakpoint(candidate, paragraph_width, indent))
            .collect();
        Ok((breakpoints, best_fit))
    }

    fn breakpoint(
        &self,
        mut candidate: LsBreak,
        paragraph_width: Option<f64>,
        indent: f64,
    ) -> TextBreakpoint {
        let line_break = candidate.break_record.take().map(|record| {
            let scope = scope_at(&self.runs, self.initial_scope.as_ref(), record.cp());
            TextLineBreak::new(scope, record)
        });
        let dependent_length = if line_break.is_some() {
            candidate.trailing_whitespace_length - candidate.newline_length
        } else {
            0
        };
        let extent = LineExtent {
            length: candidate.length,
            dependent_length,
            newline_length: candidate.newline_length,
            trailing_whitespace_length: candidate.trailing_whitespace_length,
            width: candidate.width_without_trailing,
            width_with_trailing: candidate.width,
            ascent: candidate.ascent,
            descent: candidate.descent,
        };
        TextBreakpoint {
            metrics: TextLineMetrics::new(&extent, &self.props, paragraph_width, indent),
            penalty: candidate.penalty,
            is_truncated: candidate.is_truncated,
            has_overflowed: candidate.has_overflowed,
            is_hyphenated: candidate.is_hyphenated,
            line_break,
            disposed: false,
        }
    }

    /// Releases the paragraph snapshot. Calling it again does nothing.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.session.close();
        self.runs = Vec::new();
        log::trace!("paragraph cache disposed");
    }

    /// Returns `true` once the cache has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

impl Drop for TextParagraphCache {
    fn drop(&mut self) {
        if !self.disposed {
            log::warn!("paragraph cache dropped without being disposed");
            self.session.close();
        }
    }
}
