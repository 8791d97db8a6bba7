// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Content fetched from the client, one unit per character position.

use alloc::vec::Vec;

use smallvec::SmallVec;

use crate::break_record::apply_control;
use crate::config::{LsDoc, LsTabAlignment, LsTabs};
use crate::line::BreakKind;
use crate::run::{LsBreakCondition, LsRunKind};
use crate::{BreakRecord, Ideal, LsClient, LsErr, LsResult};

pub(crate) const OBJECT_REPLACEMENT: char = '\u{FFFC}';
pub(crate) const LINE_SEPARATOR: char = '\u{2028}';
pub(crate) const PARAGRAPH_SEPARATOR: char = '\u{2029}';
pub(crate) const SOFT_HYPHEN: char = '\u{00AD}';

/// Returns `true` for characters that terminate a line when present in text.
pub(crate) fn is_newline(ch: char) -> bool {
    matches!(
        ch,
        '\n' | '\r' | '\u{0B}' | '\u{0C}' | '\u{85}' | LINE_SEPARATOR | PARAGRAPH_SEPARATOR
    )
}

/// Returns `true` for whitespace that may hang past the end of a line.
///
/// No-break spaces are excluded so that they keep their width at line end.
pub(crate) fn is_collapsible_space(ch: char) -> bool {
    ch.is_whitespace() && !matches!(ch, '\u{A0}' | '\u{2007}' | '\u{202F}')
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum UnitKind {
    Text,
    Object,
    /// Trailing positions of a multi position object.
    Filler,
    Hidden,
    Terminator,
}

/// One character position.
#[derive(Clone, Debug)]
pub(crate) struct Unit {
    pub(crate) cp: usize,
    /// Character seen by the analysis, if any.
    pub(crate) ch: Option<char>,
    pub(crate) advance: Ideal,
    pub(crate) run: usize,
    pub(crate) kind: UnitKind,
    pub(crate) break_before: BreakKind,
    pub(crate) cluster_start: bool,
    pub(crate) level: u8,
}

impl Unit {
    /// Whether the unit belongs to the whitespace that may hang at line end.
    pub(crate) fn is_trailing(&self) -> bool {
        match self.kind {
            UnitKind::Text => self.ch.is_some_and(is_collapsible_space),
            UnitKind::Hidden | UnitKind::Terminator => true,
            UnitKind::Object | UnitKind::Filler => false,
        }
    }

    pub(crate) fn is_newline(&self) -> bool {
        self.kind == UnitKind::Terminator || self.ch.is_some_and(is_newline)
    }
}

#[derive(Clone, Debug)]
pub(crate) struct RunInfo {
    pub(crate) cp: usize,
    pub(crate) len: usize,
    pub(crate) tag: usize,
    pub(crate) ascent: Ideal,
    pub(crate) descent: Ideal,
    pub(crate) break_before: LsBreakCondition,
    pub(crate) break_after: LsBreakCondition,
    pub(crate) is_object: bool,
}

/// Where fetching stops.
#[derive(Copy, Clone, Debug)]
pub(crate) enum FetchLimit {
    /// Until the content is wider than the given width.
    Width(Ideal),
    /// Until the given character position is covered.
    Cp(usize),
    /// Until the end of the paragraph.
    Paragraph,
}

/// Widths of a prospective line.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Measure {
    pub(crate) width: Ideal,
    pub(crate) width_without_trailing: Ideal,
    /// First unit of the trailing whitespace.
    pub(crate) trailing_start: usize,
}

/// Settings that influence advances during layout.
#[derive(Copy, Clone, Debug)]
pub(crate) struct LayoutConfig<'a> {
    pub(crate) tabs: &'a LsTabs,
    pub(crate) doc: &'a LsDoc,
}

#[derive(Debug)]
pub(crate) struct LsText {
    pub(crate) first_cp: usize,
    pub(crate) units: Vec<Unit>,
    pub(crate) runs: Vec<RunInfo>,
    /// `Some(true)` for an end of paragraph, `Some(false)` for an end of line.
    pub(crate) terminator: Option<bool>,
    /// Break opportunity after the last unit.
    pub(crate) end_break: BreakKind,
    /// Characters preceding the first unit, for analysis only.
    pub(crate) context: Vec<char>,
    /// Directional embeddings open before the first unit.
    pub(crate) embeddings: SmallVec<[char; 4]>,
    pub(crate) has_tabs: bool,
    pub(crate) has_soft_hyphens: bool,
    prefix: Vec<Ideal>,
}

impl LsText {
    /// Pulls runs from the client starting at `first_cp`.
    pub(crate) fn fetch(
        client: &mut dyn LsClient,
        first_cp: usize,
        prev: Option<&BreakRecord>,
        limit: FetchLimit,
        config: LayoutConfig<'_>,
    ) -> LsResult<Self> {
        let context = client
            .preceding_text(first_cp)
            .map_err(|_| LsErr::ClientAbort)?;
        let mut text = Self {
            first_cp,
            units: Vec::new(),
            runs: Vec::new(),
            terminator: None,
            end_break: BreakKind::None,
            context,
            embeddings: prev.map(|record| record.embeddings.clone()).unwrap_or_default(),
            has_tabs: false,
            has_soft_hyphens: false,
            prefix: Vec::new(),
        };
        let mut cp = first_cp;
        let mut x: Ideal = 0;
        let mut lookahead = false;
        while text.terminator.is_none() {
            let remaining = match limit {
                FetchLimit::Width(max) => max.saturating_sub(x).max(0),
                _ => crate::IDEAL_INFINITE_WIDTH,
            };
            let run = client
                .fetch_run(cp, remaining)
                .map_err(|_| LsErr::ClientAbort)?;
            run.validate()?;
            let has_char = !matches!(run.kind, LsRunKind::Hidden { control: None });
            cp += run.len;
            x = text.push_run(run, x, config)?;
            if lookahead && has_char {
                break;
            }
            lookahead = lookahead
                || match limit {
                    FetchLimit::Width(max) => x > max,
                    FetchLimit::Cp(end) => cp >= end,
                    FetchLimit::Paragraph => false,
                };
        }
        if text.terminator.is_some() {
            text.end_break = BreakKind::Mandatory;
        }
        text.prefix.try_reserve(text.units.len() + 1)?;
        text.prefix.push(0);
        let mut sum: Ideal = 0;
        for (index, unit) in text.units.iter().enumerate() {
            // Soft hyphens only take space at the end of a line.
            if unit.ch != Some(SOFT_HYPHEN) {
                sum = sum.saturating_add(unit.advance);
            }
            debug_assert_eq!(text.prefix.len(), index + 1, "prefix sums out of step");
            text.prefix.push(sum);
        }
        Ok(text)
    }

    fn push_run(
        &mut self,
        run: crate::LsRun,
        mut x: Ideal,
        config: LayoutConfig<'_>,
    ) -> LsResult<Ideal> {
        let run_index = self.runs.len();
        let paragraph = matches!(run.kind, LsRunKind::EndOfParagraph);
        let cp = self.units.last().map_or(self.first_cp, |unit| unit.cp + 1);
        self.units.try_reserve(run.len)?;
        self.runs.try_reserve(1)?;
        let mut info = RunInfo {
            cp,
            len: run.len,
            tag: run.tag,
            ascent: 0,
            descent: 0,
            break_before: LsBreakCondition::Possible,
            break_after: LsBreakCondition::Possible,
            is_object: false,
        };
        let unit = |offset: usize, ch: Option<char>, advance: Ideal, kind: UnitKind| Unit {
            cp: cp + offset,
            ch,
            advance,
            run: run_index,
            kind,
            break_before: BreakKind::None,
            cluster_start: false,
            level: 0,
        };
        match run.kind {
            LsRunKind::Text {
                chars,
                advances,
                ascent,
                descent,
                has_special,
            } => {
                info.ascent = ascent;
                info.descent = descent;
                for (offset, (ch, advance)) in chars.into_iter().zip(advances).enumerate() {
                    if has_special && ch == '\t' {
                        self.has_tabs = true;
                        x = config.doc.snap(config.tabs.next_stop(x).position);
                    } else {
                        if has_special && ch == SOFT_HYPHEN {
                            self.has_soft_hyphens = true;
                        }
                        x = x.saturating_add(advance);
                    }
                    self.units.push(unit(offset, Some(ch), advance, UnitKind::Text));
                }
            }
            LsRunKind::Object {
                width,
                ascent,
                descent,
                break_before,
                break_after,
            } => {
                info.ascent = ascent;
                info.descent = descent;
                info.break_before = break_before;
                info.break_after = break_after;
                info.is_object = true;
                x = x.saturating_add(width);
                self.units
                    .push(unit(0, Some(OBJECT_REPLACEMENT), width, UnitKind::Object));
                for offset in 1..run.len {
                    self.units.push(unit(offset, None, 0, UnitKind::Filler));
                }
            }
            LsRunKind::Hidden { control } => {
                self.units.push(unit(0, control, 0, UnitKind::Hidden));
                for offset in 1..run.len {
                    self.units.push(unit(offset, None, 0, UnitKind::Hidden));
                }
            }
            LsRunKind::EndOfLine | LsRunKind::EndOfParagraph => {
                let ch = if paragraph {
                    PARAGRAPH_SEPARATOR
                } else {
                    LINE_SEPARATOR
                };
                for offset in 0..run.len {
                    let ch = (offset == 0).then_some(ch);
                    self.units.push(unit(offset, ch, 0, UnitKind::Terminator));
                }
                self.terminator = Some(paragraph);
            }
        }
        self.runs.push(info);
        Ok(x)
    }

    /// Character position just past the fetched content.
    pub(crate) fn end_cp(&self) -> usize {
        self.units.last().map_or(self.first_cp, |unit| unit.cp + 1)
    }

    /// Character position of the unit at `index`, or the end position.
    pub(crate) fn cp_at(&self, index: usize) -> usize {
        self.units.get(index).map_or(self.end_cp(), |unit| unit.cp)
    }

    /// Index of the unit at `cp`.
    pub(crate) fn index_of_cp(&self, cp: usize) -> Option<usize> {
        let index = cp.checked_sub(self.first_cp)?;
        (index <= self.units.len()).then_some(index)
    }

    /// Break opportunity before the unit at `index`.
    pub(crate) fn break_at(&self, index: usize) -> BreakKind {
        if index == 0 {
            BreakKind::None
        } else if index >= self.units.len() {
            self.end_break
        } else {
            self.units[index].break_before
        }
    }

    fn trailing_start(&self, start: usize, end: usize) -> usize {
        let mut trailing = end;
        while trailing > start && self.units[trailing - 1].is_trailing() {
            trailing -= 1;
        }
        trailing
    }

    /// Width of a line covering `start..end`, with `hyphen` added when the line
    /// ends on an inserted hyphen.
    pub(crate) fn measure(
        &self,
        start: usize,
        end: usize,
        hyphen: Ideal,
        config: LayoutConfig<'_>,
    ) -> Measure {
        let trailing_start = self.trailing_start(start, end);
        if self.has_tabs {
            let advances = self.layout(start, end, config);
            let sum = |range: core::ops::Range<usize>| {
                advances[range]
                    .iter()
                    .fold(0, |sum: Ideal, advance| sum.saturating_add(*advance))
            };
            let width_without_trailing = sum(0..trailing_start - start).saturating_add(hyphen);
            return Measure {
                width: sum(0..end - start).saturating_add(hyphen),
                width_without_trailing,
                trailing_start,
            };
        }
        let visible_hyphen = self.visible_soft_hyphen(start, end).map_or(0, |index| {
            self.units[index].advance
        });
        let extra = hyphen.saturating_add(visible_hyphen);
        Measure {
            width: (self.prefix[end] - self.prefix[start]).saturating_add(extra),
            width_without_trailing: (self.prefix[trailing_start] - self.prefix[start])
                .saturating_add(extra),
            trailing_start,
        }
    }

    fn visible_soft_hyphen(&self, start: usize, end: usize) -> Option<usize> {
        if !self.has_soft_hyphens {
            return None;
        }
        let last = self.units[start..end]
            .iter()
            .rposition(|unit| unit.ch.is_some())?;
        (self.units[start + last].ch == Some(SOFT_HYPHEN)).then_some(start + last)
    }

    /// Advances of the units in `start..end` with tab stops resolved.
    pub(crate) fn layout(&self, start: usize, end: usize, config: LayoutConfig<'_>) -> Vec<Ideal> {
        let visible_hyphen = self.visible_soft_hyphen(start, end);
        let mut advances: Vec<Ideal> = self.units[start..end]
            .iter()
            .enumerate()
            .map(|(offset, unit)| {
                if unit.ch == Some(SOFT_HYPHEN) && visible_hyphen != Some(start + offset) {
                    0
                } else {
                    unit.advance
                }
            })
            .collect();
        if !self.has_tabs {
            return advances;
        }
        let mut x: Ideal = 0;
        for offset in 0..advances.len() {
            if self.units[start + offset].ch != Some('\t') {
                x = x.saturating_add(advances[offset]);
                continue;
            }
            let stop = config.tabs.next_stop(x);
            let position = config.doc.snap(stop.position);
            let segment = || {
                advances[offset + 1..]
                    .iter()
                    .zip(&self.units[start + offset + 1..end])
                    .take_while(|(_, unit)| unit.ch != Some('\t'))
                    .fold(0, |sum: Ideal, (advance, _)| sum.saturating_add(*advance))
            };
            let target = match stop.alignment {
                LsTabAlignment::Left => position,
                LsTabAlignment::Right => position - segment(),
                LsTabAlignment::Center => position - segment() / 2,
            };
            advances[offset] = target.saturating_sub(x).max(0);
            x = x.saturating_add(advances[offset]);
        }
        advances
    }

    /// Embeddings still open after the unit before `end`.
    pub(crate) fn embeddings_at(&self, end: usize) -> SmallVec<[char; 4]> {
        let mut embeddings = self.embeddings.clone();
        for unit in &self.units[..end] {
            if let Some(ch) = unit.ch {
                apply_control(&mut embeddings, ch);
            }
        }
        embeddings
    }

    /// Largest ascent and descent of the runs touched by `start..end`.
    pub(crate) fn extents(&self, start: usize, end: usize) -> (Ideal, Ideal) {
        let Some(last) = end.checked_sub(1).filter(|last| *last >= start) else {
            return (0, 0);
        };
        let runs = self.units[start].run..=self.units[last].run;
        self.runs[runs].iter().fold((0, 0), |(ascent, descent), run| {
            (ascent.max(run.ascent), descent.max(run.descent))
        })
    }
}
