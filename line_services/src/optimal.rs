// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paragraph wide (Knuth-Plass style) line breaking.

use alloc::vec::Vec;

use hashbrown::HashMap;

use crate::config::{LsDoc, LsTabs};
use crate::line::greedy::emergency_break;
use crate::text::{LayoutConfig, LsText, SOFT_HYPHEN, UnitKind, is_collapsible_space};
use crate::{BreakKind, BreakRecord, Ideal, LsClient, LsErr, LsResult, LsWrap};

/// The cost of a line or of the rest of a paragraph.
type Cost = f64;

const MAX_COST: Cost = 1_000_000.0;
const MIN_RATIO: f64 = -1.0;
/// Widths whose tail costs are kept at once.
const MAX_TAILS: usize = 8;

/// Extra costs added to lines with undesirable endings.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Penalties {
    /// Cost of ending a line with a hyphen.
    pub hyphen: f64,
    /// Cost of a last line holding a single word.
    pub runt: f64,
    /// Cost of two hyphenated lines in a row.
    pub consecutive_hyphens: f64,
}

impl Default for Penalties {
    fn default() -> Self {
        Self {
            hyphen: 0.5,
            runt: 0.5,
            consecutive_hyphens: 0.3,
        }
    }
}

/// Limits on the candidates returned by [`LsContext::create_breaks`](crate::LsContext::create_breaks).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BreakRestriction {
    /// Maximum number of candidates.
    pub max_variants: usize,
    /// Costs used to rank candidates.
    pub penalties: Penalties,
}

impl Default for BreakRestriction {
    fn default() -> Self {
        Self {
            max_variants: 8,
            penalties: Penalties::default(),
        }
    }
}

/// A candidate end for one line.
#[derive(Debug)]
pub struct LsBreak {
    /// Number of character positions of the line.
    pub length: usize,
    /// Width including trailing whitespace.
    pub width: Ideal,
    /// Width without trailing whitespace.
    pub width_without_trailing: Ideal,
    /// Positions taken by trailing whitespace.
    pub trailing_whitespace_length: usize,
    /// Positions taken by line terminators.
    pub newline_length: usize,
    /// The line breaks inside a word.
    pub is_truncated: bool,
    /// The line is wider than the budget.
    pub has_overflowed: bool,
    /// The line ends with a hyphen.
    pub is_hyphenated: bool,
    /// Cost of the paragraph when this candidate is taken.
    pub penalty: f64,
    /// Largest ascent of the content.
    pub ascent: Ideal,
    /// Largest descent of the content.
    pub descent: Ideal,
    /// Continuation state, `None` at the end of the paragraph.
    pub break_record: Option<BreakRecord>,
}

/// Optimal tail costs for one width.
#[derive(Debug)]
struct Tail {
    /// Cost of the best layout of the rest of the paragraph from each
    /// breakpoint.
    cost: Vec<Cost>,
    /// Whether the first line of that layout ends with a hyphen.
    hyphenated: Vec<bool>,
    /// Last use, for evicting the least recently used width.
    epoch: u64,
}

/// Snapshot of a whole paragraph on which breaks can be computed repeatedly.
#[derive(Debug)]
pub struct ParaBreakingSession {
    text: Option<LsText>,
    tabs: LsTabs,
    doc: LsDoc,
    wrap: LsWrap,
    justify: bool,
    hyphen_advance: Ideal,
    /// Unit indices after which a line may end.
    breakpoints: Vec<usize>,
    /// Average advance of a space, the unit of stretching.
    space: f64,
    penalties: Penalties,
    tails: HashMap<Ideal, Tail>,
    epoch: u64,
}

impl ParaBreakingSession {
    pub(crate) fn new(
        text: LsText,
        tabs: LsTabs,
        doc: LsDoc,
        wrap: LsWrap,
        justify: bool,
        hyphen_advance: Ideal,
    ) -> LsResult<Self> {
        let mut breakpoints = Vec::new();
        breakpoints.try_reserve(text.units.len() / 4 + 1)?;
        breakpoints.extend(
            (1..=text.units.len()).filter(|index| text.break_at(*index) != BreakKind::None),
        );
        let (count, total) = text
            .units
            .iter()
            .filter(|unit| unit.kind == UnitKind::Text && unit.ch == Some(' '))
            .fold((0_u32, 0.0), |(count, total), unit| {
                (count + 1, total + f64::from(unit.advance))
            });
        let space = if count > 0 {
            total / f64::from(count)
        } else {
            let config = LayoutConfig {
                tabs: &tabs,
                doc: &doc,
            };
            f64::from(text.measure(0, text.units.len(), 0, config).width) / 20.0
        };
        Ok(Self {
            text: Some(text),
            tabs,
            doc,
            wrap,
            justify,
            hyphen_advance,
            breakpoints,
            space: space.max(1.0),
            penalties: Penalties::default(),
            tails: HashMap::new(),
            epoch: 0,
        })
    }

    /// Releases the snapshot. Later use reports [`LsErr::Disposed`].
    pub fn close(&mut self) {
        self.text = None;
        self.breakpoints = Vec::new();
        self.tails = HashMap::new();
    }

    /// Returns `true` once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.text.is_none()
    }

    /// First character position of the snapshot.
    pub fn first_cp(&self) -> Option<usize> {
        self.text.as_ref().map(|text| text.first_cp)
    }

    /// Character position just past the paragraph.
    pub fn end_cp(&self) -> Option<usize> {
        self.text.as_ref().map(LsText::end_cp)
    }

    fn text(&self) -> LsResult<&LsText> {
        self.text.as_ref().ok_or(LsErr::Disposed)
    }

    fn config(&self) -> LayoutConfig<'_> {
        LayoutConfig {
            tabs: &self.tabs,
            doc: &self.doc,
        }
    }

    /// Width of the hyphen inserted when a line ends at `end`.
    fn inserted_hyphen(&self, text: &LsText, end: usize) -> Ideal {
        let kind = text.break_at(end);
        if kind == BreakKind::Hyphen && text.units[end - 1].ch != Some(SOFT_HYPHEN) {
            self.hyphen_advance
        } else {
            0
        }
    }

    /// Cost of the line `start..end` at `width`, and whether it is overfull.
    fn line_cost(&self, text: &LsText, start: usize, end: usize, width: Ideal) -> (Cost, bool) {
        let kind = text.break_at(end);
        let hyphen = self.inserted_hyphen(text, end);
        let measure = text.measure(start, end, hyphen, self.config());
        let spaces = text.units[start..measure.trailing_start]
            .iter()
            .filter(|unit| {
                unit.kind == UnitKind::Text
                    && unit.ch.is_some_and(|ch| ch != '\t' && is_collapsible_space(ch))
            })
            .count();
        let spaces = u32::try_from(spaces).unwrap_or(u32::MAX);
        let delta = f64::from(width) - f64::from(measure.width_without_trailing);
        let stretch = f64::from(spaces) * self.space / 2.0;
        let mut ratio = if delta >= 0.0 {
            delta / stretch
        } else {
            // Lines never shrink.
            f64::NEG_INFINITY
        };
        if ratio.is_nan() {
            ratio = 0.0;
        }
        if ratio > 1.0 {
            let extra = (delta - stretch) / f64::from(spaces.max(1));
            ratio = 1.0 + extra / (2.0 * self.space);
        }
        let min_ratio = if self.justify { MIN_RATIO } else { 0.0 };
        let is_last = end == text.units.len() || kind == BreakKind::Mandatory;
        if ratio < min_ratio {
            return (MAX_COST, true);
        }
        let mut cost = if is_last {
            if ratio < 0.0 { ratio.powi(3).abs() } else { 0.0 }
        } else {
            ratio.powi(3).abs()
        };
        if end == text.units.len() && self.next_breakpoint(start) == Some(end) && start > 0 {
            cost += self.penalties.runt;
        }
        if kind == BreakKind::Hyphen {
            cost += self.penalties.hyphen;
        }
        ((0.01 + cost).powi(2), false)
    }

    fn next_breakpoint(&self, start: usize) -> Option<usize> {
        let index = self.breakpoints.partition_point(|point| *point <= start);
        self.breakpoints.get(index).copied()
    }

    /// Enumerates the lines starting at `start` as `(end, cost, overfull)`.
    ///
    /// Enumeration stops after the first overfull line and at a mandatory break.
    fn lines_from(
        &self,
        text: &LsText,
        start: usize,
        width: Ideal,
        mut f: impl FnMut(usize, usize, Cost, bool),
    ) {
        let first = self.breakpoints.partition_point(|point| *point <= start);
        for (index, end) in self.breakpoints.iter().enumerate().skip(first) {
            let kind = text.break_at(*end);
            if self.wrap == LsWrap::NoWrap && kind != BreakKind::Mandatory {
                continue;
            }
            let (cost, overfull) = self.line_cost(text, start, *end, width);
            if overfull && self.wrap != LsWrap::NoWrap {
                if index == first {
                    f(index, *end, cost, true);
                }
                break;
            }
            f(index, *end, cost, overfull);
            if kind == BreakKind::Mandatory {
                break;
            }
        }
    }

    fn tail(&mut self, width: Ideal, penalties: Penalties) -> LsResult<&Tail> {
        if self.penalties != penalties {
            self.penalties = penalties;
            self.tails.clear();
        }
        if !self.tails.contains_key(&width) {
            let text = self.text()?;
            let count = self.breakpoints.len();
            let mut cost = Vec::new();
            cost.try_reserve(count)?;
            cost.resize(count, 0.0);
            let mut hyphenated = Vec::new();
            hyphenated.try_reserve(count)?;
            hyphenated.resize(count, false);
            // The last breakpoint is the paragraph end, where nothing remains.
            for from in (0..count.saturating_sub(1)).rev() {
                let mut best = Cost::INFINITY;
                let mut best_hyphenated = false;
                self.lines_from(text, self.breakpoints[from], width, |index, end, line, _| {
                    let ends_hyphen = text.break_at(end) == BreakKind::Hyphen;
                    let mut total = line + cost[index];
                    if ends_hyphen && hyphenated[index] {
                        total += self.penalties.consecutive_hyphens;
                    }
                    if total < best {
                        best = total;
                        best_hyphenated = ends_hyphen;
                    }
                });
                cost[from] = best;
                hyphenated[from] = best_hyphenated;
            }
            log::trace!("computed tail costs for width {width} over {count} breakpoints");
            if self.tails.len() >= MAX_TAILS {
                let oldest = self
                    .tails
                    .iter()
                    .min_by_key(|(_, tail)| tail.epoch)
                    .map(|(width, _)| *width);
                if let Some(oldest) = oldest {
                    self.tails.remove(&oldest);
                }
            }
            self.tails.insert(
                width,
                Tail {
                    cost,
                    hyphenated,
                    epoch: 0,
                },
            );
        }
        self.epoch += 1;
        let tail = self.tails.get_mut(&width).ok_or(LsErr::InvalidParameter)?;
        tail.epoch = self.epoch;
        Ok(&*tail)
    }

    /// Ranks the candidate ends of the line starting at `first_cp`.
    pub(crate) fn create_breaks(
        &mut self,
        first_cp: usize,
        prev: Option<&BreakRecord>,
        restriction: &BreakRestriction,
        width: Ideal,
    ) -> LsResult<(Vec<LsBreak>, usize)> {
        let text = self.text()?;
        if prev.is_some_and(|record| record.cp != first_cp) {
            return Err(LsErr::InvalidParameter);
        }
        let start = text.index_of_cp(first_cp).ok_or(LsErr::InvalidParameter)?;
        if start >= text.units.len() && !text.units.is_empty() {
            return Err(LsErr::InvalidParameter);
        }
        if restriction.max_variants == 0 {
            return Err(LsErr::InvalidParameter);
        }
        self.tail(width, restriction.penalties)?;
        let (Some(text), Some(tail)) = (self.text.as_ref(), self.tails.get(&width)) else {
            return Err(LsErr::Disposed);
        };

        let mut candidates: Vec<(usize, Cost, bool, bool)> = Vec::new();
        self.lines_from(text, start, width, |index, end, line, overfull| {
            let mut total = line + tail.cost[index];
            if text.break_at(end) == BreakKind::Hyphen && tail.hyphenated[index] {
                total += self.penalties.consecutive_hyphens;
            }
            candidates.push((end, total, overfull, false));
        });
        if candidates.is_empty() {
            // Empty paragraph.
            candidates.push((text.units.len(), 0.0, false, false));
        }
        if candidates.len() == 1 && candidates[0].2 && self.wrap == LsWrap::Wrap {
            let decision = emergency_break(text, start, width, self.config());
            if decision.end < candidates[0].0 {
                candidates[0] = (decision.end, MAX_COST, decision.overflowed, true);
            }
        }

        // Keep the longest candidates, in logical order.
        candidates.sort_by_key(|candidate| candidate.0);
        let excess = candidates.len().saturating_sub(restriction.max_variants);
        candidates.drain(..excess);
        // Ties go to the longer line.
        let best_fit = candidates
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.1.total_cmp(&b.1).then(b.0.cmp(&a.0)))
            .map_or(0, |(index, _)| index);

        let mut breaks = Vec::new();
        breaks.try_reserve(candidates.len())?;
        for (end, penalty, overfull, truncated) in candidates {
            breaks.push(self.make_break(text, start, end, penalty, overfull, truncated));
        }
        log::debug!(
            "create_breaks at {first_cp}: {} candidates, best fit {best_fit}",
            breaks.len()
        );
        Ok((breaks, best_fit))
    }

    fn make_break(
        &self,
        text: &LsText,
        start: usize,
        end: usize,
        penalty: Cost,
        overfull: bool,
        truncated: bool,
    ) -> LsBreak {
        let kind = text.break_at(end);
        let hyphen = if end > start {
            self.inserted_hyphen(text, end)
        } else {
            0
        };
        let measure = text.measure(start, end, hyphen, self.config());
        let units = &text.units[measure.trailing_start..end];
        let ends_paragraph = end == text.units.len() && text.terminator == Some(true);
        let (ascent, descent) = text.extents(start, end);
        LsBreak {
            length: text.cp_at(end) - text.cp_at(start),
            width: measure.width,
            width_without_trailing: measure.width_without_trailing,
            trailing_whitespace_length: units.len(),
            newline_length: units.iter().filter(|unit| unit.is_newline()).count(),
            is_truncated: truncated,
            has_overflowed: overfull,
            is_hyphenated: kind == BreakKind::Hyphen,
            penalty,
            ascent,
            descent,
            break_record: (!ends_paragraph).then(|| BreakRecord {
                cp: text.cp_at(end),
                embeddings: text.embeddings_at(end),
                hyphenated: kind == BreakKind::Hyphen,
            }),
        }
    }

    /// Smallest and largest width the paragraph can occupy.
    pub(crate) fn content_widths(&self) -> LsResult<(Ideal, Ideal)> {
        let text = self.text()?;
        let config = self.config();
        let mut min_width: Ideal = 0;
        let mut max_width: Ideal = 0;
        let mut word_start = 0;
        let mut line_start = 0;
        let mut words = Vec::new();
        for end in &self.breakpoints {
            let kind = text.break_at(*end);
            if kind == BreakKind::Hyphen {
                continue;
            }
            if text.has_tabs {
                words.try_reserve(1)?;
                words.push(*end);
            } else {
                let word = text.measure(word_start, *end, 0, config);
                min_width = min_width.max(word.width_without_trailing);
                word_start = *end;
            }
            if kind == BreakKind::Mandatory {
                let line = text.measure(line_start, *end, 0, config);
                max_width = max_width.max(line.width_without_trailing);
                if text.has_tabs {
                    // Tab stops are measured from the line start.
                    let advances = text.layout(line_start, *end, config);
                    let mut start = line_start;
                    for word_end in words.drain(..) {
                        let trailing = text.measure(start, word_end, 0, config).trailing_start;
                        let width = advances[start - line_start..trailing - line_start]
                            .iter()
                            .fold(0, |sum: Ideal, advance| sum.saturating_add(*advance));
                        min_width = min_width.max(width);
                        start = word_end;
                    }
                }
                line_start = *end;
            }
        }
        Ok((min_width, max_width))
    }
}

/// Asks the client for hyphenation opportunities in every word of `text`.
pub(crate) fn insert_hyphenation(text: &mut LsText, client: &mut dyn LsClient) -> LsResult<()> {
    let len = text.units.len();
    let is_letter = |text: &LsText, index: usize| {
        let unit = &text.units[index];
        unit.kind == UnitKind::Text && unit.ch.is_some_and(char::is_alphabetic)
    };
    let mut word = Vec::new();
    let mut start = 0;
    while start < len {
        if !is_letter(text, start) {
            start += 1;
            continue;
        }
        let mut end = start + 1;
        while end < len && is_letter(text, end) && text.break_at(end) == BreakKind::None {
            end += 1;
        }
        if end - start >= 2 {
            word.clear();
            word.try_reserve(end - start)?;
            word.extend(text.units[start..end].iter().filter_map(|unit| unit.ch));
            let points = client
                .hyphenate(text.units[start].cp, &word)
                .map_err(|_| LsErr::ClientAbort)?;
            for point in points {
                if point == 0 || point >= end - start {
                    continue;
                }
                let unit = &mut text.units[start + point];
                if unit.cluster_start && unit.break_before == BreakKind::None {
                    unit.break_before = BreakKind::Hyphen;
                }
            }
        }
        start = end;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::Segmenters;
    use crate::config::BreakStrategy;
    use crate::text::FetchLimit;
    use crate::text::tests::Runs;

    fn session(client: &mut Runs, justify: bool) -> ParaBreakingSession {
        let tabs = LsTabs::default();
        let doc = LsDoc::default();
        let config = LayoutConfig {
            tabs: &tabs,
            doc: &doc,
        };
        let mut text = LsText::fetch(client, 0, None, FetchLimit::Paragraph, config).unwrap();
        Segmenters::default()
            .analyze(&mut text, BreakStrategy::Normal, false)
            .unwrap();
        ParaBreakingSession::new(text, tabs, doc, LsWrap::Wrap, justify, 0).unwrap()
    }

    #[test]
    fn content_widths_of_three_words() {
        let mut client = Runs::default().text("aaa bbbbb cc", 10).end();
        let session = session(&mut client, false);
        assert_eq!(session.content_widths().unwrap(), (50, 120));
    }

    #[test]
    fn content_widths_respect_mandatory_breaks() {
        let mut client = Runs::default().text("aaaa bb\nc", 10).end();
        let session = session(&mut client, false);
        assert_eq!(session.content_widths().unwrap(), (40, 70));
    }

    #[test]
    fn content_widths_place_tabs_from_the_line_start() {
        let mut client = Runs::default().text("aaa b\t)", 10).end();
        let tabs = LsTabs {
            stops: Vec::new(),
            incremental: 80,
        };
        let doc = LsDoc::default();
        let config = LayoutConfig {
            tabs: &tabs,
            doc: &doc,
        };
        let mut text = LsText::fetch(&mut client, 0, None, FetchLimit::Paragraph, config).unwrap();
        Segmenters::default()
            .analyze(&mut text, BreakStrategy::Normal, false)
            .unwrap();
        let session =
            ParaBreakingSession::new(text, tabs, doc, LsWrap::Wrap, false, 0).unwrap();
        // The tab after "b" at 50 reaches the stop at 80, so "b\t)" is 50
        // wide rather than the 90 it takes at the line start.
        assert_eq!(session.content_widths().unwrap(), (50, 90));
    }

    #[test]
    fn candidates_stop_at_the_first_overfull_line() {
        let mut client = Runs::default().text("aaa bb cc dd", 10).end();
        let mut session = session(&mut client, false);
        let (breaks, best) = session
            .create_breaks(0, None, &BreakRestriction::default(), 90)
            .unwrap();
        let lengths: Vec<usize> = breaks.iter().map(|candidate| candidate.length).collect();
        assert_eq!(lengths, vec![4, 7, 10]);
        assert!(breaks.iter().all(|candidate| !candidate.has_overflowed));
        // The full first line leaves only a cheap last line.
        assert_eq!(breaks[best].length, 10);
        assert!(breaks[best].penalty < breaks[0].penalty);
    }

    #[test]
    fn later_lines_reuse_the_snapshot() {
        let mut client = Runs::default().text("aaa bb cc dd", 10).end();
        let mut session = session(&mut client, false);
        let restriction = BreakRestriction::default();
        let (mut breaks, best) = session.create_breaks(0, None, &restriction, 90).unwrap();
        let record = breaks.swap_remove(best).break_record.unwrap();
        let fetched = client.fetched;
        let (breaks, best) = session
            .create_breaks(record.cp(), Some(&record), &restriction, 90)
            .unwrap();
        assert_eq!(client.fetched, fetched);
        assert_eq!(breaks[best].length, 3);
        assert!(breaks[best].break_record.is_none());
        let mismatched = session.create_breaks(4, Some(&record), &restriction, 90);
        assert_eq!(mismatched.err(), Some(LsErr::InvalidParameter));
    }

    #[test]
    fn hyphenation_adds_breakpoints() {
        let mut client = Runs::default().text("aa hyphenation", 10).end();
        client.hyphens.push((3, vec![2, 6]));
        let tabs = LsTabs::default();
        let doc = LsDoc::default();
        let config = LayoutConfig {
            tabs: &tabs,
            doc: &doc,
        };
        let mut text = LsText::fetch(&mut client, 0, None, FetchLimit::Paragraph, config).unwrap();
        Segmenters::default()
            .analyze(&mut text, BreakStrategy::Normal, false)
            .unwrap();
        insert_hyphenation(&mut text, &mut client).unwrap();
        assert_eq!(text.break_at(5), BreakKind::Hyphen);
        assert_eq!(text.break_at(9), BreakKind::Hyphen);
        let mut session = ParaBreakingSession::new(text, tabs, doc, LsWrap::Wrap, false, 10).unwrap();
        let (breaks, _) = session
            .create_breaks(0, None, &BreakRestriction::default(), 100)
            .unwrap();
        let last = breaks.last().unwrap();
        assert_eq!(last.length, 9);
        assert!(last.is_hyphenated);
        assert_eq!(last.width_without_trailing, 100);
    }

    #[test]
    fn a_closed_session_reports_disposed() {
        let mut client = Runs::default().text("aa", 10).end();
        let mut session = session(&mut client, false);
        session.close();
        session.close();
        assert!(session.is_closed());
        assert_eq!(session.content_widths().err(), Some(LsErr::Disposed));
        let result = session.create_breaks(0, None, &BreakRestriction::default(), 100);
        assert_eq!(result.err(), Some(LsErr::Disposed));
    }

    #[test]
    fn words_wider_than_the_line_are_truncated() {
        let mut client = Runs::default().text("abcdefgh", 10).end();
        let mut session = session(&mut client, false);
        let (breaks, best) = session
            .create_breaks(0, None, &BreakRestriction::default(), 35)
            .unwrap();
        assert_eq!(breaks.len(), 1);
        assert_eq!(breaks[best].length, 3);
        assert!(breaks[best].is_truncated);
        assert!(breaks[best].break_record.is_some());
    }

    #[test]
    fn the_restriction_limits_candidates() {
        let mut client = Runs::default().text("a b c d e f g h", 10).end();
        let mut session = session(&mut client, false);
        let restriction = BreakRestriction {
            max_variants: 2,
            ..BreakRestriction::default()
        };
        let (breaks, best) = session.create_breaks(0, None, &restriction, 1000).unwrap();
        assert_eq!(breaks.len(), 2);
        assert!(best < 2);
        // The whole paragraph fits, which is the cheapest layout.
        assert_eq!(breaks[best].length, 16);
        assert!(breaks[best].break_record.is_none());
    }

    #[test]
    fn the_restriction_keeps_the_longest_candidates() {
        let mut client = Runs::default().text("aa bb cc dd", 10).end();
        let mut session = session(&mut client, false);
        let mut restriction = BreakRestriction::default();
        restriction.penalties.runt = 1000.0;
        let (all, best) = session.create_breaks(0, None, &restriction, 90).unwrap();
        let lengths: Vec<usize> = all.iter().map(|candidate| candidate.length).collect();
        assert_eq!(lengths, vec![3, 6, 9]);
        // Ending at 9 leaves "dd" alone on the last line.
        assert_eq!(all[best].length, 6);
        assert!(all[2].penalty > all[0].penalty);

        restriction.max_variants = 1;
        let (kept, best) = session.create_breaks(0, None, &restriction, 90).unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(best, 0);
        assert_eq!(kept[0].length, 9);

        restriction.max_variants = 2;
        let (kept, best) = session.create_breaks(0, None, &restriction, 90).unwrap();
        let lengths: Vec<usize> = kept.iter().map(|candidate| candidate.length).collect();
        assert_eq!(lengths, vec![6, 9]);
        assert_eq!(kept[best].length, 6);
    }

    #[test]
    fn tail_costs_are_kept_for_recent_widths() {
        let mut client = Runs::default().text("aa bb cc dd", 10).end();
        let mut session = session(&mut client, false);
        let restriction = BreakRestriction::default();
        for width in (60..).step_by(10).take(MAX_TAILS) {
            session.create_breaks(0, None, &restriction, width).unwrap();
        }
        assert_eq!(session.tails.len(), MAX_TAILS);
        // Using the first width again makes the second one the oldest.
        session.create_breaks(0, None, &restriction, 60).unwrap();
        session.create_breaks(0, None, &restriction, 500).unwrap();
        assert_eq!(session.tails.len(), MAX_TAILS);
        assert!(session.tails.contains_key(&60));
        assert!(!session.tails.contains_key(&70));
        assert!(session.tails.contains_key(&500));
    }
}
