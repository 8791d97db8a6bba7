// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Greedy line breaking: fill each line with as much content as fits.

use alloc::vec::Vec;

use crate::text::{LayoutConfig, LsText, UnitKind};
use crate::{BreakKind, Ideal, LineParams, LsClient, LsErr, LsResult, LsWrap};

/// Where a line ends and why.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Decision {
    /// Unit index just past the line.
    pub(crate) end: usize,
    /// Width of an inserted hyphen.
    pub(crate) hyphen: Ideal,
    pub(crate) hyphenated: bool,
    pub(crate) truncated: bool,
    pub(crate) overflowed: bool,
}

impl Decision {
    fn at(end: usize) -> Self {
        Self {
            end,
            hyphen: 0,
            hyphenated: false,
            truncated: false,
            overflowed: false,
        }
    }
}

/// Returns `true` if some break opportunity exists after `start`.
pub(crate) fn has_opportunity(text: &LsText, start: usize) -> bool {
    (start + 1..=text.units.len()).any(|end| text.break_at(end) != BreakKind::None)
}

/// Chooses the end of the line starting at unit `start`.
pub(crate) fn choose_break(
    text: &LsText,
    client: &mut dyn LsClient,
    start: usize,
    params: &LineParams<'_>,
    config: LayoutConfig<'_>,
) -> LsResult<Decision> {
    let len = text.units.len();
    let max = params.max_width;
    let width = |end: usize| text.measure(start, end, 0, config).width_without_trailing;

    if let Some(forced) = params.forced_length {
        let end = text
            .index_of_cp(text.cp_at(start) + forced)
            .unwrap_or(len)
            .min(len);
        return forced_break(text, client, start, end, params, config);
    }
    if start >= len {
        return Ok(Decision::at(len));
    }

    let mut first = None;
    let mut fitting = None;
    let mut overflow = None;
    for end in start + 1..=len {
        let kind = text.break_at(end);
        if kind == BreakKind::None {
            continue;
        }
        first.get_or_insert(end);
        if params.wrap != LsWrap::NoWrap && width(end) > max {
            overflow = Some(end);
            break;
        }
        fitting = Some(end);
        if kind == BreakKind::Mandatory {
            break;
        }
    }

    if params.hyphenate && params.wrap != LsWrap::NoWrap {
        if let Some(overflow) = overflow {
            let word_start = fitting.unwrap_or(start);
            if let Some(decision) =
                hyphenate_word(text, client, start, word_start, overflow, params, config)?
            {
                return Ok(decision);
            }
        }
    }

    if let Some(end) = fitting {
        let mut decision = Decision::at(end);
        decision.overflowed = params.wrap == LsWrap::NoWrap && width(end) > max;
        return Ok(decision);
    }
    match params.wrap {
        LsWrap::Wrap => Ok(emergency_break(text, start, max, config)),
        LsWrap::WrapWithOverflow | LsWrap::NoWrap => {
            let mut decision = Decision::at(first.unwrap_or(len));
            decision.overflowed = true;
            Ok(decision)
        }
    }
}

fn is_letter(text: &LsText, index: usize) -> bool {
    let unit = &text.units[index];
    unit.kind == UnitKind::Text && unit.ch.is_some_and(char::is_alphabetic)
}

/// Recovers how a line of a known length ends.
///
/// An end without a break opportunity is an inserted hyphen when the client
/// hyphenates the word there, and a truncation otherwise.
fn forced_break(
    text: &LsText,
    client: &mut dyn LsClient,
    start: usize,
    end: usize,
    params: &LineParams<'_>,
    config: LayoutConfig<'_>,
) -> LsResult<Decision> {
    let mut decision = Decision::at(end);
    if end > start && end < text.units.len() && text.break_at(end) == BreakKind::None {
        if params.hyphenate && is_hyphenation_point(text, client, start, end)? {
            decision.hyphen = params.hyphen_advance;
            decision.hyphenated = true;
        } else {
            decision.truncated = true;
        }
    }
    decision.overflowed =
        text.measure(start, end, decision.hyphen, config).width_without_trailing > params.max_width;
    Ok(decision)
}

fn is_hyphenation_point(
    text: &LsText,
    client: &mut dyn LsClient,
    start: usize,
    end: usize,
) -> LsResult<bool> {
    let len = text.units.len();
    if !is_letter(text, end - 1) || !is_letter(text, end) || !text.units[end].cluster_start {
        return Ok(false);
    }
    let mut word_start = end - 1;
    while word_start > start
        && is_letter(text, word_start - 1)
        && text.break_at(word_start) == BreakKind::None
    {
        word_start -= 1;
    }
    let mut word_end = end + 1;
    while word_end < len && is_letter(text, word_end) && text.break_at(word_end) == BreakKind::None
    {
        word_end += 1;
    }
    let mut word = Vec::new();
    word.try_reserve(word_end - word_start)?;
    word.extend(text.units[word_start..word_end].iter().filter_map(|unit| unit.ch));
    let points = client
        .hyphenate(text.units[word_start].cp, &word)
        .map_err(|_| LsErr::ClientAbort)?;
    Ok(points.contains(&(end - word_start)))
}

/// Breaks inside the word spanning `word_start..overflow` at the last
/// hyphenation opportunity that fits.
fn hyphenate_word(
    text: &LsText,
    client: &mut dyn LsClient,
    start: usize,
    word_start: usize,
    overflow: usize,
    params: &LineParams<'_>,
    config: LayoutConfig<'_>,
) -> LsResult<Option<Decision>> {
    let units = &text.units;
    let word_end = (word_start..overflow)
        .find(|index| !units[*index].ch.is_some_and(char::is_alphabetic))
        .unwrap_or(overflow);
    if word_end - word_start < 2 {
        return Ok(None);
    }
    let mut word = Vec::new();
    word.try_reserve(word_end - word_start)?;
    word.extend(units[word_start..word_end].iter().filter_map(|unit| unit.ch));
    let points = client
        .hyphenate(units[word_start].cp, &word)
        .map_err(|_| LsErr::ClientAbort)?;
    let best = points
        .into_iter()
        .filter(|point| *point > 0 && *point < word.len())
        .map(|point| word_start + point)
        .filter(|end| units[*end].cluster_start)
        .filter(|end| {
            text.measure(start, *end, params.hyphen_advance, config)
                .width_without_trailing
                <= params.max_width
        })
        .max();
    Ok(best.map(|end| Decision {
        end,
        hyphen: params.hyphen_advance,
        hyphenated: true,
        truncated: false,
        overflowed: false,
    }))
}

/// Breaks at the last cluster boundary that fits, taking at least one cluster.
pub(crate) fn emergency_break(
    text: &LsText,
    start: usize,
    max: Ideal,
    config: LayoutConfig<'_>,
) -> Decision {
    let len = text.units.len();
    let is_boundary = |index: usize| index == len || text.units[index].cluster_start;
    let mut end = (start + 1..=len).find(|index| is_boundary(*index)).unwrap_or(len);
    for candidate in end + 1..=len {
        if !is_boundary(candidate) {
            continue;
        }
        if text.measure(start, candidate, 0, config).width_without_trailing > max {
            break;
        }
        end = candidate;
    }
    let mut decision = Decision::at(end);
    decision.truncated = true;
    decision.overflowed = text.measure(start, end, 0, config).width_without_trailing > max;
    decision
}
