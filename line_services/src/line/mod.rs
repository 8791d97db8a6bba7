// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

pub(crate) mod greedy;

use alloc::vec::Vec;

use crate::analysis::{line_levels, reorder_visual};
use crate::text::{LayoutConfig, LsText, UnitKind, is_collapsible_space};
use crate::{BreakRecord, IDEAL_INFINITE_WIDTH, Ideal, LsResult};

use greedy::Decision;

/// Kind of break opportunity between two character positions.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum BreakKind {
    /// No break is allowed.
    #[default]
    None,
    /// A regular break opportunity.
    Normal,
    /// The line must end here.
    Mandatory,
    /// A break that shows a hyphen.
    Hyphen,
}

/// Wrapping behavior of a line.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum LsWrap {
    /// Break at opportunities; words wider than the line are broken.
    #[default]
    Wrap,
    /// Break at opportunities; words wider than the line overflow.
    WrapWithOverflow,
    /// Only break at mandatory breaks.
    NoWrap,
}

/// Parameters of [`LsContext::create_line`](crate::LsContext::create_line).
#[derive(Copy, Clone, Debug, Default)]
pub struct LineParams<'a> {
    /// First character position of the line.
    pub first_cp: usize,
    /// Width budget.
    pub max_width: Ideal,
    /// Wrapping behavior.
    pub wrap: LsWrap,
    /// Distribute the remaining space over inner whitespace.
    pub justify: bool,
    /// Break after exactly this many positions instead of deciding.
    pub forced_length: Option<usize>,
    /// Ask the client for hyphenation opportunities.
    pub hyphenate: bool,
    /// Width of the hyphen shown at an inserted hyphenation break.
    pub hyphen_advance: Ideal,
    /// Whether the paragraph is right-to-left.
    pub base_rtl: bool,
    /// Continuation state of the previous line, `None` for a paragraph start.
    pub prev_break: Option<&'a BreakRecord>,
}

/// A grapheme cluster, an object or a hidden run of a formatted line.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LsCluster {
    /// First character position.
    pub cp: usize,
    /// Number of character positions.
    pub len: usize,
    /// Advance including tab and justification adjustments.
    pub advance: Ideal,
    /// Offset of the cluster from the line start in the flow direction.
    ///
    /// For a right-to-left paragraph this is measured from the right edge.
    pub flow_x: Ideal,
    /// Resolved bidi level.
    pub level: u8,
    /// Whether the cluster only holds whitespace or invisible content.
    pub is_whitespace: bool,
    /// Whether the cluster holds a line terminator.
    pub is_newline: bool,
}

/// A piece of a line that comes from one client run.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LsLineSpan {
    /// First character position.
    pub cp: usize,
    /// Number of character positions.
    pub len: usize,
    /// Client tag of the run.
    pub tag: usize,
}

/// A formatted line.
#[derive(Debug)]
pub struct LsLine {
    /// First character position.
    pub cp_first: usize,
    /// Number of character positions, including the terminator.
    pub length: usize,
    /// Positions at the end of the line whose layout depends on the next line.
    pub dependent_length: usize,
    /// Positions taken by line terminators.
    pub newline_length: usize,
    /// Positions taken by trailing whitespace, terminators included.
    pub trailing_whitespace_length: usize,
    /// Width without trailing whitespace.
    pub width: Ideal,
    /// Width including trailing whitespace.
    pub width_with_trailing: Ideal,
    /// Width of an inserted hyphen, already part of both widths.
    pub hyphen_width: Ideal,
    /// Largest ascent of the content.
    pub ascent: Ideal,
    /// Largest descent of the content.
    pub descent: Ideal,
    /// A word had to be broken between two clusters.
    pub is_truncated: bool,
    /// The content is wider than the budget.
    pub has_overflowed: bool,
    /// The line holds the end of its paragraph.
    pub ends_paragraph: bool,
    /// The line ends with a hyphen.
    pub is_hyphenated: bool,
    /// Deepest bidi level relative to the paragraph level.
    pub max_nesting_depth: u8,
    /// Whether the paragraph is right-to-left.
    pub base_rtl: bool,
    /// Kind of break that ended the line.
    pub break_kind: BreakKind,
    /// Clusters in logical order.
    pub clusters: Vec<LsCluster>,
    /// Indices into `clusters`, left to right.
    pub visual_order: Vec<usize>,
    /// Pieces of the line per client run, in logical order.
    pub spans: Vec<LsLineSpan>,
    /// Advance of every character position.
    pub advances: Vec<Ideal>,
    /// Continuation state, `None` at the end of a paragraph.
    pub break_record: Option<BreakRecord>,
}

impl LsLine {
    /// Character position just past the line.
    pub fn cp_end(&self) -> usize {
        self.cp_first + self.length
    }

    /// Index of the cluster containing `cp`.
    pub fn cluster_at(&self, cp: usize) -> Option<usize> {
        if cp < self.cp_first || cp >= self.cp_end() {
            return None;
        }
        let index = self
            .clusters
            .partition_point(|cluster| cluster.cp + cluster.len <= cp);
        (index < self.clusters.len()).then_some(index)
    }

    /// Whether the cluster at `index` runs in the paragraph direction.
    pub fn is_forward(&self, index: usize) -> bool {
        (self.clusters[index].level & 1 == 1) == self.base_rtl
    }
}

fn sum(advances: &[Ideal]) -> Ideal {
    advances
        .iter()
        .fold(0, |sum: Ideal, advance| sum.saturating_add(*advance))
}

fn to_ideal(count: usize) -> Ideal {
    Ideal::try_from(count).unwrap_or(Ideal::MAX)
}

/// Builds the line ending at `decision.end` from text fetched at the line start.
pub(crate) fn build_line(
    text: &LsText,
    decision: &Decision,
    params: &LineParams<'_>,
    config: LayoutConfig<'_>,
) -> LsResult<LsLine> {
    let end = decision.end;
    let units = &text.units[..end];
    let measure = text.measure(0, end, decision.hyphen, config);
    let trailing_start = measure.trailing_start;
    let mut advances = text.layout(0, end, config);
    let ends_paragraph = end == text.units.len() && text.terminator == Some(true);
    let break_kind = if decision.hyphenated {
        BreakKind::Hyphen
    } else {
        text.break_at(end)
    };

    if params.justify
        && !ends_paragraph
        && break_kind != BreakKind::Mandatory
        && params.max_width < IDEAL_INFINITE_WIDTH
    {
        let slack = params.max_width - measure.width_without_trailing;
        let mut spaces = Vec::new();
        spaces.try_reserve(trailing_start)?;
        spaces.extend((0..trailing_start).filter(|index| {
            let unit = &units[*index];
            unit.kind == UnitKind::Text
                && unit
                    .ch
                    .is_some_and(|ch| ch != '\t' && is_collapsible_space(ch))
        }));
        if slack > 0 && !spaces.is_empty() {
            let count = to_ideal(spaces.len());
            let share = slack / count;
            let mut rest = slack % count;
            for index in spaces {
                advances[index] += share + Ideal::from(rest > 0);
                rest -= Ideal::from(rest > 0);
            }
        }
    }

    let levels = line_levels(units, u8::from(params.base_rtl));
    let base_level = u8::from(params.base_rtl);
    let max_nesting_depth = levels
        .iter()
        .map(|level| level.saturating_sub(base_level))
        .max()
        .unwrap_or(0);

    let mut clusters: Vec<LsCluster> = Vec::new();
    clusters.try_reserve(units.len())?;
    for (index, unit) in units.iter().enumerate() {
        if unit.cluster_start || clusters.is_empty() {
            clusters.push(LsCluster {
                cp: unit.cp,
                len: 0,
                advance: 0,
                flow_x: 0,
                level: levels[index],
                is_whitespace: true,
                is_newline: false,
            });
        }
        if let Some(cluster) = clusters.last_mut() {
            cluster.len += 1;
            cluster.advance = cluster.advance.saturating_add(advances[index]);
            cluster.is_whitespace &= unit.is_trailing();
            cluster.is_newline |= unit.is_newline();
        }
    }

    let mut visual_order: Vec<usize> = (0..clusters.len()).collect();
    reorder_visual(&mut visual_order, |index| clusters[*index].level);
    let total = sum(&advances);
    let mut x: Ideal = 0;
    for index in &visual_order {
        let cluster = &mut clusters[*index];
        cluster.flow_x = if params.base_rtl {
            total - x - cluster.advance
        } else {
            x
        };
        x = x.saturating_add(cluster.advance);
    }

    let mut spans: Vec<LsLineSpan> = Vec::new();
    for unit in units {
        let tag = text.runs[unit.run].tag;
        match spans.last_mut() {
            Some(span) if text.units[span.cp - text.first_cp].run == unit.run => span.len += 1,
            _ => spans.push(LsLineSpan {
                cp: unit.cp,
                len: 1,
                tag,
            }),
        }
    }

    let length = text.cp_at(end) - text.first_cp;
    let trailing_whitespace_length = end - trailing_start;
    let newline_length = units[trailing_start..]
        .iter()
        .filter(|unit| unit.is_newline())
        .count();
    let dependent_length = if break_kind == BreakKind::Mandatory || ends_paragraph {
        0
    } else {
        trailing_whitespace_length - newline_length
    };
    let is_hyphenated = decision.hyphenated || break_kind == BreakKind::Hyphen;
    let (ascent, descent) = text.extents(0, end);
    let break_record = (!ends_paragraph).then(|| BreakRecord {
        cp: text.first_cp + length,
        embeddings: text.embeddings_at(end),
        hyphenated: is_hyphenated,
    });

    let width = sum(&advances[..trailing_start]).saturating_add(decision.hyphen);
    let has_overflowed = decision.overflowed
        || (params.wrap != LsWrap::NoWrap && !decision.truncated && width > params.max_width);
    Ok(LsLine {
        cp_first: text.first_cp,
        length,
        dependent_length,
        newline_length,
        trailing_whitespace_length,
        width,
        width_with_trailing: total.saturating_add(decision.hyphen),
        hyphen_width: decision.hyphen,
        ascent,
        descent,
        is_truncated: decision.truncated,
        has_overflowed,
        ends_paragraph,
        is_hyphenated,
        max_nesting_depth,
        base_rtl: params.base_rtl,
        break_kind,
        clusters,
        visual_order,
        spans,
        advances,
        break_record,
    })
}
