// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Formatted lines.

mod caret;
mod collapse;
mod draw;

pub use caret::CharacterHit;
pub use collapse::TextCollapsedRange;
pub use draw::{DrawingContext, GlyphRun, IndexedGlyphRun, TextBounds, TextRunBounds};

use alloc::sync::Arc;
use alloc::vec::Vec;

use line_services::{Ideal, LsCluster, LsLine};

use crate::convert::ideal_to_real;
use crate::fetch::{Fetcher, FetchedRun, scope_at};
use crate::{
    Error, FlowDirection, TextAlignment, TextFormattingMode, TextLineBreak,
    TextParagraphProperties, TextRun, TextRunProperties, TextSpan,
};

use collapse::Collapsed;

/// Measurements shared by lines and breakpoints.
///
/// Lengths are in character positions, everything else in device
/// independent units.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct TextLineMetrics {
    /// Number of character positions, terminator included.
    pub length: usize,
    /// Positions at the end whose layout depends on the following line.
    pub dependent_length: usize,
    /// Positions taken by line terminators.
    pub newline_length: usize,
    /// Positions taken by trailing whitespace, terminators included.
    pub trailing_whitespace_length: usize,
    /// Advance of the content without trailing whitespace.
    pub width: f64,
    /// Advance of the content with trailing whitespace.
    pub width_including_trailing_whitespace: f64,
    /// Distance between the top of this line and the top of the next one.
    pub height: f64,
    /// Height of the content.
    pub text_height: f64,
    /// Distance from the top of the line to its baseline.
    pub baseline: f64,
    /// Distance from the top of the content to its baseline.
    pub text_baseline: f64,
    /// Baseline used to place a list marker.
    pub marker_baseline: f64,
    /// Height used to place a list marker.
    pub marker_height: f64,
    /// Distance from the topmost to the bottommost ink of the content.
    pub extent: f64,
    /// Distance from the line start to the first ink in the flow
    /// direction, negative when ink reaches before the start.
    pub overhang_leading: f64,
    /// Distance from the last ink to the end of the content, negative when
    /// ink reaches past it.
    pub overhang_trailing: f64,
    /// Ink reaching below the line height.
    pub overhang_after: f64,
    /// Distance from the paragraph edge to the line start, in the flow
    /// direction.
    pub start: f64,
}

/// Raw engine measurements of a line or a candidate break.
#[derive(Copy, Clone, Debug)]
pub(crate) struct LineExtent {
    pub(crate) length: usize,
    pub(crate) dependent_length: usize,
    pub(crate) newline_length: usize,
    pub(crate) trailing_whitespace_length: usize,
    pub(crate) width: Ideal,
    pub(crate) width_with_trailing: Ideal,
    pub(crate) ascent: Ideal,
    pub(crate) descent: Ideal,
}

impl TextLineMetrics {
    /// Derives the client metrics of a line formatted for `paragraph_width`.
    ///
    /// An unconstrained paragraph has no width and aligns every line to its
    /// start.
    pub(crate) fn new(
        extent: &LineExtent,
        props: &TextParagraphProperties,
        paragraph_width: Option<f64>,
        indent: f64,
    ) -> Self {
        let width = ideal_to_real(extent.width);
        let (mut ascent, mut descent) = (ideal_to_real(extent.ascent), ideal_to_real(extent.descent));
        if ascent + descent <= 0.0 {
            // Empty lines take the extent of the default run.
            let default = &props.default_text_run_properties;
            ascent = default.typeface.ascent() * default.font_rendering_em_size;
            descent = default.typeface.descent() * default.font_rendering_em_size;
        }
        let text_height = ascent + descent;
        let (height, baseline) = if props.line_height > 0.0 {
            let baseline = if text_height > 0.0 {
                ascent * props.line_height / text_height
            } else {
                props.line_height
            };
            (props.line_height, baseline)
        } else {
            (text_height, ascent)
        };

        let slack = paragraph_width.map_or(0.0, |paragraph| (paragraph - indent - width).max(0.0));
        let offset = match (props.text_alignment, props.flow_direction) {
            (TextAlignment::Left, FlowDirection::LeftToRight)
            | (TextAlignment::Right, FlowDirection::RightToLeft)
            | (TextAlignment::Justify, _) => 0.0,
            (TextAlignment::Right, FlowDirection::LeftToRight)
            | (TextAlignment::Left, FlowDirection::RightToLeft) => slack,
            (TextAlignment::Center, _) => slack / 2.0,
        };

        Self {
            length: extent.length,
            dependent_length: extent.dependent_length,
            newline_length: extent.newline_length,
            trailing_whitespace_length: extent.trailing_whitespace_length,
            width,
            width_including_trailing_whitespace: ideal_to_real(extent.width_with_trailing),
            height,
            text_height,
            baseline,
            text_baseline: ascent,
            marker_baseline: baseline,
            marker_height: height,
            // The font box; lines refine these from their glyphs.
            extent: text_height,
            overhang_leading: 0.0,
            overhang_trailing: 0.0,
            overhang_after: (text_height - height).max(0.0),
            start: indent + offset,
        }
    }
}

/// Piece of a line coming from one run.
#[derive(Copy, Clone, Debug)]
struct LineSpan {
    cp: usize,
    len: usize,
    /// Index into the fetched runs.
    run: usize,
    text_effect_cp: usize,
}

/// Formatting state needed to turn an engine line into a [`TextLine`].
#[derive(Copy, Clone, Debug)]
pub(crate) struct LineSettings<'a> {
    pub(crate) props: &'a TextParagraphProperties,
    pub(crate) paragraph_width: Option<f64>,
    pub(crate) mode: TextFormattingMode,
}

/// A formatted line of text.
///
/// Lines are immutable: operations such as [`collapse`](Self::collapse)
/// return a new line. Distances are measured in the flow direction from the
/// paragraph edge at which lines start.
#[derive(Clone, Debug)]
pub struct TextLine {
    metrics: TextLineMetrics,
    cp_first: usize,
    has_overflowed: bool,
    is_truncated: bool,
    is_hyphenated: bool,
    ends_paragraph: bool,
    max_nesting_depth: u8,
    flow_direction: FlowDirection,
    mode: TextFormattingMode,
    pixels_per_dip: f32,
    hyphen_width: Ideal,
    paragraph_width: Option<f64>,
    clusters: Vec<LsCluster>,
    visual_order: Vec<usize>,
    spans: Vec<LineSpan>,
    /// Advance of every position of the line.
    advances: Vec<Ideal>,
    runs: Vec<FetchedRun>,
    line_break: Option<TextLineBreak>,
    collapsed: Option<Collapsed>,
    disposed: bool,
}

impl TextLine {
    pub(crate) fn new(mut ls: LsLine, fetcher: Fetcher<'_>, settings: LineSettings<'_>) -> Self {
        let source = fetcher.source();
        let spans = ls
            .spans
            .iter()
            .map(|span| LineSpan {
                cp: span.cp,
                len: span.len,
                run: span.tag,
                text_effect_cp: source.get_text_effect_character_index(span.cp),
            })
            .collect();
        let (runs, initial_scope) = fetcher.into_runs();
        let line_break = ls.break_record.take().map(|record| {
            let scope = scope_at(&runs, initial_scope.as_ref(), record.cp());
            TextLineBreak::new(scope, record)
        });
        let extent = LineExtent {
            length: ls.length,
            dependent_length: ls.dependent_length,
            newline_length: ls.newline_length,
            trailing_whitespace_length: ls.trailing_whitespace_length,
            width: ls.width,
            width_with_trailing: ls.width_with_trailing,
            ascent: ls.ascent,
            descent: ls.descent,
        };
        let props = settings.props;
        log::debug!(
            "formatted line at {}: {} positions, width {}",
            ls.cp_first,
            ls.length,
            ls.width
        );
        let mut line = Self {
            metrics: TextLineMetrics::new(
                &extent,
                props,
                settings.paragraph_width,
                props.line_indent(),
            ),
            cp_first: ls.cp_first,
            has_overflowed: ls.has_overflowed,
            is_truncated: ls.is_truncated,
            is_hyphenated: ls.is_hyphenated,
            ends_paragraph: ls.ends_paragraph,
            max_nesting_depth: ls.max_nesting_depth,
            flow_direction: props.flow_direction,
            mode: settings.mode,
            pixels_per_dip: props.default_text_run_properties.pixels_per_dip,
            hyphen_width: ls.hyphen_width,
            paragraph_width: settings.paragraph_width,
            clusters: ls.clusters,
            visual_order: ls.visual_order,
            spans,
            advances: ls.advances,
            runs,
            line_break,
            collapsed: None,
            disposed: false,
        };
        line.apply_ink();
        line
    }

    /// All measurements of the line.
    pub fn metrics(&self) -> &TextLineMetrics {
        &self.metrics
    }

    /// First character position.
    pub fn text_source_character_index(&self) -> usize {
        self.cp_first
    }

    /// Number of character positions, terminator included.
    pub fn length(&self) -> usize {
        self.metrics.length
    }

    /// Advance of the content without trailing whitespace.
    pub fn width(&self) -> f64 {
        self.metrics.width
    }

    /// Advance of the content with trailing whitespace.
    pub fn width_including_trailing_whitespace(&self) -> f64 {
        self.metrics.width_including_trailing_whitespace
    }

    /// Distance between the top of this line and the top of the next one.
    pub fn height(&self) -> f64 {
        self.metrics.height
    }

    /// Distance from the top of the line to its baseline.
    pub fn baseline(&self) -> f64 {
        self.metrics.baseline
    }

    /// Distance from the paragraph edge to the line start.
    pub fn start(&self) -> f64 {
        self.metrics.start
    }

    /// Positions taken by trailing whitespace.
    pub fn trailing_whitespace_length(&self) -> usize {
        self.metrics.trailing_whitespace_length
    }

    /// Positions taken by line terminators.
    pub fn newline_length(&self) -> usize {
        self.metrics.newline_length
    }

    /// Positions whose layout depends on the following line.
    pub fn dependent_length(&self) -> usize {
        self.metrics.dependent_length
    }

    /// The content is wider than the paragraph.
    pub fn has_overflowed(&self) -> bool {
        self.has_overflowed
    }

    /// The line was produced by [`collapse`](Self::collapse) and lost content.
    pub fn has_collapsed(&self) -> bool {
        self.collapsed.is_some()
    }

    /// A word was broken between two characters to fit the width.
    pub fn is_truncated(&self) -> bool {
        self.is_truncated
    }

    /// The line ends with a hyphenation break.
    pub fn is_hyphenated(&self) -> bool {
        self.is_hyphenated
    }

    /// The line holds the end of its paragraph.
    pub fn ends_paragraph(&self) -> bool {
        self.ends_paragraph
    }

    /// Deepest bidi embedding relative to the paragraph level.
    pub fn depth_of_nested_embeddings(&self) -> u8 {
        self.max_nesting_depth
    }

    /// Device pixels per device independent unit used for formatting.
    pub fn pixels_per_dip(&self) -> f32 {
        self.pixels_per_dip
    }

    /// Continuation state for the next line; `None` at the paragraph end.
    pub fn get_text_line_break(&self) -> Option<&TextLineBreak> {
        self.line_break.as_ref()
    }

    /// Runs of the line with the properties in effect for them.
    ///
    /// Each span covers the part of a run that lies on this line.
    pub fn get_text_run_spans(&self) -> Result<Vec<TextSpan<TextRun>>, Error> {
        self.check()?;
        Ok(self
            .spans
            .iter()
            .map(|span| TextSpan {
                length: span.len,
                value: self.span_run(span),
            })
            .collect())
    }

    /// Releases the line. Calling it again does nothing.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        if let Some(line_break) = &mut self.line_break {
            line_break.dispose();
        }
    }

    fn check(&self) -> Result<(), Error> {
        if self.disposed {
            Err(Error::disposed())
        } else {
            Ok(())
        }
    }

    fn is_rtl(&self) -> bool {
        self.flow_direction == FlowDirection::RightToLeft
    }

    fn cp_end(&self) -> usize {
        self.cp_first + self.metrics.length
    }

    /// The run of `span`, cut to the span when it covers characters.
    fn span_run(&self, span: &LineSpan) -> TextRun {
        let fetched = &self.runs[span.run];
        match &fetched.run {
            TextRun::Characters(characters)
                if span.cp != fetched.cp || span.len != fetched.run.length() =>
            {
                match characters.range.sub_range(span.cp - fetched.cp, span.len) {
                    Ok(range) => TextRun::Characters(crate::TextCharacters {
                        range,
                        properties: characters.properties.clone(),
                    }),
                    Err(_) => fetched.run.clone(),
                }
            }
            run => run.clone(),
        }
    }

    fn span_index(&self, cp: usize) -> Option<usize> {
        let index = self.spans.partition_point(|span| span.cp + span.len <= cp);
        (index < self.spans.len()).then_some(index)
    }

    /// The fetched run at `cp`.
    fn run_at(&self, cp: usize) -> Option<&FetchedRun> {
        self.span_index(cp)
            .map(|index| &self.runs[self.spans[index].run])
    }

    fn properties_at(&self, cp: usize) -> Option<&Arc<TextRunProperties>> {
        self.run_at(cp).and_then(|fetched| fetched.run.properties())
    }

    /// Whether a caret may stop at the cluster.
    fn is_navigable(&self, index: usize) -> bool {
        let cluster = &self.clusters[index];
        !cluster.is_newline
            && self.is_visible(cluster)
            && self.is_content_at(cluster.cp)
    }

    /// Whether `cp` holds characters or an object rather than a hidden run.
    fn is_content_at(&self, cp: usize) -> bool {
        self.run_at(cp).is_some_and(|fetched| {
            matches!(fetched.run, TextRun::Characters(_) | TextRun::EmbeddedObject(_))
        })
    }

    fn is_visible(&self, cluster: &LsCluster) -> bool {
        self.collapsed
            .as_ref()
            .is_none_or(|collapsed| cluster.cp < collapsed.cp())
    }

    /// Whether the cluster at `index` runs in the paragraph direction.
    fn is_forward(&self, index: usize) -> bool {
        (self.clusters[index].level & 1 == 1) == self.is_rtl()
    }
}
