// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Run and paragraph properties.

mod typeface;

pub use typeface::{FixedPitchTypeface, FontTypeface, MappedTypeface, Typeface};

use alloc::sync::Arc;
use alloc::vec::Vec;

use peniko::Color;
use peniko::color::palette::css;

use crate::source::TextLexicalService;
use crate::TextRun;

/// How glyph metrics are rounded.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TextFormattingMode {
    /// Metrics are used as designed.
    #[default]
    Ideal,
    /// Advances are rounded to whole device pixels.
    Display,
}

/// Direction of the paragraph.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FlowDirection {
    /// Lines run from left to right.
    #[default]
    LeftToRight,
    /// Lines run from right to left.
    RightToLeft,
}

/// Horizontal placement of lines.
///
/// `Left` and `Right` refer to physical sides regardless of the flow
/// direction.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TextAlignment {
    /// Lines hug the left edge.
    #[default]
    Left,
    /// Lines hug the right edge.
    Right,
    /// Lines are centered.
    Center,
    /// Lines other than the last one of a paragraph fill the width.
    Justify,
}

/// Wrapping behavior of a paragraph.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TextWrapping {
    /// Words wider than the paragraph are broken between characters.
    #[default]
    Wrap,
    /// Words wider than the paragraph overflow it.
    WrapWithOverflow,
    /// Lines only end at explicit breaks.
    NoWrap,
}

/// How strictly words of CJK and Hangul text may be broken.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BreakStrategy {
    /// Default line breaking rules.
    #[default]
    Normal,
    /// Never break inside CJK words.
    KeepAll,
    /// Break between any two letters.
    BreakAll,
}

/// Vertical placement of a run relative to the line baseline.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BaselineAlignment {
    /// On the baseline.
    #[default]
    Baseline,
    /// Raised by a third of the em size.
    Superscript,
    /// Lowered by a fifth of the em size.
    Subscript,
}

/// Lines drawn through or along a run.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextDecorations {
    /// Below the baseline.
    pub underline: bool,
    /// Through the middle of lower case letters.
    pub strikethrough: bool,
    /// Above the ascent.
    pub overline: bool,
}

/// Formatting properties of a run.
#[derive(Clone, Debug)]
pub struct TextRunProperties {
    /// Metrics source.
    pub typeface: Arc<dyn Typeface>,
    /// Em size used for layout, in device independent units.
    pub font_rendering_em_size: f64,
    /// Em size used for hinting.
    pub font_hinting_em_size: f64,
    /// BCP 47 language tag.
    pub culture: Option<Arc<str>>,
    /// Glyph colour.
    pub foreground: Color,
    /// Fill behind the run.
    pub background: Option<Color>,
    /// Decoration lines.
    pub decorations: TextDecorations,
    /// Baseline shift.
    pub baseline_alignment: BaselineAlignment,
    /// Device pixels per device independent unit.
    pub pixels_per_dip: f32,
}

impl Default for TextRunProperties {
    fn default() -> Self {
        Self {
            typeface: Arc::new(FixedPitchTypeface::default()),
            font_rendering_em_size: 16.0,
            font_hinting_em_size: 16.0,
            culture: None,
            foreground: css::BLACK,
            background: None,
            decorations: TextDecorations::default(),
            baseline_alignment: BaselineAlignment::Baseline,
            pixels_per_dip: 1.0,
        }
    }
}

impl TextRunProperties {
    /// Offset of the run baseline from the line baseline, positive upwards.
    pub fn baseline_shift(&self) -> f64 {
        match self.baseline_alignment {
            BaselineAlignment::Baseline => 0.0,
            BaselineAlignment::Superscript => self.font_rendering_em_size / 3.0,
            BaselineAlignment::Subscript => -self.font_rendering_em_size / 5.0,
        }
    }
}

/// Alignment of the text following a tab stop.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TextTabAlignment {
    /// The text starts at the stop.
    #[default]
    Left,
    /// The text is centered on the stop.
    Center,
    /// The text ends at the stop.
    Right,
    /// The aligning character sits at the stop.
    ///
    /// Laid out like [`TextTabAlignment::Left`].
    Character,
}

/// A user defined tab stop.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextTabProperties {
    /// Alignment of the following text.
    pub alignment: TextTabAlignment,
    /// Distance from the line start.
    pub location: f64,
    /// Character repeated in the tab gap.
    pub tab_leader: Option<char>,
    /// Character aligned with [`TextTabAlignment::Character`].
    pub aligning_char: Option<char>,
}

/// Formatting properties of a paragraph.
#[derive(Clone, Debug)]
pub struct TextParagraphProperties {
    /// Paragraph direction.
    pub flow_direction: FlowDirection,
    /// Line placement.
    pub text_alignment: TextAlignment,
    /// Whether the next line to format is the first one of the paragraph.
    pub first_line_in_paragraph: bool,
    /// Whether lines may always be collapsed.
    pub always_collapsible: bool,
    /// Properties of runs that do not bring their own.
    pub default_text_run_properties: Arc<TextRunProperties>,
    /// Wrapping behavior.
    pub text_wrapping: TextWrapping,
    /// Fixed line height; zero or negative means the height of the content.
    pub line_height: f64,
    /// Extra indentation of the first line.
    pub indent: f64,
    /// Indentation of every line.
    pub paragraph_indent: f64,
    /// User defined tab stops, sorted by location.
    pub tabs: Vec<TextTabProperties>,
    /// Distance between implicit tab stops; zero or negative means four
    /// times the default em size.
    pub default_incremental_tab: f64,
    /// Hyphenation service; hyphenation is off when absent.
    pub text_lexical_service: Option<Arc<dyn TextLexicalService>>,
    /// Word breaking strictness.
    pub break_strategy: BreakStrategy,
}

impl Default for TextParagraphProperties {
    fn default() -> Self {
        Self::new(Arc::new(TextRunProperties::default()))
    }
}

impl TextParagraphProperties {
    /// Creates left-to-right paragraph properties around `default_run`.
    pub fn new(default_run: Arc<TextRunProperties>) -> Self {
        Self {
            flow_direction: FlowDirection::LeftToRight,
            text_alignment: TextAlignment::Left,
            first_line_in_paragraph: true,
            always_collapsible: false,
            default_text_run_properties: default_run,
            text_wrapping: TextWrapping::Wrap,
            line_height: 0.0,
            indent: 0.0,
            paragraph_indent: 0.0,
            tabs: Vec::new(),
            default_incremental_tab: 0.0,
            text_lexical_service: None,
            break_strategy: BreakStrategy::Normal,
        }
    }

    /// Indentation of the line about to be formatted.
    pub(crate) fn line_indent(&self) -> f64 {
        self.indent_for(self.first_line_in_paragraph)
    }

    /// Indentation of a line, which may be the first of the paragraph.
    pub(crate) fn indent_for(&self, first_line: bool) -> f64 {
        let first = if first_line { self.indent } else { 0.0 };
        (self.paragraph_indent + first).max(0.0)
    }

    pub(crate) fn incremental_tab(&self) -> f64 {
        if self.default_incremental_tab > 0.0 {
            self.default_incremental_tab
        } else {
            4.0 * self.default_text_run_properties.font_rendering_em_size
        }
    }
}

/// Where a collapsed line is cut.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TextCollapsingStyle {
    /// After the last character that fits.
    #[default]
    TrailingCharacter,
    /// After the last whole word that fits.
    TrailingWord,
}

/// Parameters of [`TextLine::collapse`](crate::TextLine::collapse).
#[derive(Clone, Debug)]
pub struct TextCollapsingProperties {
    /// Width the collapsed line has to fit in.
    pub width: f64,
    /// Symbol shown in place of the removed content, usually an ellipsis.
    pub symbol: TextRun,
    /// Cut granularity.
    pub style: TextCollapsingStyle,
}

impl TextCollapsingProperties {
    /// An ellipsis with `properties`, cut after whole characters.
    pub fn character_ellipsis(width: f64, properties: Arc<TextRunProperties>) -> Self {
        Self {
            width,
            symbol: TextRun::from_text("\u{2026}", properties),
            style: TextCollapsingStyle::TrailingCharacter,
        }
    }

    /// An ellipsis with `properties`, cut after whole words.
    pub fn word_ellipsis(width: f64, properties: Arc<TextRunProperties>) -> Self {
        Self {
            style: TextCollapsingStyle::TrailingWord,
            ..Self::character_ellipsis(width, properties)
        }
    }
}
