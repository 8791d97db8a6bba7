// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::sync::Arc;

use peniko::kurbo::{Point, Rect};

use crate::{CharacterBufferRange, DrawingContext, FlowDirection, TextRunProperties};

/// Whether a line may break next to an embedded object.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LineBreakCondition {
    /// A break is preferred.
    BreakDesired,
    /// A break is allowed if the neighbour allows it too.
    #[default]
    BreakPossible,
    /// No break.
    BreakRestrained,
    /// The line always ends here.
    BreakAlways,
}

/// Size of a formatted embedded object.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct TextEmbeddedObjectMetrics {
    /// Advance width.
    pub width: f64,
    /// Total height.
    pub height: f64,
    /// Distance from the top to the baseline.
    pub baseline: f64,
}

/// A client object laid out inline as one unit.
pub trait TextEmbeddedObject: core::fmt::Debug + Send + Sync {
    /// Number of character positions the object takes.
    fn length(&self) -> usize;

    /// Run properties of the object.
    fn properties(&self) -> &Arc<TextRunProperties>;

    /// Break condition before the object.
    fn break_before(&self) -> LineBreakCondition {
        LineBreakCondition::BreakPossible
    }

    /// Break condition after the object.
    fn break_after(&self) -> LineBreakCondition {
        LineBreakCondition::BreakPossible
    }

    /// Whether the size is independent of the remaining width.
    fn has_fixed_size(&self) -> bool {
        true
    }

    /// Measures the object given the width left on the line.
    fn format(&self, remaining_width: f64) -> TextEmbeddedObjectMetrics;

    /// Ink bounds relative to the object origin on the baseline.
    fn compute_bounding_box(&self, right_to_left: bool) -> Rect;

    /// Draws the object with its origin on the line baseline.
    fn draw(&self, context: &mut dyn DrawingContext, origin: Point, right_to_left: bool);
}

/// A run that changes the properties of the runs in its scope.
///
/// The scope lasts until the matching [`TextRun::EndOfSegment`].
pub trait TextModifier: core::fmt::Debug + Send + Sync {
    /// Number of character positions the modifier takes.
    fn length(&self) -> usize {
        1
    }

    /// Returns the properties of a run inside the scope.
    fn modify_properties(&self, properties: &TextRunProperties) -> TextRunProperties;

    /// Whether the scope opens a bidi embedding.
    fn has_directional_embedding(&self) -> bool {
        false
    }

    /// Direction of the embedding.
    fn flow_direction(&self) -> FlowDirection {
        FlowDirection::LeftToRight
    }
}

/// Characters sharing one set of properties.
#[derive(Clone, Debug)]
pub struct TextCharacters {
    /// The characters.
    pub range: CharacterBufferRange,
    /// Their properties.
    pub properties: Arc<TextRunProperties>,
}

/// A line or paragraph terminator.
#[derive(Clone, Debug)]
pub struct TextEndOfLine {
    /// Number of character positions the terminator takes.
    pub length: usize,
    /// Properties used for the terminator extent.
    pub properties: Option<Arc<TextRunProperties>>,
}

/// A piece of content returned by a [`TextSource`](crate::TextSource).
#[derive(Clone, Debug)]
pub enum TextRun {
    /// Shapeable characters.
    Characters(TextCharacters),
    /// An inline object.
    EmbeddedObject(Arc<dyn TextEmbeddedObject>),
    /// Explicit end of a line inside a paragraph.
    EndOfLine(TextEndOfLine),
    /// End of the paragraph.
    EndOfParagraph(TextEndOfLine),
    /// End of the innermost modifier scope.
    EndOfSegment {
        /// Number of character positions.
        length: usize,
    },
    /// Positions that are neither shown nor measured.
    Hidden {
        /// Number of character positions.
        length: usize,
    },
    /// Start of a modifier scope.
    Modifier(Arc<dyn TextModifier>),
}

impl TextRun {
    /// A characters run over a copy of `text`.
    pub fn from_text(text: &str, properties: Arc<TextRunProperties>) -> Self {
        Self::Characters(TextCharacters {
            range: CharacterBufferRange::from_text(text),
            properties,
        })
    }

    /// A paragraph terminator taking `length` positions.
    pub fn end_of_paragraph(length: usize) -> Self {
        Self::EndOfParagraph(TextEndOfLine {
            length,
            properties: None,
        })
    }

    /// A line terminator taking `length` positions.
    pub fn end_of_line(length: usize) -> Self {
        Self::EndOfLine(TextEndOfLine {
            length,
            properties: None,
        })
    }

    /// Number of character positions the run consumes.
    pub fn length(&self) -> usize {
        match self {
            Self::Characters(characters) => characters.range.len(),
            Self::EmbeddedObject(object) => object.length(),
            Self::EndOfLine(end) | Self::EndOfParagraph(end) => end.length,
            Self::EndOfSegment { length } | Self::Hidden { length } => *length,
            Self::Modifier(modifier) => modifier.length(),
        }
    }

    /// Properties of the run; modifiers and hidden runs have none.
    pub fn properties(&self) -> Option<&Arc<TextRunProperties>> {
        match self {
            Self::Characters(characters) => Some(&characters.properties),
            Self::EmbeddedObject(object) => Some(object.properties()),
            Self::EndOfLine(end) | Self::EndOfParagraph(end) => end.properties.as_ref(),
            Self::EndOfSegment { .. } | Self::Hidden { .. } | Self::Modifier(_) => None,
        }
    }

    /// Characters of the run; empty for everything but characters runs.
    pub fn characters(&self) -> &[char] {
        match self {
            Self::Characters(characters) => characters.range.as_slice(),
            _ => &[],
        }
    }

    /// The same run with `properties`, for runs that carry properties.
    pub(crate) fn with_properties(&self, properties: Arc<TextRunProperties>) -> Self {
        match self {
            Self::Characters(characters) => Self::Characters(TextCharacters {
                range: characters.range.clone(),
                properties,
            }),
            Self::EndOfLine(end) => Self::EndOfLine(TextEndOfLine {
                length: end.length,
                properties: Some(properties),
            }),
            Self::EndOfParagraph(end) => Self::EndOfParagraph(TextEndOfLine {
                length: end.length,
                properties: Some(properties),
            }),
            _ => self.clone(),
        }
    }
}
