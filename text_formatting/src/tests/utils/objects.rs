// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::sync::Arc;

use peniko::kurbo::{Point, Rect};

use crate::{
    ClientError, DrawingContext, FlowDirection, LineBreakCondition, TextEmbeddedObject,
    TextEmbeddedObjectMetrics, TextLexicalService, TextModifier, TextRunProperties,
};

/// Halves the em size of everything in its scope.
#[derive(Debug, Default)]
pub(crate) struct Shrink {
    direction: Option<FlowDirection>,
}

impl Shrink {
    /// A scope that also opens a right-to-left embedding.
    pub(crate) fn rtl() -> Self {
        Self {
            direction: Some(FlowDirection::RightToLeft),
        }
    }

    /// A scope that also opens a left-to-right embedding.
    pub(crate) fn ltr() -> Self {
        Self {
            direction: Some(FlowDirection::LeftToRight),
        }
    }
}

impl TextModifier for Shrink {
    fn modify_properties(&self, properties: &TextRunProperties) -> TextRunProperties {
        TextRunProperties {
            font_rendering_em_size: properties.font_rendering_em_size / 2.0,
            font_hinting_em_size: properties.font_hinting_em_size / 2.0,
            ..properties.clone()
        }
    }

    fn has_directional_embedding(&self) -> bool {
        self.direction.is_some()
    }

    fn flow_direction(&self) -> FlowDirection {
        self.direction.unwrap_or_default()
    }
}

/// A solid box of a fixed size.
#[derive(Debug)]
pub(crate) struct Block {
    pub(crate) width: f64,
    pub(crate) height: f64,
    pub(crate) break_before: LineBreakCondition,
    pub(crate) break_after: LineBreakCondition,
    properties: Arc<TextRunProperties>,
}

impl Block {
    pub(crate) fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            break_before: LineBreakCondition::BreakPossible,
            break_after: LineBreakCondition::BreakPossible,
            properties: Arc::new(TextRunProperties::default()),
        }
    }

    pub(crate) fn unbreakable(self) -> Self {
        Self {
            break_before: LineBreakCondition::BreakRestrained,
            break_after: LineBreakCondition::BreakRestrained,
            ..self
        }
    }
}

impl TextEmbeddedObject for Block {
    fn length(&self) -> usize {
        1
    }

    fn properties(&self) -> &Arc<TextRunProperties> {
        &self.properties
    }

    fn break_before(&self) -> LineBreakCondition {
        self.break_before
    }

    fn break_after(&self) -> LineBreakCondition {
        self.break_after
    }

    fn format(&self, _: f64) -> TextEmbeddedObjectMetrics {
        TextEmbeddedObjectMetrics {
            width: self.width,
            height: self.height,
            baseline: self.height,
        }
    }

    fn compute_bounding_box(&self, _: bool) -> Rect {
        Rect::new(0.0, -self.height, self.width, 0.0)
    }

    fn draw(&self, context: &mut dyn DrawingContext, origin: Point, _: bool) {
        let rect = self.compute_bounding_box(false) + origin.to_vec2();
        context.fill_rect(rect, self.properties.foreground);
    }
}

/// Allows a hyphen after every second letter of a word.
#[derive(Debug, Default)]
pub(crate) struct EveryOtherLetter;

impl TextLexicalService for EveryOtherLetter {
    fn hyphenate(&self, word: &[char], _: Option<&str>) -> Result<Vec<usize>, ClientError> {
        Ok((2..word.len().saturating_sub(1)).step_by(2).collect())
    }
}
