// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::sync::Arc;

use hashbrown::HashMap;
use peniko::kurbo::Rect;
use skrifa::instance::{LocationRef, Size};
use skrifa::{FontRef, MetadataProvider};

use crate::Error;

/// Source of glyph metrics for a run.
///
/// All values are relative to the em size.
pub trait Typeface: core::fmt::Debug + Send + Sync {
    /// Advance of `ch`.
    fn advance(&self, ch: char) -> f64;

    /// Distance from the baseline to the top of the line.
    fn ascent(&self) -> f64;

    /// Distance from the baseline to the bottom of the line.
    fn descent(&self) -> f64;

    /// Extra space between lines.
    fn line_gap(&self) -> f64 {
        0.0
    }

    /// Glyph identifier for `ch`.
    fn glyph_index(&self, ch: char) -> u32 {
        u32::from(ch)
    }

    /// Ink box of the glyph for `ch` around its origin on the baseline, with
    /// y growing downwards. `None` for glyphs without ink.
    ///
    /// Defaults to the advance by the ascent and descent.
    fn ink_bounds(&self, ch: char) -> Option<Rect> {
        (!ch.is_whitespace()).then(|| Rect::new(0.0, -self.ascent(), self.advance(ch), self.descent()))
    }
}

/// A typeface in which every character has the same advance.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FixedPitchTypeface {
    /// Advance of every character.
    pub advance: f64,
    /// Ascent.
    pub ascent: f64,
    /// Descent.
    pub descent: f64,
}

impl Default for FixedPitchTypeface {
    fn default() -> Self {
        Self {
            advance: 0.5,
            ascent: 0.8,
            descent: 0.2,
        }
    }
}

impl Typeface for FixedPitchTypeface {
    fn advance(&self, _: char) -> f64 {
        self.advance
    }

    fn ascent(&self) -> f64 {
        self.ascent
    }

    fn descent(&self) -> f64 {
        self.descent
    }
}

/// A typeface with per character advances.
#[derive(Clone, Debug, Default)]
pub struct MappedTypeface {
    advances: HashMap<char, f64>,
    default_advance: f64,
    ascent: f64,
    descent: f64,
}

impl MappedTypeface {
    /// Creates a typeface where unmapped characters use `default_advance`.
    pub fn new(default_advance: f64, ascent: f64, descent: f64) -> Self {
        Self {
            advances: HashMap::new(),
            default_advance,
            ascent,
            descent,
        }
    }

    /// Sets the advance of `ch`.
    pub fn with_advance(mut self, ch: char, advance: f64) -> Self {
        self.advances.insert(ch, advance);
        self
    }
}

impl Typeface for MappedTypeface {
    fn advance(&self, ch: char) -> f64 {
        self.advances.get(&ch).copied().unwrap_or(self.default_advance)
    }

    fn ascent(&self) -> f64 {
        self.ascent
    }

    fn descent(&self) -> f64 {
        self.descent
    }
}

/// An OpenType font read with `skrifa`.
#[derive(Clone)]
pub struct FontTypeface {
    data: Arc<[u8]>,
    index: u32,
    units_per_em: f64,
    ascent: f64,
    descent: f64,
    line_gap: f64,
}

impl core::fmt::Debug for FontTypeface {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FontTypeface")
            .field("data", &self.data.len())
            .field("index", &self.index)
            .field("units_per_em", &self.units_per_em)
            .field("ascent", &self.ascent)
            .field("descent", &self.descent)
            .field("line_gap", &self.line_gap)
            .finish()
    }
}

impl FontTypeface {
    /// Reads the font at `index` of a font file or collection.
    pub fn new(data: Arc<[u8]>, index: u32) -> Result<Self, Error> {
        let font = FontRef::from_index(&data, index).map_err(|_| Error::invalid_argument("data"))?;
        let metrics = font.metrics(Size::unscaled(), LocationRef::default());
        let units_per_em = f64::from(metrics.units_per_em.max(1));
        Ok(Self {
            units_per_em,
            ascent: f64::from(metrics.ascent) / units_per_em,
            descent: -f64::from(metrics.descent) / units_per_em,
            line_gap: f64::from(metrics.leading) / units_per_em,
            data,
            index,
        })
    }

    fn font(&self) -> Option<FontRef<'_>> {
        FontRef::from_index(&self.data, self.index).ok()
    }
}

impl Typeface for FontTypeface {
    fn advance(&self, ch: char) -> f64 {
        let Some(font) = self.font() else {
            return 0.0;
        };
        let glyph = font.charmap().map(ch).unwrap_or_default();
        font.glyph_metrics(Size::unscaled(), LocationRef::default())
            .advance_width(glyph)
            .map_or(0.0, |advance| f64::from(advance) / self.units_per_em)
    }

    fn ascent(&self) -> f64 {
        self.ascent
    }

    fn descent(&self) -> f64 {
        self.descent
    }

    fn line_gap(&self) -> f64 {
        self.line_gap
    }

    fn glyph_index(&self, ch: char) -> u32 {
        self.font()
            .and_then(|font| font.charmap().map(ch))
            .map_or(0, |glyph| glyph.to_u32())
    }

    fn ink_bounds(&self, ch: char) -> Option<Rect> {
        let font = self.font()?;
        let glyph = font.charmap().map(ch)?;
        let bounds = font
            .glyph_metrics(Size::unscaled(), LocationRef::default())
            .bounds(glyph)?;
        let scale = self.units_per_em;
        Some(Rect::new(
            f64::from(bounds.x_min) / scale,
            -f64::from(bounds.y_max) / scale,
            f64::from(bounds.x_max) / scale,
            -f64::from(bounds.y_min) / scale,
        ))
    }
}
