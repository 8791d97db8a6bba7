// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Glyph runs, bounds and drawing.

use alloc::sync::Arc;
use alloc::vec::Vec;

use line_services::Ideal;
use peniko::Color;
use peniko::kurbo::{Point, Rect, Vec2};

use crate::convert::ideal_to_real;
use crate::{CharacterHit, Error, FlowDirection, TextLine, TextRun, TextRunProperties};

/// Receives the output of [`TextLine::draw`].
pub trait DrawingContext {
    /// Fills a rectangle, used for backgrounds and decorations.
    fn fill_rect(&mut self, rect: Rect, color: Color);

    /// Draws positioned glyphs.
    fn draw_glyph_run(&mut self, run: &GlyphRun);
}

/// Glyphs of one run laid out left to right from `origin`.
#[derive(Clone, Debug)]
pub struct GlyphRun {
    /// Left end of the run on its baseline.
    pub origin: Point,
    /// Em size of the glyphs.
    pub em_size: f64,
    /// Glyph of every character, in visual order.
    pub glyph_indices: Vec<u32>,
    /// Advance of every glyph.
    pub advances: Vec<f64>,
    /// Characters of the run, in visual order.
    pub characters: Vec<char>,
    /// Resolved bidi level.
    pub bidi_level: u8,
    /// Properties the glyphs are drawn with.
    pub properties: Arc<TextRunProperties>,
}

impl GlyphRun {
    /// Sum of the advances.
    pub fn width(&self) -> f64 {
        self.advances.iter().sum()
    }
}

/// A glyph run with the character positions it was produced from.
#[derive(Clone, Debug)]
pub struct IndexedGlyphRun {
    /// First character position.
    pub text_source_character_index: usize,
    /// Number of character positions.
    pub text_source_length: usize,
    /// First position in text effect coordinates.
    pub text_effect_character_index: usize,
    /// The glyphs, positioned relative to the top left corner of the line.
    pub glyph_run: GlyphRun,
}

/// Bounds of the part of a range that comes from one run.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TextRunBounds {
    /// First character position.
    pub text_source_character_index: usize,
    /// Number of character positions.
    pub length: usize,
    /// The bounds.
    pub rectangle: Rect,
}

/// Bounds of a visually contiguous part of a range.
#[derive(Clone, Debug, PartialEq)]
pub struct TextBounds {
    /// The bounds; horizontal coordinates are distances in the flow
    /// direction, vertical ones are relative to the line top.
    pub rectangle: Rect,
    /// Direction of the content inside the bounds.
    pub flow_direction: FlowDirection,
    /// Bounds per run.
    pub text_run_bounds: Vec<TextRunBounds>,
}

fn direction(level: u8) -> FlowDirection {
    if level & 1 == 1 {
        FlowDirection::RightToLeft
    } else {
        FlowDirection::LeftToRight
    }
}

fn touches(rect: &Rect, lo: f64, hi: f64) -> bool {
    (lo - rect.x1).abs() < 1e-9 || (hi - rect.x0).abs() < 1e-9
}

impl TextLine {
    /// Bounds of the visible parts of `length` positions from `first_cp`.
    ///
    /// A range covering no visible content yields one empty rectangle at the
    /// caret position of `first_cp`.
    pub fn get_text_bounds(&self, first_cp: usize, length: usize) -> Result<Vec<TextBounds>, Error> {
        self.check()?;
        let end = first_cp.saturating_add(length);
        let height = self.metrics.height;
        let mut bounds: Vec<TextBounds> = Vec::new();
        for index in &self.visual_order {
            let cluster = &self.clusters[*index];
            if cluster.is_newline
                || !self.is_visible(cluster)
                || cluster.cp + cluster.len <= first_cp
                || cluster.cp >= end
            {
                continue;
            }
            let lo = self.metrics.start + ideal_to_real(cluster.flow_x);
            let hi = lo + ideal_to_real(cluster.advance);
            let rect = Rect::new(lo, 0.0, hi, height);
            let flow_direction = direction(cluster.level);
            let extends = bounds.last().is_some_and(|last| {
                last.flow_direction == flow_direction && touches(&last.rectangle, lo, hi)
            });
            if !extends {
                bounds.push(TextBounds {
                    rectangle: rect,
                    flow_direction,
                    text_run_bounds: Vec::new(),
                });
            }
            let count = bounds.len();
            let merged = &mut bounds[count - 1];
            merged.rectangle = merged.rectangle.union(rect);
            let span = self.span_index(cluster.cp);
            match merged.text_run_bounds.last_mut() {
                Some(run)
                    if self.span_index(run.text_source_character_index) == span
                        && touches(&run.rectangle, lo, hi) =>
                {
                    run.rectangle = run.rectangle.union(rect);
                    run.text_source_character_index =
                        run.text_source_character_index.min(cluster.cp);
                    run.length += cluster.len;
                }
                _ => merged.text_run_bounds.push(TextRunBounds {
                    text_source_character_index: cluster.cp,
                    length: cluster.len,
                    rectangle: rect,
                }),
            }
        }
        if bounds.is_empty() {
            let x = self.get_distance_from_character_hit(CharacterHit::new(first_cp, 0))?;
            bounds.push(TextBounds {
                rectangle: Rect::new(x, 0.0, x, height),
                flow_direction: self.flow_direction,
                text_run_bounds: Vec::new(),
            });
        }
        Ok(bounds)
    }

    /// Glyph runs of the line, positioned relative to its top left corner.
    ///
    /// A collapsed line yields the collapsing symbol in place of the removed
    /// content and a hyphenated line yields the inserted hyphen.
    pub fn get_indexed_glyph_runs(&self) -> Result<Vec<IndexedGlyphRun>, Error> {
        self.check()?;
        let mut glyph_runs = Vec::new();
        let mut group: Vec<usize> = Vec::new();
        let mut key = None;
        for index in &self.visual_order {
            let cluster = &self.clusters[*index];
            let span = self.span_index(cluster.cp);
            let is_text = span.is_some_and(|span| {
                matches!(
                    self.runs[self.spans[span].run].run,
                    TextRun::Characters(_)
                )
            });
            if cluster.is_newline || !self.is_visible(cluster) || !is_text {
                self.flush_group(&mut group, &mut glyph_runs);
                key = None;
                continue;
            }
            if key != Some((span, cluster.level)) {
                self.flush_group(&mut group, &mut glyph_runs);
                key = Some((span, cluster.level));
            }
            group.push(*index);
        }
        self.flush_group(&mut group, &mut glyph_runs);

        if let Some(hyphen) = self.hyphen_run() {
            glyph_runs.push(hyphen);
        }
        if let Some(collapsed) = &self.collapsed {
            if let TextRun::Characters(symbol) = &collapsed.symbol {
                let width: Ideal = collapsed.symbol_advances.iter().sum();
                let cp = collapsed.cp();
                glyph_runs.push(IndexedGlyphRun {
                    text_source_character_index: cp,
                    text_source_length: collapsed.range.length,
                    text_effect_character_index: self.text_effect_cp(cp),
                    glyph_run: self.glyph_run(
                        collapsed.symbol_x,
                        width,
                        symbol.range.as_slice().to_vec(),
                        collapsed
                            .symbol_advances
                            .iter()
                            .map(|advance| ideal_to_real(*advance))
                            .collect(),
                        u8::from(self.is_rtl()),
                        symbol.properties.clone(),
                    ),
                });
            }
        }
        Ok(glyph_runs)
    }

    /// Draws the line with its top left corner at `origin`.
    ///
    /// Backgrounds come first, then glyphs with their decorations, then
    /// embedded objects.
    pub fn draw(&self, context: &mut dyn DrawingContext, origin: Point) -> Result<(), Error> {
        let glyph_runs = self.get_indexed_glyph_runs()?;
        let offset = origin.to_vec2();
        for indexed in &glyph_runs {
            let run = &indexed.glyph_run;
            if let Some(background) = run.properties.background {
                let rect = Rect::new(run.origin.x, 0.0, run.origin.x + run.width(), self.metrics.height);
                context.fill_rect(rect + offset, background);
            }
        }
        for indexed in &glyph_runs {
            let mut run = indexed.glyph_run.clone();
            run.origin += offset;
            context.draw_glyph_run(&run);
            self.draw_decorations(context, &run);
        }
        for index in &self.visual_order {
            let cluster = &self.clusters[*index];
            if !self.is_visible(cluster) {
                continue;
            }
            let Some(TextRun::EmbeddedObject(object)) =
                self.run_at(cluster.cp).map(|fetched| &fetched.run)
            else {
                continue;
            };
            let x = self.physical_x(cluster.flow_x, cluster.advance);
            let point = Point::new(x, self.metrics.baseline) + offset;
            object.draw(context, point, cluster.level & 1 == 1);
        }
        Ok(())
    }

    fn draw_decorations(&self, context: &mut dyn DrawingContext, run: &GlyphRun) {
        let properties = &run.properties;
        let decorations = properties.decorations;
        let em = properties.font_rendering_em_size;
        let size = em * 0.05;
        let (x0, x1) = (run.origin.x, run.origin.x + run.width());
        let baseline = run.origin.y;
        let mut line = |top: f64| {
            context.fill_rect(Rect::new(x0, top, x1, top + size), properties.foreground);
        };
        if decorations.underline {
            line(baseline + em * 0.1);
        }
        if decorations.strikethrough {
            line(baseline - em * 0.3);
        }
        if decorations.overline {
            line(baseline - properties.typeface.ascent() * em);
        }
    }

    /// Ink box of the glyphs and objects, from the top left corner of the line.
    fn ink_bounds(&self) -> Option<Rect> {
        let mut ink: Option<Rect> = None;
        let mut add = |rect: Rect| ink = Some(ink.map_or(rect, |ink| ink.union(rect)));
        for indexed in self.get_indexed_glyph_runs().ok()? {
            let run = &indexed.glyph_run;
            let mut pen = run.origin.x;
            for (ch, advance) in run.characters.iter().zip(&run.advances) {
                if let Some(glyph) = run.properties.typeface.ink_bounds(*ch) {
                    add(glyph.scale_from_origin(run.em_size) + Vec2::new(pen, run.origin.y));
                }
                pen += advance;
            }
        }
        let top = self.metrics.baseline - self.metrics.text_baseline;
        for cluster in self.clusters.iter().filter(|cluster| self.is_visible(cluster)) {
            let run = self.run_at(cluster.cp).map(|fetched| &fetched.run);
            if let Some(TextRun::EmbeddedObject(_)) = run {
                let x = self.physical_x(cluster.flow_x, cluster.advance);
                let right = x + ideal_to_real(cluster.advance);
                add(Rect::new(x, top, right, top + self.metrics.text_height));
            }
        }
        ink
    }

    /// Derives the ink metrics from the glyphs of the line.
    pub(super) fn apply_ink(&mut self) {
        let Some(ink) = self.ink_bounds() else {
            let metrics = &mut self.metrics;
            metrics.extent = 0.0;
            metrics.overhang_leading = 0.0;
            metrics.overhang_trailing = 0.0;
            metrics.overhang_after = 0.0;
            return;
        };
        let edge = self.physical_x(0, 0);
        let width = self.metrics.width;
        let (leading, trailing) = if self.is_rtl() {
            (edge - ink.x1, ink.x0 - (edge - width))
        } else {
            (ink.x0 - edge, edge + width - ink.x1)
        };
        let metrics = &mut self.metrics;
        metrics.extent = ink.height();
        metrics.overhang_leading = leading;
        metrics.overhang_trailing = trailing;
        metrics.overhang_after = (ink.y1 - metrics.height).max(0.0);
    }

    /// Physical left edge, from the top left corner of the line box, of
    /// content at flow position `flow_x`.
    fn physical_x(&self, flow_x: Ideal, advance: Ideal) -> f64 {
        let flow = self.metrics.start + ideal_to_real(flow_x);
        if self.is_rtl() {
            let reference = self.paragraph_width.unwrap_or(
                self.metrics.start + self.metrics.width_including_trailing_whitespace,
            );
            reference - flow - ideal_to_real(advance)
        } else {
            flow
        }
    }

    fn text_effect_cp(&self, cp: usize) -> usize {
        self.span_index(cp)
            .map_or(cp, |index| {
                let span = &self.spans[index];
                span.text_effect_cp + (cp - span.cp)
            })
    }

    fn glyph_run(
        &self,
        flow_x: Ideal,
        width: Ideal,
        characters: Vec<char>,
        advances: Vec<f64>,
        bidi_level: u8,
        properties: Arc<TextRunProperties>,
    ) -> GlyphRun {
        let origin = Point::new(
            self.physical_x(flow_x, width),
            self.metrics.baseline - properties.baseline_shift(),
        );
        GlyphRun {
            origin,
            em_size: properties.font_rendering_em_size,
            glyph_indices: characters
                .iter()
                .map(|ch| properties.typeface.glyph_index(*ch))
                .collect(),
            advances,
            characters,
            bidi_level,
            properties,
        }
    }

    fn flush_group(&self, group: &mut Vec<usize>, glyph_runs: &mut Vec<IndexedGlyphRun>) {
        let Some(&first) = group.first() else {
            return;
        };
        let Some(properties) = self.properties_at(self.clusters[first].cp).cloned() else {
            group.clear();
            return;
        };
        let mut characters = Vec::new();
        let mut advances = Vec::new();
        let (mut cp, mut end) = (usize::MAX, 0);
        let mut width: Ideal = 0;
        let mut flow_lo = Ideal::MAX;
        for index in group.iter() {
            let cluster = &self.clusters[*index];
            let offset = cluster.cp - self.cp_first;
            let fetched = self.run_at(cluster.cp);
            let chars = fetched.map_or(&[][..], |fetched| fetched.run.characters());
            let base = fetched.map_or(cluster.cp, |fetched| fetched.cp);
            for position in 0..cluster.len {
                if let Some(ch) = chars.get(cluster.cp - base + position) {
                    characters.push(*ch);
                    advances.push(ideal_to_real(self.advances[offset + position]));
                }
            }
            cp = cp.min(cluster.cp);
            end = end.max(cluster.cp + cluster.len);
            width = width.saturating_add(cluster.advance);
            flow_lo = flow_lo.min(cluster.flow_x);
        }
        let level = self.clusters[first].level;
        glyph_runs.push(IndexedGlyphRun {
            text_source_character_index: cp,
            text_source_length: end - cp,
            text_effect_character_index: self.text_effect_cp(cp),
            glyph_run: self.glyph_run(flow_lo, width, characters, advances, level, properties),
        });
        group.clear();
    }

    fn hyphen_run(&self) -> Option<IndexedGlyphRun> {
        if !self.is_hyphenated || self.hyphen_width <= 0 || self.collapsed.is_some() {
            return None;
        }
        let last = self
            .clusters
            .iter()
            .rev()
            .find(|cluster| !cluster.is_whitespace)?;
        let properties = self.properties_at(last.cp)?.clone();
        let content = self.clusters.iter().fold(0, |width: Ideal, cluster| {
            if cluster.is_whitespace {
                width
            } else {
                width.max(cluster.flow_x.saturating_add(cluster.advance))
            }
        });
        let cp = last.cp + last.len;
        Some(IndexedGlyphRun {
            text_source_character_index: cp,
            text_source_length: 0,
            text_effect_character_index: self.text_effect_cp(last.cp) + last.len,
            glyph_run: self.glyph_run(
                content,
                self.hyphen_width,
                alloc::vec!['-'],
                alloc::vec![ideal_to_real(self.hyphen_width)],
                u8::from(self.is_rtl()),
                properties,
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::utils::{Recorder, format, text_source};
    use crate::{TextDecorations, TextFormatter, TextFormattingMode, TextParagraphProperties};
    use peniko::color::palette::css;

    #[test]
    fn bounds_merge_adjacent_clusters() {
        let formatter = TextFormatter::create(TextFormattingMode::Ideal);
        let line = format(
            &formatter,
            &text_source("hello"),
            0,
            1000.0,
            &TextParagraphProperties {
                indent: 2.0,
                ..TextParagraphProperties::default()
            },
            None,
        );
        let bounds = line.get_text_bounds(1, 3).unwrap();
        assert_eq!(bounds.len(), 1);
        assert_eq!(bounds[0].rectangle, Rect::new(10.0, 0.0, 34.0, 16.0));
        assert_eq!(bounds[0].text_run_bounds.len(), 1);
        assert_eq!(bounds[0].text_run_bounds[0].length, 3);
        let empty = line.get_text_bounds(5, 1).unwrap();
        assert_eq!(empty[0].rectangle.width(), 0.0);
    }

    #[test]
    fn drawing_emits_backgrounds_glyphs_and_decorations() {
        let formatter = TextFormatter::create(TextFormattingMode::Ideal);
        let run = crate::TextRunProperties {
            background: Some(css::YELLOW),
            decorations: TextDecorations {
                underline: true,
                ..TextDecorations::default()
            },
            ..crate::TextRunProperties::default()
        };
        let props = TextParagraphProperties::new(Arc::new(run));
        let source = crate::tests::utils::RunsSource::new()
            .text_with("abc", props.default_text_run_properties.clone())
            .end_of_paragraph();
        let line = format(&formatter, &source, 0, 1000.0, &props, None);
        let mut recorder = Recorder::default();
        line.draw(&mut recorder, Point::new(100.0, 0.0)).unwrap();
        assert_eq!(recorder.glyph_runs.len(), 1);
        let glyphs = &recorder.glyph_runs[0];
        assert_eq!(glyphs.origin, Point::new(100.0, 12.8));
        assert_eq!(glyphs.characters, ['a', 'b', 'c']);
        assert_eq!(glyphs.width(), 24.0);
        assert_eq!(recorder.rects.len(), 2);
        assert_eq!(recorder.rects[0], (Rect::new(100.0, 0.0, 124.0, 16.0), css::YELLOW));
        assert_eq!(recorder.rects[1].1, css::BLACK);
    }

    #[test]
    fn glyph_runs_record_text_effect_positions() {
        let formatter = TextFormatter::create(TextFormattingMode::Ideal);
        let source = crate::tests::utils::RunsSource::new()
            .text("ab")
            .text("cd")
            .end_of_paragraph()
            .with_effect_offset(100);
        let line = format(
            &formatter,
            &source,
            0,
            1000.0,
            &TextParagraphProperties::default(),
            None,
        );
        let runs = line.get_indexed_glyph_runs().unwrap();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[1].text_source_character_index, 2);
        assert_eq!(runs[1].text_effect_character_index, 102);
        assert_eq!(runs[1].glyph_run.origin.x, 16.0);
    }
}
