// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use peniko::Color;
use peniko::kurbo::Rect;

use crate::{DrawingContext, GlyphRun};

/// Drawing context that keeps everything it is asked to draw.
#[derive(Debug, Default)]
pub(crate) struct Recorder {
    pub(crate) rects: Vec<(Rect, Color)>,
    pub(crate) glyph_runs: Vec<GlyphRun>,
}

impl DrawingContext for Recorder {
    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.rects.push((rect, color));
    }

    fn draw_glyph_run(&mut self, run: &GlyphRun) {
        self.glyph_runs.push(run.clone());
    }
}
