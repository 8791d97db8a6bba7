// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

mod objects;
mod recorder;
mod source;

pub(crate) use objects::{Block, EveryOtherLetter, Shrink};
pub(crate) use recorder::Recorder;
pub(crate) use source::{RunsSource, text_source};

use crate::{TextFormatter, TextLine, TextLineBreak, TextParagraphProperties, TextSource};

/// Formats one line, panicking on failure.
pub(crate) fn format(
    formatter: &TextFormatter,
    source: &dyn TextSource,
    first_cp: usize,
    paragraph_width: f64,
    props: &TextParagraphProperties,
    previous_line_break: Option<&TextLineBreak>,
) -> TextLine {
    formatter
        .format_line(source, first_cp, paragraph_width, props, previous_line_break)
        .unwrap_or_else(|err| panic!("formatting the line at {first_cp} failed: {err}"))
}

/// Formats the whole paragraph starting at `0` and returns its lines.
pub(crate) fn format_paragraph(
    formatter: &TextFormatter,
    source: &dyn TextSource,
    paragraph_width: f64,
    props: &TextParagraphProperties,
) -> Vec<TextLine> {
    let mut lines: Vec<TextLine> = Vec::new();
    let mut cp = 0;
    loop {
        let previous = lines.last().and_then(TextLine::get_text_line_break);
        let line = format(formatter, source, cp, paragraph_width, props, previous);
        cp += line.length();
        let done = line.get_text_line_break().is_none();
        lines.push(line);
        if done {
            return lines;
        }
        assert!(lines.len() < 1000, "paragraph did not terminate");
    }
}
