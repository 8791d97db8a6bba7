// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::sync::Arc;

use peniko::kurbo::{Point, Rect};
use peniko::color::palette::css;

use super::utils::{
    Block, EveryOtherLetter, Recorder, RunsSource, Shrink, format, format_paragraph, text_source,
};
use crate::{
    TextFormatter, TextFormattingMode, TextParagraphProperties, TextPenaltyModule, TextRunCache,
};

fn formatter() -> TextFormatter {
    TextFormatter::create(TextFormattingMode::Ideal)
}

fn em_sizes(line: &crate::TextLine) -> Vec<Option<f64>> {
    line.get_text_run_spans()
        .unwrap()
        .iter()
        .map(|span| span.value.properties().map(|p| p.font_rendering_em_size))
        .collect()
}

#[test]
fn modifier_scopes_continue_on_the_next_line() {
    let source = RunsSource::new()
        .text("aa ")
        .modifier(Arc::new(Shrink::default()))
        .text("bb cc dd")
        .end_of_segment()
        .text(" ee")
        .end_of_paragraph();
    let props = TextParagraphProperties::default();
    let lines = format_paragraph(&formatter(), &source, 40.0, &props);
    assert!(lines.len() > 1);

    let line_break = lines[0].get_text_line_break().unwrap();
    let next = line_break.text_source_character_index().unwrap();
    assert!((4..12).contains(&next), "break at {next}");
    let scope = line_break.text_modifier_scope().unwrap();
    assert_eq!(scope.depth(), 1);
    assert_eq!(scope.text_source_character_index(), 3);

    // The second line starts inside the scope.
    assert_eq!(em_sizes(&lines[1])[0], Some(8.0));
    // Formatting the first line again does not leak the scope.
    let first = format(&formatter(), &source, 0, 40.0, &props, None);
    assert_eq!(em_sizes(&first)[0], Some(16.0));
    let last = lines.last().unwrap();
    assert!(last.get_text_line_break().is_none());
    assert_eq!(em_sizes(last).last().copied().flatten(), Some(16.0));
}

#[test]
fn hyphenation_splits_long_words() {
    let props = TextParagraphProperties {
        text_lexical_service: Some(Arc::new(EveryOtherLetter)),
        ..TextParagraphProperties::default()
    };
    let source = text_source("abcdefgh ijk");
    let line = format(&formatter(), &source, 0, 45.0, &props, None);
    // "abcd" and the hyphen take 40.
    assert_eq!(line.length(), 4);
    assert!(line.is_hyphenated());
    assert!(!line.is_truncated());
    let line_break = line.get_text_line_break().unwrap();
    assert!(line_break.is_hyphenated());
    let runs = line.get_indexed_glyph_runs().unwrap();
    assert_eq!(runs.last().unwrap().glyph_run.characters, ['-']);

    let next = format(&formatter(), &source, 4, 45.0, &props, Some(line_break));
    assert_eq!(next.length(), 5);
    assert!(!next.is_hyphenated());
}

#[test]
fn embedded_objects_are_measured_and_drawn() {
    let source = RunsSource::new()
        .text("ab")
        .object(Arc::new(Block::new(20.0, 30.0)))
        .text("cd")
        .end_of_paragraph();
    let props = TextParagraphProperties::default();
    let line = format(&formatter(), &source, 0, 1000.0, &props, None);
    assert_eq!(line.length(), 6);
    assert_eq!(line.width(), 52.0);
    assert_eq!(line.baseline(), 30.0);
    let mut recorder = Recorder::default();
    line.draw(&mut recorder, Point::ZERO).unwrap();
    assert_eq!(recorder.glyph_runs.len(), 2);
    assert_eq!(recorder.rects, [(Rect::new(16.0, 0.0, 36.0, 30.0), css::BLACK)]);
}

#[test]
fn restrained_objects_stick_to_their_neighbours() {
    let source = RunsSource::new()
        .text("aa bb")
        .object(Arc::new(Block::new(8.0, 10.0).unbreakable()))
        .text("cc")
        .end_of_paragraph();
    let props = TextParagraphProperties::default();
    let line = format(&formatter(), &source, 0, 60.0, &props, None);
    // "bb", the object and "cc" move to the next line together.
    assert_eq!(line.length(), 3);
}

#[test]
fn line_ends_and_hidden_runs() {
    let source = RunsSource::new()
        .text("ab")
        .hidden(3)
        .text("cd")
        .end_of_line()
        .text("ef")
        .end_of_paragraph();
    let props = TextParagraphProperties::default();
    let lines = format_paragraph(&formatter(), &source, 1000.0, &props);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].length(), 8);
    assert_eq!(lines[0].newline_length(), 1);
    assert_eq!(lines[0].width(), 32.0);
    assert!(!lines[0].ends_paragraph());
    assert!(lines[1].ends_paragraph());
}

#[test]
fn recreated_lines_match_formatted_ones() {
    let source = text_source("one two three four");
    let props = TextParagraphProperties::default();
    let formatted = format(&formatter(), &source, 0, 45.0, &props, None);
    let recreated = formatter()
        .recreate_line(&source, 0, formatted.length(), 45.0, &props, None)
        .unwrap();
    assert_eq!(recreated.metrics(), formatted.metrics());
    let forced = formatter()
        .recreate_line(&source, 0, 8, 45.0, &props, None)
        .unwrap();
    assert_eq!(forced.length(), 8);
    assert!(forced.has_overflowed());
}

#[test]
fn recreated_breakpoints_keep_hyphens_and_truncation() {
    let formatter = formatter();
    let module = TextPenaltyModule::new();
    let props = TextParagraphProperties {
        text_lexical_service: Some(Arc::new(EveryOtherLetter)),
        ..TextParagraphProperties::default()
    };
    let source = text_source("abcdefgh ijk");
    let mut cache = formatter
        .create_paragraph_cache(&source, 0, 45.0, &props, None, None)
        .unwrap();
    let (breakpoints, best) = cache.format_breakpoints(0, None, &module, 45.0).unwrap();
    let chosen = &breakpoints[best];
    assert!(chosen.is_hyphenated());
    let line = formatter
        .recreate_line(&source, 0, chosen.length(), 45.0, &props, None)
        .unwrap();
    assert_eq!(line.length(), chosen.length());
    assert_eq!(line.width(), chosen.width());
    assert!(line.is_hyphenated());
    assert!(!line.is_truncated());
    let runs = line.get_indexed_glyph_runs().unwrap();
    assert_eq!(runs.last().unwrap().glyph_run.characters, ['-']);
    cache.dispose();

    let props = TextParagraphProperties::default();
    let source = text_source("abcdefgh");
    let mut cache = formatter
        .create_paragraph_cache(&source, 0, 35.0, &props, None, None)
        .unwrap();
    let (breakpoints, best) = cache.format_breakpoints(0, None, &module, 35.0).unwrap();
    let chosen = &breakpoints[best];
    assert!(chosen.is_truncated());
    let line = formatter
        .recreate_line(&source, 0, chosen.length(), 35.0, &props, None)
        .unwrap();
    assert_eq!(line.length(), chosen.length());
    assert_eq!(line.width(), chosen.width());
    assert!(line.is_truncated());
    assert!(!line.has_overflowed());
    cache.dispose();
}

#[test]
fn run_cache_serves_repeated_formatting() {
    let source = text_source("one two three four");
    let props = TextParagraphProperties::default();
    let mut cache = TextRunCache::new();
    let first = formatter()
        .format_line_cached(&source, 0, 1000.0, &props, None, &mut cache)
        .unwrap();
    let fetches = source.fetches();
    assert!(!cache.is_empty());
    let second = formatter()
        .format_line_cached(&source, 0, 1000.0, &props, None, &mut cache)
        .unwrap();
    assert_eq!(source.fetches(), fetches);
    assert_eq!(first.metrics(), second.metrics());
    cache.invalidate();
    formatter()
        .format_line_cached(&source, 0, 1000.0, &props, None, &mut cache)
        .unwrap();
    assert!(source.fetches() > fetches);
}

#[test]
fn optimal_breaking_walks_the_paragraph() {
    let source = text_source("aaa bb cccc d eeeee ff");
    let props = TextParagraphProperties::default();
    let formatter = formatter();
    let mut cache = formatter
        .create_paragraph_cache(&source, 0, 80.0, &props, None, None)
        .unwrap();
    let module = TextPenaltyModule::new();
    let mut cp = 0;
    let mut previous = None;
    let mut lines = 0;
    loop {
        let (mut breakpoints, best) = cache
            .format_breakpoints(cp, previous.as_ref(), &module, 80.0)
            .unwrap();
        let chosen = breakpoints.swap_remove(best);
        assert!(chosen.width() <= 80.0);
        cp += chosen.length();
        lines += 1;
        previous = chosen.get_text_line_break().cloned();
        if previous.is_none() {
            break;
        }
        assert!(lines < 10, "breaking did not terminate");
    }
    assert_eq!(cp, 23);
    assert!(lines >= 2);
    cache.dispose();
}

#[test]
fn min_max_widths() {
    let source = text_source("aa bbbb c");
    let props = TextParagraphProperties {
        indent: 10.0,
        ..TextParagraphProperties::default()
    };
    let widths = formatter()
        .format_min_max_paragraph_width(&source, 0, &props)
        .unwrap();
    assert_eq!(widths.min_width, 32.0);
    assert_eq!(widths.max_width, 72.0);
    let mut cache = TextRunCache::new();
    let cached = formatter()
        .format_min_max_paragraph_width_cached(&source, 0, &props, &mut cache)
        .unwrap();
    assert_eq!(cached, widths);
}
