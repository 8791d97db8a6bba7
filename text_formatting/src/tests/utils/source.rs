// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use std::cell::Cell;
use std::sync::Arc;

use crate::{
    ClientError, CultureSpecificCharacterBufferRange, TextCharacters,
    TextEmbeddedObject, TextModifier, TextRun, TextRunProperties, TextSource, TextSpan,
};

/// A text source backed by a list of runs.
///
/// Positions past the last run read as a one position paragraph end.
#[derive(Debug, Default)]
pub(crate) struct RunsSource {
    runs: Vec<(usize, TextRun)>,
    failing_at: Option<usize>,
    effect_offset: usize,
    fetches: Cell<usize>,
}

impl RunsSource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn end(&self) -> usize {
        self.runs
            .last()
            .map_or(0, |(cp, run)| cp + run.length())
    }

    fn push(mut self, run: TextRun) -> Self {
        let cp = self.end();
        self.runs.push((cp, run));
        self
    }

    /// Appends characters with the default properties.
    pub(crate) fn text(self, text: &str) -> Self {
        self.text_with(text, Arc::new(TextRunProperties::default()))
    }

    pub(crate) fn text_with(self, text: &str, properties: Arc<TextRunProperties>) -> Self {
        self.push(TextRun::from_text(text, properties))
    }

    pub(crate) fn object(self, object: Arc<dyn TextEmbeddedObject>) -> Self {
        self.push(TextRun::EmbeddedObject(object))
    }

    pub(crate) fn modifier(self, modifier: Arc<dyn TextModifier>) -> Self {
        self.push(TextRun::Modifier(modifier))
    }

    pub(crate) fn end_of_segment(self) -> Self {
        self.push(TextRun::EndOfSegment { length: 1 })
    }

    pub(crate) fn hidden(self, length: usize) -> Self {
        self.push(TextRun::Hidden { length })
    }

    pub(crate) fn end_of_line(self) -> Self {
        self.push(TextRun::end_of_line(1))
    }

    pub(crate) fn end_of_paragraph(self) -> Self {
        self.push(TextRun::end_of_paragraph(1))
    }

    /// Makes every request at or after `cp` fail.
    pub(crate) fn failing_at(mut self, cp: usize) -> Self {
        self.failing_at = Some(cp);
        self
    }

    /// Offsets text effect positions from text source positions.
    pub(crate) fn with_effect_offset(mut self, offset: usize) -> Self {
        self.effect_offset = offset;
        self
    }

    /// Number of runs handed out so far.
    pub(crate) fn fetches(&self) -> usize {
        self.fetches.get()
    }
}

impl TextSource for RunsSource {
    fn get_text_run(&self, cp: usize) -> Result<TextRun, ClientError> {
        self.fetches.set(self.fetches.get() + 1);
        if self.failing_at.is_some_and(|failing| cp >= failing) {
            return Err(format!("no content at {cp}").into());
        }
        let index = self.runs.partition_point(|(start, _)| *start <= cp);
        let Some((start, run)) = index.checked_sub(1).map(|found| &self.runs[found]) else {
            return Ok(TextRun::end_of_paragraph(1));
        };
        let offset = cp - start;
        if offset >= run.length() {
            return Ok(TextRun::end_of_paragraph(1));
        }
        Ok(match run {
            TextRun::Characters(characters) if offset > 0 => TextRun::Characters(TextCharacters {
                range: characters
                    .range
                    .sub_range(offset, characters.range.len() - offset)?,
                properties: characters.properties.clone(),
            }),
            _ => run.clone(),
        })
    }

    fn get_preceding_text(
        &self,
        cp_limit: usize,
    ) -> Result<TextSpan<CultureSpecificCharacterBufferRange>, ClientError> {
        let index = self.runs.partition_point(|(start, _)| *start < cp_limit);
        let Some((start, TextRun::Characters(characters))) =
            index.checked_sub(1).map(|found| &self.runs[found])
        else {
            return Ok(TextSpan::default());
        };
        let length = (cp_limit - start).min(characters.range.len());
        Ok(TextSpan {
            length,
            value: CultureSpecificCharacterBufferRange {
                culture: characters.properties.culture.clone(),
                range: characters.range.sub_range(0, length)?,
            },
        })
    }

    fn get_text_effect_character_index(&self, cp: usize) -> usize {
        cp + self.effect_offset
    }
}

/// A paragraph of `text` with the default properties.
pub(crate) fn text_source(text: &str) -> RunsSource {
    RunsSource::new().text(text).end_of_paragraph()
}

#[test]
fn runs_are_sliced_at_the_requested_position() {
    let source = text_source("hello");
    let run = source.get_text_run(2).unwrap();
    assert_eq!(run.characters(), ['l', 'l', 'o']);
    assert!(matches!(source.get_text_run(5), Ok(TextRun::EndOfParagraph(_))));
    let preceding = source.get_preceding_text(3).unwrap();
    assert_eq!(preceding.length, 3);
    assert_eq!(preceding.value.range.as_slice(), ['h', 'e', 'l']);
    assert_eq!(source.fetches(), 2);
}
