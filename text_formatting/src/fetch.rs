// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Feeds client runs to the engine.

use alloc::sync::Arc;
use alloc::vec::Vec;

use line_services::{ClientAbort, Ideal, LsBreakCondition, LsClient, LsRun, LsRunKind};

use crate::context::is_special_character;
use crate::convert::{ideal_to_real, real_to_ideal, scaled};
use crate::modifier::modified;
use crate::source::fetch_run;
use crate::{
    ClientError, FlowDirection, LineBreakCondition, TextFormattingMode, TextModifierScope,
    TextParagraphProperties, TextRun, TextRunCache, TextRunProperties, TextSource,
};

const LRE: char = '\u{202A}';
const RLE: char = '\u{202B}';
const PDF: char = '\u{202C}';

/// A run handed to the engine, with the properties of its scope applied.
#[derive(Clone, Debug)]
pub(crate) struct FetchedRun {
    pub(crate) cp: usize,
    pub(crate) run: TextRun,
    /// Modifier scope in effect after the run.
    pub(crate) scope_after: Option<Arc<TextModifierScope>>,
}

impl FetchedRun {
    pub(crate) fn end(&self) -> usize {
        self.cp + self.run.length()
    }
}

/// The engine's view of a [`TextSource`] for one formatting call.
///
/// The first error returned by the client is kept until the engine call
/// returns and is then reported instead of the engine result code.
pub(crate) struct Fetcher<'a> {
    source: &'a dyn TextSource,
    cache: Option<&'a mut TextRunCache>,
    props: &'a TextParagraphProperties,
    mode: TextFormattingMode,
    first_cp: usize,
    initial_scope: Option<Arc<TextModifierScope>>,
    scope: Option<Arc<TextModifierScope>>,
    runs: Vec<FetchedRun>,
    error: Option<ClientError>,
}

impl core::fmt::Debug for Fetcher<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Fetcher")
            .field("first_cp", &self.first_cp)
            .field("mode", &self.mode)
            .field("runs", &self.runs.len())
            .field("error", &self.error.is_some())
            .finish_non_exhaustive()
    }
}

impl<'a> Fetcher<'a> {
    pub(crate) fn new(
        source: &'a dyn TextSource,
        cache: Option<&'a mut TextRunCache>,
        props: &'a TextParagraphProperties,
        mode: TextFormattingMode,
        first_cp: usize,
        scope: Option<Arc<TextModifierScope>>,
    ) -> Self {
        Self {
            source,
            cache,
            props,
            mode,
            first_cp,
            initial_scope: scope.clone(),
            scope,
            runs: Vec::new(),
            error: None,
        }
    }

    /// Takes the pending client error.
    pub(crate) fn take_error(&mut self) -> Option<ClientError> {
        self.error.take()
    }

    pub(crate) fn source(&self) -> &'a dyn TextSource {
        self.source
    }

    /// Runs fetched since the last restart at the first position.
    pub(crate) fn into_runs(self) -> (Vec<FetchedRun>, Option<Arc<TextModifierScope>>) {
        (self.runs, self.initial_scope)
    }

    fn fail(&mut self, error: ClientError) -> ClientAbort {
        log::debug!("text source failed: {error}");
        if self.error.is_none() {
            self.error = Some(error);
        }
        ClientAbort
    }

    fn ideal(&self, value: f64, properties: &TextRunProperties) -> Ideal {
        real_to_ideal(scaled(
            value,
            properties.font_rendering_em_size,
            self.mode,
            properties.pixels_per_dip,
        ))
    }

    fn text_kind(&self, chars: &[char], properties: &TextRunProperties) -> LsRunKind {
        let typeface = &properties.typeface;
        let advances = chars
            .iter()
            .map(|ch| {
                if *ch == '\t' {
                    0
                } else {
                    self.ideal(typeface.advance(*ch), properties)
                }
            })
            .collect();
        let shift = real_to_ideal(properties.baseline_shift());
        LsRunKind::Text {
            chars: chars.to_vec(),
            advances,
            ascent: (self.ideal(typeface.ascent(), properties) + shift).max(0),
            descent: (self.ideal(typeface.descent(), properties) - shift).max(0),
            has_special: chars.iter().any(|ch| is_special_character(*ch)),
        }
    }
}

fn condition(condition: LineBreakCondition) -> LsBreakCondition {
    match condition {
        LineBreakCondition::BreakDesired | LineBreakCondition::BreakPossible => {
            LsBreakCondition::Possible
        }
        LineBreakCondition::BreakRestrained => LsBreakCondition::Restrained,
        LineBreakCondition::BreakAlways => LsBreakCondition::Always,
    }
}

impl LsClient for Fetcher<'_> {
    fn fetch_run(&mut self, cp: usize, remaining_width: Ideal) -> Result<LsRun, ClientAbort> {
        if cp == self.first_cp {
            // The engine starts over, possibly with a wider limit.
            self.scope = self.initial_scope.clone();
            self.runs.clear();
        }
        let run = match fetch_run(self.source, self.cache.as_deref_mut(), cp) {
            Ok(run) => run,
            Err(error) => return Err(self.fail(error)),
        };
        let len = run.length();
        let (kind, effective) = match &run {
            TextRun::Characters(characters) => {
                let properties = modified(self.scope.as_ref(), &characters.properties);
                let kind = self.text_kind(characters.range.as_slice(), &properties);
                (kind, run.with_properties(properties))
            }
            TextRun::EmbeddedObject(object) => {
                let metrics = object.format(ideal_to_real(remaining_width));
                let kind = LsRunKind::Object {
                    width: real_to_ideal(metrics.width).max(0),
                    ascent: real_to_ideal(metrics.baseline).max(0),
                    descent: real_to_ideal(metrics.height - metrics.baseline).max(0),
                    break_before: condition(object.break_before()),
                    break_after: condition(object.break_after()),
                };
                (kind, run.clone())
            }
            TextRun::EndOfLine(end) | TextRun::EndOfParagraph(end) => {
                let base = end
                    .properties
                    .as_ref()
                    .unwrap_or(&self.props.default_text_run_properties);
                let properties = modified(self.scope.as_ref(), base);
                let kind = if matches!(run, TextRun::EndOfParagraph(_)) {
                    LsRunKind::EndOfParagraph
                } else {
                    LsRunKind::EndOfLine
                };
                (kind, run.with_properties(properties))
            }
            TextRun::EndOfSegment { .. } => {
                let control = match self.scope.take() {
                    Some(scope) => {
                        self.scope = scope.parent().cloned();
                        scope
                            .text_modifier()
                            .has_directional_embedding()
                            .then_some(PDF)
                    }
                    None => None,
                };
                (LsRunKind::Hidden { control }, run.clone())
            }
            TextRun::Hidden { .. } => (LsRunKind::Hidden { control: None }, run.clone()),
            TextRun::Modifier(modifier) => {
                let control = modifier.has_directional_embedding().then(|| {
                    match modifier.flow_direction() {
                        FlowDirection::LeftToRight => LRE,
                        FlowDirection::RightToLeft => RLE,
                    }
                });
                self.scope = Some(TextModifierScope::push(
                    self.scope.take(),
                    modifier.clone(),
                    cp,
                ));
                (LsRunKind::Hidden { control }, run.clone())
            }
        };
        let tag = self.runs.len();
        self.runs.push(FetchedRun {
            cp,
            run: effective,
            scope_after: self.scope.clone(),
        });
        Ok(LsRun { len, tag, kind })
    }

    fn preceding_text(&mut self, cp: usize) -> Result<Vec<char>, ClientAbort> {
        match self.source.get_preceding_text(cp) {
            Ok(span) => Ok(span.value.range.as_slice().to_vec()),
            Err(error) => Err(self.fail(error)),
        }
    }

    fn hyphenate(&mut self, cp: usize, word: &[char]) -> Result<Vec<usize>, ClientAbort> {
        let Some(service) = self.props.text_lexical_service.clone() else {
            return Ok(Vec::new());
        };
        let culture = self
            .runs
            .iter()
            .find(|fetched| fetched.cp <= cp && cp < fetched.end())
            .and_then(|fetched| fetched.run.properties())
            .and_then(|properties| properties.culture.clone());
        if !service.is_culture_supported(culture.as_deref()) {
            return Ok(Vec::new());
        }
        match service.hyphenate(word, culture.as_deref()) {
            Ok(points) => Ok(points),
            Err(error) => Err(self.fail(error)),
        }
    }
}

/// Modifier scope in effect at `cp`, given the runs fetched from the start of
/// the line.
pub(crate) fn scope_at(
    runs: &[FetchedRun],
    initial: Option<&Arc<TextModifierScope>>,
    cp: usize,
) -> Option<Arc<TextModifierScope>> {
    runs.iter()
        .take_while(|fetched| fetched.end() <= cp)
        .last()
        .map_or_else(|| initial.cloned(), |fetched| fetched.scope_after.clone())
}
