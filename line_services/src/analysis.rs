// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Unicode analysis of fetched content.

use alloc::string::String;
use alloc::vec::Vec;

use icu_properties::CodePointMapData;
use icu_properties::props::LineBreak;
use icu_segmenter::options::{LineBreakOptions, LineBreakWordOption};
use icu_segmenter::{GraphemeClusterSegmenter, LineSegmenter, LineSegmenterBorrowed};
use unicode_bidi::{BidiClass, BidiInfo, Level, bidi_class};

use crate::config::BreakStrategy;
use crate::line::BreakKind;
use crate::run::LsBreakCondition;
use crate::text::{LsText, SOFT_HYPHEN, Unit, UnitKind};
use crate::LsResult;

/// Line segmenters, created on first use for each strategy.
#[derive(Default)]
pub(crate) struct Segmenters {
    normal: Option<LineSegmenter>,
    keep_all: Option<LineSegmenter>,
    break_all: Option<LineSegmenter>,
}

impl core::fmt::Debug for Segmenters {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Segmenters")
            .field("normal", &self.normal.is_some())
            .field("keep_all", &self.keep_all.is_some())
            .field("break_all", &self.break_all.is_some())
            .finish()
    }
}

impl Segmenters {
    fn line(&mut self, strategy: BreakStrategy) -> LineSegmenterBorrowed<'_> {
        let (segmenter, word_option) = match strategy {
            BreakStrategy::Normal => (&mut self.normal, LineBreakWordOption::Normal),
            BreakStrategy::KeepAll => (&mut self.keep_all, LineBreakWordOption::KeepAll),
            BreakStrategy::BreakAll => (&mut self.break_all, LineBreakWordOption::BreakAll),
        };
        segmenter
            .get_or_insert_with(|| {
                log::trace!("creating line segmenter for {strategy:?}");
                let mut options = LineBreakOptions::default();
                options.word_option = Some(word_option);
                LineSegmenter::new_auto(options).static_to_owned()
            })
            .as_borrowed()
    }

    /// Computes break opportunities, cluster starts and bidi levels for
    /// every unit of `text`.
    pub(crate) fn analyze(
        &mut self,
        text: &mut LsText,
        strategy: BreakStrategy,
        base_rtl: bool,
    ) -> LsResult<()> {
        let mut string = String::new();
        string.try_reserve(4 * (text.context.len() + text.embeddings.len() + text.units.len()))?;
        string.extend(text.context.iter());
        let context_end = string.len();
        string.extend(text.embeddings.iter());
        let body_start = string.len();
        // Byte offset and unit index of every unit that has a character.
        let mut offsets: Vec<(usize, usize)> = Vec::new();
        offsets.try_reserve(text.units.len())?;
        for (index, unit) in text.units.iter_mut().enumerate() {
            unit.break_before = BreakKind::None;
            unit.cluster_start = false;
            if let Some(ch) = unit.ch {
                offsets.push((string.len(), index));
                string.push(ch);
            }
        }
        let unit_at = |byte: usize| {
            offsets
                .binary_search_by_key(&byte, |(offset, _)| *offset)
                .ok()
                .map(|found| offsets[found].1)
        };

        let line_break = CodePointMapData::<LineBreak>::new();
        for point in self.line(strategy).segment_str(&string) {
            if point <= body_start || point >= string.len() {
                continue;
            }
            let Some(index) = unit_at(point) else {
                continue;
            };
            let Some(prev) = string[..point].chars().next_back() else {
                continue;
            };
            text.units[index].break_before = match line_break.get(prev) {
                LineBreak::Glue | LineBreak::WordJoiner | LineBreak::ZWJ => continue,
                LineBreak::MandatoryBreak
                | LineBreak::CarriageReturn
                | LineBreak::LineFeed
                | LineBreak::NextLine => BreakKind::Mandatory,
                _ if prev == SOFT_HYPHEN => BreakKind::Hyphen,
                _ => BreakKind::Normal,
            };
        }
        apply_object_conditions(text);

        let body = &string[body_start..];
        for point in GraphemeClusterSegmenter::new().segment_str(body) {
            if let Some(index) = unit_at(body_start + point) {
                text.units[index].cluster_start = text.units[index].kind != UnitKind::Hidden;
            }
        }
        if let Some(first) = text.units.first_mut() {
            first.cluster_start = true;
        }

        let base = if base_rtl { Level::rtl() } else { Level::ltr() };
        let info = BidiInfo::new(&string[context_end..], Some(base));
        let mut level = base.number();
        let mut next = offsets.iter().peekable();
        for (index, unit) in text.units.iter_mut().enumerate() {
            if let Some((offset, _)) = next.next_if(|(_, unit_index)| *unit_index == index) {
                level = info.levels[offset - context_end].number();
            }
            unit.level = level;
        }
        Ok(())
    }
}

/// Lets the break conditions of embedded objects override the text rules.
fn apply_object_conditions(text: &mut LsText) {
    let len = text.units.len();
    for run_index in 0..text.runs.len() {
        let run = &text.runs[run_index];
        if !run.is_object {
            continue;
        }
        let (before, after) = (run.break_before, run.break_after);
        let Some(start) = text.index_of_cp(run.cp) else {
            continue;
        };
        let end = start + run.len;
        if start > 0 {
            override_break(&mut text.units[start].break_before, before);
        }
        if end < len {
            override_break(&mut text.units[end].break_before, after);
        } else if text.terminator.is_none() {
            // The following content is unknown yet; only a mandatory break
            // can be decided now.
            if after == LsBreakCondition::Always {
                text.end_break = BreakKind::Mandatory;
            }
        }
    }
}

fn override_break(kind: &mut BreakKind, condition: LsBreakCondition) {
    match condition {
        LsBreakCondition::Possible => {}
        LsBreakCondition::Restrained => {
            if *kind != BreakKind::Mandatory {
                *kind = BreakKind::None;
            }
        }
        LsBreakCondition::Always => *kind = BreakKind::Mandatory,
    }
}

/// Returns the levels of `units` laid out as one line, with rule L1 of the
/// bidi algorithm applied.
pub(crate) fn line_levels(units: &[Unit], base: u8) -> Vec<u8> {
    let mut levels: Vec<u8> = units.iter().map(|unit| unit.level).collect();
    let mut reset = true;
    for (index, unit) in units.iter().enumerate().rev() {
        match unit.ch.map(bidi_class) {
            Some(BidiClass::S | BidiClass::B) => {
                levels[index] = base;
                reset = true;
            }
            Some(
                BidiClass::WS
                | BidiClass::BN
                | BidiClass::LRE
                | BidiClass::RLE
                | BidiClass::LRO
                | BidiClass::RLO
                | BidiClass::PDF
                | BidiClass::LRI
                | BidiClass::RLI
                | BidiClass::FSI
                | BidiClass::PDI,
            )
            | None => {
                if reset {
                    levels[index] = base;
                }
            }
            Some(_) => reset = false,
        }
    }
    levels
}

/// Reorders `items` from logical to visual order according to their levels.
pub(crate) fn reorder_visual<T>(items: &mut [T], level: impl Fn(&T) -> u8) {
    let count = items.len();
    let mut max_level = 0;
    let mut lowest_odd_level = u8::MAX;
    for item in items.iter() {
        let item_level = level(item);
        max_level = max_level.max(item_level);
        if item_level & 1 != 0 {
            lowest_odd_level = lowest_odd_level.min(item_level);
        }
    }
    if lowest_odd_level > max_level {
        return;
    }
    for current in (lowest_odd_level..=max_level).rev() {
        let mut i = 0;
        while i < count {
            if level(&items[i]) >= current {
                let mut end = i + 1;
                while end < count && level(&items[end]) >= current {
                    end += 1;
                }
                items[i..end].reverse();
                i = end;
            }
            i += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LsDoc, LsTabs};
    use crate::text::tests::Runs;
    use crate::text::{FetchLimit, LayoutConfig};
    use crate::LsRunKind;

    fn analyzed(client: &mut Runs, base_rtl: bool) -> LsText {
        let tabs = LsTabs::default();
        let doc = LsDoc::default();
        let config = LayoutConfig {
            tabs: &tabs,
            doc: &doc,
        };
        let mut text = LsText::fetch(client, 0, None, FetchLimit::Paragraph, config).unwrap();
        Segmenters::default()
            .analyze(&mut text, BreakStrategy::Normal, base_rtl)
            .unwrap();
        text
    }

    fn breaks(text: &LsText) -> Vec<(usize, BreakKind)> {
        (0..=text.units.len())
            .map(|index| (index, text.break_at(index)))
            .filter(|(_, kind)| *kind != BreakKind::None)
            .collect()
    }

    #[test]
    fn breaks_follow_spaces_and_newlines() {
        let mut client = Runs::default().text("ab cd\nef", 10).end();
        let text = analyzed(&mut client, false);
        assert_eq!(
            breaks(&text),
            vec![
                (3, BreakKind::Normal),
                (6, BreakKind::Mandatory),
                (9, BreakKind::Mandatory)
            ]
        );
    }

    #[test]
    fn soft_hyphen_breaks_are_hyphen_breaks() {
        let mut client = Runs::default().text("hy\u{AD}phen", 10).end();
        let text = analyzed(&mut client, false);
        assert_eq!(text.break_at(3), BreakKind::Hyphen);
    }

    #[test]
    fn restrained_objects_glue_to_their_neighbours() {
        let object = LsRunKind::Object {
            width: 50,
            ascent: 40,
            descent: 0,
            break_before: LsBreakCondition::Restrained,
            break_after: LsBreakCondition::Always,
        };
        let mut client = Runs::default()
            .text("ab ", 10)
            .run(2, object)
            .text("cd", 10)
            .end();
        let text = analyzed(&mut client, false);
        assert_eq!(text.break_at(3), BreakKind::None);
        assert_eq!(text.break_at(5), BreakKind::Mandatory);
        assert!(text.units[3].cluster_start);
        assert!(!text.units[4].cluster_start);
    }

    #[test]
    fn combining_marks_share_a_cluster() {
        let mut client = Runs::default().text("e\u{301}x", 10).end();
        let text = analyzed(&mut client, false);
        let starts: Vec<bool> = text.units.iter().map(|unit| unit.cluster_start).collect();
        assert_eq!(starts, vec![true, false, true, true]);
    }

    #[test]
    fn hebrew_is_resolved_to_an_odd_level() {
        let mut client = Runs::default().text("ab \u{5D0}\u{5D1}", 10).end();
        let text = analyzed(&mut client, false);
        let levels: Vec<u8> = text.units.iter().map(|unit| unit.level).collect();
        assert_eq!(&levels[..5], &[0, 0, 0, 1, 1]);
    }

    #[test]
    fn trailing_whitespace_takes_the_paragraph_level() {
        let mut client = Runs::default().text("\u{5D0}\u{5D1} ", 10).end();
        let text = analyzed(&mut client, false);
        let levels = line_levels(&text.units[..3], 0);
        assert_eq!(levels, vec![1, 1, 0]);
    }

    #[test]
    fn visual_reordering_reverses_odd_runs() {
        let mut items = vec![(0, 'a'), (1, 'b'), (1, 'c'), (0, 'd')];
        reorder_visual(&mut items, |item| item.0);
        let order: String = items.iter().map(|item| item.1).collect();
        assert_eq!(order, "acbd");
    }
}
