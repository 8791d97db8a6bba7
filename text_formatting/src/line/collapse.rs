// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec::Vec;

use line_services::Ideal;

use crate::convert::{ideal_to_real, real_to_ideal, scaled};
use crate::{Error, TextCollapsingProperties, TextCollapsingStyle, TextLine, TextRun};

/// Content of a line replaced by the collapsing symbol.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct TextCollapsedRange {
    /// First removed character position.
    pub text_source_character_index: usize,
    /// Number of removed positions.
    pub length: usize,
    /// Advance of the removed content.
    pub width: f64,
}

/// Collapsing state of a line.
#[derive(Clone, Debug)]
pub(crate) struct Collapsed {
    pub(crate) range: TextCollapsedRange,
    pub(crate) symbol: TextRun,
    pub(crate) symbol_advances: Vec<Ideal>,
    /// Flow position of the symbol.
    pub(crate) symbol_x: Ideal,
}

impl Collapsed {
    pub(crate) fn cp(&self) -> usize {
        self.range.text_source_character_index
    }
}

impl TextLine {
    /// Returns a copy of the line that fits `collapsing.width`.
    ///
    /// Content past the cut is replaced by the collapsing symbol. A line that
    /// already fits is returned unchanged.
    pub fn collapse(&self, collapsing: &TextCollapsingProperties) -> Result<Self, Error> {
        self.check()?;
        if collapsing.width.is_nan() {
            return Err(Error::invalid_argument("width"));
        }
        if collapsing.width < 0.0 {
            return Err(Error::out_of_range("width"));
        }
        let TextRun::Characters(symbol) = &collapsing.symbol else {
            return Err(Error::invalid_argument("symbol"));
        };
        let budget = real_to_ideal(collapsing.width);
        if self.collapsed.is_some() || real_to_ideal(self.metrics.width) <= budget {
            return Ok(self.clone());
        }

        let properties = &symbol.properties;
        let symbol_advances: Vec<Ideal> = symbol
            .range
            .as_slice()
            .iter()
            .map(|ch| {
                real_to_ideal(scaled(
                    properties.typeface.advance(*ch),
                    properties.font_rendering_em_size,
                    self.mode,
                    properties.pixels_per_dip,
                ))
            })
            .collect();
        let symbol_width: Ideal = symbol_advances.iter().sum();
        let available = budget - symbol_width;

        let mut cut = 0;
        let mut used: Ideal = 0;
        for cluster in self.clusters.iter().take_while(|cluster| !cluster.is_newline) {
            if used.saturating_add(cluster.advance) > available {
                break;
            }
            used = used.saturating_add(cluster.advance);
            cut += 1;
        }
        if collapsing.style == TextCollapsingStyle::TrailingWord
            && self
                .clusters
                .get(cut)
                .is_some_and(|cluster| !cluster.is_whitespace)
        {
            while cut > 0 && !self.clusters[cut - 1].is_whitespace {
                cut -= 1;
            }
        }
        while cut > 0 && self.clusters[cut - 1].is_whitespace {
            cut -= 1;
        }

        let cut_cp = self
            .clusters
            .get(cut)
            .map_or(self.cp_end(), |cluster| cluster.cp);
        let kept: Ideal = self.clusters[..cut]
            .iter()
            .map(|cluster| cluster.advance)
            .sum();
        let removed: Ideal = self.clusters[cut..]
            .iter()
            .filter(|cluster| !cluster.is_whitespace)
            .map(|cluster| cluster.advance)
            .sum();

        let mut line = self.clone();
        let rtl = self.is_rtl();
        let mut x: Ideal = 0;
        for index in &self.visual_order {
            if *index >= cut {
                continue;
            }
            let cluster = &mut line.clusters[*index];
            cluster.flow_x = if rtl { kept - x - cluster.advance } else { x };
            x += cluster.advance;
        }
        let width = ideal_to_real(kept + symbol_width);
        line.metrics.width = width;
        line.metrics.width_including_trailing_whitespace = width;
        line.collapsed = Some(Collapsed {
            range: TextCollapsedRange {
                text_source_character_index: cut_cp,
                length: self.cp_end() - cut_cp,
                width: ideal_to_real(removed),
            },
            symbol: collapsing.symbol.clone(),
            symbol_advances,
            symbol_x: kept,
        });
        line.apply_ink();
        log::debug!("collapsed line at {} after {cut} clusters", self.cp_first);
        Ok(line)
    }

    /// Ranges replaced by the collapsing symbol; empty for lines that were
    /// not collapsed.
    pub fn get_text_collapsed_ranges(&self) -> Result<Vec<TextCollapsedRange>, Error> {
        self.check()?;
        Ok(self
            .collapsed
            .iter()
            .map(|collapsed| collapsed.range)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::utils::{format, text_source};
    use crate::{
        CharacterHit, TextFormatter, TextFormattingMode, TextParagraphProperties, TextWrapping,
    };

    fn long_line(text: &str) -> TextLine {
        let formatter = TextFormatter::create(TextFormattingMode::Ideal);
        let props = TextParagraphProperties {
            text_wrapping: TextWrapping::NoWrap,
            ..TextParagraphProperties::default()
        };
        format(&formatter, &text_source(text), 0, 60.0, &props, None)
    }

    #[test]
    fn character_collapse_cuts_between_letters() {
        let line = long_line("alphabetical order");
        assert!(line.has_overflowed());
        let props = TextCollapsingProperties::character_ellipsis(
            60.0,
            line.get_text_run_spans().unwrap()[0]
                .value
                .properties()
                .unwrap()
                .clone(),
        );
        let collapsed = line.collapse(&props).unwrap();
        assert!(collapsed.has_collapsed());
        assert!(!line.has_collapsed(), "the original line is untouched");
        // Six characters and the ellipsis fit in 60.
        assert_eq!(collapsed.width(), 56.0);
        assert_eq!(collapsed.length(), line.length());
        let ranges = collapsed.get_text_collapsed_ranges().unwrap();
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].text_source_character_index, 6);
        assert_eq!(ranges[0].length, 13);
        // The caret does not enter the collapsed range.
        assert_eq!(
            collapsed
                .get_next_caret_character_hit(CharacterHit::new(12, 0))
                .unwrap(),
            CharacterHit::new(5, 1)
        );
    }

    #[test]
    fn word_collapse_keeps_whole_words() {
        let line = long_line("alpha beta gamma");
        let props = TextCollapsingProperties::word_ellipsis(
            60.0,
            line.get_text_run_spans().unwrap()[0]
                .value
                .properties()
                .unwrap()
                .clone(),
        );
        let collapsed = line.collapse(&props).unwrap();
        // "alpha" and the ellipsis.
        assert_eq!(collapsed.width(), 48.0);
        assert_eq!(
            collapsed.get_text_collapsed_ranges().unwrap()[0].text_source_character_index,
            5
        );
    }

    #[test]
    fn display_mode_rounds_the_symbol() {
        let formatter = TextFormatter::create(TextFormattingMode::Display);
        let props = TextParagraphProperties {
            text_wrapping: TextWrapping::NoWrap,
            ..TextParagraphProperties::default()
        };
        let line = format(&formatter, &text_source("alphabetical order"), 0, 60.0, &props, None);
        let symbol = crate::TextRunProperties {
            font_rendering_em_size: 15.0,
            ..crate::TextRunProperties::default()
        };
        let collapsing =
            TextCollapsingProperties::character_ellipsis(60.0, alloc::sync::Arc::new(symbol));
        let collapsed = line.collapse(&collapsing).unwrap();
        // The ellipsis is 7.5 wide before rounding.
        assert_eq!(collapsed.width(), 56.0);
        assert_eq!(
            collapsed.get_text_collapsed_ranges().unwrap()[0].text_source_character_index,
            6
        );

        let ideal = format(
            &TextFormatter::create(TextFormattingMode::Ideal),
            &text_source("alphabetical order"),
            0,
            60.0,
            &props,
            None,
        );
        assert_eq!(ideal.collapse(&collapsing).unwrap().width(), 55.5);
    }

    #[test]
    fn fitting_lines_are_not_collapsed() {
        let line = long_line("alpha beta gamma");
        let props = TextCollapsingProperties::character_ellipsis(
            500.0,
            alloc::sync::Arc::new(crate::TextRunProperties::default()),
        );
        let same = line.collapse(&props).unwrap();
        assert!(!same.has_collapsed());
        assert!(same.get_text_collapsed_ranges().unwrap().is_empty());
    }
}
