// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Caret navigation and hit testing.

use line_services::{Ideal, LsCluster};

use crate::convert::{ideal_to_real, real_to_ideal};
use crate::{Error, TextLine, TextRun};

/// A caret position.
///
/// A `trailing_length` of zero denotes the leading edge of the cluster at
/// `first_character_index`; a positive value denotes the edge that many
/// positions into it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct CharacterHit {
    /// Character position of the cluster.
    pub first_character_index: usize,
    /// Positions from the cluster start to the edge.
    pub trailing_length: usize,
}

impl CharacterHit {
    /// Creates a hit.
    pub fn new(first_character_index: usize, trailing_length: usize) -> Self {
        Self {
            first_character_index,
            trailing_length,
        }
    }

    fn leading(cluster: &LsCluster) -> Self {
        Self::new(cluster.cp, 0)
    }

    fn trailing(cluster: &LsCluster) -> Self {
        Self::new(cluster.cp, cluster.len)
    }
}

impl TextLine {
    /// Returns the caret stop after `hit`.
    ///
    /// At the end of the line the trailing edge of the last cluster is
    /// returned.
    pub fn get_next_caret_character_hit(&self, hit: CharacterHit) -> Result<CharacterHit, Error> {
        self.check()?;
        Ok(self.next_hit(hit))
    }

    /// Returns the caret stop before `hit`.
    ///
    /// At the start of the line the leading edge of the first cluster is
    /// returned.
    pub fn get_previous_caret_character_hit(
        &self,
        hit: CharacterHit,
    ) -> Result<CharacterHit, Error> {
        self.check()?;
        Ok(self.previous_hit(hit))
    }

    /// Returns the caret position left after deleting backwards from `hit`.
    ///
    /// Inside a cluster of characters, such as a base letter followed by
    /// combining marks, one position is removed at a time.
    pub fn get_backspace_caret_character_hit(
        &self,
        hit: CharacterHit,
    ) -> Result<CharacterHit, Error> {
        self.check()?;
        let Some((first, last)) = self.stop_bounds() else {
            return Ok(CharacterHit::new(self.cp_first, 0));
        };
        let caret = hit.first_character_index + hit.trailing_length;
        if caret <= self.clusters[first].cp {
            return Ok(CharacterHit::leading(&self.clusters[first]));
        }
        let Some(index) = self.previous_stop(self.cluster_index(caret - 1), last) else {
            return Ok(CharacterHit::leading(&self.clusters[first]));
        };
        let cluster = &self.clusters[index];
        let removed = (caret - 1).min(cluster.cp + cluster.len - 1);
        let is_text = matches!(
            self.run_at(cluster.cp).map(|fetched| &fetched.run),
            Some(TextRun::Characters(_))
        );
        if removed > cluster.cp && is_text {
            Ok(CharacterHit::new(cluster.cp, removed - cluster.cp))
        } else {
            Ok(CharacterHit::leading(cluster))
        }
    }

    /// Returns `true` if `hit` is a valid caret stop.
    ///
    /// A leading hit is valid when stepping forward and back returns to it, a
    /// trailing hit when stepping back and forward does.
    pub fn is_at_caret_character_hit(&self, hit: CharacterHit) -> Result<bool, Error> {
        self.check()?;
        Ok(if hit.trailing_length == 0 {
            let next = self.next_hit(hit);
            next != hit && self.previous_hit(next) == hit
        } else {
            let previous = self.previous_hit(hit);
            previous != hit && self.next_hit(previous) == hit
        })
    }

    /// Distance of the caret at `hit` from the paragraph edge, in the flow
    /// direction.
    pub fn get_distance_from_character_hit(&self, hit: CharacterHit) -> Result<f64, Error> {
        self.check()?;
        let Some((first, last)) = self.stop_bounds() else {
            return Ok(self.metrics.start);
        };
        let cp = hit.first_character_index;
        let (index, trailing) = if cp < self.clusters[first].cp {
            (first, false)
        } else if cp >= self.visible_end(last) {
            (last, true)
        } else {
            let index = self.cluster_index(cp);
            if self.is_navigable(index) {
                // Hidden positions folded into a cluster sit after its content.
                let hidden = cp > self.clusters[index].cp && !self.is_content_at(cp);
                (index, hit.trailing_length > 0 || hidden)
            } else if let Some(previous) = self.previous_stop(index, last) {
                (previous, true)
            } else {
                (self.next_stop(index).unwrap_or(first), false)
            }
        };
        Ok(self.metrics.start + ideal_to_real(self.edge(index, trailing)))
    }

    /// Maps a distance from the paragraph edge, in the flow direction, to the
    /// nearest caret hit.
    pub fn get_character_hit_from_distance(&self, distance: f64) -> Result<CharacterHit, Error> {
        self.check()?;
        let x = real_to_ideal(distance - self.metrics.start);
        let mut nearest: Option<(Ideal, usize)> = None;
        for index in (0..self.clusters.len()).filter(|index| self.is_navigable(*index)) {
            let cluster = &self.clusters[index];
            let (lo, hi) = (cluster.flow_x, cluster.flow_x.saturating_add(cluster.advance));
            let gap = if x < lo {
                lo - x
            } else if x >= hi {
                x - hi
            } else {
                -1
            };
            if nearest.is_none_or(|(best, _)| gap < best) {
                nearest = Some((gap, index));
            }
        }
        let Some((_, index)) = nearest else {
            return Ok(CharacterHit::new(self.cp_first, 0));
        };
        let cluster = &self.clusters[index];
        let middle = cluster.flow_x.saturating_add(cluster.advance / 2);
        let after_middle = x >= middle;
        Ok(if after_middle == self.is_forward(index) {
            CharacterHit::trailing(cluster)
        } else {
            CharacterHit::leading(cluster)
        })
    }

    fn next_hit(&self, hit: CharacterHit) -> CharacterHit {
        let Some((first, last)) = self.stop_bounds() else {
            return CharacterHit::new(self.cp_first, 0);
        };
        let cp = hit.first_character_index;
        if cp < self.clusters[first].cp {
            return CharacterHit::trailing(&self.clusters[first]);
        }
        if cp >= self.visible_end(last) {
            return CharacterHit::trailing(&self.clusters[last]);
        }
        let index = self.cluster_index(cp);
        if hit.trailing_length == 0 {
            let stop = self.next_stop(index).unwrap_or(last);
            return CharacterHit::trailing(&self.clusters[stop]);
        }
        let stop = self
            .next_stop(index + 1)
            .or_else(|| self.previous_stop(index, last))
            .unwrap_or(last);
        CharacterHit::trailing(&self.clusters[stop])
    }

    fn previous_hit(&self, hit: CharacterHit) -> CharacterHit {
        let Some((first, last)) = self.stop_bounds() else {
            return CharacterHit::new(self.cp_first, 0);
        };
        let cp = hit.first_character_index;
        if cp < self.clusters[first].cp {
            return CharacterHit::leading(&self.clusters[first]);
        }
        if cp >= self.visible_end(last) {
            return CharacterHit::leading(&self.clusters[last]);
        }
        let index = self.cluster_index(cp);
        if hit.trailing_length > 0 {
            let stop = self.previous_stop(index, last).unwrap_or(first);
            return CharacterHit::leading(&self.clusters[stop]);
        }
        let stop = index
            .checked_sub(1)
            .and_then(|before| self.previous_stop(before, last))
            .unwrap_or(first);
        CharacterHit::leading(&self.clusters[stop])
    }

    /// First and last caret stop clusters.
    fn stop_bounds(&self) -> Option<(usize, usize)> {
        let first = self.next_stop(0)?;
        let last = self.previous_stop(self.clusters.len().checked_sub(1)?, usize::MAX)?;
        Some((first, last))
    }

    /// First caret stop at or after `index`.
    fn next_stop(&self, index: usize) -> Option<usize> {
        (index..self.clusters.len()).find(|index| self.is_navigable(*index))
    }

    /// Last caret stop at or before `index`, not after `last`.
    fn previous_stop(&self, index: usize, last: usize) -> Option<usize> {
        (0..=index.min(last)).rev().find(|index| self.is_navigable(*index))
    }

    /// Index of the cluster holding `cp`, clamped to the line.
    fn cluster_index(&self, cp: usize) -> usize {
        self.clusters
            .partition_point(|cluster| cluster.cp + cluster.len <= cp)
            .min(self.clusters.len().saturating_sub(1))
    }

    fn visible_end(&self, last: usize) -> usize {
        let cluster = &self.clusters[last];
        cluster.cp + cluster.len
    }

    /// Flow position of the leading or trailing edge of a cluster.
    fn edge(&self, index: usize, trailing: bool) -> Ideal {
        let cluster = &self.clusters[index];
        let far = cluster.flow_x.saturating_add(cluster.advance);
        if trailing == self.is_forward(index) {
            far
        } else {
            cluster.flow_x
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::sync::Arc;

    use super::*;
    use crate::tests::utils::{RunsSource, Shrink, format, text_source};
    use crate::{TextFormatter, TextFormattingMode, TextParagraphProperties};

    fn line(text: &str) -> TextLine {
        let formatter = TextFormatter::create(TextFormattingMode::Ideal);
        format(
            &formatter,
            &text_source(text),
            0,
            1000.0,
            &TextParagraphProperties::default(),
            None,
        )
    }

    #[test]
    fn combining_marks_form_one_stop() {
        let line = line("ae\u{301}b");
        let next = line
            .get_next_caret_character_hit(CharacterHit::new(1, 0))
            .unwrap();
        assert_eq!(next, CharacterHit::new(1, 2));
        let after = line.get_next_caret_character_hit(next).unwrap();
        assert_eq!(after, CharacterHit::new(3, 1));
        assert!(!line.is_at_caret_character_hit(CharacterHit::new(2, 0)).unwrap());
        assert!(line.is_at_caret_character_hit(CharacterHit::new(1, 2)).unwrap());
        let back = line
            .get_backspace_caret_character_hit(CharacterHit::new(1, 2))
            .unwrap();
        assert_eq!(back, CharacterHit::new(1, 1));
        let back = line.get_backspace_caret_character_hit(back).unwrap();
        assert_eq!(back, CharacterHit::new(1, 0));
    }

    #[test]
    fn navigation_stops_at_the_line_ends() {
        let line = line("abc");
        let end = CharacterHit::new(2, 1);
        assert_eq!(line.get_next_caret_character_hit(end).unwrap(), end);
        let start = CharacterHit::new(0, 0);
        assert_eq!(line.get_previous_caret_character_hit(start).unwrap(), start);
        // The paragraph terminator is not a caret stop.
        assert_eq!(
            line.get_next_caret_character_hit(CharacterHit::new(3, 0))
                .unwrap(),
            end
        );
    }

    #[test]
    fn distances_follow_the_clusters() {
        let line = line("abc");
        let distance = |cp, trailing| {
            line.get_distance_from_character_hit(CharacterHit::new(cp, trailing))
                .unwrap()
        };
        assert_eq!(distance(0, 0), 0.0);
        assert_eq!(distance(0, 1), 8.0);
        assert_eq!(distance(1, 0), 8.0);
        assert_eq!(distance(2, 1), 24.0);
        let hit = |x| line.get_character_hit_from_distance(x).unwrap();
        assert_eq!(hit(3.0), CharacterHit::new(0, 0));
        assert_eq!(hit(5.0), CharacterHit::new(0, 1));
        assert_eq!(hit(-10.0), CharacterHit::new(0, 0));
        assert_eq!(hit(100.0), CharacterHit::new(2, 1));
    }

    #[test]
    fn hidden_positions_sit_after_the_preceding_character() {
        let source = RunsSource::new()
            .text("ab")
            .modifier(Arc::new(Shrink::default()))
            .text("cd")
            .end_of_segment()
            .end_of_paragraph();
        let formatter = TextFormatter::create(TextFormattingMode::Ideal);
        let props = TextParagraphProperties::default();
        let line = format(&formatter, &source, 0, 1000.0, &props, None);
        let distance = |cp, trailing| {
            line.get_distance_from_character_hit(CharacterHit::new(cp, trailing))
                .unwrap()
        };
        assert_eq!(distance(1, 1), 16.0);
        assert_eq!(distance(2, 0), distance(1, 1));
        assert_eq!(distance(3, 0), 16.0);
        // Characters in the scope are half as wide.
        assert_eq!(distance(3, 1), 20.0);
    }
}
