// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec::Vec;

use crate::{Ideal, LsErr, LsResult};

/// Characters that get dedicated treatment from the engine.
///
/// Runs that contain none of these characters take the plain text path.
pub const SPECIAL_CHARACTERS: &[char] = &[
    '\t',
    '\n',
    '\r',
    '-',
    '\u{00A0}',
    '\u{00AD}',
    '\u{200B}',
    '\u{2010}',
    '\u{2028}',
    '\u{2029}',
    '\u{202A}',
    '\u{202B}',
    '\u{202C}',
    '\u{202D}',
    '\u{202E}',
    '\u{FFFC}',
];

/// How strictly words of CJK and Hangul text may be broken.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum BreakStrategy {
    /// Default UAX #14 behavior.
    #[default]
    Normal,
    /// Never break inside CJK words.
    KeepAll,
    /// Break between any two letters.
    BreakAll,
}

/// Device description.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LsDoc {
    /// Ideal units per device pixel. Tab positions snap to whole pixels when
    /// this is positive.
    pub ideal_per_pixel: Ideal,
}

impl LsDoc {
    pub(crate) fn snap(&self, position: Ideal) -> Ideal {
        if self.ideal_per_pixel <= 0 {
            return position;
        }
        let pixel = self.ideal_per_pixel;
        ((position + pixel / 2) / pixel) * pixel
    }
}

/// Alignment of the text segment that follows a tab.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum LsTabAlignment {
    /// The segment starts at the stop.
    #[default]
    Left,
    /// The segment is centered on the stop.
    Center,
    /// The segment ends at the stop.
    Right,
}

/// A user defined tab stop.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LsTabStop {
    /// Distance from the line start.
    pub position: Ideal,
    /// Alignment of the following segment.
    pub alignment: LsTabAlignment,
}

/// Tab configuration.
///
/// Explicit stops are used first; past the last of them tabs advance to the
/// next multiple of `incremental`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LsTabs {
    /// Stops sorted by position.
    pub stops: Vec<LsTabStop>,
    /// Distance between implicit stops.
    pub incremental: Ideal,
}

impl Default for LsTabs {
    fn default() -> Self {
        // 48 device independent pixels.
        Self {
            stops: Vec::new(),
            incremental: 48 * 300,
        }
    }
}

impl LsTabs {
    pub(crate) fn validate(&self) -> LsResult<()> {
        if self.incremental <= 0 {
            return Err(LsErr::InvalidParameter);
        }
        let mut last = 0;
        for stop in &self.stops {
            if stop.position < last {
                return Err(LsErr::InvalidParameter);
            }
            last = stop.position;
        }
        Ok(())
    }

    /// Returns the first stop strictly after `x`.
    pub(crate) fn next_stop(&self, x: Ideal) -> LsTabStop {
        if let Some(stop) = self.stops.iter().find(|stop| stop.position > x) {
            return *stop;
        }
        let position = (x / self.incremental + 1).saturating_mul(self.incremental);
        LsTabStop {
            position,
            alignment: LsTabAlignment::Left,
        }
    }
}
