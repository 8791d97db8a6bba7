// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Engine contexts and their per thread pool.

use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;
use core::cell::RefCell;
use std::sync::OnceLock;

use line_services::{
    BreakRecord, BreakRestriction, LineParams, LsBreak, LsContext, LsDoc, LsLine, LsTabAlignment,
    LsTabStop, LsTabs, ParaBreakingSession,
};

use crate::convert::{REAL_TO_IDEAL, real_to_ideal};
use crate::fetch::Fetcher;
use crate::{
    BreakStrategy, Error, TextFormattingMode, TextParagraphProperties, TextTabAlignment,
};

/// Characters the engine treats specially, as a bitset over the BMP.
struct SpecialCharacters {
    bits: Box<[u64]>,
}

impl SpecialCharacters {
    fn new(characters: &[char]) -> Self {
        let mut bits = vec![0_u64; 0x1_0000 / 64].into_boxed_slice();
        for ch in characters {
            let cp = u32::from(*ch) as usize;
            if cp < 0x1_0000 {
                bits[cp / 64] |= 1 << (cp % 64);
            }
        }
        Self { bits }
    }

    fn contains(&self, ch: char) -> bool {
        let cp = u32::from(ch) as usize;
        cp < 0x1_0000 && self.bits[cp / 64] & (1 << (cp % 64)) != 0
    }
}

static SPECIAL_CHARACTERS: OnceLock<SpecialCharacters> = OnceLock::new();

/// Returns `true` if `ch` needs the engine's dedicated handling.
pub(crate) fn is_special_character(ch: char) -> bool {
    SPECIAL_CHARACTERS
        .get_or_init(|| SpecialCharacters::new(line_services::SPECIAL_CHARACTERS))
        .contains(ch)
}

/// One reentrancy slot into the line services engine.
///
/// A context serves a single formatting call at a time. Between uses it is
/// kept in a per thread pool or by an exclusive formatter.
#[derive(Debug, Default)]
pub(crate) struct TextFormatterContext {
    ls: Option<LsContext>,
}

impl TextFormatterContext {
    fn ls(&mut self) -> &mut LsContext {
        self.ls.get_or_insert_with(|| {
            log::trace!("creating line services context");
            LsContext::new()
        })
    }

    /// Applies the paragraph configuration to the engine.
    pub(crate) fn configure(
        &mut self,
        props: &TextParagraphProperties,
        mode: TextFormattingMode,
    ) -> Result<(), Error> {
        let strategy = match props.break_strategy {
            BreakStrategy::Normal => line_services::BreakStrategy::Normal,
            BreakStrategy::KeepAll => line_services::BreakStrategy::KeepAll,
            BreakStrategy::BreakAll => line_services::BreakStrategy::BreakAll,
        };
        let ls = self.ls();
        ls.set_breaking(strategy);

        let pixels_per_dip = f64::from(props.default_text_run_properties.pixels_per_dip);
        let ideal_per_pixel = match mode {
            TextFormattingMode::Display if pixels_per_dip > 0.0 => {
                real_to_ideal(1.0 / pixels_per_dip).max(1)
            }
            _ => 0,
        };
        ls.set_doc(LsDoc { ideal_per_pixel })
            .map_err(|err| Error::from_ls(err, None))?;

        let mut stops = Vec::new();
        stops.try_reserve(props.tabs.len()).map_err(|_| {
            Error::from_ls(line_services::LsErr::OutOfMemory, None)
        })?;
        for tab in &props.tabs {
            if tab.location.is_nan() || tab.location < 0.0 {
                return Err(Error::out_of_range("tabs"));
            }
            stops.push(LsTabStop {
                position: real_to_ideal(tab.location),
                alignment: match tab.alignment {
                    TextTabAlignment::Left | TextTabAlignment::Character => LsTabAlignment::Left,
                    TextTabAlignment::Center => LsTabAlignment::Center,
                    TextTabAlignment::Right => LsTabAlignment::Right,
                },
            });
        }
        let incremental = props.incremental_tab();
        if incremental.is_nan() || incremental * REAL_TO_IDEAL < 1.0 {
            return Err(Error::out_of_range("default_incremental_tab"));
        }
        let tabs = LsTabs {
            stops,
            incremental: real_to_ideal(incremental),
        };
        if *ls.tabs() != tabs {
            ls.set_tabs(tabs)
                .map_err(|_| Error::out_of_range("tabs"))?;
        }
        Ok(())
    }

    /// Formats one line.
    pub(crate) fn create_line(
        &mut self,
        fetcher: &mut Fetcher<'_>,
        params: &LineParams<'_>,
    ) -> Result<LsLine, Error> {
        self.ls()
            .create_line(fetcher, params)
            .map_err(|err| Error::from_ls(err, fetcher.take_error()))
    }

    /// Snapshots a paragraph for optimal breaking.
    pub(crate) fn create_para_breaking_session(
        &mut self,
        fetcher: &mut Fetcher<'_>,
        params: &LineParams<'_>,
    ) -> Result<(ParaBreakingSession, bool), Error> {
        self.ls()
            .create_para_breaking_session(fetcher, params)
            .map_err(|err| Error::from_ls(err, fetcher.take_error()))
    }

    /// Lists break candidates for one line of a session.
    pub(crate) fn create_breaks(
        &mut self,
        session: &mut ParaBreakingSession,
        first_cp: usize,
        prev: Option<&BreakRecord>,
        restriction: &BreakRestriction,
        max_width: line_services::Ideal,
    ) -> Result<(Vec<LsBreak>, usize), Error> {
        self.ls()
            .create_breaks(session, first_cp, prev, restriction, max_width)
            .map_err(|err| Error::from_ls(err, None))
    }

    /// Smallest and largest width of a session's paragraph.
    pub(crate) fn content_widths(
        &mut self,
        session: &ParaBreakingSession,
    ) -> Result<(line_services::Ideal, line_services::Ideal), Error> {
        self.ls()
            .content_widths(session)
            .map_err(|err| Error::from_ls(err, None))
    }

    /// Drops the engine context.
    pub(crate) fn destroy(&mut self) {
        if self.ls.take().is_some() {
            log::trace!("destroying line services context");
        }
    }
}

/// Upper bound of idle contexts kept per thread.
const POOL_LIMIT: usize = 4;

std::thread_local! {
    static POOL: RefCell<Vec<TextFormatterContext>> = const { RefCell::new(Vec::new()) };
}

/// Runs `f` with a context taken from the current thread's pool.
///
/// Nested calls, for example from inside a text source, get a context of
/// their own.
pub(crate) fn with_pooled<R>(f: impl FnOnce(&mut TextFormatterContext) -> R) -> R {
    let mut context = POOL
        .with(|pool| pool.borrow_mut().pop())
        .unwrap_or_else(|| {
            log::trace!("context pool empty, creating a context");
            TextFormatterContext::default()
        });
    let result = f(&mut context);
    POOL.with(|pool| {
        let mut pool = pool.borrow_mut();
        if pool.len() < POOL_LIMIT {
            pool.push(context);
        } else {
            context.destroy();
        }
    });
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn special_characters_are_recognised() {
        assert!(is_special_character('\t'));
        assert!(is_special_character('\u{2029}'));
        assert!(is_special_character('\u{AD}'));
        assert!(!is_special_character('a'));
        assert!(!is_special_character('\u{1F600}'));
    }

    #[test]
    fn nested_pool_use_gets_a_context_of_its_own() {
        with_pooled(|outer| {
            outer.ls();
            with_pooled(|inner| {
                assert!(inner.ls.is_none(), "the outer context is still in use");
            });
        });
        with_pooled(|context| {
            assert!(context.ls.is_some(), "released contexts are reused");
        });
    }

    #[test]
    fn configuration_rejects_negative_tab_stops() {
        let mut context = TextFormatterContext::default();
        let mut props = TextParagraphProperties::default();
        props.tabs.push(crate::TextTabProperties {
            alignment: TextTabAlignment::Left,
            location: -4.0,
            tab_leader: None,
            aligning_char: None,
        });
        let error = context
            .configure(&props, TextFormattingMode::Ideal)
            .unwrap_err();
        assert_eq!(error.kind(), crate::ErrorKind::ArgumentOutOfRange);
    }
}
