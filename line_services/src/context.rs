// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::vec::Vec;

use crate::analysis::Segmenters;
use crate::line::build_line;
use crate::line::greedy::{choose_break, has_opportunity};
use crate::optimal::insert_hyphenation;
use crate::text::{FetchLimit, LayoutConfig, LsText};
use crate::{
    BreakRecord, BreakRestriction, BreakStrategy, IDEAL_INFINITE_WIDTH, Ideal, LineParams, LsBreak,
    LsClient, LsDoc, LsErr, LsLine, LsResult, LsTabs, LsWrap, ParaBreakingSession,
    SPECIAL_CHARACTERS,
};

/// An instance of the line breaking engine.
///
/// A context is configured once and then used for any number of lines, one
/// call at a time.
#[derive(Debug, Default)]
pub struct LsContext {
    strategy: BreakStrategy,
    doc: LsDoc,
    tabs: LsTabs,
    segmenters: Segmenters,
}

fn validate_width(width: Ideal) -> LsResult<()> {
    if (0..=IDEAL_INFINITE_WIDTH).contains(&width) {
        Ok(())
    } else {
        Err(LsErr::InvalidParameter)
    }
}

fn validate_params(params: &LineParams<'_>) -> LsResult<()> {
    validate_width(params.max_width)?;
    if params.hyphen_advance < 0 {
        return Err(LsErr::InvalidParameter);
    }
    if params
        .prev_break
        .is_some_and(|record| record.cp != params.first_cp)
    {
        return Err(LsErr::InvalidParameter);
    }
    Ok(())
}

impl LsContext {
    /// Creates a context with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// The configured breaking strategy.
    pub fn breaking(&self) -> BreakStrategy {
        self.strategy
    }

    /// Sets the breaking strategy. Returns `false` if it was already in effect.
    pub fn set_breaking(&mut self, strategy: BreakStrategy) -> bool {
        if self.strategy == strategy {
            return false;
        }
        log::trace!("breaking strategy {:?} -> {strategy:?}", self.strategy);
        self.strategy = strategy;
        true
    }

    /// The device configuration.
    pub fn doc(&self) -> LsDoc {
        self.doc
    }

    /// Sets the device configuration.
    pub fn set_doc(&mut self, doc: LsDoc) -> LsResult<()> {
        if doc.ideal_per_pixel < 0 {
            return Err(LsErr::InvalidParameter);
        }
        self.doc = doc;
        Ok(())
    }

    /// The tab configuration.
    pub fn tabs(&self) -> &LsTabs {
        &self.tabs
    }

    /// Sets the tab configuration.
    pub fn set_tabs(&mut self, tabs: LsTabs) -> LsResult<()> {
        tabs.validate()?;
        self.tabs = tabs;
        Ok(())
    }

    /// Characters that get dedicated treatment.
    pub fn special_characters(&self) -> &'static [char] {
        SPECIAL_CHARACTERS
    }

    fn fetch(
        &mut self,
        client: &mut dyn LsClient,
        params: &LineParams<'_>,
        limit: FetchLimit,
    ) -> LsResult<LsText> {
        let config = LayoutConfig {
            tabs: &self.tabs,
            doc: &self.doc,
        };
        let mut text = LsText::fetch(client, params.first_cp, params.prev_break, limit, config)?;
        self.segmenters
            .analyze(&mut text, self.strategy, params.base_rtl)?;
        Ok(text)
    }

    /// Formats the line starting at `params.first_cp`.
    pub fn create_line(
        &mut self,
        client: &mut dyn LsClient,
        params: &LineParams<'_>,
    ) -> LsResult<LsLine> {
        validate_params(params)?;
        let limit = match (params.forced_length, params.wrap) {
            (Some(length), _) => FetchLimit::Cp(params.first_cp.saturating_add(length)),
            (None, LsWrap::NoWrap) => FetchLimit::Paragraph,
            (None, _) => FetchLimit::Width(params.max_width),
        };
        let mut text = self.fetch(client, params, limit)?;
        if params.wrap == LsWrap::WrapWithOverflow
            && params.forced_length.is_none()
            && text.terminator.is_none()
            && !has_opportunity(&text, 0)
        {
            // An overflowing word has to be taken whole.
            text = self.fetch(client, params, FetchLimit::Paragraph)?;
        }
        let config = LayoutConfig {
            tabs: &self.tabs,
            doc: &self.doc,
        };
        let decision = choose_break(&text, client, 0, params, config)?;
        let line = build_line(&text, &decision, params, config)?;
        log::debug!(
            "create_line at {}: length {}, width {}, truncated {}, overflowed {}",
            line.cp_first,
            line.length,
            line.width,
            line.is_truncated,
            line.has_overflowed
        );
        Ok(line)
    }

    /// Snapshots the paragraph starting at `params.first_cp` for optimal
    /// breaking.
    ///
    /// Also returns whether the paragraph is penalized as justified text.
    pub fn create_para_breaking_session(
        &mut self,
        client: &mut dyn LsClient,
        params: &LineParams<'_>,
    ) -> LsResult<(ParaBreakingSession, bool)> {
        validate_params(params)?;
        let mut text = self.fetch(client, params, FetchLimit::Paragraph)?;
        if params.hyphenate {
            insert_hyphenation(&mut text, client)?;
        }
        log::debug!(
            "para breaking session at {}: {} positions",
            params.first_cp,
            text.units.len()
        );
        let session = ParaBreakingSession::new(
            text,
            self.tabs.clone(),
            self.doc,
            params.wrap,
            params.justify,
            params.hyphen_advance,
        )?;
        Ok((session, params.justify))
    }

    /// Lists candidate ends for the line starting at `first_cp` and the index
    /// of the one that minimizes the cost of the whole paragraph.
    pub fn create_breaks(
        &mut self,
        session: &mut ParaBreakingSession,
        first_cp: usize,
        prev: Option<&BreakRecord>,
        restriction: &BreakRestriction,
        max_width: Ideal,
    ) -> LsResult<(Vec<LsBreak>, usize)> {
        validate_width(max_width)?;
        session.create_breaks(first_cp, prev, restriction, max_width)
    }

    /// Smallest and largest width the paragraph of `session` can occupy.
    pub fn content_widths(&self, session: &ParaBreakingSession) -> LsResult<(Ideal, Ideal)> {
        session.content_widths()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::tests::Runs;
    use crate::{BreakKind, LsBreakCondition, LsRunKind};

    fn line(client: &mut Runs, params: LineParams<'_>) -> LsLine {
        LsContext::new().create_line(client, &params).unwrap()
    }

    fn wide(first_cp: usize) -> LineParams<'static> {
        LineParams {
            first_cp,
            max_width: 100_000,
            ..LineParams::default()
        }
    }

    #[test]
    fn breaking_is_only_reconfigured_on_change() {
        let mut context = LsContext::new();
        assert!(!context.set_breaking(BreakStrategy::Normal));
        assert!(context.set_breaking(BreakStrategy::KeepAll));
        assert!(!context.set_breaking(BreakStrategy::KeepAll));
        assert_eq!(context.breaking(), BreakStrategy::KeepAll);
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        let mut context = LsContext::new();
        let tabs = LsTabs {
            stops: Vec::new(),
            incremental: -1,
        };
        assert_eq!(context.set_tabs(tabs), Err(LsErr::InvalidParameter));
        let doc = LsDoc {
            ideal_per_pixel: -3,
        };
        assert_eq!(context.set_doc(doc), Err(LsErr::InvalidParameter));
        let mut client = Runs::default().text("a", 10).end();
        let params = LineParams {
            max_width: -1,
            ..LineParams::default()
        };
        let result = context.create_line(&mut client, &params);
        assert_eq!(result.err(), Some(LsErr::InvalidParameter));
    }

    #[test]
    fn single_line_paragraph() {
        let mut client = Runs::default().text("Hello world", 100).end();
        let line = line(&mut client, wide(0));
        assert_eq!(line.length, 12);
        assert_eq!(line.width, 1100);
        assert_eq!(line.newline_length, 1);
        assert_eq!(line.trailing_whitespace_length, 1);
        assert!(line.ends_paragraph);
        assert!(line.break_record.is_none());
        assert!(!line.has_overflowed);
        assert!(!line.is_truncated);
        assert_eq!(line.spans.len(), 2);
        assert_eq!(line.advances.len(), 12);
    }

    #[test]
    fn lines_continue_from_the_break_record() {
        let mut client = Runs::default().text("aaa bbb ccc", 10).end();
        let mut context = LsContext::new();
        let mut params = LineParams {
            max_width: 75,
            ..LineParams::default()
        };
        let first = context.create_line(&mut client, &params).unwrap();
        assert_eq!(first.length, 8);
        assert_eq!(first.width, 70);
        assert_eq!(first.trailing_whitespace_length, 1);
        assert_eq!(first.dependent_length, 1);
        let record = first.break_record.unwrap();
        params.first_cp = record.cp();
        params.prev_break = Some(&record);
        let second = context.create_line(&mut client, &params).unwrap();
        assert_eq!(second.cp_first, 8);
        assert_eq!(second.length, 4);
        assert!(second.ends_paragraph);
    }

    #[test]
    fn a_mismatched_break_record_is_rejected() {
        let mut client = Runs::default().text("aaa bbb", 10).end();
        let record = BreakRecord {
            cp: 4,
            embeddings: smallvec::SmallVec::new(),
            hyphenated: false,
        };
        let params = LineParams {
            first_cp: 2,
            max_width: 100,
            prev_break: Some(&record),
            ..LineParams::default()
        };
        let result = LsContext::new().create_line(&mut client, &params);
        assert_eq!(result.err(), Some(LsErr::InvalidParameter));
    }

    #[test]
    fn empty_paragraph_is_an_empty_line() {
        let mut client = Runs::default().run(0, LsRunKind::EndOfParagraph);
        let line = line(&mut client, wide(0));
        assert_eq!(line.length, 0);
        assert!(line.ends_paragraph);
        assert!(line.clusters.is_empty());
    }

    #[test]
    fn end_of_line_continues_the_paragraph() {
        let mut client = Runs::default()
            .text("ab", 10)
            .run(1, LsRunKind::EndOfLine)
            .text("cd", 10)
            .end();
        let line = line(&mut client, wide(0));
        assert_eq!(line.length, 3);
        assert_eq!(line.newline_length, 1);
        assert_eq!(line.break_kind, BreakKind::Mandatory);
        assert!(!line.ends_paragraph);
        assert_eq!(line.break_record.as_ref().map(BreakRecord::cp), Some(3));
    }

    #[test]
    fn justification_fills_the_width() {
        let mut client = Runs::default().text("aa bb cc dd", 10).end();
        let params = LineParams {
            max_width: 95,
            justify: true,
            ..LineParams::default()
        };
        let line = line(&mut client, params);
        assert_eq!(line.length, 9);
        assert_eq!(line.width, 95);
        assert_eq!(line.advances[2], 18);
        assert_eq!(line.advances[5], 17);
    }

    #[test]
    fn last_lines_are_not_justified() {
        let mut client = Runs::default().text("aa bb", 10).end();
        let params = LineParams {
            max_width: 95,
            justify: true,
            ..LineParams::default()
        };
        let line = line(&mut client, params);
        assert_eq!(line.width, 50);
    }

    #[test]
    fn right_to_left_lines_start_at_the_right() {
        let mut client = Runs::default().text("\u{5D0}\u{5D1} ab", 10).end();
        let params = LineParams {
            max_width: 1000,
            base_rtl: true,
            ..LineParams::default()
        };
        let line = line(&mut client, params);
        // Logical order: alef, bet, space, a, b, terminator.
        let flow: Vec<Ideal> = line.clusters.iter().map(|cluster| cluster.flow_x).collect();
        assert_eq!(flow[0], 0);
        assert_eq!(flow[1], 10);
        assert!(line.is_forward(0));
        assert!(!line.is_forward(3));
        // The Latin run is laid out left to right at the visual left end.
        assert!(flow[3] > flow[4]);
        assert_eq!(line.max_nesting_depth, 1);
    }

    #[test]
    fn embeddings_are_carried_to_the_next_line() {
        let mut client = Runs::default()
            .run(
                1,
                LsRunKind::Hidden {
                    control: Some('\u{202B}'),
                },
            )
            .text("aaa bbb", 10)
            .run(
                1,
                LsRunKind::Hidden {
                    control: Some('\u{202C}'),
                },
            )
            .end();
        let params = LineParams {
            max_width: 35,
            ..LineParams::default()
        };
        let first = line(&mut client, params);
        let record = first.break_record.unwrap();
        assert_eq!(record.embedding_depth(), 1);
        // Left-to-right text inside a right-to-left embedding.
        assert_eq!(first.clusters[1].level, 2);
    }

    #[test]
    fn objects_break_as_their_conditions_say() {
        let object = LsRunKind::Object {
            width: 30,
            ascent: 1000,
            descent: 0,
            break_before: LsBreakCondition::Possible,
            break_after: LsBreakCondition::Always,
        };
        let mut client = Runs::default().text("ab", 10).run(3, object).text("cd", 10).end();
        let line = line(&mut client, wide(0));
        assert_eq!(line.length, 5);
        assert_eq!(line.width, 50);
        assert_eq!(line.ascent, 1000);
        assert_eq!(line.clusters.len(), 3);
        assert_eq!(line.clusters[2].len, 3);
    }

    #[test]
    fn client_failures_abort_the_line() {
        let mut client = Runs::default().text("ab", 10).end();
        client.fail_at = Some(2);
        let result = LsContext::new().create_line(&mut client, &wide(0));
        assert_eq!(result.err(), Some(LsErr::ClientAbort));
    }

    #[test]
    fn sessions_report_content_widths() {
        let mut client = Runs::default().text("aaa bbbbb cc", 10).end();
        let mut context = LsContext::new();
        let (session, justified) = context
            .create_para_breaking_session(&mut client, &wide(0))
            .unwrap();
        assert!(!justified);
        assert_eq!(context.content_widths(&session).unwrap(), (50, 120));
    }
}
