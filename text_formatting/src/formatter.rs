// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::rc::Rc;
use core::cell::RefCell;

use line_services::{IDEAL_INFINITE_WIDTH, Ideal, LineParams, LsWrap};

use crate::context::{TextFormatterContext, with_pooled};
use crate::convert::{ideal_to_real, real_to_ideal, scaled, width_to_ideal};
use crate::fetch::Fetcher;
use crate::line::LineSettings;
use crate::{
    Error, FlowDirection, TextAlignment, TextFormattingMode, TextLine, TextLineBreak,
    TextParagraphCache, TextParagraphProperties, TextRunCache, TextSource, TextWrapping,
};

/// Smallest and largest width a paragraph can occupy.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct MinMaxParagraphWidth {
    /// Width of the widest unbreakable piece of content.
    pub min_width: f64,
    /// Width of the paragraph laid out without wrapping.
    pub max_width: f64,
}

std::thread_local! {
    static FORMATTERS: RefCell<[Option<Rc<TextFormatter>>; 2]> = const { RefCell::new([None, None]) };
}

/// Entry point for line formatting.
///
/// A formatter created with [`create`](Self::create) borrows an engine
/// context from a per thread pool for every call and can be used
/// reentrantly, for example from inside a [`TextSource`]. One created with
/// [`create_exclusive`](Self::create_exclusive) owns its context and rejects
/// overlapping calls with [`ErrorKind::FormatterInUse`](crate::ErrorKind::FormatterInUse).
#[derive(Debug)]
pub struct TextFormatter {
    mode: TextFormattingMode,
    exclusive: Option<RefCell<TextFormatterContext>>,
}

impl TextFormatter {
    /// Creates a formatter sharing the engine contexts of the current thread.
    pub fn create(mode: TextFormattingMode) -> Self {
        Self {
            mode,
            exclusive: None,
        }
    }

    /// Creates a formatter with an engine context of its own.
    pub fn create_exclusive(mode: TextFormattingMode) -> Self {
        Self {
            mode,
            exclusive: Some(RefCell::new(TextFormatterContext::default())),
        }
    }

    /// Returns the shared formatter of the current thread for `mode`.
    ///
    /// The formatter is created on first use and lives as long as the
    /// thread.
    pub fn from_current_thread(mode: TextFormattingMode) -> Rc<Self> {
        let slot = match mode {
            TextFormattingMode::Ideal => 0,
            TextFormattingMode::Display => 1,
        };
        FORMATTERS.with(|formatters| {
            formatters.borrow_mut()[slot]
                .get_or_insert_with(|| {
                    log::trace!("creating the {mode:?} formatter of this thread");
                    Rc::new(Self::create(mode))
                })
                .clone()
        })
    }

    /// How glyph metrics are rounded.
    pub fn formatting_mode(&self) -> TextFormattingMode {
        self.mode
    }

    /// Formats the line starting at `first_cp`.
    ///
    /// `previous_line_break` is `None` for the first line of a paragraph and
    /// the break of the previous line otherwise. `paragraph_width` follows
    /// the usual width rules: `0.0` and infinity mean unconstrained.
    pub fn format_line(
        &self,
        source: &dyn TextSource,
        first_cp: usize,
        paragraph_width: f64,
        props: &TextParagraphProperties,
        previous_line_break: Option<&TextLineBreak>,
    ) -> Result<TextLine, Error> {
        self.line(source, None, first_cp, paragraph_width, props, previous_line_break, None)
    }

    /// Formats the line starting at `first_cp`, taking runs from `cache`
    /// when possible.
    pub fn format_line_cached(
        &self,
        source: &dyn TextSource,
        first_cp: usize,
        paragraph_width: f64,
        props: &TextParagraphProperties,
        previous_line_break: Option<&TextLineBreak>,
        cache: &mut TextRunCache,
    ) -> Result<TextLine, Error> {
        self.line(
            source,
            Some(cache),
            first_cp,
            paragraph_width,
            props,
            previous_line_break,
            None,
        )
    }

    /// Formats a line of a known `line_length` without deciding where it
    /// ends.
    pub fn recreate_line(
        &self,
        source: &dyn TextSource,
        first_cp: usize,
        line_length: usize,
        paragraph_width: f64,
        props: &TextParagraphProperties,
        previous_line_break: Option<&TextLineBreak>,
    ) -> Result<TextLine, Error> {
        if line_length == 0 {
            return Err(Error::out_of_range("line_length"));
        }
        self.line(
            source,
            None,
            first_cp,
            paragraph_width,
            props,
            previous_line_break,
            Some(line_length),
        )
    }

    /// Snapshots the paragraph starting at `first_cp` for optimal breaking.
    pub fn create_paragraph_cache(
        &self,
        source: &dyn TextSource,
        first_cp: usize,
        paragraph_width: f64,
        props: &TextParagraphProperties,
        previous_line_break: Option<&TextLineBreak>,
        cache: Option<&mut TextRunCache>,
    ) -> Result<TextParagraphCache, Error> {
        let width = width_to_ideal(paragraph_width, "paragraph_width")?;
        let prev_break = previous_record(first_cp, previous_line_break)?;
        let params = LineParams {
            max_width: budget(width, props.line_indent()),
            prev_break,
            ..self.params(first_cp, props)
        };
        let scope = previous_line_break.and_then(|line_break| line_break.text_modifier_scope().cloned());
        self.with_context(|context| {
            context.configure(props, self.mode)?;
            let mut fetcher = Fetcher::new(source, cache, props, self.mode, first_cp, scope);
            let (session, penalized_as_justified) =
                context.create_para_breaking_session(&mut fetcher, &params)?;
            let (runs, initial_scope) = fetcher.into_runs();
            Ok(TextParagraphCache::new(
                session,
                props.clone(),
                runs,
                initial_scope,
                paragraph_width,
                penalized_as_justified,
            ))
        })
    }

    /// Measures the narrowest and widest layout of the paragraph starting at
    /// `first_cp`. Indentation is not included.
    pub fn format_min_max_paragraph_width(
        &self,
        source: &dyn TextSource,
        first_cp: usize,
        props: &TextParagraphProperties,
    ) -> Result<MinMaxParagraphWidth, Error> {
        self.min_max(source, None, first_cp, props)
    }

    /// Like [`format_min_max_paragraph_width`](Self::format_min_max_paragraph_width),
    /// taking runs from `cache` when possible.
    pub fn format_min_max_paragraph_width_cached(
        &self,
        source: &dyn TextSource,
        first_cp: usize,
        props: &TextParagraphProperties,
        cache: &mut TextRunCache,
    ) -> Result<MinMaxParagraphWidth, Error> {
        self.min_max(source, Some(cache), first_cp, props)
    }

    fn with_context<R>(
        &self,
        f: impl FnOnce(&mut TextFormatterContext) -> Result<R, Error>,
    ) -> Result<R, Error> {
        match &self.exclusive {
            Some(context) => {
                let mut context = context.try_borrow_mut().map_err(|_| Error::in_use())?;
                f(&mut context)
            }
            None => with_pooled(f),
        }
    }

    /// Engine parameters shared by every entry point.
    fn params<'a>(&self, first_cp: usize, props: &TextParagraphProperties) -> LineParams<'a> {
        let default = &props.default_text_run_properties;
        let hyphen_advance = real_to_ideal(scaled(
            default.typeface.advance('-'),
            default.font_rendering_em_size,
            self.mode,
            default.pixels_per_dip,
        ))
        .max(0);
        LineParams {
            first_cp,
            max_width: IDEAL_INFINITE_WIDTH,
            wrap: match props.text_wrapping {
                TextWrapping::Wrap => LsWrap::Wrap,
                TextWrapping::WrapWithOverflow => LsWrap::WrapWithOverflow,
                TextWrapping::NoWrap => LsWrap::NoWrap,
            },
            justify: props.text_alignment == TextAlignment::Justify,
            forced_length: None,
            hyphenate: props.text_lexical_service.is_some(),
            hyphen_advance,
            base_rtl: props.flow_direction == FlowDirection::RightToLeft,
            prev_break: None,
        }
    }

    fn line(
        &self,
        source: &dyn TextSource,
        cache: Option<&mut TextRunCache>,
        first_cp: usize,
        paragraph_width: f64,
        props: &TextParagraphProperties,
        previous_line_break: Option<&TextLineBreak>,
        forced_length: Option<usize>,
    ) -> Result<TextLine, Error> {
        let width = width_to_ideal(paragraph_width, "paragraph_width")?;
        let prev_break = previous_record(first_cp, previous_line_break)?;
        let params = LineParams {
            max_width: budget(width, props.line_indent()),
            forced_length,
            prev_break,
            ..self.params(first_cp, props)
        };
        let scope = previous_line_break.and_then(|line_break| line_break.text_modifier_scope().cloned());
        let settings = LineSettings {
            props,
            paragraph_width: (width != IDEAL_INFINITE_WIDTH).then_some(paragraph_width),
            mode: self.mode,
        };
        self.with_context(|context| {
            context.configure(props, self.mode)?;
            let mut fetcher = Fetcher::new(source, cache, props, self.mode, first_cp, scope);
            let ls = context.create_line(&mut fetcher, &params)?;
            Ok(TextLine::new(ls, fetcher, settings))
        })
    }

    fn min_max(
        &self,
        source: &dyn TextSource,
        cache: Option<&mut TextRunCache>,
        first_cp: usize,
        props: &TextParagraphProperties,
    ) -> Result<MinMaxParagraphWidth, Error> {
        let params = LineParams {
            hyphenate: false,
            ..self.params(first_cp, props)
        };
        self.with_context(|context| {
            context.configure(props, self.mode)?;
            let mut fetcher = Fetcher::new(source, cache, props, self.mode, first_cp, None);
            let (mut session, _) = context.create_para_breaking_session(&mut fetcher, &params)?;
            let widths = context.content_widths(&session);
            session.close();
            let (min_width, max_width) = widths?;
            Ok(MinMaxParagraphWidth {
                min_width: ideal_to_real(min_width),
                max_width: ideal_to_real(max_width),
            })
        })
    }
}

/// The engine record of `previous_line_break`, which has to continue at
/// `first_cp`.
fn previous_record(
    first_cp: usize,
    previous_line_break: Option<&TextLineBreak>,
) -> Result<Option<&line_services::BreakRecord>, Error> {
    let Some(line_break) = previous_line_break else {
        return Ok(None);
    };
    let record = line_break.record()?;
    if record.cp() != first_cp {
        return Err(Error::invalid_argument("previous_line_break"));
    }
    Ok(Some(record))
}

/// Width left for the content of a line after its indentation.
fn budget(width: Ideal, indent: f64) -> Ideal {
    if width == IDEAL_INFINITE_WIDTH {
        width
    } else {
        (width - real_to_ideal(indent)).max(0)
    }
}
