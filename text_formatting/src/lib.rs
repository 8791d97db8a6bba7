// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Line formatting for rich text.
//!
//! A client describes its content through a [`TextSource`], a sequence of
//! [`TextRun`]s addressed by character position. [`TextFormatter`] turns the
//! content starting at a position into a [`TextLine`], which supports
//! measuring, hit testing, caret navigation, collapsing and drawing. The
//! [`TextLineBreak`] of a line resumes formatting at the next line.
//!
//! For paragraph wide optimization a [`TextParagraphCache`] snapshots the
//! paragraph once and ranks the candidate ends of each line by the cost of
//! the whole paragraph.
//!
//! All lengths are device independent units. Internally they are converted
//! to the fixed point units of [`line_services`], at [`REAL_TO_IDEAL`] units
//! per device independent unit.
//!
//! ```
//! use text_formatting::{
//!     CharacterBufferRange, ClientError, TextFormatter, TextFormattingMode,
//!     TextParagraphProperties, TextRun, TextSource,
//! };
//!
//! struct Paragraph {
//!     text: CharacterBufferRange,
//!     props: TextParagraphProperties,
//! }
//!
//! impl TextSource for Paragraph {
//!     fn get_text_run(&self, cp: usize) -> Result<TextRun, ClientError> {
//!         if cp >= self.text.len() {
//!             return Ok(TextRun::end_of_paragraph(1));
//!         }
//!         let rest = self.text.sub_range(cp, self.text.len() - cp)?;
//!         Ok(TextRun::Characters(text_formatting::TextCharacters {
//!             range: rest,
//!             properties: self.props.default_text_run_properties.clone(),
//!         }))
//!     }
//! }
//!
//! let props = TextParagraphProperties::default();
//! let source = Paragraph {
//!     text: CharacterBufferRange::from_text("Hello, world"),
//!     props: props.clone(),
//! };
//! let formatter = TextFormatter::create(TextFormattingMode::Ideal);
//! let line = formatter.format_line(&source, 0, 500.0, &props, None)?;
//! assert_eq!(line.length(), 13);
//! assert!(line.get_text_line_break().is_none());
//! # Ok::<(), text_formatting::Error>(())
//! ```

extern crate alloc;

mod buffer;
mod context;
mod convert;
mod error;
mod fetch;
mod formatter;
mod line;
mod line_break;
mod modifier;
mod paragraph_cache;
mod run;
mod source;
mod style;

#[cfg(test)]
mod tests;

pub use buffer::{CharacterBuffer, CharacterBufferRange, CharacterBufferReference};
pub use convert::{REAL_INFINITE_WIDTH, REAL_TO_IDEAL, ideal_to_real, real_to_ideal};
pub use error::{ClientError, Error, ErrorKind};
pub use formatter::{MinMaxParagraphWidth, TextFormatter};
pub use line::{
    CharacterHit, DrawingContext, GlyphRun, IndexedGlyphRun, TextBounds, TextCollapsedRange,
    TextLine, TextLineMetrics, TextRunBounds,
};
pub use line_break::TextLineBreak;
pub use modifier::TextModifierScope;
pub use paragraph_cache::{TextBreakpoint, TextParagraphCache, TextPenaltyModule};
pub use run::{
    LineBreakCondition, TextCharacters, TextEmbeddedObject, TextEmbeddedObjectMetrics,
    TextEndOfLine, TextModifier, TextRun,
};
pub use source::{
    CultureSpecificCharacterBufferRange, TextLexicalService, TextRunCache, TextSource, TextSpan,
};
pub use style::{
    BaselineAlignment, BreakStrategy, FixedPitchTypeface, FlowDirection, FontTypeface,
    MappedTypeface, TextAlignment, TextCollapsingProperties, TextCollapsingStyle,
    TextDecorations, TextFormattingMode, TextParagraphProperties, TextRunProperties,
    TextTabAlignment, TextTabProperties, TextWrapping, Typeface,
};
