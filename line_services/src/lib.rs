// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Line Services: the low level line breaking engine.
//!
//! This crate is deliberately ignorant of rich text. A client describes its
//! content through the [`LsClient`] callback trait, one [`LsRun`] at a time,
//! with every advance already converted to [`Ideal`] units. The engine
//! performs Unicode analysis (line break opportunities, grapheme clusters and
//! bidirectional levels), decides where lines end, and hands back opaque
//! continuation state ([`BreakRecord`]) to resume the next line.
//!
//! Every entry point reports failure through an [`LsErr`] result code. When
//! a client callback fails it returns [`ClientAbort`]; the engine then unwinds
//! with [`LsErr::ClientAbort`] and leaves it to the client to surface whatever
//! caused the abort.
//!
//! Two breaking strategies are offered:
//!
//! - [`LsContext::create_line`] fills one line greedily.
//! - [`LsContext::create_para_breaking_session`] snapshots a whole paragraph,
//!   after which [`LsContext::create_breaks`] ranks the candidate breaks for a
//!   line by the total cost of the paragraph (Knuth-Plass style).

extern crate alloc;

mod analysis;
mod break_record;
mod client;
mod config;
mod context;
mod error;
mod line;
mod optimal;
mod run;
mod text;

pub use break_record::BreakRecord;
pub use client::{ClientAbort, LsClient};
pub use config::{BreakStrategy, LsDoc, LsTabAlignment, LsTabStop, LsTabs, SPECIAL_CHARACTERS};
pub use context::LsContext;
pub use error::LsErr;
pub use line::{BreakKind, LineParams, LsCluster, LsLine, LsLineSpan, LsWrap};
pub use optimal::{BreakRestriction, LsBreak, ParaBreakingSession, Penalties};
pub use run::{LsBreakCondition, LsRun, LsRunKind};

/// Fixed point length unit used for all engine arithmetic.
pub type Ideal = i32;

/// The widest line the engine is able to represent.
///
/// Callers map "unconstrained" widths onto this value.
pub const IDEAL_INFINITE_WIDTH: Ideal = 0x3FFF_FFFE;

/// Result type used by the engine entry points.
pub type LsResult<T> = Result<T, LsErr>;
