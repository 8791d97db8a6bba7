// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::{CharacterBufferRange, ClientError, TextCharacters, TextRun};

/// A value covering `length` character positions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TextSpan<T> {
    /// Number of character positions.
    pub length: usize,
    /// The value.
    pub value: T,
}

/// Characters tagged with the culture they belong to.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CultureSpecificCharacterBufferRange {
    /// BCP 47 language tag.
    pub culture: Option<Arc<str>>,
    /// The characters.
    pub range: CharacterBufferRange,
}

/// Client content provider.
///
/// Runs are requested in increasing character order, starting at the first
/// position of the line being formatted. A run returned for `cp` starts at
/// `cp`.
pub trait TextSource {
    /// Returns the run starting at `cp`.
    fn get_text_run(&self, cp: usize) -> Result<TextRun, ClientError>;

    /// Returns text preceding `cp_limit`, used as context for the analysis
    /// at the start of a line.
    fn get_preceding_text(
        &self,
        cp_limit: usize,
    ) -> Result<TextSpan<CultureSpecificCharacterBufferRange>, ClientError> {
        let _ = cp_limit;
        Ok(TextSpan::default())
    }

    /// Maps a text source position to a text effect position.
    fn get_text_effect_character_index(&self, cp: usize) -> usize {
        cp
    }
}

/// Client hyphenation provider.
pub trait TextLexicalService: core::fmt::Debug + Send + Sync {
    /// Whether words of `culture` can be hyphenated.
    fn is_culture_supported(&self, culture: Option<&str>) -> bool {
        let _ = culture;
        true
    }

    /// Returns the offsets inside `word` where a hyphen may be inserted.
    ///
    /// An offset `k` allows a break between `word[k - 1]` and `word[k]`.
    fn hyphenate(&self, word: &[char], culture: Option<&str>) -> Result<Vec<usize>, ClientError>;
}

#[derive(Clone, Debug)]
struct CachedRun {
    cp: usize,
    run: TextRun,
    /// Last use, for evicting the least recently used run.
    epoch: u64,
}

impl CachedRun {
    fn end(&self) -> usize {
        self.cp + self.run.length()
    }
}

/// Runs fetched by earlier formatting calls.
///
/// Passing the same cache to consecutive calls spares the
/// [`TextSource`] repeated requests for the same runs. Edits to the content
/// have to be reported through [`TextRunCache::change`].
///
/// At most [`TextRunCache::DEFAULT_MAX_RUNS`] runs are kept unless another
/// bound is given; the least recently used run makes room for a new one.
#[derive(Clone, Debug)]
pub struct TextRunCache {
    /// Sorted by position, without overlaps.
    runs: Vec<CachedRun>,
    epoch: u64,
    max_runs: usize,
}

impl Default for TextRunCache {
    fn default() -> Self {
        Self::with_max_runs(Self::DEFAULT_MAX_RUNS)
    }
}

impl TextRunCache {
    /// Bound of caches made by [`TextRunCache::new`].
    pub const DEFAULT_MAX_RUNS: usize = 256;

    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty cache holding at most `max_runs` runs.
    pub fn with_max_runs(max_runs: usize) -> Self {
        Self {
            runs: Vec::new(),
            epoch: 0,
            max_runs,
        }
    }

    /// Number of cached runs.
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Reports that `removed` positions starting at `cp` were replaced by
    /// `added` positions.
    ///
    /// Runs touching the edit are dropped and runs after it are shifted.
    pub fn change(&mut self, cp: usize, added: usize, removed: usize) {
        let edit_end = cp + removed;
        self.runs.retain_mut(|cached| {
            if cached.end() <= cp {
                return true;
            }
            if cached.cp >= edit_end {
                cached.cp = cached.cp - removed + added;
                return true;
            }
            false
        });
        log::trace!("run cache change at {cp}: +{added} -{removed}, {} runs kept", self.runs.len());
    }

    /// Drops every cached run.
    pub fn invalidate(&mut self) {
        self.runs.clear();
    }

    /// Returns the run starting at `cp`, from the cache when possible.
    pub(crate) fn fetch(&mut self, source: &dyn TextSource, cp: usize) -> Result<TextRun, ClientError> {
        self.epoch += 1;
        let mut index = self.runs.partition_point(|cached| cached.cp <= cp);
        if let Some(cached) = index.checked_sub(1).map(|found| &mut self.runs[found]) {
            if cp < cached.end() {
                cached.epoch = self.epoch;
            }
            if cached.cp == cp {
                return Ok(cached.run.clone());
            }
            if cp < cached.end() {
                if let TextRun::Characters(characters) = &cached.run {
                    if let Ok(range) = characters
                        .range
                        .sub_range(cp - cached.cp, cached.end() - cp)
                    {
                        return Ok(TextRun::Characters(TextCharacters {
                            range,
                            properties: characters.properties.clone(),
                        }));
                    }
                }
            }
        }
        let run = source.get_text_run(cp)?;
        if run.length() > 0 {
            let overlaps = self
                .runs
                .get(index)
                .is_some_and(|next| next.cp < cp + run.length());
            let fits = !overlaps
                && self.max_runs > 0
                && index.checked_sub(1).is_none_or(|prev| self.runs[prev].end() <= cp);
            if fits {
                if self.runs.len() >= self.max_runs {
                    let oldest = self
                        .runs
                        .iter()
                        .enumerate()
                        .min_by_key(|(_, cached)| cached.epoch)
                        .map(|(oldest, _)| oldest);
                    if let Some(oldest) = oldest {
                        self.runs.remove(oldest);
                        if oldest < index {
                            index -= 1;
                        }
                    }
                }
                self.runs.insert(index, CachedRun {
                    cp,
                    run: run.clone(),
                    epoch: self.epoch,
                });
            }
        }
        Ok(run)
    }
}

/// Fetches the run at `cp` through `cache` when one is given.
pub(crate) fn fetch_run(
    source: &dyn TextSource,
    cache: Option<&mut TextRunCache>,
    cp: usize,
) -> Result<TextRun, ClientError> {
    match cache {
        Some(cache) => cache.fetch(source, cp),
        None => source.get_text_run(cp),
    }
}
