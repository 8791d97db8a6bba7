// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Zero-copy views over caller owned character storage.

use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::Error;

/// Shared character storage.
pub type CharacterBuffer = Arc<[char]>;

/// A position inside a [`CharacterBuffer`].
///
/// Two references are equal when they point into the same buffer at the
/// same offset.
#[derive(Clone, Debug, Default)]
pub struct CharacterBufferReference {
    buffer: Option<CharacterBuffer>,
    offset: usize,
}

impl CharacterBufferReference {
    /// Creates a reference to `offset` in `buffer`.
    ///
    /// Offset zero is always accepted, even for an empty buffer.
    pub fn new(buffer: CharacterBuffer, offset: usize) -> Result<Self, Error> {
        if offset > buffer.len().saturating_sub(1) {
            return Err(Error::out_of_range("offset"));
        }
        Ok(Self {
            buffer: Some(buffer),
            offset,
        })
    }

    /// The empty reference used by runs without character content.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The referenced buffer, if any.
    pub fn buffer(&self) -> Option<&CharacterBuffer> {
        self.buffer.as_ref()
    }

    /// Offset into the buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    fn available(&self) -> usize {
        self.buffer
            .as_ref()
            .map_or(0, |buffer| buffer.len() - self.offset)
    }
}

impl PartialEq for CharacterBufferReference {
    fn eq(&self, other: &Self) -> bool {
        let same_buffer = match (&self.buffer, &other.buffer) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        same_buffer && self.offset == other.offset
    }
}

impl Eq for CharacterBufferReference {}

/// A range of characters inside a [`CharacterBuffer`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CharacterBufferRange {
    reference: CharacterBufferReference,
    length: usize,
}

impl CharacterBufferRange {
    /// Creates a range of `length` characters starting at `reference`.
    pub fn new(reference: CharacterBufferReference, length: usize) -> Result<Self, Error> {
        if length > reference.available() {
            return Err(Error::out_of_range("length"));
        }
        Ok(Self { reference, length })
    }

    /// The canonical empty range.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Copies `text` into a new buffer and covers all of it.
    pub fn from_text(text: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        Self::from_buffer(chars.into())
    }

    /// Covers all of `buffer`.
    pub fn from_buffer(buffer: CharacterBuffer) -> Self {
        let length = buffer.len();
        Self {
            reference: CharacterBufferReference {
                buffer: Some(buffer),
                offset: 0,
            },
            length,
        }
    }

    /// Start of the range.
    pub fn reference(&self) -> &CharacterBufferReference {
        &self.reference
    }

    /// Number of characters.
    pub fn len(&self) -> usize {
        self.length
    }

    /// Returns `true` if the range holds no characters.
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Character at `index` within the range.
    pub fn get(&self, index: usize) -> Option<char> {
        self.as_slice().get(index).copied()
    }

    /// The characters of the range.
    pub fn as_slice(&self) -> &[char] {
        match &self.reference.buffer {
            Some(buffer) => &buffer[self.reference.offset..self.reference.offset + self.length],
            None => &[],
        }
    }

    /// The sub-range starting `offset` characters in and holding `length`
    /// characters.
    pub fn sub_range(&self, offset: usize, length: usize) -> Result<Self, Error> {
        if offset > self.length {
            return Err(Error::out_of_range("offset"));
        }
        if length > self.length - offset {
            return Err(Error::out_of_range("length"));
        }
        if length == 0 {
            return Ok(Self::empty());
        }
        Ok(Self {
            reference: CharacterBufferReference {
                buffer: self.reference.buffer.clone(),
                offset: self.reference.offset + offset,
            },
            length,
        })
    }
}
