// Copyright 2025 the Parley Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::{TextModifier, TextRunProperties};

/// One frame of the stack of modifier scopes active at a position.
///
/// Frames are immutable and shared: pushing a scope creates a new frame whose
/// parent is the previous top, and the parent chain stays valid for every
/// line break that refers to it.
#[derive(Debug)]
pub struct TextModifierScope {
    parent: Option<Arc<TextModifierScope>>,
    modifier: Arc<dyn TextModifier>,
    text_source_character_index: usize,
}

impl TextModifierScope {
    /// Pushes `modifier`, which became active at `cp`, on top of `parent`.
    pub fn push(
        parent: Option<Arc<Self>>,
        modifier: Arc<dyn TextModifier>,
        cp: usize,
    ) -> Arc<Self> {
        Arc::new(Self {
            parent,
            modifier,
            text_source_character_index: cp,
        })
    }

    /// The enclosing scope.
    pub fn parent(&self) -> Option<&Arc<Self>> {
        self.parent.as_ref()
    }

    /// The modifier of this scope.
    pub fn text_modifier(&self) -> &Arc<dyn TextModifier> {
        &self.modifier
    }

    /// Character index at which the scope started.
    pub fn text_source_character_index(&self) -> usize {
        self.text_source_character_index
    }

    /// Number of frames from this one to the outermost.
    pub fn depth(&self) -> usize {
        self.frames().count()
    }

    fn frames(&self) -> impl Iterator<Item = &Self> {
        core::iter::successors(Some(self), |scope| scope.parent.as_deref())
    }

    /// Applies every modifier of the stack to `properties`, innermost first.
    pub fn modify_properties(&self, properties: &TextRunProperties) -> TextRunProperties {
        let mut modified = self.modifier.modify_properties(properties);
        let mut parent = self.parent.as_deref();
        while let Some(scope) = parent {
            modified = scope.modifier.modify_properties(&modified);
            parent = scope.parent.as_deref();
        }
        modified
    }

    /// Copies every frame of the stack.
    ///
    /// The copy shares no frame with the original.
    pub fn clone_stack(&self) -> Arc<Self> {
        let frames: Vec<&Self> = self.frames().collect();
        frames.into_iter().rev().fold(None, |parent, frame| {
            Some(Self::push(
                parent,
                frame.modifier.clone(),
                frame.text_source_character_index,
            ))
        })
        .unwrap_or_else(|| unreachable!("a stack has at least one frame"))
    }
}

/// Applies the optional `scope` to `properties`.
pub(crate) fn modified(
    scope: Option<&Arc<TextModifierScope>>,
    properties: &Arc<TextRunProperties>,
) -> Arc<TextRunProperties> {
    match scope {
        Some(scope) => Arc::new(scope.modify_properties(properties)),
        None => properties.clone(),
    }
}
