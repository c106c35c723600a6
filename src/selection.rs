// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Selection state - the chosen value, if any, for each attribute

use serde::{Deserialize, Serialize};

/// Current selection for every attribute of a chain.
///
/// Invariant: once an attribute is unset, every attribute after it is unset.
/// Only the resolver mutates a selection, and it restores the invariant
/// before returning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionState {
    values: Vec<Option<String>>,
}

impl SelectionState {
    /// All attributes unset
    #[must_use]
    pub fn empty(len: usize) -> Self {
        Self {
            values: vec![None; len],
        }
    }

    /// Number of attributes tracked
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the state tracks no attributes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Selected value at `index`
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.values.get(index).and_then(Option::as_deref)
    }

    /// Whether `index` has a value
    #[must_use]
    pub fn is_set(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    /// All slots in chain order
    #[must_use]
    pub fn values(&self) -> &[Option<String>] {
        &self.values
    }

    /// Values of attributes `0..index`, or `None` if any of them is unset
    #[must_use]
    pub fn upstream(&self, index: usize) -> Option<Vec<&str>> {
        self.values.get(..index)?.iter().map(Option::as_deref).collect()
    }

    /// First unset attribute
    #[must_use]
    pub fn first_unset(&self) -> Option<usize> {
        self.values.iter().position(Option::is_none)
    }

    /// Every attribute has a value
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.first_unset().is_none()
    }

    /// No value follows an unset attribute
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        match self.first_unset() {
            Some(i) => self.values[i..].iter().all(Option::is_none),
            None => true,
        }
    }

    pub(crate) fn set(&mut self, index: usize, value: String) {
        self.values[index] = Some(value);
    }

    pub(crate) fn clear(&mut self, index: usize) -> Option<String> {
        self.values[index].take()
    }
}
