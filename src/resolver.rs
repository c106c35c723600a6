// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Dependency resolver - the cascading selection state machine
//!
//! The selection itself is the state. The single transition is
//! [`Resolver::select`]: validate the value against the catalog, set it, then
//! walk every downstream attribute in chain order and clear the ones that
//! are no longer valid. The walk runs to completion before bindings render.

use crate::catalog::Catalog;
use crate::selection::SelectionState;
use crate::types::{AttributeChain, CascadePolicy};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Rejected transitions. The state is untouched when one is returned.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SelectionError {
    /// No attribute with this name in the chain
    #[error("unknown attribute '{0}'")]
    UnknownAttribute(String),
    /// Attribute index past the end of the chain
    #[error("attribute index {index} is out of range for a chain of {len}")]
    OutOfRange {
        /// Requested index
        index: usize,
        /// Chain length
        len: usize,
    },
    /// An upstream attribute has no value yet
    #[error("cannot select {attribute} while {upstream} is unset")]
    UpstreamUnset {
        /// Attribute being selected
        attribute: String,
        /// First unset upstream attribute
        upstream: String,
    },
    /// The value is not among the current options
    #[error("'{value}' is not a valid {attribute}")]
    NotAnOption {
        /// Attribute being selected
        attribute: String,
        /// Rejected value
        value: String,
    },
}

/// Selection plus the option list of every attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    /// Attribute chain
    pub chain: AttributeChain,
    /// Current selection
    pub state: SelectionState,
    /// Valid options per attribute; empty while upstream is incomplete
    pub options: Vec<Vec<String>>,
}

impl Snapshot {
    /// Name, selected value and options of each attribute, in chain order
    pub fn attributes(&self) -> impl Iterator<Item = (&str, Option<&str>, &[String])> {
        self.chain
            .names()
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), self.state.get(i), self.options[i].as_slice()))
    }
}

/// Outcome of a successful transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// State and options after the cascade
    pub snapshot: Snapshot,
    /// Downstream attributes cleared by the cascade
    pub cleared: Vec<usize>,
    /// Whether the selected attribute changed value
    pub changed: bool,
}

/// Presentation binding: renders after every successful transition
pub trait Binding {
    /// Called once per successful transition, after the cascade finished
    fn render(&mut self, snapshot: &Snapshot);
}

impl<F> Binding for F
where
    F: FnMut(&Snapshot),
{
    fn render(&mut self, snapshot: &Snapshot) {
        self(snapshot);
    }
}

/// Owns one selection session over a shared catalog snapshot
pub struct Resolver {
    catalog: Arc<Catalog>,
    state: SelectionState,
    policy: CascadePolicy,
    bindings: Vec<Box<dyn Binding>>,
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("chain", self.catalog.chain())
            .field("state", &self.state)
            .field("policy", &self.policy)
            .field("bindings", &self.bindings.len())
            .finish()
    }
}

impl Resolver {
    /// New session with every attribute unset
    #[must_use]
    pub fn new(catalog: Arc<Catalog>) -> Self {
        let state = SelectionState::empty(catalog.chain().len());
        Self {
            catalog,
            state,
            policy: CascadePolicy::default(),
            bindings: Vec::new(),
        }
    }

    /// Use a different cascade policy
    #[must_use]
    pub fn with_policy(mut self, policy: CascadePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Register a binding to render after each successful transition
    pub fn attach<B: Binding + 'static>(&mut self, binding: B) {
        self.bindings.push(Box::new(binding));
    }

    /// Catalog snapshot in use
    #[must_use]
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Attribute chain
    #[must_use]
    pub fn chain(&self) -> &AttributeChain {
        self.catalog.chain()
    }

    /// Current selection
    #[must_use]
    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    /// Cascade policy in use
    #[must_use]
    pub fn policy(&self) -> CascadePolicy {
        self.policy
    }

    /// Every attribute is selected
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state.is_complete()
    }

    /// Valid options for `index` under the current upstream selection.
    /// Empty when an upstream attribute is unset or `index` is out of range.
    #[must_use]
    pub fn valid_options(&self, index: usize) -> Vec<String> {
        self.options_slice(index).to_vec()
    }

    /// Like [`Resolver::valid_options`], by attribute name
    #[must_use]
    pub fn valid_options_named(&self, name: &str) -> Vec<String> {
        self.chain()
            .position(name)
            .map(|i| self.valid_options(i))
            .unwrap_or_default()
    }

    fn options_slice(&self, index: usize) -> &[String] {
        match self.state.upstream(index) {
            Some(upstream) => self.catalog.lookup(index, &upstream),
            None => &[],
        }
    }

    /// Current state and options
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            chain: self.chain().clone(),
            state: self.state.clone(),
            options: (0..self.state.len()).map(|i| self.valid_options(i)).collect(),
        }
    }

    /// Set attribute `index` to `value` and cascade downstream.
    ///
    /// # Errors
    ///
    /// Rejects the transition, leaving the state untouched, when `index` is
    /// out of range, an upstream attribute is unset, or `value` is not a
    /// current option.
    pub fn select(&mut self, index: usize, value: &str) -> Result<Transition, SelectionError> {
        if let Err(err) = self.check(index, value) {
            warn!("Rejected selection: {}", err);
            return Err(err);
        }

        let changed = self.state.get(index) != Some(value);
        self.state.set(index, value.to_string());

        let reset = changed && self.policy == CascadePolicy::Reset;
        let cleared = self.cascade(index + 1, reset);

        if !cleared.is_empty() {
            debug!(
                "Selecting {} cleared {:?}",
                self.chain().name(index).unwrap_or("?"),
                cleared
            );
        }

        Ok(self.emit(cleared, changed))
    }

    /// Like [`Resolver::select`], by attribute name
    ///
    /// # Errors
    ///
    /// Same as [`Resolver::select`], plus an unknown attribute name.
    pub fn select_named(&mut self, name: &str, value: &str) -> Result<Transition, SelectionError> {
        let index = self
            .chain()
            .position(name)
            .ok_or_else(|| SelectionError::UnknownAttribute(name.to_string()))?;
        self.select(index, value)
    }

    /// Apply named selections in order, stopping at the first rejection.
    /// Selections applied before the rejection stay in place. With no
    /// selections the current snapshot is returned without rendering.
    ///
    /// # Errors
    ///
    /// The first rejected selection.
    pub fn apply<'a, I>(&mut self, selections: I) -> Result<Transition, SelectionError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut last = None;
        for (name, value) in selections {
            last = Some(self.select_named(name, value)?);
        }

        Ok(last.unwrap_or_else(|| Transition {
            snapshot: self.snapshot(),
            cleared: Vec::new(),
            changed: false,
        }))
    }

    /// Swap in a newer catalog snapshot and revalidate the whole selection
    /// from the first attribute. A catalog with a different chain starts a
    /// fresh selection.
    pub fn replace_catalog(&mut self, catalog: Arc<Catalog>) -> Transition {
        let same_chain = catalog.chain() == self.chain();
        self.catalog = catalog;

        let cleared = if same_chain {
            self.cascade(0, false)
        } else {
            let cleared: Vec<usize> = (0..self.state.len())
                .filter(|&i| self.state.is_set(i))
                .collect();
            self.state = SelectionState::empty(self.chain().len());
            cleared
        };

        self.emit(cleared, false)
    }

    fn check(&self, index: usize, value: &str) -> Result<(), SelectionError> {
        let chain = self.chain();
        let attribute = chain.name(index).ok_or(SelectionError::OutOfRange {
            index,
            len: chain.len(),
        })?;

        let Some(upstream) = self.state.upstream(index) else {
            let unset = self.state.first_unset().unwrap_or(0);
            return Err(SelectionError::UpstreamUnset {
                attribute: attribute.to_string(),
                upstream: chain.name(unset).unwrap_or("?").to_string(),
            });
        };

        if self.catalog.lookup(index, &upstream).iter().any(|o| o == value) {
            Ok(())
        } else {
            Err(SelectionError::NotAnOption {
                attribute: attribute.to_string(),
                value: value.to_string(),
            })
        }
    }

    /// Walk attributes `from..` in order. Each set value survives only if
    /// `reset` is false and it is a member of the options recomputed from
    /// the already-updated upstream values.
    fn cascade(&mut self, from: usize, reset: bool) -> Vec<usize> {
        let mut cleared = Vec::new();

        for j in from..self.state.len() {
            let keep = match self.state.get(j) {
                None => continue,
                Some(_) if reset => false,
                Some(current) => self.options_slice(j).iter().any(|o| o == current),
            };

            if !keep {
                self.state.clear(j);
                cleared.push(j);
            }
        }

        cleared
    }

    fn emit(&mut self, cleared: Vec<usize>, changed: bool) -> Transition {
        let snapshot = self.snapshot();
        for binding in &mut self.bindings {
            binding.render(&snapshot);
        }

        Transition {
            snapshot,
            cleared,
            changed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogFile;
    use std::cell::RefCell;
    use std::rc::Rc;

    const SMALL: &str = r#"
chain = ["Year", "Make", "Model"]

[defaults]
Year = ["2024", "2023"]
Make = ["Ford", "Toyota"]

[[entries]]
attribute = "Model"
when = { Year = "2024", Make = "Ford" }
values = ["F-150", "Mustang"]

[[entries]]
attribute = "Model"
when = { Year = "2023", Make = "Ford" }
values = ["F-150", "Ranger"]

[[entries]]
attribute = "Model"
when = { Make = "Toyota" }
values = ["Camry", "Corolla"]
"#;

    fn resolver() -> Resolver {
        let file = CatalogFile::from_toml_str(SMALL).unwrap();
        Resolver::new(Arc::new(Catalog::from_file(file).unwrap()))
    }

    #[test]
    fn test_initial_state() {
        let r = resolver();

        assert_eq!(r.state(), &SelectionState::empty(3));
        assert_eq!(r.valid_options(0), ["2024", "2023"]);
        assert!(r.valid_options(1).is_empty());
        assert!(r.valid_options(7).is_empty());
    }

    #[test]
    fn test_select_reports_options() {
        let mut r = resolver();
        r.select(0, "2024").unwrap();
        let t = r.select(1, "Ford").unwrap();

        assert!(t.changed);
        assert!(t.cleared.is_empty());
        assert_eq!(t.snapshot.options[2], ["F-150", "Mustang"]);
    }

    #[test]
    fn test_out_of_range() {
        let mut r = resolver();
        let err = r.select(3, "x").unwrap_err();

        assert_eq!(err, SelectionError::OutOfRange { index: 3, len: 3 });
    }

    #[test]
    fn test_upstream_unset_names_first_gap() {
        let mut r = resolver();
        let err = r.select(2, "F-150").unwrap_err();

        assert_eq!(
            err,
            SelectionError::UpstreamUnset {
                attribute: "Model".into(),
                upstream: "Year".into(),
            }
        );
    }

    #[test]
    fn test_reset_policy_clears_on_change() {
        let mut r = resolver();
        r.apply([("Year", "2024"), ("Make", "Ford"), ("Model", "F-150")]).unwrap();

        // F-150 is valid for 2023 too, but the reset policy clears on change
        let t = r.select(0, "2023").unwrap();

        assert_eq!(t.cleared, vec![1, 2]);
        assert_eq!(r.state().first_unset(), Some(1));
    }

    #[test]
    fn test_retain_policy_keeps_valid_values() {
        let mut r = resolver().with_policy(CascadePolicy::Retain);
        r.apply([("Year", "2024"), ("Make", "Ford"), ("Model", "F-150")]).unwrap();

        let t = r.select(0, "2023").unwrap();
        assert!(t.cleared.is_empty());
        assert_eq!(r.state().get(2), Some("F-150"));

        r.select(2, "Ranger").unwrap();
        let t = r.select(0, "2024").unwrap();
        assert_eq!(t.cleared, vec![2]);
        assert_eq!(r.state().get(1), Some("Ford"));
    }

    #[test]
    fn test_reselecting_same_value_keeps_downstream() {
        let mut r = resolver();
        r.apply([("Year", "2024"), ("Make", "Ford"), ("Model", "Mustang")]).unwrap();

        let t = r.select(1, "Ford").unwrap();

        assert!(!t.changed);
        assert!(t.cleared.is_empty());
        assert!(r.is_complete());
    }

    #[test]
    fn test_bindings_render_only_on_success() {
        let renders = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&renders);

        let mut r = resolver();
        r.attach(move |s: &Snapshot| sink.borrow_mut().push(s.state.clone()));

        r.select(0, "2024").unwrap();
        let _ = r.select(1, "Zzyzx");
        r.select(1, "Toyota").unwrap();

        let renders = renders.borrow();
        assert_eq!(renders.len(), 2);
        assert_eq!(renders[1].get(1), Some("Toyota"));
    }

    #[test]
    fn test_apply_stops_at_first_rejection() {
        let mut r = resolver();
        let err = r
            .apply([("Year", "2024"), ("Trim", "XLT"), ("Make", "Ford")])
            .unwrap_err();

        assert_eq!(err, SelectionError::UnknownAttribute("Trim".into()));
        assert_eq!(r.state().get(0), Some("2024"));
        assert!(!r.state().is_set(1));
    }

    #[test]
    fn test_apply_empty_returns_snapshot() {
        let mut r = resolver();
        let t = r.apply(std::iter::empty()).unwrap();

        assert!(!t.changed);
        assert_eq!(t.snapshot, r.snapshot());
    }

    #[test]
    fn test_replace_catalog_revalidates() {
        let mut r = resolver().with_policy(CascadePolicy::Retain);
        r.apply([("Year", "2024"), ("Make", "Toyota"), ("Model", "Camry")]).unwrap();

        let mut catalog = (**r.catalog()).clone();
        let overlay = CatalogFile::from_toml_str(
            r#"
[[entries]]
attribute = "Model"
when = { Make = "Toyota" }
values = ["Tacoma"]
"#,
        )
        .unwrap();
        catalog.merge(&overlay).unwrap();

        let t = r.replace_catalog(Arc::new(catalog));

        assert_eq!(t.cleared, vec![2]);
        assert_eq!(t.snapshot.options[2], ["Tacoma"]);
        assert!(r.state().is_consistent());
    }

    #[test]
    fn test_replace_catalog_with_new_chain_starts_over() {
        let mut r = resolver();
        r.apply([("Year", "2024"), ("Make", "Ford")]).unwrap();

        let t = r.replace_catalog(Arc::new(Catalog::builtin().unwrap()));

        assert_eq!(t.cleared, vec![0, 1]);
        assert_eq!(r.state().len(), 6);
        assert_eq!(r.state().first_unset(), Some(0));
    }
}
