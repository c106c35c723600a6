// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Pickard library - cascading vehicle selector
//!
//! This crate resolves the dependent chain of vehicle attributes
//! (Year → Make → Model → Submodel → Engine → Drive Type) used by The
//! Pickard's vehicle picker. Changing an upstream attribute recomputes the
//! valid options of every downstream attribute and clears selections that
//! are no longer valid.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod catalog;
pub mod commands;
pub mod config;
pub mod resolver;
pub mod selection;

/// Core data types shared by the catalog and the resolver
pub mod types {
    use crate::catalog::CatalogError;
    use serde::{Deserialize, Serialize};
    use std::collections::HashSet;
    use std::fmt;

    // =========================================================================
    // Attribute Chain
    // =========================================================================

    /// Ordered list of attribute names. Attribute `i` may constrain the
    /// options of attribute `i + 1`, never the reverse.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(try_from = "Vec<String>", into = "Vec<String>")]
    pub struct AttributeChain {
        attributes: Vec<String>,
    }

    impl AttributeChain {
        /// Attribute names of the vehicle picker, in dependency order
        pub const VEHICLE: [&'static str; 6] =
            ["Year", "Make", "Model", "Submodel", "Engine", "DriveType"];

        /// Build a chain from attribute names
        ///
        /// # Errors
        ///
        /// Returns an error if the chain is empty or a name appears twice.
        pub fn new<I, S>(names: I) -> Result<Self, CatalogError>
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            let attributes: Vec<String> = names.into_iter().map(Into::into).collect();
            if attributes.is_empty() {
                return Err(CatalogError::EmptyChain);
            }

            let mut seen = HashSet::new();
            for name in &attributes {
                if !seen.insert(name.as_str()) {
                    return Err(CatalogError::DuplicateAttribute(name.clone()));
                }
            }

            Ok(Self { attributes })
        }

        /// The vehicle chain: Year, Make, Model, Submodel, Engine, DriveType
        #[must_use]
        pub fn vehicle() -> Self {
            Self {
                attributes: Self::VEHICLE.iter().map(|s| (*s).to_string()).collect(),
            }
        }

        /// Number of attributes in the chain
        #[must_use]
        pub fn len(&self) -> usize {
            self.attributes.len()
        }

        /// Always false for a constructed chain
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.attributes.is_empty()
        }

        /// Attribute names in order
        #[must_use]
        pub fn names(&self) -> &[String] {
            &self.attributes
        }

        /// Name of the attribute at `index`
        #[must_use]
        pub fn name(&self, index: usize) -> Option<&str> {
            self.attributes.get(index).map(String::as_str)
        }

        /// Position of an attribute by name. Exact matches win over
        /// case-insensitive ones.
        #[must_use]
        pub fn position(&self, name: &str) -> Option<usize> {
            self.attributes
                .iter()
                .position(|a| a == name)
                .or_else(|| self.attributes.iter().position(|a| a.eq_ignore_ascii_case(name)))
        }
    }

    impl Default for AttributeChain {
        fn default() -> Self {
            Self::vehicle()
        }
    }

    impl TryFrom<Vec<String>> for AttributeChain {
        type Error = CatalogError;

        fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
            Self::new(names)
        }
    }

    impl From<AttributeChain> for Vec<String> {
        fn from(chain: AttributeChain) -> Self {
            chain.attributes
        }
    }

    impl fmt::Display for AttributeChain {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.attributes.join(" → "))
        }
    }

    // =========================================================================
    // Cascade Policy
    // =========================================================================

    /// How downstream selections react when an upstream attribute is set
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum CascadePolicy {
        /// Changing a value clears everything downstream. Re-selecting the
        /// same value keeps downstream selections that are still valid.
        #[default]
        Reset,
        /// Downstream selections survive as long as they remain valid
        /// under the new upstream values.
        Retain,
    }

    impl CascadePolicy {
        /// Parse a policy name
        #[must_use]
        pub fn from_name(s: &str) -> Option<Self> {
            match s.to_lowercase().as_str() {
                "reset" => Some(Self::Reset),
                "retain" | "keep" => Some(Self::Retain),
                _ => None,
            }
        }
    }
}

/// Prelude for common imports
pub mod prelude {
    pub use crate::catalog::{Catalog, CatalogError, CatalogKey, FallbackPolicy, FallbackStage};
    pub use crate::resolver::{Binding, Resolver, SelectionError, Snapshot, Transition};
    pub use crate::selection::SelectionState;
    pub use crate::types::*;
    pub use anyhow::{Context, Result};
}
