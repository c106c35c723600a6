// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Attribute catalog - static lookup tables for valid attribute values
//!
//! Each attribute of the chain owns a table mapping upstream keys to the
//! ordered list of values valid for that attribute. Lookups try the exact
//! upstream key first, then the attribute's fallback stages, then the
//! attribute's default list. A lookup never fails; the worst case is an
//! empty list.

use crate::types::AttributeChain;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Vehicle catalog shipped with the crate
const BUILTIN_CATALOG: &str = include_str!("../data/vehicles.toml");

/// Errors raised while building or loading a catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The attribute chain has no attributes
    #[error("attribute chain is empty")]
    EmptyChain,
    /// The same attribute name appears twice in the chain
    #[error("attribute '{0}' appears more than once in the chain")]
    DuplicateAttribute(String),
    /// A name does not match any attribute of the chain
    #[error("unknown attribute '{0}'")]
    UnknownAttribute(String),
    /// A key or fallback stage references an attribute that is not upstream
    #[error("'{upstream}' is not upstream of '{attribute}'")]
    NotUpstream {
        /// Attribute the entry or stage belongs to
        attribute: String,
        /// Offending key attribute
        upstream: String,
    },
    /// An entry key names the same upstream attribute twice
    #[error("entry for '{attribute}' is keyed on '{upstream}' more than once")]
    RepeatedKeyAttribute {
        /// Attribute the entry belongs to
        attribute: String,
        /// Upstream attribute named twice
        upstream: String,
    },
    /// Two entries for the same attribute share a key
    #[error("duplicate entry for '{attribute}' keyed on {key}")]
    DuplicateEntry {
        /// Attribute the entries belong to
        attribute: String,
        /// Rendered key
        key: String,
    },
    /// An overlay was built for a different chain
    #[error("catalog chain [{found}] does not match [{expected}]")]
    ChainMismatch {
        /// Chain of the catalog being merged into
        expected: String,
        /// Chain declared by the overlay
        found: String,
    },
    /// Reading a catalog file failed
    #[error("failed to read catalog {}", path.display())]
    Io {
        /// File that could not be read
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
    /// TOML catalog did not parse
    #[error("failed to parse TOML catalog: {0}")]
    Toml(#[from] toml::de::Error),
    /// JSON catalog did not parse
    #[error("failed to parse JSON catalog: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Keys and Fallback Policy
// =============================================================================

/// Key of a catalog entry: upstream attribute positions and their values,
/// ordered by position
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CatalogKey(Vec<(usize, String)>);

impl CatalogKey {
    /// Build a key from `(position, value)` pairs in any order
    #[must_use]
    pub fn new(mut fields: Vec<(usize, String)>) -> Self {
        fields.sort_by_key(|(position, _)| *position);
        Self(fields)
    }

    /// Key over the full upstream tuple
    #[must_use]
    pub fn exact(upstream: &[&str]) -> Self {
        Self(
            upstream
                .iter()
                .enumerate()
                .map(|(i, v)| (i, (*v).to_string()))
                .collect(),
        )
    }

    /// Key over a subset of the upstream tuple. `positions` must be sorted
    /// and every position must index into `upstream`.
    #[must_use]
    pub fn project(positions: &[usize], upstream: &[&str]) -> Self {
        Self(
            positions
                .iter()
                .filter_map(|&p| upstream.get(p).map(|v| (p, (*v).to_string())))
                .collect(),
        )
    }

    /// The `(position, value)` pairs of this key
    #[must_use]
    pub fn fields(&self) -> &[(usize, String)] {
        &self.0
    }

    /// Whether this key has no fields (entries for the first attribute)
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Render the key with attribute names from `chain`
    #[must_use]
    pub fn describe(&self, chain: &AttributeChain) -> String {
        if self.0.is_empty() {
            return "(any)".to_string();
        }
        self.0
            .iter()
            .map(|(p, v)| format!("{}={}", chain.name(*p).unwrap_or("?"), v))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A single fallback step tried when the exact upstream key has no entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackStage {
    /// Look up the key projected onto these upstream positions
    Key(Vec<usize>),
    /// Match entries keyed only on this position whose value is a
    /// substring of the selected value
    Contains(usize),
}

impl FallbackStage {
    /// Render the stage with attribute names from `chain`
    #[must_use]
    pub fn describe(&self, chain: &AttributeChain) -> String {
        let name = |p: usize| chain.name(p).unwrap_or("?");
        match self {
            Self::Key(positions) => {
                let names: Vec<&str> = positions.iter().map(|&p| name(p)).collect();
                format!("key({})", names.join("+"))
            }
            Self::Contains(position) => format!("contains({})", name(*position)),
        }
    }
}

/// Ordered fallback stages for one attribute
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FallbackPolicy {
    stages: Vec<FallbackStage>,
}

impl FallbackPolicy {
    /// A policy with no fallback stages: exact key, then default list
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Progressively shorter keys, dropping leading upstream attributes one
    /// at a time. For the attribute at position 2 this yields `[1]`; for
    /// position 4 it yields `[1, 2, 3]`, `[2, 3]`, `[3]`.
    #[must_use]
    pub fn suffixes(attribute: usize) -> Self {
        Self {
            stages: (1..attribute)
                .map(|start| FallbackStage::Key((start..attribute).collect()))
                .collect(),
        }
    }

    /// Build a policy from explicit stages
    #[must_use]
    pub fn from_stages(stages: Vec<FallbackStage>) -> Self {
        Self { stages }
    }

    /// Stages in the order they are tried
    #[must_use]
    pub fn stages(&self) -> &[FallbackStage] {
        &self.stages
    }
}

// =============================================================================
// Catalog File Format
// =============================================================================

/// Fallback stage as written in a catalog file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageSpec {
    /// Expands to [`FallbackPolicy::suffixes`]
    Suffixes,
    /// Projection onto the named upstream attributes
    Key {
        /// Upstream attribute names
        on: Vec<String>,
    },
    /// Substring heuristic on one upstream attribute
    Contains {
        /// Upstream attribute name
        on: String,
    },
}

/// One catalog entry as written in a catalog file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrySpec {
    /// Attribute whose options this entry lists
    pub attribute: String,
    /// Upstream attribute values this entry applies to
    #[serde(default)]
    pub when: BTreeMap<String, String>,
    /// Valid values, in display order
    pub values: Vec<String>,
}

/// Serialized form of a catalog (TOML or JSON)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogFile {
    /// Attribute chain; the vehicle chain when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain: Option<Vec<String>>,
    /// Default option list per attribute
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub defaults: BTreeMap<String, Vec<String>>,
    /// Fallback stages per attribute; attributes not listed use suffixes
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fallback: BTreeMap<String, Vec<StageSpec>>,
    /// Catalog entries
    #[serde(default)]
    pub entries: Vec<EntrySpec>,
}

impl CatalogFile {
    /// Parse a TOML catalog
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid catalog document.
    pub fn from_toml_str(text: &str) -> Result<Self, CatalogError> {
        Ok(toml::from_str(text)?)
    }

    /// Parse a JSON catalog
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a valid catalog document.
    pub fn from_json_str(text: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read a catalog file, choosing the format by extension (`.json` is
    /// JSON, anything else TOML)
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn read(path: &Path) -> Result<Self, CatalogError> {
        let text = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_toml_str(&text)
        }
    }
}

// =============================================================================
// Catalog
// =============================================================================

/// Options table for one attribute
#[derive(Debug, Clone, Default)]
struct Table {
    entries: BTreeMap<CatalogKey, Vec<String>>,
    default: Vec<String>,
    policy: FallbackPolicy,
}

/// Validated table contents from one catalog file, before it is applied
#[derive(Debug, Default)]
struct TableOverlay {
    entries: Vec<(CatalogKey, Vec<String>)>,
    default: Option<Vec<String>>,
    policy: Option<FallbackPolicy>,
}

/// Where a lookup found its values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupSource {
    /// Entry keyed on the full upstream tuple
    Exact,
    /// Entry found by the fallback stage at this index of the policy
    Fallback(usize),
    /// The attribute's default list
    Default,
}

/// Result of a catalog lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution<'a> {
    /// Valid values, in display order
    pub values: &'a [String],
    /// Which step produced the values
    pub source: LookupSource,
}

/// Summary of one attribute table, for reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableStats {
    /// Attribute name
    pub attribute: String,
    /// Number of keyed entries
    pub entries: usize,
    /// Length of the default list
    pub defaults: usize,
    /// Number of fallback stages
    pub stages: usize,
}

/// Static lookup data for every attribute of a chain
#[derive(Debug, Clone)]
pub struct Catalog {
    chain: AttributeChain,
    tables: Vec<Table>,
}

impl Catalog {
    /// An empty catalog: every lookup yields an empty list
    #[must_use]
    pub fn empty(chain: AttributeChain) -> Self {
        let tables = (0..chain.len())
            .map(|i| Table {
                policy: FallbackPolicy::suffixes(i),
                ..Table::default()
            })
            .collect();
        Self { chain, tables }
    }

    /// The vehicle catalog bundled with the crate
    ///
    /// # Errors
    ///
    /// Returns an error only if the bundled data is malformed.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_file(CatalogFile::from_toml_str(BUILTIN_CATALOG)?)
    }

    /// Build and validate a catalog from its serialized form
    ///
    /// # Errors
    ///
    /// Returns an error if the chain is invalid or an entry, default or
    /// fallback stage references an unknown or non-upstream attribute, or
    /// if two entries share a key.
    pub fn from_file(file: CatalogFile) -> Result<Self, CatalogError> {
        let chain = match &file.chain {
            Some(names) => AttributeChain::new(names.clone())?,
            None => AttributeChain::vehicle(),
        };

        let overlays = compile(&chain, &file)?;
        let mut catalog = Self::empty(chain);
        catalog.apply(overlays);
        Ok(catalog)
    }

    /// Load a catalog file from disk
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let catalog = Self::from_file(CatalogFile::read(path)?)?;
        info!(
            "Loaded catalog {} ({} entries)",
            path.display(),
            catalog.entry_count()
        );
        Ok(catalog)
    }

    /// Merge a newer snapshot into this catalog. Entries with the same key
    /// are replaced; defaults and fallback policies named by the overlay
    /// replace the current ones. Nothing changes if the overlay is invalid.
    ///
    /// # Errors
    ///
    /// Returns an error if the overlay declares a different chain or does
    /// not validate against this catalog's chain.
    pub fn merge(&mut self, overlay: &CatalogFile) -> Result<(), CatalogError> {
        if let Some(names) = &overlay.chain {
            if names.as_slice() != self.chain.names() {
                return Err(CatalogError::ChainMismatch {
                    expected: self.chain.names().join(", "),
                    found: names.join(", "),
                });
            }
        }

        let overlays = compile(&self.chain, overlay)?;
        self.apply(overlays);
        debug!("Merged {} overlay entries", overlay.entries.len());
        Ok(())
    }

    fn apply(&mut self, overlays: Vec<TableOverlay>) {
        for (table, overlay) in self.tables.iter_mut().zip(overlays) {
            table.entries.extend(overlay.entries);
            if let Some(default) = overlay.default {
                table.default = default;
            }
            if let Some(policy) = overlay.policy {
                table.policy = policy;
            }
        }
    }

    /// The attribute chain this catalog covers
    #[must_use]
    pub fn chain(&self) -> &AttributeChain {
        &self.chain
    }

    /// Valid values for `attribute` given the full upstream tuple
    /// `upstream[0..attribute]`. Unknown attributes and short upstream
    /// tuples yield an empty list.
    #[must_use]
    pub fn lookup(&self, attribute: usize, upstream: &[&str]) -> &[String] {
        self.resolve(attribute, upstream).values
    }

    /// Like [`Catalog::lookup`], also reporting which step matched
    #[must_use]
    pub fn resolve(&self, attribute: usize, upstream: &[&str]) -> Resolution<'_> {
        let empty = Resolution {
            values: &[],
            source: LookupSource::Default,
        };

        let Some(table) = self.tables.get(attribute) else {
            return empty;
        };
        if upstream.len() < attribute {
            return empty;
        }
        let upstream = &upstream[..attribute];

        if let Some(values) = table.entries.get(&CatalogKey::exact(upstream)) {
            return Resolution {
                values,
                source: LookupSource::Exact,
            };
        }

        for (index, stage) in table.policy.stages().iter().enumerate() {
            let hit = match stage {
                FallbackStage::Key(positions) => table
                    .entries
                    .get(&CatalogKey::project(positions, upstream)),
                FallbackStage::Contains(position) => {
                    contains_match(table, *position, upstream)
                }
            };

            if let Some(values) = hit {
                debug!(
                    "{} resolved by fallback stage {} ({:?})",
                    self.chain.name(attribute).unwrap_or("?"),
                    index,
                    stage
                );
                return Resolution {
                    values,
                    source: LookupSource::Fallback(index),
                };
            }
        }

        Resolution {
            values: &table.default,
            source: LookupSource::Default,
        }
    }

    /// Fallback policy of an attribute
    #[must_use]
    pub fn policy(&self, attribute: usize) -> Option<&FallbackPolicy> {
        self.tables.get(attribute).map(|t| &t.policy)
    }

    /// Total number of keyed entries
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.tables.iter().map(|t| t.entries.len()).sum()
    }

    /// Per-attribute summary
    #[must_use]
    pub fn stats(&self) -> Vec<TableStats> {
        self.chain
            .names()
            .iter()
            .zip(&self.tables)
            .map(|(name, table)| TableStats {
                attribute: name.clone(),
                entries: table.entries.len(),
                defaults: table.default.len(),
                stages: table.policy.stages().len(),
            })
            .collect()
    }

    /// Serializable form of this catalog
    #[must_use]
    pub fn to_file(&self) -> CatalogFile {
        let names = self.chain.names();
        let mut file = CatalogFile {
            chain: Some(names.to_vec()),
            ..CatalogFile::default()
        };

        for (i, table) in self.tables.iter().enumerate() {
            let name = &names[i];

            if !table.default.is_empty() {
                file.defaults.insert(name.clone(), table.default.clone());
            }

            if table.policy != FallbackPolicy::suffixes(i) {
                let stages = table
                    .policy
                    .stages()
                    .iter()
                    .map(|stage| match stage {
                        FallbackStage::Key(positions) => StageSpec::Key {
                            on: positions.iter().map(|&p| names[p].clone()).collect(),
                        },
                        FallbackStage::Contains(p) => StageSpec::Contains {
                            on: names[*p].clone(),
                        },
                    })
                    .collect();
                file.fallback.insert(name.clone(), stages);
            }

            for (key, values) in &table.entries {
                file.entries.push(EntrySpec {
                    attribute: name.clone(),
                    when: key
                        .fields()
                        .iter()
                        .map(|(p, v)| (names[*p].clone(), v.clone()))
                        .collect(),
                    values: values.clone(),
                });
            }
        }

        file
    }
}

/// Entry keyed only on `position` whose value occurs in the selected value.
/// The longest matching fragment wins, ties go to the first key in order.
fn contains_match<'a>(
    table: &'a Table,
    position: usize,
    upstream: &[&str],
) -> Option<&'a Vec<String>> {
    let selected = upstream.get(position)?;

    table
        .entries
        .iter()
        .filter_map(|(key, values)| match key.fields() {
            [(p, fragment)] if *p == position && selected.contains(fragment.as_str()) => {
                Some((fragment.len(), values))
            }
            _ => None,
        })
        .rev()
        .max_by_key(|(len, _)| *len)
        .map(|(_, values)| values)
}

/// Validate a catalog file against `chain`, producing one overlay per
/// attribute
fn compile(chain: &AttributeChain, file: &CatalogFile) -> Result<Vec<TableOverlay>, CatalogError> {
    let mut overlays: Vec<TableOverlay> =
        (0..chain.len()).map(|_| TableOverlay::default()).collect();

    let position_of = |name: &str| -> Result<usize, CatalogError> {
        chain
            .position(name)
            .ok_or_else(|| CatalogError::UnknownAttribute(name.to_string()))
    };
    let upstream_of = |attribute: usize, name: &str| -> Result<usize, CatalogError> {
        let p = position_of(name)?;
        if p < attribute {
            Ok(p)
        } else {
            Err(CatalogError::NotUpstream {
                attribute: chain.name(attribute).unwrap_or("?").to_string(),
                upstream: name.to_string(),
            })
        }
    };

    for (name, values) in &file.defaults {
        let attribute = position_of(name)?;
        overlays[attribute].default = Some(dedup(values));
    }

    for (name, specs) in &file.fallback {
        let attribute = position_of(name)?;
        let mut stages = Vec::new();
        for stage in specs {
            match stage {
                StageSpec::Suffixes => {
                    stages.extend(FallbackPolicy::suffixes(attribute).stages().iter().cloned());
                }
                StageSpec::Key { on } => {
                    let positions: BTreeSet<usize> = on
                        .iter()
                        .map(|n| upstream_of(attribute, n))
                        .collect::<Result<_, _>>()?;
                    stages.push(FallbackStage::Key(positions.into_iter().collect()));
                }
                StageSpec::Contains { on } => {
                    stages.push(FallbackStage::Contains(upstream_of(attribute, on)?));
                }
            }
        }
        overlays[attribute].policy = Some(FallbackPolicy::from_stages(stages));
    }

    let mut seen: Vec<HashSet<CatalogKey>> = vec![HashSet::new(); chain.len()];
    for entry in &file.entries {
        let attribute = position_of(&entry.attribute)?;
        let fields = entry
            .when
            .iter()
            .map(|(n, v)| Ok((upstream_of(attribute, n)?, v.clone())))
            .collect::<Result<Vec<_>, CatalogError>>()?;

        let mut named = HashSet::new();
        if let Some((p, _)) = fields.iter().find(|(p, _)| !named.insert(*p)) {
            return Err(CatalogError::RepeatedKeyAttribute {
                attribute: entry.attribute.clone(),
                upstream: chain.name(*p).unwrap_or("?").to_string(),
            });
        }
        let key = CatalogKey::new(fields);

        if !seen[attribute].insert(key.clone()) {
            return Err(CatalogError::DuplicateEntry {
                attribute: entry.attribute.clone(),
                key: key.describe(chain),
            });
        }

        overlays[attribute].entries.push((key, dedup(&entry.values)));
    }

    Ok(overlays)
}

/// Drop repeated values, keeping the first occurrence
fn dedup(values: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .iter()
        .filter(|v| seen.insert(v.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SMALL: &str = r#"
chain = ["Year", "Make", "Model"]

[defaults]
Year = ["2024", "2023"]
Make = ["Ford", "Toyota", "Ford"]

[[entries]]
attribute = "Model"
when = { Year = "2024", Make = "Ford" }
values = ["F-150", "Mustang"]

[[entries]]
attribute = "Model"
when = { Make = "Toyota" }
values = ["Camry", "Corolla"]
"#;

    fn small() -> Catalog {
        Catalog::from_file(CatalogFile::from_toml_str(SMALL).unwrap()).unwrap()
    }

    #[test]
    fn test_exact_lookup() {
        let catalog = small();
        let resolution = catalog.resolve(2, &["2024", "Ford"]);

        assert_eq!(resolution.values, ["F-150", "Mustang"]);
        assert_eq!(resolution.source, LookupSource::Exact);
    }

    #[test]
    fn test_make_only_fallback() {
        let catalog = small();
        let resolution = catalog.resolve(2, &["2024", "Toyota"]);

        assert_eq!(resolution.values, ["Camry", "Corolla"]);
        assert_eq!(resolution.source, LookupSource::Fallback(0));
    }

    #[test]
    fn test_missing_entry_degrades_to_empty() {
        let catalog = small();

        assert!(catalog.lookup(2, &["2023", "Honda"]).is_empty());
        assert!(catalog.lookup(9, &[]).is_empty());
        assert!(catalog.lookup(2, &["2024"]).is_empty());
    }

    #[test]
    fn test_defaults_are_deduplicated_in_order() {
        let catalog = small();

        assert_eq!(catalog.lookup(1, &["2024"]), ["Ford", "Toyota"]);
        assert_eq!(catalog.lookup(0, &[]), ["2024", "2023"]);
    }

    #[test]
    fn test_suffix_policy_shape() {
        assert!(FallbackPolicy::suffixes(0).stages().is_empty());
        assert!(FallbackPolicy::suffixes(1).stages().is_empty());
        assert_eq!(
            FallbackPolicy::suffixes(4).stages(),
            &[
                FallbackStage::Key(vec![1, 2, 3]),
                FallbackStage::Key(vec![2, 3]),
                FallbackStage::Key(vec![3]),
            ]
        );
    }

    #[test]
    fn test_contains_prefers_longest_fragment() {
        let text = r#"
chain = ["Make", "Model", "DriveType"]

[fallback]
DriveType = [{ kind = "contains", on = "Model" }]

[[entries]]
attribute = "DriveType"
when = { Model = "F-150" }
values = ["RWD", "4WD"]

[[entries]]
attribute = "DriveType"
when = { Model = "F-150 Lightning" }
values = ["AWD"]
"#;
        let catalog = Catalog::from_file(CatalogFile::from_toml_str(text).unwrap()).unwrap();

        assert_eq!(catalog.lookup(2, &["Ford", "F-150 XLT"]), ["RWD", "4WD"]);
        assert_eq!(catalog.lookup(2, &["Ford", "F-150 Lightning Pro"]), ["AWD"]);
        assert!(catalog.lookup(2, &["Ford", "Ranger"]).is_empty());
    }

    #[test]
    fn test_empty_fallback_list_disables_suffixes() {
        let text = format!("{SMALL}\n[fallback]\nModel = []\n");
        let catalog = Catalog::from_file(CatalogFile::from_toml_str(&text).unwrap()).unwrap();

        assert_eq!(catalog.policy(2), Some(&FallbackPolicy::none()));
        assert!(catalog.lookup(2, &["2024", "Toyota"]).is_empty());
    }

    #[test]
    fn test_rejects_unknown_attribute() {
        let text = r#"
chain = ["Year", "Make"]

[[entries]]
attribute = "Trim"
values = ["LX"]
"#;
        let err = Catalog::from_file(CatalogFile::from_toml_str(text).unwrap()).unwrap_err();
        assert!(matches!(err, CatalogError::UnknownAttribute(name) if name == "Trim"));
    }

    #[test]
    fn test_rejects_downstream_key() {
        let text = r#"
chain = ["Year", "Make"]

[[entries]]
attribute = "Year"
when = { Make = "Ford" }
values = ["2024"]
"#;
        let err = Catalog::from_file(CatalogFile::from_toml_str(text).unwrap()).unwrap_err();
        assert!(matches!(err, CatalogError::NotUpstream { .. }));
    }

    #[test]
    fn test_rejects_attribute_named_twice_in_key() {
        let text = r#"
chain = ["Year", "Make", "Model"]

[[entries]]
attribute = "Model"
when = { Year = "2024", year = "2023", Make = "Ford" }
values = ["F-150"]
"#;
        let err = Catalog::from_file(CatalogFile::from_toml_str(text).unwrap()).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::RepeatedKeyAttribute { ref attribute, ref upstream }
                if attribute == "Model" && upstream == "Year"
        ));
    }

    #[test]
    fn test_rejects_duplicate_entry() {
        let text = r#"
chain = ["Year", "Make"]

[[entries]]
attribute = "Make"
when = { Year = "2024" }
values = ["Ford"]

[[entries]]
attribute = "Make"
when = { Year = "2024" }
values = ["Toyota"]
"#;
        let err = Catalog::from_file(CatalogFile::from_toml_str(text).unwrap()).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateEntry { .. }));
        assert!(err.to_string().contains("Year=2024"));
    }

    #[test]
    fn test_merge_replaces_and_extends() {
        let mut catalog = small();
        let overlay = CatalogFile::from_toml_str(
            r#"
[defaults]
Make = ["Honda"]

[[entries]]
attribute = "Model"
when = { Year = "2024", Make = "Ford" }
values = ["Bronco"]
"#,
        )
        .unwrap();

        catalog.merge(&overlay).unwrap();

        assert_eq!(catalog.lookup(2, &["2024", "Ford"]), ["Bronco"]);
        assert_eq!(catalog.lookup(2, &["2024", "Toyota"]), ["Camry", "Corolla"]);
        assert_eq!(catalog.lookup(1, &["2024"]), ["Honda"]);
    }

    #[test]
    fn test_merge_rejects_other_chain() {
        let mut catalog = small();
        let overlay = CatalogFile {
            chain: Some(vec!["Make".into()]),
            ..CatalogFile::default()
        };

        assert!(matches!(
            catalog.merge(&overlay),
            Err(CatalogError::ChainMismatch { .. })
        ));
    }

    #[test]
    fn test_to_file_preserves_lookups() {
        let catalog = small();
        let rebuilt = Catalog::from_file(catalog.to_file()).unwrap();

        assert_eq!(rebuilt.lookup(2, &["2024", "Ford"]), ["F-150", "Mustang"]);
        assert_eq!(rebuilt.lookup(2, &["2023", "Toyota"]), ["Camry", "Corolla"]);
        assert_eq!(rebuilt.entry_count(), catalog.entry_count());
    }

    #[test]
    fn test_builtin_catalog_loads() {
        let catalog = Catalog::builtin().unwrap();

        assert_eq!(catalog.chain(), &AttributeChain::vehicle());
        assert!(!catalog.lookup(0, &[]).is_empty());
        assert!(catalog.entry_count() > 0);
    }
}
