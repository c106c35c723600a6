// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Command implementations

pub mod chain;
pub mod check;
pub mod completions;
pub mod config;
pub mod export;
pub mod options;
pub mod select;
pub mod session;

use crate::catalog::Catalog;
use crate::config::Settings;
use crate::resolver::{Resolver, Snapshot};
use crate::types::CascadePolicy;
use anyhow::{Context as _, Result};
use owo_colors::OwoColorize;
use std::ffi::OsStr;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Global flags that override the loaded settings
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Catalog file instead of the configured one
    pub catalog: Option<PathBuf>,
    /// Cascade policy instead of the configured one
    pub cascade: Option<CascadePolicy>,
    /// Emit JSON instead of text
    pub json: bool,
    /// Disable colored output
    pub no_color: bool,
}

/// Everything a command needs from the global flags and configuration
#[derive(Debug, Clone)]
pub struct Context {
    /// Effective settings
    pub settings: Settings,
    /// Emit JSON instead of text
    pub json: bool,
}

impl Context {
    /// Build a context, applying the command-line overrides to `settings`
    #[must_use]
    pub fn new(mut settings: Settings, overrides: Overrides) -> Self {
        if overrides.catalog.is_some() {
            settings.catalog = overrides.catalog;
        }
        if let Some(cascade) = overrides.cascade {
            settings.cascade = cascade;
        }
        if overrides.no_color {
            settings.color = false;
        }
        Self {
            settings,
            json: overrides.json,
        }
    }

    /// Load the configured catalog, or the built-in one
    pub fn catalog(&self) -> Result<Arc<Catalog>> {
        let catalog = match &self.settings.catalog {
            Some(path) => Catalog::load(path)
                .with_context(|| format!("Failed to load catalog {}", path.display()))?,
            None => {
                info!("Using built-in vehicle catalog");
                Catalog::builtin().context("Built-in catalog is malformed")?
            }
        };
        Ok(Arc::new(catalog))
    }

    /// Fresh resolver over the configured catalog
    pub fn resolver(&self) -> Result<Resolver> {
        Ok(Resolver::new(self.catalog()?).with_policy(self.settings.cascade))
    }
}

/// Parse an `Attribute=Value` assignment from the command line
pub fn parse_assignment(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected Attribute=Value, got '{s}'"))?;

    let name = name.trim();
    let value = value.trim();
    if name.is_empty() || value.is_empty() {
        return Err(format!("expected Attribute=Value, got '{s}'"));
    }

    Ok((name.to_string(), value.to_string()))
}

/// Parse a cascade policy name (`reset`, `retain`)
pub fn parse_cascade(s: &str) -> Result<CascadePolicy, String> {
    CascadePolicy::from_name(s)
        .ok_or_else(|| format!("unknown cascade policy '{s}' (expected reset or retain)"))
}

/// Whether a `NO_COLOR` value asks for plain output: any non-empty value does
#[must_use]
pub fn no_color_requested(value: Option<&OsStr>) -> bool {
    value.is_some_and(|v| !v.is_empty())
}

/// Borrow owned assignments in the shape [`Resolver::apply`] takes
pub fn as_pairs(sets: &[(String, String)]) -> impl Iterator<Item = (&str, &str)> {
    sets.iter().map(|(n, v)| (n.as_str(), v.as_str()))
}

/// Render a snapshot as aligned text, one attribute per line
#[must_use]
pub fn render_snapshot(snapshot: &Snapshot, color: bool) -> String {
    let width = snapshot
        .chain
        .names()
        .iter()
        .map(String::len)
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for (name, selected, options) in snapshot.attributes() {
        let label = format!("{name:<width$}");
        let label = paint(&label, color, |s| s.bold().to_string());

        let value = match selected {
            Some(v) => paint(v, color, |s| s.green().to_string()),
            None => paint("(unset)", color, |s| s.dimmed().to_string()),
        };

        let _ = writeln!(out, "  {label}  {value}");
        if selected.is_none() && !options.is_empty() {
            let _ = writeln!(out, "  {:width$}  options: {}", "", options.join(", "));
        }
    }
    out
}

/// Apply `style` only when color is enabled
pub(crate) fn paint(text: &str, color: bool, style: impl Fn(&str) -> String) -> String {
    if color {
        style(text)
    } else {
        text.to_string()
    }
}
