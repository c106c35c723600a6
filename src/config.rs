// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Configuration management

use crate::types::CascadePolicy;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the optional config file in the platform config directory
pub const CONFIG_FILE: &str = "pickard.toml";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Catalog file to load instead of the built-in vehicle catalog
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<PathBuf>,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Colored terminal output
    pub color: bool,
    /// How downstream selections react to upstream changes
    pub cascade: CascadePolicy,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            catalog: None,
            log_level: "info".to_string(),
            color: true,
            cascade: CascadePolicy::Reset,
        }
    }
}

/// Platform config directory for pickard
#[must_use]
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "hyperpolymath", "pickard")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Load configuration: defaults, then `pickard.toml` from the config
/// directory, then `explicit` if given, then `PICKARD_*` variables
pub fn load(explicit: Option<&Path>) -> Result<Settings> {
    let defaults = Settings::default();
    let mut builder = Config::builder()
        .set_default("log_level", defaults.log_level)?
        .set_default("color", defaults.color)?
        .set_default("cascade", "reset")?;

    if let Some(dir) = config_dir() {
        builder = builder.add_source(File::from(dir.join(CONFIG_FILE)).required(false));
    }

    if let Some(path) = explicit {
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }
        builder = builder.add_source(File::from(path));
    }

    builder
        .add_source(Environment::with_prefix("PICKARD"))
        .build()
        .context("Failed to read configuration")?
        .try_deserialize()
        .context("Invalid configuration")
}
