// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell

use super::Context;
use anyhow::{Context as _, Result};

/// Print the effective configuration, or one key of it
pub fn run(ctx: &Context, key: Option<&str>) -> Result<()> {
    let value = toml::Value::try_from(&ctx.settings).context("Failed to serialize settings")?;
    let table = value
        .as_table()
        .ok_or_else(|| anyhow::anyhow!("Settings did not serialize to a table"))?;

    match key {
        Some(key) => {
            let value = table
                .get(key)
                .ok_or_else(|| anyhow::anyhow!("Unknown config key: {}", key))?;
            match value {
                toml::Value::String(s) => println!("{}", s),
                other => println!("{}", other),
            }
        }
        None if ctx.json => println!("{}", serde_json::to_string_pretty(&ctx.settings)?),
        None => {
            print!("{}", toml::to_string_pretty(table)?);
            if let Some(dir) = crate::config::config_dir() {
                println!("# config file: {}", dir.join(crate::config::CONFIG_FILE).display());
            }
        }
    }

    Ok(())
}
