// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Export command - writes the active catalog as TOML or JSON

use super::Context;
use anyhow::{Context as _, Result};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// TOML catalog file
    Toml,
    /// JSON catalog file
    Json,
}

impl ExportFormat {
    /// Parse format from string
    #[must_use]
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Get file extension for format
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Toml => "toml",
            Self::Json => "json",
        }
    }
}

/// Run the export command
pub fn run(ctx: &Context, format: &str, output: Option<PathBuf>) -> Result<()> {
    info!("Exporting catalog as {}", format);

    let export_format = ExportFormat::from_name(format)
        .ok_or_else(|| {
            anyhow::anyhow!("Unknown export format: {}. Supported: toml, json", format)
        })?;

    let file = ctx.catalog()?.to_file();

    let content = match export_format {
        ExportFormat::Toml => {
            toml::to_string_pretty(&file).context("Failed to serialize catalog to TOML")?
        }
        ExportFormat::Json => {
            serde_json::to_string_pretty(&file).context("Failed to serialize catalog to JSON")?
        }
    };

    match output {
        Some(path) => {
            if path.extension().is_none() {
                info!(
                    "No extension on {}; expected .{}",
                    path.display(),
                    export_format.extension()
                );
            }
            fs::write(&path, &content)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
            println!("Exported to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }

    Ok(())
}
