// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Check command - validate a catalog file and summarise it

use super::Context;
use crate::catalog::Catalog;
use anyhow::{Context as _, Result};
use std::path::Path;

/// Run the check command
pub fn run(ctx: &Context, path: &Path) -> Result<()> {
    let catalog = Catalog::load(path)
        .with_context(|| format!("Invalid catalog {}", path.display()))?;
    let stats = catalog.stats();

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{} is valid: {}", path.display(), catalog.chain());
    for s in &stats {
        println!(
            "  {}: {} entries, {} defaults, {} fallback stages",
            s.attribute, s.entries, s.defaults, s.stages
        );
    }

    Ok(())
}
