// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Chain command - show the attribute chain and each attribute's fallback policy

use super::Context;
use anyhow::Result;
use serde::Serialize;

#[derive(Serialize)]
struct ChainEntry {
    position: usize,
    name: String,
    fallback: Vec<String>,
}

/// Run the chain command
pub fn run(ctx: &Context) -> Result<()> {
    let catalog = ctx.catalog()?;
    let chain = catalog.chain();

    let entries: Vec<ChainEntry> = chain
        .names()
        .iter()
        .enumerate()
        .map(|(i, name)| ChainEntry {
            position: i,
            name: name.clone(),
            fallback: catalog
                .policy(i)
                .map(|p| p.stages().iter().map(|s| s.describe(chain)).collect())
                .unwrap_or_default(),
        })
        .collect();

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("{}", chain);
    for entry in &entries {
        if entry.fallback.is_empty() {
            println!("  {}. {}", entry.position, entry.name);
        } else {
            println!(
                "  {}. {} (fallback: {})",
                entry.position,
                entry.name,
                entry.fallback.join(" → ")
            );
        }
    }

    Ok(())
}
