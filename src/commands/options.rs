// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Options command - list the valid values of one attribute

use super::{as_pairs, paint, Context};
use crate::catalog::LookupSource;
use anyhow::{Context as _, Result};
use owo_colors::OwoColorize;
use serde::Serialize;

#[derive(Serialize)]
struct OptionsReport<'a> {
    attribute: &'a str,
    source: &'static str,
    options: Vec<String>,
}

/// Run the options command
pub fn run(ctx: &Context, attribute: &str, sets: &[(String, String)]) -> Result<()> {
    let mut resolver = ctx.resolver()?;
    resolver
        .apply(as_pairs(sets))
        .context("Selection rejected")?;

    let index = resolver
        .chain()
        .position(attribute)
        .ok_or_else(|| {
            anyhow::anyhow!(
                "Unknown attribute: {}. Valid: {}",
                attribute,
                resolver.chain().names().join(", ")
            )
        })?;
    let name = resolver.chain().name(index).unwrap_or(attribute);

    let Some(upstream) = resolver.state().upstream(index) else {
        let unset = resolver.state().first_unset().unwrap_or(0);
        anyhow::bail!(
            "{} depends on {}; pass --set {}=<value> first",
            name,
            resolver.chain().name(unset).unwrap_or("?"),
            resolver.chain().name(unset).unwrap_or("?")
        );
    };

    let resolution = resolver.catalog().resolve(index, &upstream);
    let source = match resolution.source {
        LookupSource::Exact => "exact",
        LookupSource::Fallback(_) => "fallback",
        LookupSource::Default => "default",
    };

    if ctx.json {
        let report = OptionsReport {
            attribute: name,
            source,
            options: resolution.values.to_vec(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if resolution.values.is_empty() {
        println!("No {} options for this selection.", name);
        return Ok(());
    }

    let heading = format!("{} ({}, {}):", name, resolution.values.len(), source);
    println!("{}", paint(&heading, ctx.settings.color, |s| s.bold().to_string()));
    for value in resolution.values {
        println!("  {}", value);
    }

    Ok(())
}
