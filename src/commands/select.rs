// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Select command - apply selections in order and show the result

use super::{render_snapshot, Context};
use crate::resolver::Snapshot;
use anyhow::Result;
use serde::Serialize;
use tracing::info;

#[derive(Serialize)]
struct AttributeReport<'a> {
    name: &'a str,
    selected: Option<&'a str>,
    options: &'a [String],
}

#[derive(Serialize)]
struct SelectReport<'a> {
    complete: bool,
    attributes: Vec<AttributeReport<'a>>,
}

impl<'a> SelectReport<'a> {
    fn new(snapshot: &'a Snapshot) -> Self {
        Self {
            complete: snapshot.state.is_complete(),
            attributes: snapshot
                .attributes()
                .map(|(name, selected, options)| AttributeReport {
                    name,
                    selected,
                    options,
                })
                .collect(),
        }
    }
}

/// Run the select command
pub fn run(ctx: &Context, sets: &[(String, String)]) -> Result<()> {
    let mut resolver = ctx.resolver()?;

    for (name, value) in sets {
        let transition = resolver.select_named(name, value).map_err(|err| {
            anyhow::anyhow!("Selection rejected at {}={}: {}", name, value, err)
        })?;

        if !transition.cleared.is_empty() {
            let cleared: Vec<&str> = transition
                .cleared
                .iter()
                .filter_map(|&i| resolver.chain().name(i))
                .collect();
            info!("{}={} cleared {}", name, value, cleared.join(", "));
        }
    }

    let snapshot = resolver.snapshot();
    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&SelectReport::new(&snapshot))?);
    } else {
        print!("{}", render_snapshot(&snapshot, ctx.settings.color));
        if snapshot.state.is_complete() {
            println!("Selection complete.");
        }
    }

    Ok(())
}
