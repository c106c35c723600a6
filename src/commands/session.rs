// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Session command - line-driven vehicle picker on stdin/stdout
//!
//! Reads one command per line:
//!
//! ```text
//! set <Attribute> <value>   select a value (values may contain spaces)
//! options <Attribute>       list valid values
//! show                      print the current selection
//! help                      list commands
//! quit                      leave the session
//! ```
//!
//! The terminal binding re-renders the selection after every accepted
//! `set`; rejected selections print the reason and leave the state alone.

use super::{render_snapshot, Context};
use crate::resolver::{Binding, Resolver, Snapshot};
use anyhow::Result;
use std::io::{self, BufRead, Write};

/// Renders snapshots as text to a writer
pub struct TerminalBinding<W: Write> {
    out: W,
    color: bool,
}

impl<W: Write> TerminalBinding<W> {
    /// Binding writing to `out`
    pub fn new(out: W, color: bool) -> Self {
        Self { out, color }
    }
}

impl<W: Write> Binding for TerminalBinding<W> {
    fn render(&mut self, snapshot: &Snapshot) {
        let text = render_snapshot(snapshot, self.color);
        if let Err(err) = self.out.write_all(text.as_bytes()).and_then(|()| self.out.flush()) {
            tracing::error!("Failed to render selection: {}", err);
        }
    }
}

const HELP: &str = "commands: set <Attribute> <value>, options <Attribute>, show, help, quit";

/// Run the session command on stdin/stdout
pub fn run(ctx: &Context) -> Result<()> {
    let mut resolver = ctx.resolver()?;
    resolver.attach(TerminalBinding::new(io::stdout(), ctx.settings.color));

    let stdin = io::stdin();
    drive(&mut resolver, stdin.lock(), io::stdout(), ctx.settings.color)
}

/// Feed lines from `input` into `resolver`, writing prompts and command
/// output to `out`. Rendering after a selection is left to the resolver's
/// bindings.
pub fn drive<R: BufRead, W: Write>(
    resolver: &mut Resolver,
    input: R,
    mut out: W,
    color: bool,
) -> Result<()> {
    writeln!(out, "Vehicle picker: {}", resolver.chain())?;
    writeln!(out, "{HELP}")?;

    for line in input.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (command, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();

        match command {
            "set" | "select" => {
                let Some((name, value)) = rest.split_once(char::is_whitespace) else {
                    writeln!(out, "usage: set <Attribute> <value>")?;
                    continue;
                };
                if let Err(err) = resolver.select_named(name, value.trim()) {
                    writeln!(out, "rejected: {err}")?;
                }
            }
            "options" | "opts" => {
                if rest.is_empty() {
                    writeln!(out, "usage: options <Attribute>")?;
                    continue;
                }
                if resolver.chain().position(rest).is_none() {
                    writeln!(out, "unknown attribute '{rest}'")?;
                    continue;
                }
                let options = resolver.valid_options_named(rest);
                if options.is_empty() {
                    writeln!(out, "no options for {rest} yet")?;
                } else {
                    writeln!(out, "{}", options.join(", "))?;
                }
            }
            "show" => {
                write!(out, "{}", render_snapshot(&resolver.snapshot(), color))?;
            }
            "help" | "?" => writeln!(out, "{HELP}")?,
            "quit" | "exit" | "q" => break,
            other => writeln!(out, "unknown command '{other}'; {HELP}")?,
        }
    }

    Ok(())
}
