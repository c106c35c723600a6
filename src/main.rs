// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//
//! Pickard CLI - cascading vehicle selector

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use pickard::commands::{
    self, no_color_requested, parse_assignment, parse_cascade, Context, Overrides,
};
use pickard::types::CascadePolicy;

#[derive(Parser)]
#[command(name = "pickard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Quiet mode (suppress non-error output)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file path
    #[arg(short, long, env = "PICKARD_CONFIG", global = true)]
    config: Option<std::path::PathBuf>,

    /// Catalog file (TOML or JSON) instead of the built-in vehicle catalog
    #[arg(long, env = "PICKARD_CATALOG", global = true)]
    catalog: Option<std::path::PathBuf>,

    /// Cascade policy when an upstream value changes (reset, retain)
    #[arg(long, value_name = "POLICY", value_parser = parse_cascade, global = true)]
    cascade: Option<CascadePolicy>,

    /// Disable colored output (also set by a non-empty NO_COLOR)
    #[arg(long, global = true)]
    no_color: bool,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the valid values of an attribute
    Options {
        /// Attribute name (Year, Make, Model, Submodel, Engine, DriveType)
        attribute: String,

        /// Upstream selection, applied in order
        #[arg(short, long = "set", value_name = "ATTRIBUTE=VALUE", value_parser = parse_assignment)]
        sets: Vec<(String, String)>,
    },

    /// Apply selections in order and show every attribute
    Select {
        /// Selection, applied in order
        #[arg(short, long = "set", value_name = "ATTRIBUTE=VALUE", value_parser = parse_assignment)]
        sets: Vec<(String, String)>,
    },

    /// Interactive picker reading commands from stdin
    Session,

    /// Show the attribute chain and fallback policies
    Chain,

    /// Validate a catalog file
    Check {
        /// Catalog file to validate
        file: std::path::PathBuf,
    },

    /// Export the active catalog
    Export {
        /// Output format (toml, json)
        #[arg(short, long, default_value = "toml")]
        format: String,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<std::path::PathBuf>,
    },

    /// Show the effective configuration
    Config {
        /// Configuration key
        key: Option<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: clap_complete::Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = pickard::config::load(cli.config.as_deref())?;

    // Initialize logging
    let log_level = match cli.verbose {
        0 if cli.quiet => tracing::Level::ERROR,
        0 => settings.log_level.parse().unwrap_or(tracing::Level::INFO),
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    // RUST_LOG wins over the flags when set
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level.as_str().to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let ctx = Context::new(
        settings,
        Overrides {
            catalog: cli.catalog,
            cascade: cli.cascade,
            json: cli.json,
            no_color: cli.no_color || no_color_requested(std::env::var_os("NO_COLOR").as_deref()),
        },
    );

    // Execute command
    match cli.command {
        Commands::Options { attribute, sets } => commands::options::run(&ctx, &attribute, &sets),
        Commands::Select { sets } => commands::select::run(&ctx, &sets),
        Commands::Session => commands::session::run(&ctx),
        Commands::Chain => commands::chain::run(&ctx),
        Commands::Check { file } => commands::check::run(&ctx, &file),
        Commands::Export { format, output } => commands::export::run(&ctx, &format, output),
        Commands::Config { key } => commands::config::run(&ctx, key.as_deref()),
        Commands::Completions { shell } => commands::completions::run(shell, &mut Cli::command()),
    }
}
