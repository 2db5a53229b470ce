// Refscope - reference and revision metadata service
// Copyright (C) 2026 Refscope Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//! `refscope` command-line host
//!
//! Every command opens the repository fresh, runs against the core crate
//! and prints plain text to stdout. Diagnostics go through `tracing` to
//! stderr.

mod commands;
mod output;
mod repo;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use commands::*;
use refscope_observability::{init_tracing_with_config, LogConfig, LogFormat};
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "refscope")]
#[command(version, about = "Inspect references, history, ancestry and notes")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log debug output to stderr
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only print requested data and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Colored output (always|auto|never)
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    color: String,

    /// Run as if started in PATH
    #[arg(short = 'C', global = true, value_name = "PATH")]
    directory: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty repository
    Init(InitCmd),

    /// List references
    Refs(RefsCmd),

    /// Resolve a revision to a commit id
    Resolve(ResolveCmd),

    /// List local and remote-tracking branches
    Branches(BranchesCmd),

    /// List tags
    Tags(TagsCmd),

    /// Show where HEAD points
    Head(HeadCmd),

    /// Show commit history
    Log(LogCmd),

    /// Count commits reachable from a revision
    Count(CountCmd),

    /// Check whether one commit descends from another
    Descendant(DescendantCmd),

    /// Find the best common ancestors of two commits
    #[command(name = "merge-base")]
    MergeBase(MergeBaseCmd),

    /// Read and write notes
    Notes(NotesCmd),

    /// List and edit configured remotes
    Remotes(RemotesCmd),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.color.as_str() {
        "never" => console::set_colors_enabled(false),
        "always" => console::set_colors_enabled(true),
        "auto" => {}
        other => {
            output::error(&format!("invalid --color value '{other}'"));
            std::process::exit(2);
        }
    }

    let cwd = match cli.directory {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    init_logging(&cwd, cli.verbose, cli.quiet);

    let ctx = GlobalArgs {
        cwd,
        quiet: cli.quiet,
    };

    let result = match cli.command {
        Commands::Init(cmd) => cmd.execute(&ctx).await,
        Commands::Refs(cmd) => cmd.execute(&ctx).await,
        Commands::Resolve(cmd) => cmd.execute(&ctx).await,
        Commands::Branches(cmd) => cmd.execute(&ctx).await,
        Commands::Tags(cmd) => cmd.execute(&ctx).await,
        Commands::Head(cmd) => cmd.execute(&ctx).await,
        Commands::Log(cmd) => cmd.execute(&ctx).await,
        Commands::Count(cmd) => cmd.execute(&ctx).await,
        Commands::Descendant(cmd) => cmd.execute(&ctx).await,
        Commands::MergeBase(cmd) => cmd.execute(&ctx).await,
        Commands::Notes(cmd) => cmd.execute(&ctx).await,
        Commands::Remotes(cmd) => cmd.execute(&ctx).await,
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "refscope", &mut io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        output::error(&format!("{e:#}"));
        std::process::exit(1);
    }

    Ok(())
}

/// `-q` and `-v` win, then `RUST_LOG`, then `[logging]` in the repository
/// config.
fn init_logging(cwd: &std::path::Path, verbose: bool, quiet: bool) {
    let settings = repo::load_config(cwd).logging;
    let format = settings.format.parse::<LogFormat>().unwrap_or_default();

    let mut config = LogConfig::new()
        .with_format(format)
        .with_color(console::colors_enabled_stderr())
        .with_timestamps(format == LogFormat::Json);

    if quiet {
        config = config.with_level("error");
    } else if verbose {
        config = config.with_level("debug");
    } else if std::env::var_os("RUST_LOG").is_none() {
        config = config.with_level(settings.level);
    }

    if let Err(e) = init_tracing_with_config(&config) {
        output::warning(&format!("logging disabled: {e}"));
    }
}
