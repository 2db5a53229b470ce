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
//! Branch listing

use super::GlobalArgs;
use crate::repo::{blocking, open_repository};
use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use refscope_core::{Branch, BranchFilter, BranchKind, Repository};

/// List local and remote-tracking branches
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:
    # All branches, local first
    refscope branches

    # Local branches with their upstream and ahead/behind counts
    refscope branches --local --track")]
pub struct BranchesCmd {
    /// Only local branches
    #[arg(long, conflicts_with = "remote")]
    pub local: bool,

    /// Only remote-tracking branches
    #[arg(short, long)]
    pub remote: bool,

    /// Show the commit, and for local branches the upstream with
    /// ahead/behind counts
    #[arg(short, long)]
    pub track: bool,
}

/// One rendered row
struct Row {
    marker: char,
    name: String,
    commit: String,
    extra: String,
}

impl BranchesCmd {
    pub async fn execute(&self, ctx: &GlobalArgs) -> Result<()> {
        let repo = open_repository(&ctx.cwd)?;
        let filter = if self.local {
            BranchFilter::Local
        } else if self.remote {
            BranchFilter::Remote
        } else {
            BranchFilter::All
        };
        let track = self.track;

        let rows = blocking(move || {
            let branches = repo
                .references()
                .list_branches(filter)
                .context("Failed to list branches")?;
            branches.iter().map(|b| row(&repo, b, track)).collect::<Result<Vec<_>>>()
        })
        .await?;

        let width = rows.iter().map(|r| r.name.len()).max().unwrap_or(0);
        for row in rows {
            let name = if row.marker == '*' {
                style(format!("{:<width$}", row.name)).green().bold().to_string()
            } else {
                format!("{:<width$}", row.name)
            };
            let line = [row.commit, row.extra]
                .into_iter()
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            if line.is_empty() {
                println!("{} {}", row.marker, name.trim_end());
            } else {
                println!("{} {} {}", row.marker, name, line);
            }
        }
        Ok(())
    }
}

fn row(repo: &Repository, branch: &Branch, track: bool) -> Result<Row> {
    let marker = if branch.is_head { '*' } else { ' ' };
    let name = branch.name();

    let mut commit = String::new();
    if track {
        commit = match repo.references().resolve(&branch.reference.name) {
            Ok(oid) => oid.short(),
            Err(e) if e.is_not_found() => "-".to_string(),
            Err(e) => return Err(e).with_context(|| format!("Failed to resolve {name}")),
        };
    }

    let extra = match &branch.kind {
        BranchKind::Remote { url, .. } => url.to_string(),
        BranchKind::Local { .. } if track => upstream_summary(repo, branch)?,
        BranchKind::Local { .. } => String::new(),
    };

    Ok(Row {
        marker,
        name,
        commit,
        extra,
    })
}

/// `[origin/main: ahead 1, behind 2]`, or empty without an upstream
fn upstream_summary(repo: &Repository, branch: &Branch) -> Result<String> {
    let Some(upstream) = repo.references().upstream(branch)? else {
        return Ok(String::new());
    };
    let references = repo.references();
    let local = references.resolve(&branch.reference.name)?;
    let remote = references.resolve(&upstream.reference.name)?;
    let (ahead, behind) = repo.ancestry().ahead_behind(&local, &remote)?;

    let counts = match (ahead, behind) {
        (0, 0) => String::new(),
        (a, 0) => format!(": ahead {a}"),
        (0, b) => format!(": behind {b}"),
        (a, b) => format!(": ahead {a}, behind {b}"),
    };
    Ok(format!("[{}{counts}]", upstream.name()))
}
