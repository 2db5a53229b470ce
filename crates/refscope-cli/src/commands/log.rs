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
//! History listing and counting

use super::GlobalArgs;
use crate::output;
use crate::repo::{blocking, open_repository, resolve};
use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use refscope_core::{Commit, MetaResult, Oid, Repository, Sorting, WalkOptions, HEAD};

/// Show commit history
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:
    # History of HEAD
    refscope log

    # Last five commits of a branch, oldest first
    refscope log main -n 5 --reverse

    # Commits on feature that are not on main
    refscope log main..feature")]
pub struct LogCmd {
    /// Revision or `A..B` range (defaults to HEAD)
    #[arg(value_name = "REVISION")]
    pub revision: Option<String>,

    /// Maximum number of commits to show
    #[arg(short = 'n', long, value_name = "NUM")]
    pub max_count: Option<usize>,

    /// Never show a parent before all of its children
    #[arg(long)]
    pub topo: bool,

    /// Show oldest commits first
    #[arg(long)]
    pub reverse: bool,

    /// Follow only the first parent of merges
    #[arg(long)]
    pub first_parent: bool,

    /// One line per commit
    #[arg(long)]
    pub oneline: bool,
}

impl LogCmd {
    pub async fn execute(&self, ctx: &GlobalArgs) -> Result<()> {
        let repo = open_repository(&ctx.cwd)?;
        let revision = self.revision.clone().unwrap_or_else(|| HEAD.to_string());
        let options = self.walk_options();

        let commits = blocking(move || {
            let (start, options) = start_and_hidden(&repo, &revision, options)?;
            let walk = repo.walk(start, options)?;
            let commits = walk
                .collect::<MetaResult<Vec<Commit>>>()
                .context("History walk failed")?;
            Ok(commits)
        })
        .await?;

        if commits.is_empty() {
            output::dim("No commits to show");
            return Ok(());
        }

        for commit in &commits {
            if self.oneline {
                println!("{} {}", style(commit.id.short()).yellow(), commit.summary());
            } else {
                print_full(commit);
            }
        }
        Ok(())
    }

    fn walk_options(&self) -> WalkOptions {
        let sorting = if self.topo { Sorting::Topological } else { Sorting::Time };
        let mut options = WalkOptions::default()
            .sorting(sorting)
            .reverse(self.reverse)
            .first_parent(self.first_parent);
        if let Some(limit) = self.max_count {
            options = options.limit(limit);
        }
        options
    }
}

/// Count commits reachable from a revision
#[derive(Parser, Debug)]
pub struct CountCmd {
    /// Revision or `A..B` range (defaults to HEAD)
    #[arg(value_name = "REVISION")]
    pub revision: Option<String>,
}

impl CountCmd {
    pub async fn execute(&self, ctx: &GlobalArgs) -> Result<()> {
        let repo = open_repository(&ctx.cwd)?;
        let revision = self.revision.clone();

        let count = blocking(move || match revision {
            None => repo.count_revisions().context("Failed to count revisions"),
            Some(revision) => {
                let (start, options) = start_and_hidden(&repo, &revision, WalkOptions::default())?;
                let mut count = 0usize;
                for commit in repo.walk(start, options)? {
                    commit.context("History walk failed")?;
                    count += 1;
                }
                Ok(count)
            }
        })
        .await?;

        println!("{count}");
        Ok(())
    }
}

/// Split `A..B` into a start of `B` with `A` hidden; a plain revision starts
/// there with nothing hidden. An empty side of a range means HEAD.
fn start_and_hidden(repo: &Repository, spec: &str, options: WalkOptions) -> Result<(Oid, WalkOptions)> {
    match spec.split_once("..") {
        Some((exclude, include)) => {
            let exclude = if exclude.is_empty() { HEAD } else { exclude };
            let include = if include.is_empty() { HEAD } else { include };
            let hidden = resolve(repo, exclude)?;
            Ok((resolve(repo, include)?, options.hide(hidden)))
        }
        None => Ok((resolve(repo, spec)?, options)),
    }
}

fn print_full(commit: &Commit) {
    println!("{} {}", style("commit").yellow().bold(), style(commit.id).yellow());
    if commit.is_merge() {
        let parents: Vec<String> = commit.parents.iter().map(Oid::short).collect();
        println!("Merge: {}", parents.join(" "));
    }
    println!("Author: {} <{}>", commit.author.name, commit.author.email);
    println!(
        "Date:   {}",
        commit.author.local_time().format("%a %b %e %H:%M:%S %Y %z")
    );
    println!();
    for line in commit.message.lines() {
        println!("    {line}");
    }
    println!();
}
