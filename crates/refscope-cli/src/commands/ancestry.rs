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
//! Ancestry queries

use super::GlobalArgs;
use crate::repo::{blocking, open_repository, resolve};
use anyhow::{bail, Context, Result};
use clap::Parser;

/// Check whether COMMIT descends from ANCESTOR
///
/// Prints `true` or `false`. A commit is not its own descendant.
#[derive(Parser, Debug)]
pub struct DescendantCmd {
    /// Candidate descendant
    #[arg(value_name = "COMMIT")]
    pub commit: String,

    /// Candidate ancestor
    #[arg(value_name = "ANCESTOR")]
    pub ancestor: String,
}

impl DescendantCmd {
    pub async fn execute(&self, ctx: &GlobalArgs) -> Result<()> {
        let repo = open_repository(&ctx.cwd)?;
        let commit = resolve(&repo, &self.commit)?;
        let ancestor = resolve(&repo, &self.ancestor)?;

        let answer = blocking(move || {
            repo.ancestry()
                .is_descendant(&commit, &ancestor)
                .context("Ancestry query failed")
        })
        .await?;

        println!("{answer}");
        Ok(())
    }
}

/// Find the best common ancestors of two commits
#[derive(Parser, Debug)]
pub struct MergeBaseCmd {
    /// First commit
    #[arg(value_name = "A")]
    pub a: String,

    /// Second commit
    #[arg(value_name = "B")]
    pub b: String,

    /// Print every best common ancestor instead of one
    #[arg(long)]
    pub all: bool,
}

impl MergeBaseCmd {
    pub async fn execute(&self, ctx: &GlobalArgs) -> Result<()> {
        let repo = open_repository(&ctx.cwd)?;
        let a = resolve(&repo, &self.a)?;
        let b = resolve(&repo, &self.b)?;

        let bases = blocking(move || {
            repo.ancestry()
                .merge_base(&a, &b)
                .context("Merge base query failed")
        })
        .await?;

        let Some(first) = bases.first() else {
            bail!("No common ancestor between '{}' and '{}'", self.a, self.b);
        };

        if self.all {
            for base in &bases {
                println!("{base}");
            }
        } else {
            println!("{first}");
        }
        Ok(())
    }
}
