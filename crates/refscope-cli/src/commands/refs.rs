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
//! Reference listing, revision resolution and HEAD

use super::GlobalArgs;
use crate::repo::{open_repository, resolve};
use anyhow::{Context, Result};
use clap::Parser;
use refscope_core::{Head, RefStore, RefTarget, HEAD};

/// List references
#[derive(Parser, Debug)]
pub struct RefsCmd {
    /// Only list references under this prefix (e.g. refs/heads/)
    #[arg(value_name = "PREFIX")]
    pub prefix: Option<String>,
}

impl RefsCmd {
    pub async fn execute(&self, ctx: &GlobalArgs) -> Result<()> {
        let repo = open_repository(&ctx.cwd)?;
        let references = repo
            .references()
            .list(self.prefix.as_deref())
            .context("Failed to list references")?;

        for reference in references {
            match &reference.target {
                RefTarget::Direct(oid) => println!("{oid} {}", reference.name),
                RefTarget::Symbolic(target) => println!("{} -> {target}", reference.name),
            }
        }
        Ok(())
    }
}

/// Resolve a revision to a commit id
#[derive(Parser, Debug)]
pub struct ResolveCmd {
    /// Reference name, short name, commit id or `name~N` / `name^N`
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Print the full reference name the short name expands to instead
    #[arg(long)]
    pub full_name: bool,
}

impl ResolveCmd {
    pub async fn execute(&self, ctx: &GlobalArgs) -> Result<()> {
        let repo = open_repository(&ctx.cwd)?;

        if self.full_name {
            let reference = repo
                .references()
                .dwim(&self.name)
                .with_context(|| format!("No reference matches '{}'", self.name))?;
            println!("{}", reference.name);
        } else {
            println!("{}", resolve(&repo, &self.name)?);
        }
        Ok(())
    }
}

/// Show where HEAD points
#[derive(Parser, Debug)]
pub struct HeadCmd {}

impl HeadCmd {
    pub async fn execute(&self, ctx: &GlobalArgs) -> Result<()> {
        let repo = open_repository(&ctx.cwd)?;

        match repo.head().context("Failed to read HEAD")? {
            Some(Head::Branch(branch)) => {
                let oid = branch.target_oid().map(|o| o.to_string()).unwrap_or_default();
                println!("{} {oid}", branch.name());
            }
            Some(Head::Detached(commit)) => println!("detached {}", commit.id),
            None => match repo.refs().read_ref(HEAD) {
                Ok(head) => match head.symbolic_target() {
                    Some(target) => println!("unborn {target}"),
                    None => println!("unborn"),
                },
                Err(e) if e.is_not_found() => println!("unborn"),
                Err(e) => return Err(e).context("Failed to read HEAD"),
            },
        }
        Ok(())
    }
}
