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
//! Tag listing

use super::GlobalArgs;
use crate::repo::open_repository;
use anyhow::{Context, Result};
use clap::Parser;
use refscope_core::TagEntry;

/// List tags
#[derive(Parser, Debug)]
pub struct TagsCmd {
    /// Show target commit, kind and annotation
    #[arg(short, long)]
    pub long: bool,
}

impl TagsCmd {
    pub async fn execute(&self, ctx: &GlobalArgs) -> Result<()> {
        let repo = open_repository(&ctx.cwd)?;
        let tags = repo.references().list_tags().context("Failed to list tags")?;

        if !self.long {
            for tag in &tags {
                println!("{}", tag.name());
            }
            return Ok(());
        }

        let width = tags.iter().map(|t| t.name().len()).max().unwrap_or(0);
        for tag in &tags {
            let short = tag.target().short();
            match tag {
                TagEntry::Annotated(annotated) => {
                    let summary = annotated.message.lines().next().unwrap_or("");
                    println!("{:<width$} {short} annotated {summary}", tag.name());
                }
                TagEntry::Lightweight { .. } => {
                    println!("{:<width$} {short} lightweight", tag.name());
                }
            }
        }
        Ok(())
    }
}
