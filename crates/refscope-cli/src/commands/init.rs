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
//! Repository initialization

use super::GlobalArgs;
use crate::output;
use anyhow::{Context, Result};
use clap::Parser;
use refscope_core::{Repository, REPO_DIR_NAME};
use std::fs;
use std::path::PathBuf;

/// Create an empty repository
#[derive(Parser, Debug)]
pub struct InitCmd {
    /// Directory to initialize (defaults to the current directory)
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Branch HEAD starts on (defaults to core.default_branch)
    #[arg(short = 'b', long, value_name = "BRANCH")]
    pub initial_branch: Option<String>,
}

impl InitCmd {
    pub async fn execute(&self, ctx: &GlobalArgs) -> Result<()> {
        let path = match &self.path {
            Some(p) => ctx.cwd.join(p),
            None => ctx.cwd.clone(),
        };
        fs::create_dir_all(&path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;

        let repo = Repository::init(&path, self.initial_branch.as_deref())
            .with_context(|| format!("Failed to initialize repository in {}", path.display()))?;

        if !ctx.quiet {
            output::success(&format!(
                "Initialized empty refscope repository in {}",
                path.join(REPO_DIR_NAME).display()
            ));
            output::detail("Initial branch", &repo.config().core.default_branch);
        }
        Ok(())
    }
}
