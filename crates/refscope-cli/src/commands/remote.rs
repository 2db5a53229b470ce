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
//! Remote configuration

use super::GlobalArgs;
use crate::output;
use crate::repo::{open_repository, repo_dir};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use refscope_config::Validator;
use tracing::info;

/// List and edit configured remotes
///
/// Remote URLs are shown next to remote-tracking branches; a remote
/// without one is listed as `(unconfigured)`.
#[derive(Parser, Debug)]
pub struct RemotesCmd {
    #[command(subcommand)]
    pub action: Option<RemoteAction>,
}

#[derive(Subcommand, Debug)]
pub enum RemoteAction {
    /// Declare a remote, optionally with a URL
    Add {
        /// Remote name
        #[arg(value_name = "NAME")]
        name: String,

        /// Remote URL
        #[arg(value_name = "URL")]
        url: Option<String>,
    },

    /// Change or clear a remote's URL
    #[command(name = "set-url")]
    SetUrl {
        /// Remote name
        #[arg(value_name = "NAME")]
        name: String,

        /// New URL; omit to clear
        #[arg(value_name = "URL")]
        url: Option<String>,
    },

    /// Forget a remote
    #[command(alias = "rm")]
    Remove {
        /// Remote name
        #[arg(value_name = "NAME")]
        name: String,
    },
}

impl RemotesCmd {
    pub async fn execute(&self, ctx: &GlobalArgs) -> Result<()> {
        let repo = open_repository(&ctx.cwd)?;

        let Some(action) = &self.action else {
            for (name, remote) in &repo.config().remotes {
                let url = remote.url.as_deref().unwrap_or("(unconfigured)");
                println!("{name}\t{url}");
            }
            return Ok(());
        };

        let mut config = repo.config().clone();
        let message = match action {
            RemoteAction::Add { name, url } => {
                if config.remotes.contains_key(name) {
                    bail!("Remote '{name}' already exists");
                }
                config.set_remote(name.as_str(), url.clone());
                format!("Added remote '{name}'")
            }
            RemoteAction::SetUrl { name, url } => {
                if !config.remotes.contains_key(name) {
                    bail!("No such remote '{name}'");
                }
                config.set_remote(name.as_str(), url.clone());
                format!("Updated remote '{name}'")
            }
            RemoteAction::Remove { name } => {
                if config.remove_remote(name).is_none() {
                    bail!("No such remote '{name}'");
                }
                format!("Removed remote '{name}'")
            }
        };

        config.validate().context("Invalid remote")?;
        let dir = repo_dir(&repo)?;
        config.save(&dir).context("Failed to write configuration")?;
        info!(path = %dir.display(), "Saved configuration");

        if !ctx.quiet {
            output::success(&message);
        }
        Ok(())
    }
}
