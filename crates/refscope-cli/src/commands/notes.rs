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
//! Notes commands

use super::GlobalArgs;
use crate::output;
use crate::repo::{open_repository, resolve_object, signature};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use refscope_core::HEAD;
use tracing::debug;

/// Read and write notes
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:
    # Annotate HEAD
    refscope notes add -m \"reviewed\"

    # Replace the note on a tag's commit in a custom notes ref
    refscope notes add v1.0 -m \"shipped\" --force --ref refs/notes/release

    # List notes as '<note blob> <annotated object>'
    refscope notes list

Note commits are signed with REFSCOPE_AUTHOR_NAME and REFSCOPE_AUTHOR_EMAIL.")]
pub struct NotesCmd {
    /// Notes reference (defaults to core.notes_ref)
    #[arg(long = "ref", global = true, value_name = "REF")]
    pub notes_ref: Option<String>,

    #[command(subcommand)]
    pub action: NotesAction,
}

#[derive(Subcommand, Debug)]
pub enum NotesAction {
    /// List all notes
    #[command(alias = "ls")]
    List,

    /// Attach a note to an object
    Add {
        /// Object to annotate
        #[arg(value_name = "OBJECT", default_value = HEAD)]
        object: String,

        /// Note text
        #[arg(short, long)]
        message: String,

        /// Replace an existing note
        #[arg(short, long)]
        force: bool,
    },

    /// Print the note attached to an object
    Show {
        /// Annotated object
        #[arg(value_name = "OBJECT", default_value = HEAD)]
        object: String,
    },

    /// Remove the note attached to an object
    #[command(alias = "rm")]
    Remove {
        /// Annotated object
        #[arg(value_name = "OBJECT", default_value = HEAD)]
        object: String,
    },
}

impl NotesCmd {
    pub async fn execute(&self, ctx: &GlobalArgs) -> Result<()> {
        let repo = open_repository(&ctx.cwd)?;
        let notes = repo.notes();
        let notes_ref = self.notes_ref.as_deref();
        let ref_label = notes_ref.unwrap_or(notes.default_ref()).to_string();
        debug!(notes_ref = %ref_label, "Using notes ref");

        match &self.action {
            NotesAction::List => {
                let all = notes
                    .list(notes_ref)
                    .with_context(|| format!("Failed to list notes in {ref_label}"))?;
                for note in all {
                    println!("{} {}", note.blob_id, note.annotated_object_id);
                }
            }
            NotesAction::Add {
                object,
                message,
                force,
            } => {
                let oid = resolve_object(&repo, object)?;
                let sig = signature();
                notes
                    .create(&oid, message, &sig, &sig, notes_ref, *force)
                    .with_context(|| format!("Failed to add note to {object}"))?;
                if !ctx.quiet {
                    output::success(&format!("Added note to {} in {ref_label}", oid.short()));
                }
            }
            NotesAction::Show { object } => {
                let oid = resolve_object(&repo, object)?;
                let note = notes
                    .read(&oid, notes_ref)
                    .with_context(|| format!("No note found for {object}"))?;
                print!("{}", note.message);
                if !note.message.ends_with('\n') {
                    println!();
                }
            }
            NotesAction::Remove { object } => {
                let oid = resolve_object(&repo, object)?;
                let note = notes
                    .read(&oid, notes_ref)
                    .with_context(|| format!("No note found for {object}"))?;
                let sig = signature();
                notes
                    .remove(&note, &sig, &sig)
                    .with_context(|| format!("Failed to remove note from {object}"))?;
                if !ctx.quiet {
                    output::success(&format!("Removed note from {} in {ref_label}", oid.short()));
                }
            }
        }
        Ok(())
    }
}
