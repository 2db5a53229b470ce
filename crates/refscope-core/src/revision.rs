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

//! Revision specifiers
//!
//! Supports:
//! - Full 40-character object ids
//! - Reference names, full (`refs/heads/main`, `HEAD`) or short (`main`,
//!   `v1.0`, `origin/main`)
//! - `<rev>~N`: N-th first-parent ancestor (`~` alone means `~1`)
//! - `<rev>^N`: N-th parent (`^` alone means `^1`, `^0` is the commit itself)
//!
//! Suffixes chain left to right (`main~2^2`). Annotated tags are peeled to
//! the commit they name.

use crate::tag::peel_to_commit;
use crate::{MetaError, MetaResult, Oid, ReferenceStore};
use tracing::debug;

/// One navigation step after the base name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// `~N`
    Ancestor(usize),
    /// `^N`
    Parent(usize),
}

/// Resolve a revision specifier to a commit id
///
/// # Errors
///
/// - [`MetaError::InvalidArgument`] for malformed specifiers
/// - [`MetaError::NotFound`] if the base doesn't resolve or a step walks
///   past a root commit
/// - [`MetaError::InvalidObject`] if the base doesn't peel to a commit
pub fn resolve_revision(store: &ReferenceStore, revision: &str) -> MetaResult<Oid> {
    let (base, steps) = parse_revision(revision)?;

    let base_oid = if Oid::is_hex(base) {
        Oid::from_hex(base)?
    } else {
        let reference = store.dwim(base)?;
        store.resolve(&reference.name)?
    };

    let mut commit = peel_to_commit(store.objects().as_ref(), &base_oid)?;
    for step in steps {
        let next = match step {
            Step::Parent(0) => continue,
            Step::Parent(n) => commit.parents.get(n - 1).copied().ok_or_else(|| {
                MetaError::not_found(format!("{revision}: commit {} has no parent {n}", commit.id))
            })?,
            Step::Ancestor(n) => {
                for generation in 0..n {
                    let parent = commit.first_parent().copied().ok_or_else(|| {
                        MetaError::not_found(format!(
                            "{revision}: reached root commit {} after {generation} generation(s)",
                            commit.id
                        ))
                    })?;
                    commit = store.objects().get_commit(&parent)?;
                }
                continue;
            }
        };
        commit = store.objects().get_commit(&next)?;
    }

    debug!(revision = %revision, resolved = %commit.id, "Resolved revision");
    Ok(commit.id)
}

/// Split `revision` into its base name and navigation steps
fn parse_revision(revision: &str) -> MetaResult<(&str, Vec<Step>)> {
    let split = revision.find(['~', '^']).unwrap_or(revision.len());
    let (base, mut rest) = revision.split_at(split);
    if base.is_empty() {
        return Err(MetaError::invalid_argument(format!(
            "revision '{revision}' has no base"
        )));
    }

    let mut steps = Vec::new();
    let mut chars = rest.chars();
    while let Some(op) = chars.next() {
        if !matches!(op, '~' | '^') {
            return Err(MetaError::invalid_argument(format!(
                "unexpected '{op}' in revision '{revision}'"
            )));
        }
        rest = chars.as_str();
        let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        let count = if digits == 0 {
            1
        } else {
            rest[..digits].parse::<usize>().map_err(|e| {
                MetaError::invalid_argument(format!("invalid count in '{revision}': {e}"))
            })?
        };
        chars = rest[digits..].chars();

        steps.push(if op == '~' { Step::Ancestor(count) } else { Step::Parent(count) });
    }

    Ok((base, steps))
}
