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

//! Shared test utilities for refscope crates
//!
//! - [`GraphBuilder`]: labelled commit graphs on an in-memory repository
//! - [`TestRepo`]: a repository in a temporary directory
//! - [`refscope`] / [`RefscopeCommand`]: drive the CLI binary

pub mod assertions;
pub mod cli;
pub mod graph;
pub mod repo;

pub use assertions::*;
pub use cli::{refscope, RefscopeCommand};
pub use graph::GraphBuilder;
pub use repo::TestRepo;
