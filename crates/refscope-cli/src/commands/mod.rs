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
pub mod ancestry;
pub mod branch;
pub mod init;
pub mod log;
pub mod notes;
pub mod refs;
pub mod remote;
pub mod tag;

use std::path::PathBuf;

pub use ancestry::{DescendantCmd, MergeBaseCmd};
pub use branch::BranchesCmd;
pub use init::InitCmd;
pub use log::{CountCmd, LogCmd};
pub use notes::NotesCmd;
pub use refs::{HeadCmd, RefsCmd, ResolveCmd};
pub use remote::RemotesCmd;
pub use tag::TagsCmd;

/// Options shared by every command
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    /// Directory the command runs in
    pub cwd: PathBuf,
    /// Suppress status lines
    pub quiet: bool,
}
