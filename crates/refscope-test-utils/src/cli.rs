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

//! CLI command helpers
//!
//! Wrappers around assert_cmd for running the `refscope` binary.

use assert_cmd::Command;
use std::path::Path;

/// Create a `refscope` command for testing
///
/// # Example
/// ```ignore
/// use refscope_test_utils::refscope;
///
/// refscope()
///     .arg("init")
///     .current_dir(temp_dir.path())
///     .assert()
///     .success();
/// ```
#[allow(deprecated)]
pub fn refscope() -> Command {
    let mut cmd = Command::cargo_bin("refscope").expect("refscope binary not found");
    // keep test output independent of the caller's environment
    cmd.env_remove("RUST_LOG").env("NO_COLOR", "1");
    cmd
}

/// Fluent wrapper for common `refscope` invocations
pub struct RefscopeCommand {
    cmd: Command,
}

impl RefscopeCommand {
    /// Create a new command
    pub fn new() -> Self {
        Self { cmd: refscope() }
    }

    /// Run inside `dir`
    pub fn in_dir(mut self, dir: &Path) -> Self {
        self.cmd.current_dir(dir);
        self
    }

    /// Add an argument
    pub fn arg(mut self, arg: &str) -> Self {
        self.cmd.arg(arg);
        self
    }

    /// Add several arguments
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    /// Run and assert success
    pub fn run_success(mut self) -> assert_cmd::assert::Assert {
        self.cmd.assert().success()
    }

    /// Run and assert failure
    pub fn run_failure(mut self) -> assert_cmd::assert::Assert {
        self.cmd.assert().failure()
    }

    /// Underlying command for custom assertions
    pub fn into_inner(self) -> Command {
        self.cmd
    }

    /// `refscope init -q` in `dir`
    pub fn init_quiet(dir: &Path) {
        refscope()
            .args(["init", "-q"])
            .current_dir(dir)
            .assert()
            .success();
    }

    /// Standard output of a successful run, as a string
    pub fn stdout_of(dir: &Path, args: &[&str]) -> String {
        let output = refscope()
            .args(args)
            .current_dir(dir)
            .output()
            .expect("Failed to run refscope");
        assert!(
            output.status.success(),
            "refscope {args:?} failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout).expect("stdout is not UTF-8")
    }
}

impl Default for RefscopeCommand {
    fn default() -> Self {
        Self::new()
    }
}
