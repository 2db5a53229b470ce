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
//! References, branches, tags, HEAD and remotes

use predicates::prelude::*;
use refscope_core::{ObjectKind, RefTarget, Signature, Tag};
use refscope_test_utils::{refscope, RefscopeCommand, TestRepo};

fn stdout(repo: &TestRepo, args: &[&str]) -> String {
    RefscopeCommand::stdout_of(repo.path(), args)
}

#[test]
fn test_refs_lists_direct_and_symbolic() {
    let repo = TestRepo::initialized();
    let c1 = repo.commit("first");
    repo.branch("topic", c1);
    repo.set_ref(
        "refs/remotes/origin/HEAD",
        RefTarget::Symbolic("refs/heads/topic".to_string()),
    );

    let out = stdout(&repo, &["refs"]);
    assert!(out.contains(&format!("{c1} refs/heads/main")));
    assert!(out.contains(&format!("{c1} refs/heads/topic")));
    assert!(out.contains("refs/remotes/origin/HEAD -> refs/heads/topic"));

    let heads = stdout(&repo, &["refs", "refs/heads/"]);
    assert_eq!(heads.lines().count(), 2);
}

#[test]
fn test_resolve_short_and_relative_names() {
    let repo = TestRepo::initialized();
    let c1 = repo.commit("first");
    let c2 = repo.commit("second");
    let c3 = repo.commit("third");

    assert_eq!(stdout(&repo, &["resolve", "main"]).trim(), c3.to_string());
    assert_eq!(stdout(&repo, &["resolve", "HEAD~1"]).trim(), c2.to_string());
    assert_eq!(stdout(&repo, &["resolve", "main^^"]).trim(), c1.to_string());
    assert_eq!(stdout(&repo, &["resolve", &c2.to_string()]).trim(), c2.to_string());
    assert_eq!(
        stdout(&repo, &["resolve", "--full-name", "main"]).trim(),
        "refs/heads/main"
    );
}

#[test]
fn test_resolve_unknown_fails() {
    let repo = TestRepo::with_initial_commit();

    refscope()
        .args(["resolve", "nope"])
        .current_dir(repo.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope"));

    refscope()
        .args(["resolve", "HEAD~5"])
        .current_dir(repo.path())
        .assert()
        .failure();

    refscope()
        .args(["resolve", "HEAD~é"])
        .current_dir(repo.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error:").and(predicate::str::contains("panicked").not()));
}

#[test]
fn test_head_states() {
    let repo = TestRepo::initialized();
    assert_eq!(stdout(&repo, &["head"]).trim(), "unborn refs/heads/main");

    let c1 = repo.commit("first");
    assert_eq!(stdout(&repo, &["head"]).trim(), format!("main {c1}"));

    repo.set_ref("HEAD", RefTarget::Direct(c1));
    assert_eq!(stdout(&repo, &["head"]).trim(), format!("detached {c1}"));
}

#[test]
fn test_branches_mark_head_and_show_remotes() {
    let repo = TestRepo::initialized();
    repo.write_config(
        r#"
[remotes.origin]
url = "https://example.com/project.git"

[remotes.mirror]
"#,
    );
    let c1 = repo.commit("first");
    repo.branch("topic", c1);
    repo.set_ref("refs/remotes/origin/main", RefTarget::Direct(c1));
    repo.set_ref("refs/remotes/mirror/main", RefTarget::Direct(c1));

    let out = stdout(&repo, &["branches"]);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("* main"));
    assert!(lines[1].starts_with("  topic"));
    assert!(out.contains("https://example.com/project.git"));
    assert!(out.contains("mirror/main"));
    assert!(out.contains("(unconfigured)"));

    let local = stdout(&repo, &["branches", "--local"]);
    assert_eq!(local.lines().count(), 2);

    let remote = stdout(&repo, &["branches", "--remote"]);
    assert_eq!(remote.lines().count(), 2);
    assert!(remote.lines().all(|l| l.contains('/')));
}

#[test]
fn test_branches_local_and_remote_conflict() {
    let repo = TestRepo::initialized();

    refscope()
        .args(["branches", "--local", "--remote"])
        .current_dir(repo.path())
        .assert()
        .failure();
}

#[test]
fn test_branches_track_shows_ahead_behind() {
    let repo = TestRepo::initialized();
    repo.write_config(
        r#"
[remotes.origin]
url = "https://example.com/project.git"

[branches.main]
remote = "origin"
merge = "refs/heads/main"
"#,
    );
    let base = repo.commit("base");

    // origin/main gets two commits of its own
    repo.set_ref("HEAD", RefTarget::Symbolic("refs/remotes/origin/main".to_string()));
    repo.set_ref("refs/remotes/origin/main", RefTarget::Direct(base));
    repo.commit("upstream one");
    repo.commit("upstream two");

    // main gets one
    repo.set_ref("HEAD", RefTarget::Symbolic("refs/heads/main".to_string()));
    let local = repo.commit("local one");

    let out = stdout(&repo, &["branches", "--local", "--track"]);
    assert!(out.contains(&local.short()));
    assert!(out.contains("[origin/main: ahead 1, behind 2]"), "{out}");
}

#[test]
fn test_tags_lightweight_and_annotated() {
    let repo = TestRepo::initialized();
    let c1 = repo.commit("first");
    repo.set_ref("refs/tags/v0.1", RefTarget::Direct(c1));

    let opened = repo.open();
    let tagger = Signature::now("Release Bot", "bot@example.com");
    let tag = Tag::new("v1.0", c1, ObjectKind::Commit, tagger, "First release\n\nnotes")
        .write(&**opened.objects())
        .unwrap();
    repo.set_ref("refs/tags/v1.0", RefTarget::Direct(tag));

    let out = stdout(&repo, &["tags"]);
    assert_eq!(out, "v0.1\nv1.0\n");

    let long = stdout(&repo, &["tags", "--long"]);
    assert!(long.contains("lightweight"));
    assert!(long.contains("annotated First release"));
    assert!(long.lines().all(|l| l.contains(&c1.short())));

    // an annotated tag resolves to its commit
    assert_eq!(stdout(&repo, &["resolve", "v1.0"]).trim(), c1.to_string());
}

#[test]
fn test_remotes_add_list_remove() {
    let repo = TestRepo::initialized();

    RefscopeCommand::new()
        .in_dir(repo.path())
        .args(&["remotes", "add", "origin", "https://example.com/a.git"])
        .run_success()
        .stdout(predicate::str::contains("Added remote 'origin'"));
    RefscopeCommand::new()
        .in_dir(repo.path())
        .args(&["-q", "remotes", "add", "backup"])
        .run_success();

    let out = stdout(&repo, &["remotes"]);
    assert_eq!(out, "backup\t(unconfigured)\norigin\thttps://example.com/a.git\n");

    RefscopeCommand::new()
        .in_dir(repo.path())
        .args(&["remotes", "add", "origin"])
        .run_failure()
        .stderr(predicate::str::contains("already exists"));

    RefscopeCommand::new()
        .in_dir(repo.path())
        .args(&["-q", "remotes", "set-url", "backup", "file:///srv/backup"])
        .run_success();
    RefscopeCommand::new()
        .in_dir(repo.path())
        .args(&["-q", "remotes", "remove", "origin"])
        .run_success();

    assert_eq!(stdout(&repo, &["remotes"]), "backup\tfile:///srv/backup\n");

    RefscopeCommand::new()
        .in_dir(repo.path())
        .args(&["remotes", "rm", "origin"])
        .run_failure();
}
