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

//! Loading configuration files from disk in every supported format

use refscope_config::{Config, ConfigError, ConfigLoader};
use std::fs;
use tempfile::TempDir;

#[test]
fn loads_repository_config_toml() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("config.toml"),
        r#"
[core]
notes_ref = "refs/notes/review"

[remotes.origin]
url = "https://example.com/project.git"

[remotes."team/upstream"]
"#,
    )
    .unwrap();

    let config = ConfigLoader::new()
        .load_file(dir.path().join("config.toml"))
        .unwrap();
    assert_eq!(config.core.notes_ref, "refs/notes/review");
    assert_eq!(config.remote_url("origin"), Some("https://example.com/project.git"));
    assert!(config.remotes.contains_key("team/upstream"));
    assert_eq!(config.remote_url("team/upstream"), None);
}

#[test]
fn loads_yaml_and_json_files() {
    let dir = TempDir::new().unwrap();
    let yaml = dir.path().join("refscope.yml");
    let json = dir.path().join("refscope.json");
    fs::write(&yaml, "core:\n  cas_retries: 2\n").unwrap();
    fs::write(&json, r#"{"core": {"cas_retries": 4}}"#).unwrap();

    let loader = ConfigLoader::new();
    assert_eq!(loader.load_file(&yaml).unwrap().core.cas_retries, 2);
    assert_eq!(loader.load_file(&json).unwrap().core.cas_retries, 4);
}

#[test]
fn rejects_malformed_toml() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[core\nnotes_ref = ").unwrap();

    let err = ConfigLoader::new().load_file(&path).unwrap_err();
    assert!(matches!(err, ConfigError::TomlParseError(_)));
}

#[test]
fn save_then_load_roundtrips_remotes() {
    let dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.set_remote("origin", Some("https://example.com/a.git".to_string()));
    config.set_remote("bare", None);
    config.set_branch_upstream("main", "origin", "refs/heads/main");
    config.save(dir.path()).unwrap();

    let loaded = ConfigLoader::new()
        .load_file(dir.path().join("config.toml"))
        .unwrap();
    assert_eq!(loaded.remotes, config.remotes);
    assert_eq!(loaded.branch_upstream("main"), Some(("origin", "refs/heads/main")));
}
