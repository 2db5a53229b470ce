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

//! Configuration loading
//!
//! Files are parsed by extension (TOML, YAML or JSON). Environment
//! variables with the `REFSCOPE_` prefix override file values:
//!
//! | variable | field |
//! |---|---|
//! | `REFSCOPE_NOTES_REF` | `core.notes_ref` |
//! | `REFSCOPE_MAX_SYMBOLIC_DEPTH` | `core.max_symbolic_depth` |
//! | `REFSCOPE_CAS_RETRIES` | `core.cas_retries` |
//! | `REFSCOPE_CACHE_CAPACITY` | `core.cache_capacity` |
//! | `REFSCOPE_DEFAULT_BRANCH` | `core.default_branch` |
//! | `REFSCOPE_LOG_LEVEL` | `logging.level` |
//! | `REFSCOPE_LOG_FORMAT` | `logging.format` |

use crate::error::{ConfigError, ConfigResult};
use crate::schema::{Config, CONFIG_FILE_NAME};
use crate::validation::Validator;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// Prefix of all environment overrides
pub const ENV_PREFIX: &str = "REFSCOPE_";

/// Configuration format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
    Json,
}

impl ConfigFormat {
    /// Detect format from file extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(ConfigFormat::Toml),
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            Some("json") => Ok(ConfigFormat::Json),
            Some(ext) => Err(ConfigError::UnsupportedFormat(ext.to_string())),
            None => Err(ConfigError::InvalidPath(path.to_path_buf())),
        }
    }

    /// Get format name as string
    pub fn name(&self) -> &'static str {
        match self {
            ConfigFormat::Toml => "TOML",
            ConfigFormat::Yaml => "YAML",
            ConfigFormat::Json => "JSON",
        }
    }
}

/// Configuration loader
pub struct ConfigLoader {
    validate: bool,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        ConfigLoader { validate: true }
    }

    /// Create a loader without validation
    pub fn without_validation() -> Self {
        ConfigLoader { validate: false }
    }

    /// Load configuration from a file
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<Config> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading configuration");

        let format = ConfigFormat::from_path(path)?;
        let content = fs::read_to_string(path)?;

        info!(format = format.name(), path = %path.display(), "Loaded configuration file");

        self.load_from_string(&content, format)
    }

    /// Load configuration from a string
    pub fn load_from_string(&self, content: &str, format: ConfigFormat) -> ConfigResult<Config> {
        let config: Config = match format {
            ConfigFormat::Toml => toml::from_str(content)?,
            ConfigFormat::Yaml => serde_yaml::from_str(content)?,
            ConfigFormat::Json => serde_json::from_str(content)?,
        };

        if self.validate {
            config.validate()?;
            debug!("Configuration validated successfully");
        }

        Ok(config)
    }

    /// Load a file, falling back to defaults when it doesn't exist, then
    /// apply environment overrides
    pub fn load_with_overrides<P: AsRef<Path>>(&self, path: P) -> ConfigResult<Config> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            self.load_file(path)?
        } else {
            debug!(path = %path.display(), "No configuration file, using defaults");
            Config::default()
        };

        self.apply_env_overrides(&mut config)?;
        Ok(config)
    }

    /// Load `config.toml` from a repository directory
    pub fn load_repository<P: AsRef<Path>>(&self, repo_dir: P) -> ConfigResult<Config> {
        self.load_with_overrides(repo_dir.as_ref().join(CONFIG_FILE_NAME))
    }

    /// Apply `REFSCOPE_*` overrides from the process environment
    pub fn apply_env_overrides(&self, config: &mut Config) -> ConfigResult<()> {
        self.apply_overrides_from(config, |key| std::env::var(key).ok())
    }

    /// Apply overrides read through `lookup`, keyed by full variable name
    pub fn apply_overrides_from<F>(&self, config: &mut Config, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(value) = var("NOTES_REF") {
            config.core.notes_ref = value;
        }
        if let Some(value) = var("MAX_SYMBOLIC_DEPTH") {
            config.core.max_symbolic_depth = parse_number("MAX_SYMBOLIC_DEPTH", &value)?;
        }
        if let Some(value) = var("CAS_RETRIES") {
            config.core.cas_retries = parse_number("CAS_RETRIES", &value)?;
        }
        if let Some(value) = var("CACHE_CAPACITY") {
            config.core.cache_capacity = parse_number("CACHE_CAPACITY", &value)?;
        }
        if let Some(value) = var("DEFAULT_BRANCH") {
            config.core.default_branch = value;
        }
        if let Some(value) = var("LOG_LEVEL") {
            config.logging.level = value;
        }
        if let Some(value) = var("LOG_FORMAT") {
            config.logging.format = value;
        }

        if self.validate {
            config.validate()?;
        }
        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_number<T: FromStr>(name: &str, value: &str) -> ConfigResult<T> {
    value.trim().parse().map_err(|_| {
        ConfigError::env_var_parsing_error(
            format!("{ENV_PREFIX}{name}"),
            value,
            "expected a non-negative integer",
        )
    })
}
