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

//! Configuration validation

use crate::error::{ConfigError, ConfigResult};
use crate::schema::{BranchConfig, Config, CoreConfig, LoggingConfig};

/// Trait for validating configuration sections
pub trait Validator {
    /// Validate the configuration
    fn validate(&self) -> ConfigResult<()>;
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: [&str; 3] = ["pretty", "compact", "json"];

impl Validator for Config {
    fn validate(&self) -> ConfigResult<()> {
        self.core.validate()?;
        self.logging.validate()?;

        for (name, remote) in &self.remotes {
            validate_component(&format!("remotes.{name}"), name)?;
            if let Some(url) = &remote.url {
                if url.trim().is_empty() {
                    return Err(ConfigError::invalid_value(
                        format!("remotes.{name}.url"),
                        "url must not be blank; omit it instead",
                    ));
                }
            }
        }

        for (branch, upstream) in &self.branches {
            upstream.validate().map_err(|e| match e {
                ConfigError::InvalidValue { reason, .. } => {
                    ConfigError::invalid_value(format!("branches.{branch}"), reason)
                }
                other => other,
            })?;
        }

        Ok(())
    }
}

impl Validator for CoreConfig {
    fn validate(&self) -> ConfigResult<()> {
        if !self.notes_ref.starts_with("refs/") {
            return Err(ConfigError::invalid_value(
                "core.notes_ref",
                format!("must be a full ref name under refs/, got '{}'", self.notes_ref),
            ));
        }

        if !(1..=64).contains(&self.max_symbolic_depth) {
            return Err(ConfigError::invalid_value(
                "core.max_symbolic_depth",
                format!("must be between 1 and 64, got {}", self.max_symbolic_depth),
            ));
        }

        if self.cas_retries > 16 {
            return Err(ConfigError::invalid_value(
                "core.cas_retries",
                format!("must be between 0 and 16, got {}", self.cas_retries),
            ));
        }

        if self.cache_capacity == 0 {
            return Err(ConfigError::invalid_value(
                "core.cache_capacity",
                "must be greater than 0",
            ));
        }

        if self.default_branch.is_empty() {
            return Err(ConfigError::MissingRequired("core.default_branch".to_string()));
        }
        validate_component("core.default_branch", &self.default_branch)?;

        Ok(())
    }
}

impl Validator for LoggingConfig {
    fn validate(&self) -> ConfigResult<()> {
        if !LOG_LEVELS.contains(&self.level.to_lowercase().as_str()) {
            return Err(ConfigError::invalid_value(
                "logging.level",
                format!("must be one of: {}", LOG_LEVELS.join(", ")),
            ));
        }

        if !LOG_FORMATS.contains(&self.format.as_str()) {
            return Err(ConfigError::invalid_value(
                "logging.format",
                format!("must be one of: {}", LOG_FORMATS.join(", ")),
            ));
        }

        Ok(())
    }
}

impl Validator for BranchConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.remote.is_empty() {
            return Err(ConfigError::invalid_value("remote", "must not be empty"));
        }
        if !self.merge.starts_with("refs/heads/") {
            return Err(ConfigError::invalid_value(
                "merge",
                format!("must name a branch under refs/heads/, got '{}'", self.merge),
            ));
        }
        Ok(())
    }
}

/// Names that end up as path components must not escape their namespace
fn validate_component(field: &str, value: &str) -> ConfigResult<()> {
    if value.is_empty()
        || value.starts_with('/')
        || value.ends_with('/')
        || value.split('/').any(|part| part.is_empty() || part == "." || part == "..")
        || value.chars().any(|c| c.is_whitespace() || c.is_control())
    {
        return Err(ConfigError::invalid_value(
            field,
            format!("'{value}' is not a valid name"),
        ));
    }
    Ok(())
}
