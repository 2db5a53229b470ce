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

//! Repository configuration for refscope
//!
//! Configuration is read from `.refscope/config.toml` (YAML and JSON are
//! accepted too when loading an explicit file), then overridden by
//! `REFSCOPE_*` environment variables and validated.
//!
//! # Example
//!
//! ```no_run
//! use refscope_config::Config;
//!
//! let config = Config::load(".refscope")?;
//! println!("notes ref: {}", config.core.notes_ref);
//! for (name, remote) in &config.remotes {
//!     println!("{name}: {:?}", remote.url);
//! }
//! # Ok::<(), refscope_config::ConfigError>(())
//! ```

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigFormat, ConfigLoader, ENV_PREFIX};
pub use schema::*;
pub use validation::Validator;
