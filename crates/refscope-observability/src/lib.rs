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
//! Structured logging for refscope
//!
//! Thin setup layer over `tracing-subscriber`: an [`EnvFilter`] that honours
//! `RUST_LOG` plus one fmt layer in pretty, compact or JSON form. Library
//! crates only emit `tracing` events; the binary calls [`init_tracing`] once.
//!
//! # Example
//!
//! ```no_run
//! use refscope_observability::{init_tracing, LogFormat};
//!
//! init_tracing(LogFormat::Compact, Some("debug"))?;
//! tracing::info!(branch = "main", "resolved");
//! # Ok::<(), refscope_observability::LogError>(())
//! ```
//!
//! [`EnvFilter`]: tracing_subscriber::EnvFilter

pub mod config;
pub mod initialization;

pub use config::{LogConfig, LogError, LogFormat, LogOutput};
pub use initialization::{init_tracing, init_tracing_with_config};

/// Tracing re-exports for convenience
pub use tracing::{debug, error, info, trace, warn, Level};
