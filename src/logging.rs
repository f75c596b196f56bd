// ABOUTME: Logging configuration and structured logging setup for observability
// ABOUTME: Configures log levels and output formats on top of tracing-subscriber
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 RepForge Contributors

//! Structured logging configuration built on `tracing`

use anyhow::Result;
use std::env;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::environment::Environment;

/// Output format for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Machine-readable JSON, one object per line
    Json,
    /// Single-line human-readable output
    Compact,
}

impl LogFormat {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Compact,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `repforge=debug,sqlx=warn`
    pub filter: String,
    /// Output format
    pub format: LogFormat,
}

impl LoggingConfig {
    /// Build a logging configuration from the environment.
    ///
    /// Production environments default to JSON output; everything else to
    /// compact human-readable lines. `LOG_FORMAT` overrides the default.
    #[must_use]
    pub fn from_env(environment: &Environment) -> Self {
        let default_format = if environment.is_production() {
            LogFormat::Json
        } else {
            LogFormat::Compact
        };
        let format = env::var("LOG_FORMAT")
            .map_or(default_format, |v| LogFormat::from_str_or_default(&v));

        Self {
            filter: crate::constants::env_config::log_level(),
            format,
        }
    }
}

/// Initialize the global tracing subscriber.
///
/// Call once at process startup; a second call returns an error from the
/// underlying registry.
///
/// # Errors
///
/// Returns an error if the filter directive cannot be parsed or a global
/// subscriber is already installed
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_new(&config.filter)?;

    match config.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_current_span(false))
                .try_init()?;
        }
        LogFormat::Compact => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().compact())
                .try_init()?;
        }
    }

    info!(format = ?config.format, filter = %config.filter, "logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parsing() {
        assert_eq!(LogFormat::from_str_or_default("json"), LogFormat::Json);
        assert_eq!(LogFormat::from_str_or_default("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::from_str_or_default("other"), LogFormat::Compact);
    }

    #[test]
    fn test_config_carries_filter() {
        let config = LoggingConfig {
            filter: "repforge=debug".into(),
            format: LogFormat::Compact,
        };
        assert_eq!(config.filter, "repforge=debug");
    }
}
