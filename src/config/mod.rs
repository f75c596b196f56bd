// ABOUTME: Configuration module grouping environment-based runtime settings
// ABOUTME: Re-exports the ServerConfig used to bootstrap the engine
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 RepForge Contributors

/// Environment-based configuration management
pub mod environment;

pub use environment::{Environment, LogLevel, ServerConfig};
