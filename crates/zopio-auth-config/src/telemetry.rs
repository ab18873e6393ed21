// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Global tracing subscriber setup.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::ConfigError;
use crate::sections::LoggingConfig;

/// Parses the configured level as an `EnvFilter` directive.
pub fn level_filter(config: &LoggingConfig) -> Result<EnvFilter, ConfigError> {
	EnvFilter::try_new(&config.level).map_err(|e| ConfigError::InvalidValue {
		key: "logging.level".to_string(),
		message: e.to_string(),
	})
}

/// Installs the global subscriber. `RUST_LOG` takes precedence over the
/// configured level. Fails if a subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), ConfigError> {
	let filter = match EnvFilter::try_from_default_env() {
		Ok(filter) => filter,
		Err(_) => level_filter(config)?,
	};

	let registry = tracing_subscriber::registry().with(filter);
	let result = if config.json {
		registry.with(fmt::layer().json()).try_init()
	} else {
		registry.with(fmt::layer()).try_init()
	};

	result.map_err(|e| ConfigError::Tracing(e.to_string()))
}
