// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for zopio access control.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - Consistent environment variable naming (`ZOPIO_AUTH_*`)
//! - Tracing subscriber setup driven by the `logging` section
//!
//! # Usage
//!
//! ```ignore
//! use zopio_auth_config::{init_tracing, load_config};
//!
//! let config = load_config()?;
//! init_tracing(&config.logging)?;
//! ```

pub mod error;
pub mod layer;
pub mod sections;
pub mod sources;
pub mod telemetry;

pub use error::ConfigError;
pub use layer::AccessConfigLayer;
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};
pub use telemetry::init_tracing;

use tracing::{debug, info};

/// Fully resolved configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccessConfig {
	pub audit: AuditConfig,
	pub logging: LoggingConfig,
	pub policy: PolicyConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`ZOPIO_AUTH_*`)
/// 2. Config file (`/etc/zopio/auth.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<AccessConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource),
	])
}

/// Load configuration from environment only (for testing or simple deployments).
pub fn load_config_from_env() -> Result<AccessConfig, ConfigError> {
	let mut merged = AccessConfigLayer::default();
	merged.merge(EnvSource.load()?);
	finalize(merged)
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<AccessConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource),
	])
}

/// Merge `sources` in precedence order and finalize.
pub fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<AccessConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = AccessConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
fn finalize(layer: AccessConfigLayer) -> Result<AccessConfig, ConfigError> {
	let audit = layer.audit.unwrap_or_default().finalize();
	let logging = layer.logging.unwrap_or_default().finalize();
	let policy = layer.policy.unwrap_or_default().finalize();

	let config = AccessConfig {
		audit,
		logging,
		policy,
	};
	validate_config(&config)?;

	info!(
		audit_enabled = config.audit.enabled,
		audit_file_sinks = config.audit.file_sinks.len(),
		log_level = %config.logging.level,
		roles_file = ?config.policy.roles_file,
		strict_placeholders = config.policy.strict_placeholders,
		"access control configuration loaded"
	);

	Ok(config)
}

/// Validate cross-field configuration rules.
fn validate_config(config: &AccessConfig) -> Result<(), ConfigError> {
	if config.audit.queue_capacity == 0 {
		return Err(ConfigError::Validation(
			"audit.queue_capacity must be greater than zero".to_string(),
		));
	}
	if config.audit.write_timeout_ms == 0 {
		return Err(ConfigError::Validation(
			"audit.write_timeout_ms must be greater than zero".to_string(),
		));
	}
	telemetry::level_filter(&config.logging)?;
	Ok(())
}
