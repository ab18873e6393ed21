// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: built-in defaults, a TOML file and environment
//! variables.

use std::path::PathBuf;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::AccessConfigLayer;
use crate::sections::{
	AuditConfigLayer, FileSinkConfigLayer, LoggingConfigLayer, PolicyConfigLayer,
	QueueOverflowPolicy,
};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<AccessConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<AccessConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(AccessConfigLayer::default())
	}
}

/// TOML file configuration source. A missing file yields an empty layer.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new("/etc/zopio/auth.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<AccessConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(AccessConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: AccessConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: ZOPIO_AUTH_<SECTION>_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<AccessConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(AccessConfigLayer {
			audit: Some(load_audit_from_env()?),
			logging: Some(load_logging_from_env()?),
			policy: Some(load_policy_from_env()?),
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_bool(name: &str) -> Option<bool> {
	env_var(name).map(|v| v.eq_ignore_ascii_case("true") || v == "1")
}

fn env_u64(name: &str) -> Result<Option<u64>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid u64 value '{v}'"),
		}),
		None => Ok(None),
	}
}

fn env_usize(name: &str) -> Result<Option<usize>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid usize value '{v}'"),
		}),
		None => Ok(None),
	}
}

fn parse_overflow_policy(name: &str, value: &str) -> Result<QueueOverflowPolicy, ConfigError> {
	match value.to_lowercase().as_str() {
		"block" => Ok(QueueOverflowPolicy::Block),
		"drop_newest" => Ok(QueueOverflowPolicy::DropNewest),
		_ => Err(ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("expected 'block' or 'drop_newest', got '{value}'"),
		}),
	}
}

fn load_audit_from_env() -> Result<AuditConfigLayer, ConfigError> {
	const OVERFLOW_POLICY: &str = "ZOPIO_AUTH_AUDIT_QUEUE_OVERFLOW_POLICY";
	let queue_overflow_policy = env_var(OVERFLOW_POLICY)
		.map(|v| parse_overflow_policy(OVERFLOW_POLICY, &v))
		.transpose()?;

	let file_sinks = env_var("ZOPIO_AUTH_AUDIT_FILE_PATH").map(|path| {
		vec![FileSinkConfigLayer {
			path: Some(path),
			outcomes: None,
		}]
	});

	Ok(AuditConfigLayer {
		enabled: env_bool("ZOPIO_AUTH_AUDIT_ENABLED"),
		queue_capacity: env_usize("ZOPIO_AUTH_AUDIT_QUEUE_CAPACITY")?,
		queue_overflow_policy,
		write_timeout_ms: env_u64("ZOPIO_AUTH_AUDIT_WRITE_TIMEOUT_MS")?,
		tracing_sink: env_bool("ZOPIO_AUTH_AUDIT_TRACING_SINK"),
		file_sinks,
	})
}

fn load_logging_from_env() -> Result<LoggingConfigLayer, ConfigError> {
	Ok(LoggingConfigLayer {
		level: env_var("ZOPIO_AUTH_LOG_LEVEL"),
		json: env_bool("ZOPIO_AUTH_LOG_JSON"),
	})
}

fn load_policy_from_env() -> Result<PolicyConfigLayer, ConfigError> {
	Ok(PolicyConfigLayer {
		roles_file: env_var("ZOPIO_AUTH_ROLES_FILE").map(PathBuf::from),
		strict_placeholders: env_bool("ZOPIO_AUTH_STRICT_PLACEHOLDERS"),
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::sections::OutcomeFilter;
	use std::io::Write;

	#[test]
	fn test_precedence_order() {
		assert!(Precedence::Defaults < Precedence::ConfigFile);
		assert!(Precedence::ConfigFile < Precedence::Environment);
	}

	#[test]
	fn test_missing_toml_file_is_empty_layer() {
		let layer = TomlSource::new("/nonexistent/zopio/auth.toml").load().unwrap();
		assert_eq!(layer, AccessConfigLayer::default());
	}

	#[test]
	fn test_toml_source_parses_sections() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		write!(
			file,
			r#"
[audit]
queue_capacity = 128
queue_overflow_policy = "block"

[[audit.file_sinks]]
path = "/tmp/decisions.jsonl"
outcomes = "denied"

[logging]
json = true

[policy]
roles_file = "/etc/zopio/roles.toml"
strict_placeholders = true
"#
		)
		.unwrap();

		let layer = TomlSource::new(file.path()).load().unwrap();
		let audit = layer.audit.unwrap();
		assert_eq!(audit.queue_capacity, Some(128));
		assert_eq!(audit.queue_overflow_policy, Some(QueueOverflowPolicy::Block));
		let sinks = audit.file_sinks.unwrap();
		assert_eq!(sinks[0].outcomes, Some(OutcomeFilter::Denied));
		assert_eq!(layer.logging.unwrap().json, Some(true));
		assert_eq!(layer.policy.unwrap().strict_placeholders, Some(true));
	}

	#[test]
	fn test_invalid_toml_reports_path() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		write!(file, "[audit]\nqueue_capacity = \"lots\"\n").unwrap();
		let err = TomlSource::new(file.path()).load().unwrap_err();
		assert!(matches!(err, ConfigError::TomlParse { .. }));
	}

	#[test]
	fn test_overflow_policy_names() {
		let parse = |v| parse_overflow_policy("POLICY", v);
		assert_eq!(parse("block").unwrap(), QueueOverflowPolicy::Block);
		assert_eq!(parse("Drop_Newest").unwrap(), QueueOverflowPolicy::DropNewest);

		let err = parse("blokc").unwrap_err();
		assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "POLICY"));
	}

	// The only test in this crate that touches process environment.
	#[test]
	fn test_env_source_reads_zopio_auth_variables() {
		std::env::set_var("ZOPIO_AUTH_AUDIT_QUEUE_CAPACITY", "42");
		std::env::set_var("ZOPIO_AUTH_AUDIT_QUEUE_OVERFLOW_POLICY", "BLOCK");
		std::env::set_var("ZOPIO_AUTH_AUDIT_FILE_PATH", "/tmp/audit.jsonl");
		std::env::set_var("ZOPIO_AUTH_STRICT_PLACEHOLDERS", "1");

		let layer = EnvSource.load().unwrap();

		std::env::remove_var("ZOPIO_AUTH_AUDIT_QUEUE_CAPACITY");
		std::env::remove_var("ZOPIO_AUTH_AUDIT_QUEUE_OVERFLOW_POLICY");
		std::env::remove_var("ZOPIO_AUTH_AUDIT_FILE_PATH");
		std::env::remove_var("ZOPIO_AUTH_STRICT_PLACEHOLDERS");

		let audit = layer.audit.unwrap();
		assert_eq!(audit.queue_capacity, Some(42));
		assert_eq!(audit.queue_overflow_policy, Some(QueueOverflowPolicy::Block));
		assert_eq!(
			audit.file_sinks.unwrap()[0].path.as_deref(),
			Some("/tmp/audit.jsonl")
		);
		assert_eq!(layer.policy.unwrap().strict_placeholders, Some(true));
	}
}
