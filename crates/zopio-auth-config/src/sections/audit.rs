// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Decision audit configuration section.

use serde::{Deserialize, Serialize};

const DEFAULT_QUEUE_CAPACITY: usize = 10000;
const DEFAULT_WRITE_TIMEOUT_MS: u64 = 500;

fn default_queue_capacity() -> usize {
	DEFAULT_QUEUE_CAPACITY
}

fn default_write_timeout_ms() -> u64 {
	DEFAULT_WRITE_TIMEOUT_MS
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QueueOverflowPolicy {
	#[default]
	DropNewest,
	Block,
}

/// Which decisions a sink receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeFilter {
	#[default]
	All,
	Allowed,
	Denied,
}

impl OutcomeFilter {
	pub fn accepts(&self, can: bool) -> bool {
		match self {
			OutcomeFilter::All => true,
			OutcomeFilter::Allowed => can,
			OutcomeFilter::Denied => !can,
		}
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AuditConfigLayer {
	pub enabled: Option<bool>,
	pub queue_capacity: Option<usize>,
	pub queue_overflow_policy: Option<QueueOverflowPolicy>,
	pub write_timeout_ms: Option<u64>,
	pub tracing_sink: Option<bool>,
	pub file_sinks: Option<Vec<FileSinkConfigLayer>>,
}

impl AuditConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.enabled.is_some() {
			self.enabled = other.enabled;
		}
		if other.queue_capacity.is_some() {
			self.queue_capacity = other.queue_capacity;
		}
		if other.queue_overflow_policy.is_some() {
			self.queue_overflow_policy = other.queue_overflow_policy;
		}
		if other.write_timeout_ms.is_some() {
			self.write_timeout_ms = other.write_timeout_ms;
		}
		if other.tracing_sink.is_some() {
			self.tracing_sink = other.tracing_sink;
		}
		if other.file_sinks.is_some() {
			self.file_sinks = other.file_sinks;
		}
	}

	pub fn finalize(self) -> AuditConfig {
		let file_sinks = self
			.file_sinks
			.map(|sinks| sinks.into_iter().filter_map(|s| s.finalize()).collect())
			.unwrap_or_default();

		AuditConfig {
			enabled: self.enabled.unwrap_or(true),
			queue_capacity: self.queue_capacity.unwrap_or_else(default_queue_capacity),
			queue_overflow_policy: self.queue_overflow_policy.unwrap_or_default(),
			write_timeout_ms: self
				.write_timeout_ms
				.unwrap_or_else(default_write_timeout_ms),
			tracing_sink: self.tracing_sink.unwrap_or(true),
			file_sinks,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditConfig {
	pub enabled: bool,
	pub queue_capacity: usize,
	pub queue_overflow_policy: QueueOverflowPolicy,
	/// Upper bound on a single sink write, and on enqueueing in `block` mode.
	pub write_timeout_ms: u64,
	/// Emit every decision as a tracing event.
	pub tracing_sink: bool,
	pub file_sinks: Vec<FileSinkConfig>,
}

impl Default for AuditConfig {
	fn default() -> Self {
		AuditConfigLayer::default().finalize()
	}
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FileSinkConfigLayer {
	pub path: Option<String>,
	pub outcomes: Option<OutcomeFilter>,
}

impl FileSinkConfigLayer {
	pub fn finalize(self) -> Option<FileSinkConfig> {
		let path = self.path?;

		Some(FileSinkConfig {
			path,
			outcomes: self.outcomes.unwrap_or_default(),
		})
	}
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileSinkConfig {
	/// Output path; `%Y`, `%m` and `%d` expand to the current UTC date.
	pub path: String,
	pub outcomes: OutcomeFilter,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_values() {
		let config = AuditConfig::default();
		assert!(config.enabled);
		assert_eq!(config.queue_capacity, 10000);
		assert_eq!(
			config.queue_overflow_policy,
			QueueOverflowPolicy::DropNewest
		);
		assert_eq!(config.write_timeout_ms, 500);
		assert!(config.tracing_sink);
		assert!(config.file_sinks.is_empty());
	}

	#[test]
	fn test_layer_finalize_with_values() {
		let layer = AuditConfigLayer {
			enabled: Some(false),
			queue_capacity: Some(64),
			queue_overflow_policy: Some(QueueOverflowPolicy::Block),
			write_timeout_ms: Some(50),
			tracing_sink: Some(false),
			file_sinks: Some(vec![FileSinkConfigLayer {
				path: Some("/var/log/zopio/decisions-%Y%m%d.jsonl".to_string()),
				outcomes: Some(OutcomeFilter::Denied),
			}]),
		};
		let config = layer.finalize();
		assert!(!config.enabled);
		assert_eq!(config.queue_capacity, 64);
		assert_eq!(config.queue_overflow_policy, QueueOverflowPolicy::Block);
		assert_eq!(config.write_timeout_ms, 50);
		assert!(!config.tracing_sink);
		assert_eq!(config.file_sinks.len(), 1);
		assert_eq!(config.file_sinks[0].outcomes, OutcomeFilter::Denied);
	}

	#[test]
	fn test_file_sink_without_path_is_dropped() {
		let layer = AuditConfigLayer {
			file_sinks: Some(vec![FileSinkConfigLayer {
				path: None,
				outcomes: Some(OutcomeFilter::Allowed),
			}]),
			..Default::default()
		};
		assert!(layer.finalize().file_sinks.is_empty());
	}

	#[test]
	fn test_merge_overwrites() {
		let mut base = AuditConfigLayer {
			enabled: Some(true),
			queue_capacity: Some(100),
			..Default::default()
		};
		base.merge(AuditConfigLayer {
			enabled: Some(false),
			write_timeout_ms: Some(20),
			..Default::default()
		});
		assert_eq!(base.enabled, Some(false));
		assert_eq!(base.queue_capacity, Some(100));
		assert_eq!(base.write_timeout_ms, Some(20));
	}

	#[test]
	fn test_outcome_filter() {
		assert!(OutcomeFilter::All.accepts(true));
		assert!(OutcomeFilter::All.accepts(false));
		assert!(OutcomeFilter::Allowed.accepts(true));
		assert!(!OutcomeFilter::Allowed.accepts(false));
		assert!(OutcomeFilter::Denied.accepts(false));
		assert!(!OutcomeFilter::Denied.accepts(true));
	}
}
