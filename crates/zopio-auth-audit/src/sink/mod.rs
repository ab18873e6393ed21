// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Audit sink trait and built-in sinks.

pub mod file;
pub mod memory;
pub mod tracing;

use std::sync::Arc;

use async_trait::async_trait;
use zopio_auth_config::{AuditConfig, OutcomeFilter};

pub use crate::error::AuditSinkError;
use crate::error::AuditResult;
use crate::record::AuditRecord;

/// Destination for audit records.
///
/// Writes run on the audit service's background task, never on the caller of
/// an access check. A failing or slow sink is logged and skipped.
#[async_trait]
pub trait AuditSink: Send + Sync {
	fn name(&self) -> &str;

	fn filter(&self) -> &OutcomeFilter;

	async fn write(&self, record: Arc<AuditRecord>) -> Result<(), AuditSinkError>;
}

/// Builds the sinks enabled in `config`.
pub fn sinks_from_config(config: &AuditConfig) -> AuditResult<Vec<Arc<dyn AuditSink>>> {
	let mut sinks: Vec<Arc<dyn AuditSink>> = Vec::new();

	#[cfg(feature = "sink-tracing")]
	if config.tracing_sink {
		sinks.push(Arc::new(self::tracing::TracingAuditSink::new(OutcomeFilter::All)));
	}

	#[cfg(feature = "sink-file")]
	for file_config in &config.file_sinks {
		sinks.push(Arc::new(self::file::FileAuditSink::create(file_config.clone())?));
	}

	Ok(sinks)
}
