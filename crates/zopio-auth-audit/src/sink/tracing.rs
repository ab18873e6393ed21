// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

#![cfg(feature = "sink-tracing")]

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;
use zopio_auth_config::OutcomeFilter;

use crate::error::AuditSinkError;
use crate::record::AuditRecord;
use crate::sink::AuditSink;

/// Emits each record as a `zopio_auth::audit` tracing event.
pub struct TracingAuditSink {
	filter: OutcomeFilter,
}

impl TracingAuditSink {
	pub fn new(filter: OutcomeFilter) -> Self {
		Self { filter }
	}
}

impl Default for TracingAuditSink {
	fn default() -> Self {
		Self::new(OutcomeFilter::All)
	}
}

#[async_trait]
impl AuditSink for TracingAuditSink {
	fn name(&self) -> &str {
		"tracing"
	}

	fn filter(&self) -> &OutcomeFilter {
		&self.filter
	}

	async fn write(&self, record: Arc<AuditRecord>) -> Result<(), AuditSinkError> {
		info!(
			target: "zopio_auth::audit",
			audit_id = %record.id,
			user_id = %record.context.id,
			role = %record.context.role,
			action = %record.action,
			resource = %record.resource,
			field = ?record.field,
			outcome = record.outcome(),
			reason = ?record.reason,
			"access decision"
		);
		Ok(())
	}
}
