// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Evaluation with decision audit.

use std::sync::Arc;

use tracing::warn;
use zopio_auth_runner::{evaluate, EvaluationInput, EvaluationResult};

use crate::pipeline::AuditService;
use crate::record::AuditRecord;

/// Wraps [`evaluate`] so every decision, allowed or denied, produces exactly
/// one [`AuditRecord`]. Audit failures are logged and never change the
/// returned result.
#[derive(Clone)]
pub struct AuditedEvaluator {
	service: Arc<AuditService>,
}

impl AuditedEvaluator {
	pub fn new(service: Arc<AuditService>) -> Self {
		Self { service }
	}

	pub fn service(&self) -> &Arc<AuditService> {
		&self.service
	}

	pub fn into_service(self) -> Arc<AuditService> {
		self.service
	}

	/// Evaluates and queues the record without waiting.
	pub fn evaluate(&self, input: &EvaluationInput<'_>) -> EvaluationResult {
		let result = evaluate(input);
		let record = AuditRecord::from_evaluation(input, &result);
		let audit_id = record.id;
		if !self.service.log(record) {
			warn!(%audit_id, user_id = %input.context.id, "audit record dropped: queue full");
		}
		result
	}

	/// Evaluates and waits until the record is queued, bounded by the
	/// service's write timeout.
	pub async fn evaluate_and_wait(&self, input: &EvaluationInput<'_>) -> EvaluationResult {
		let result = evaluate(input);
		let record = AuditRecord::from_evaluation(input, &result);
		let audit_id = record.id;
		if let Err(e) = self.service.log_blocking(record).await {
			warn!(%audit_id, user_id = %input.context.id, error = %e, "audit record not queued");
		}
		result
	}
}
