// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The audit record emitted for every access decision.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zopio_auth_rbac::{Action, Record, UserContext};
use zopio_auth_runner::{EvaluationInput, EvaluationResult};

/// One access decision: what was asked, by whom, and the answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
	pub id: Uuid,
	pub timestamp: DateTime<Utc>,
	pub resource: String,
	pub action: Action,
	pub context: UserContext,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub record: Option<Record>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub field: Option<String>,
	pub can: bool,
	/// Rendered deny reason, e.g. `No matching rule found`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub reason: Option<String>,
}

impl AuditRecord {
	pub fn from_evaluation(input: &EvaluationInput<'_>, result: &EvaluationResult) -> Self {
		Self {
			id: Uuid::new_v4(),
			timestamp: Utc::now(),
			resource: input.resource.to_string(),
			action: input.action,
			context: input.context.clone(),
			record: input.record.cloned(),
			field: input.field.map(str::to_string),
			can: result.can,
			reason: result.reason.as_ref().map(ToString::to_string),
		}
	}

	pub fn outcome(&self) -> &'static str {
		if self.can {
			"allowed"
		} else {
			"denied"
		}
	}
}
