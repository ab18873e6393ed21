// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Inputs and outputs of a single access check.

use std::fmt;

use serde::{Serialize, Serializer};
use zopio_auth_rbac::{Action, EvaluationOptions, Record, Rule, UserContext};

/// Everything one call to [`crate::evaluate`] reads. Borrowed, so building an
/// input never copies the rule set.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationInput<'a> {
	pub rules: &'a [Rule],
	pub context: &'a UserContext,
	pub action: Action,
	pub resource: &'a str,
	pub record: Option<&'a Record>,
	pub field: Option<&'a str>,
	pub options: EvaluationOptions,
}

impl<'a> EvaluationInput<'a> {
	pub fn new(
		rules: &'a [Rule],
		context: &'a UserContext,
		action: Action,
		resource: &'a str,
	) -> Self {
		Self {
			rules,
			context,
			action,
			resource,
			record: None,
			field: None,
			options: EvaluationOptions::default(),
		}
	}

	/// Builder: check against a concrete record.
	pub fn with_record(mut self, record: &'a Record) -> Self {
		self.record = Some(record);
		self
	}

	/// Builder: check access to one field.
	pub fn with_field(mut self, field: &'a str) -> Self {
		self.field = Some(field);
		self
	}

	pub fn with_options(mut self, options: EvaluationOptions) -> Self {
		self.options = options;
		self
	}
}

/// Why a check was denied.
///
/// The rendered strings are stable and returned to callers verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
	NoMatchingRule,
	FieldDenied(String),
}

impl fmt::Display for DenyReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			DenyReason::NoMatchingRule => f.write_str("No matching rule found"),
			DenyReason::FieldDenied(field) => write!(f, "No access to field '{field}'"),
		}
	}
}

impl Serialize for DenyReason {
	fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.collect_str(self)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluationResult {
	pub can: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub reason: Option<DenyReason>,
}

impl EvaluationResult {
	pub fn allowed() -> Self {
		Self {
			can: true,
			reason: None,
		}
	}

	pub fn denied(reason: DenyReason) -> Self {
		Self {
			can: false,
			reason: Some(reason),
		}
	}
}
