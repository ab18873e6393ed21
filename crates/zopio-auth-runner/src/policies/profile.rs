// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Self-service profile access.

use serde_json::json;
use zopio_auth_rbac::{Action, Expression, FieldAccess, Rule};

pub const PROFILE: &str = "Profile";

/// Fields no profile rule exposes, even to the profile's owner.
pub const SENSITIVE_FIELDS: &[&str] = &["ssn", "taxId"];

pub fn rules() -> Vec<Rule> {
	[Action::Read, Action::Update]
		.into_iter()
		.map(|action| {
			SENSITIVE_FIELDS.iter().fold(
				Rule::can(action, PROFILE)
					.with_expression(Expression::record(json!({ "userId": "${user.id}" }))),
				|rule, field| rule.with_field_permission(*field, FieldAccess::None),
			)
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::engine::evaluate;
	use crate::types::{DenyReason, EvaluationInput};
	use serde_json::Value;
	use zopio_auth_rbac::{Record, UserContext};

	fn record(value: Value) -> Record {
		value.as_object().cloned().unwrap()
	}

	#[test]
	fn owner_reads_profile_but_not_sensitive_fields() {
		let rules = rules();
		let ctx = UserContext::new("42", "user");
		let own = record(json!({"userId": "42"}));
		let input = EvaluationInput::new(&rules, &ctx, Action::Read, PROFILE).with_record(&own);

		assert!(evaluate(&input).can);
		assert!(evaluate(&input.with_field("displayName")).can);
		for field in SENSITIVE_FIELDS {
			assert_eq!(
				evaluate(&input.with_field(field)).reason,
				Some(DenyReason::FieldDenied(field.to_string()))
			);
		}
	}

	#[test]
	fn other_profiles_are_not_matched() {
		let rules = rules();
		let ctx = UserContext::new("42", "user");
		let other = record(json!({"userId": "99"}));
		let result = evaluate(
			&EvaluationInput::new(&rules, &ctx, Action::Update, PROFILE).with_record(&other),
		);
		assert_eq!(result.reason, Some(DenyReason::NoMatchingRule));
	}
}
