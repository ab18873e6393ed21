// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! First-match access evaluation.
//!
//! [`evaluate`] scans rules in order and the first rule that matches decides:
//!
//! 1. **Key**: `resource` and `action` must be exactly equal. No wildcards.
//! 2. **Inversion**: inverted rules are skipped. A raw `cannot` neither grants
//!    nor denies; revocation only has meaning on the ability path.
//! 3. **Condition**: predicate or expression must hold. Rules without one
//!    match unconditionally.
//! 4. **Field**: an explicit `none` for the requested field denies
//!    immediately, without looking at later rules.
//!
//! Ordering is the only precedence mechanism, which is why the combined rule
//! set places RBAC rules before ABAC rules.

use tracing::{debug, instrument};
use zopio_auth_rbac::{Condition, Rule};

use crate::types::{DenyReason, EvaluationInput, EvaluationResult};

#[instrument(
	level = "debug",
	skip(input),
	fields(
		user_id = %input.context.id,
		action = %input.action,
		resource = %input.resource,
		field = ?input.field,
	)
)]
pub fn evaluate(input: &EvaluationInput<'_>) -> EvaluationResult {
	for (index, rule) in input.rules.iter().enumerate() {
		if rule.inverted || !rule.matches_key(input.action, input.resource) {
			continue;
		}
		if !condition_holds(rule, input) {
			continue;
		}

		if let Some(field) = input.field {
			if rule.denies_field(field) {
				debug!(rule = index, "field denied");
				return EvaluationResult::denied(DenyReason::FieldDenied(field.to_string()));
			}
		}

		debug!(rule = index, "access allowed");
		return EvaluationResult::allowed();
	}

	debug!("no matching rule");
	EvaluationResult::denied(DenyReason::NoMatchingRule)
}

fn condition_holds(rule: &Rule, input: &EvaluationInput<'_>) -> bool {
	match &rule.condition {
		None => true,
		Some(Condition::Predicate(predicate)) => predicate.test(input.context, input.record),
		Some(Condition::Expression(expression)) => {
			expression.evaluate(input.context, input.record, &input.options)
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use serde_json::{json, Value};
	use zopio_auth_rbac::{Action, EvaluationOptions, Expression, FieldAccess, Record, UserContext};

	fn record(value: Value) -> Record {
		value.as_object().cloned().unwrap()
	}

	fn ctx() -> UserContext {
		UserContext::new("42", "user")
	}

	mod matching {
		use super::*;

		#[test]
		fn no_key_match_denies() {
			let rules = vec![Rule::can(Action::Read, "Dashboard")];
			let ctx = ctx();
			let result = evaluate(&EvaluationInput::new(&rules, &ctx, Action::Delete, "Dashboard"));
			assert!(!result.can);
			assert_eq!(result.reason, Some(DenyReason::NoMatchingRule));
		}

		#[test]
		fn empty_rule_set_denies() {
			let ctx = ctx();
			let result = evaluate(&EvaluationInput::new(&[], &ctx, Action::Read, "Dashboard"));
			assert_eq!(result, EvaluationResult::denied(DenyReason::NoMatchingRule));
		}

		#[test]
		fn unconditional_match_allows() {
			let rules = vec![Rule::can(Action::Read, "Dashboard")];
			let ctx = ctx();
			let result = evaluate(&EvaluationInput::new(&rules, &ctx, Action::Read, "Dashboard"));
			assert_eq!(result, EvaluationResult::allowed());
		}

		#[test]
		fn keys_are_exact() {
			let rules = vec![
				Rule::can(Action::Manage, "Dashboard"),
				Rule::can(Action::Read, "all"),
				Rule::can(Action::Read, "dashboard"),
			];
			let ctx = ctx();
			let result = evaluate(&EvaluationInput::new(&rules, &ctx, Action::Read, "Dashboard"));
			assert!(!result.can);
		}

		#[test]
		fn inverted_rules_are_skipped() {
			let ctx = ctx();
			let only_cannot = vec![Rule::cannot(Action::Read, "Dashboard")];
			let result = evaluate(&EvaluationInput::new(&only_cannot, &ctx, Action::Read, "Dashboard"));
			assert_eq!(result.reason, Some(DenyReason::NoMatchingRule));

			let cannot_then_can = vec![
				Rule::cannot(Action::Read, "Dashboard"),
				Rule::can(Action::Read, "Dashboard"),
			];
			let result =
				evaluate(&EvaluationInput::new(&cannot_then_can, &ctx, Action::Read, "Dashboard"));
			assert!(result.can);
		}
	}

	mod conditions {
		use super::*;

		#[test]
		fn false_predicate_continues_to_later_rules() {
			let rules = vec![
				Rule::can(Action::Read, "Doc").with_predicate(|_, _| false),
				Rule::can(Action::Read, "Doc")
					.with_field_permission("body", FieldAccess::None),
			];
			let ctx = ctx();
			let result = evaluate(
				&EvaluationInput::new(&rules, &ctx, Action::Read, "Doc").with_field("body"),
			);
			assert_eq!(result.reason, Some(DenyReason::FieldDenied("body".to_string())));
		}

		#[test]
		fn predicate_receives_record() {
			let rules = vec![Rule::can(Action::Update, "Doc").with_predicate(|ctx, record| {
				record.and_then(|r| r.get("ownerId")).and_then(Value::as_str) == Some(ctx.id.as_str())
			})];
			let ctx = ctx();
			let own = record(json!({"ownerId": "42"}));
			let other = record(json!({"ownerId": "7"}));

			let input = EvaluationInput::new(&rules, &ctx, Action::Update, "Doc");
			assert!(evaluate(&input.with_record(&own)).can);
			assert!(!evaluate(&input.with_record(&other)).can);
			assert!(!evaluate(&input).can);
		}

		#[test]
		fn expression_substitutes_placeholders() {
			let rules = vec![Rule::can(Action::Update, "Profile")
				.with_expression(Expression::record(json!({"userId": "${user.id}"})))];
			let ctx = ctx();
			let input = EvaluationInput::new(&rules, &ctx, Action::Update, "Profile");
			assert!(evaluate(&input.with_record(&record(json!({"userId": "42"})))).can);
			assert!(!evaluate(&input.with_record(&record(json!({"userId": "99"})))).can);
		}

		#[test]
		fn strict_placeholders_fail_closed() {
			let rules = vec![Rule::can(Action::Read, "Team")
				.with_expression(Expression::record(json!({"teamId": "${user.teamId}"})))];
			let ctx = ctx();
			let unassigned = record(json!({"teamId": ""}));
			let input = EvaluationInput::new(&rules, &ctx, Action::Read, "Team").with_record(&unassigned);

			assert!(evaluate(&input).can);
			let strict = input.with_options(EvaluationOptions {
				strict_placeholders: true,
			});
			assert!(!evaluate(&strict).can);
		}
	}

	mod fields {
		use super::*;

		#[test]
		fn explicit_none_short_circuits() {
			let rules = vec![
				Rule::can(Action::Read, "Profile").with_field_permission("ssn", FieldAccess::None),
				Rule::can(Action::Read, "Profile"),
			];
			let ctx = ctx();
			let result = evaluate(
				&EvaluationInput::new(&rules, &ctx, Action::Read, "Profile").with_field("ssn"),
			);
			assert!(!result.can);
			assert_eq!(result.reason.unwrap().to_string(), "No access to field 'ssn'");
		}

		#[test]
		fn missing_entry_is_allowed() {
			let rules =
				vec![Rule::can(Action::Read, "Profile").with_field_permission("ssn", FieldAccess::None)];
			let ctx = ctx();
			let result = evaluate(
				&EvaluationInput::new(&rules, &ctx, Action::Read, "Profile").with_field("email"),
			);
			assert!(result.can);
		}

		#[test]
		fn field_map_ignored_without_field() {
			let rules =
				vec![Rule::can(Action::Read, "Profile").with_field_permission("ssn", FieldAccess::None)];
			let ctx = ctx();
			let result = evaluate(&EvaluationInput::new(&rules, &ctx, Action::Read, "Profile"));
			assert!(result.can);
		}
	}

	const RESOURCES: &[&str] = &["Dashboard", "Profile", "Doc"];
	const USERS: &[&str] = &["42", "7"];
	const FIELDS: &[&str] = &["ssn", "email"];

	fn arb_rule() -> impl Strategy<Value = Rule> {
		(
			prop::sample::select(Action::all()),
			prop::sample::select(RESOURCES),
			any::<bool>(),
			any::<bool>(),
			any::<bool>(),
		)
			.prop_map(|(action, resource, inverted, conditional, hides_ssn)| {
				let mut rule = if inverted {
					Rule::cannot(action, resource)
				} else {
					Rule::can(action, resource)
				};
				if conditional {
					rule = rule.with_predicate(|ctx, _| ctx.id == "42");
				}
				if hides_ssn {
					rule = rule.with_field_permission("ssn", FieldAccess::None);
				}
				rule
			})
	}

	proptest! {
		#[test]
		fn first_applicable_rule_decides(
			rules in prop::collection::vec(arb_rule(), 0..12),
			action in prop::sample::select(Action::all()),
			resource in prop::sample::select(RESOURCES),
			user_id in prop::sample::select(USERS),
			field in prop::option::of(prop::sample::select(FIELDS)),
		) {
			let ctx = UserContext::new(user_id, "user");
			let mut input = EvaluationInput::new(&rules, &ctx, action, resource);
			if let Some(field) = field {
				input = input.with_field(field);
			}
			let result = evaluate(&input);

			let first = rules.iter().find(|rule| {
				!rule.inverted
					&& rule.matches_key(action, resource)
					&& (rule.condition.is_none() || user_id == "42")
			});
			let expected = match first {
				None => EvaluationResult::denied(DenyReason::NoMatchingRule),
				Some(rule) => match field {
					Some(f) if rule.denies_field(f) => {
						EvaluationResult::denied(DenyReason::FieldDenied(f.to_string()))
					}
					_ => EvaluationResult::allowed(),
				},
			};
			prop_assert_eq!(result, expected);
		}

		#[test]
		fn denial_always_has_reason(
			rules in prop::collection::vec(arb_rule(), 0..8),
			action in prop::sample::select(Action::all()),
			resource in prop::sample::select(RESOURCES),
		) {
			let ctx = UserContext::new("7", "user");
			let result = evaluate(&EvaluationInput::new(&rules, &ctx, action, resource).with_field("ssn"));
			prop_assert_eq!(result.can, result.reason.is_none());
		}
	}
}
