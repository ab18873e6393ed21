// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Combination of role-derived and attribute-based rules.
//!
//! The evaluator is order-sensitive, so combination is plain concatenation:
//! RBAC rules first, ABAC rules after. No deduplication or conflict detection.

use std::sync::LazyLock;

use zopio_auth_rbac::{Expression, RoleRegistry, Rule, RuleTemplate};

use crate::policies::abac_rules;

static COMBINED: LazyLock<Vec<Rule>> =
	LazyLock::new(|| combine(rbac_rules(RoleRegistry::builtin()), abac_rules()));

/// Lowers role templates into raw rules.
///
/// Each non-inverted template becomes one rule gated on the role name, plus
/// the template's conditions over the record when it has any. Placeholders
/// stay in the rule and are resolved per evaluation. Inverted templates are
/// dropped because the evaluator skips inverted rules anyway.
pub fn rbac_rules(registry: &RoleRegistry) -> Vec<Rule> {
	registry
		.iter()
		.flat_map(|(role, templates)| {
			templates
				.iter()
				.filter(|template| !template.inverted)
				.map(move |template| template_rule(role, template))
		})
		.collect()
}

fn template_rule(role: &str, template: &RuleTemplate) -> Rule {
	let gate = Expression::role(role);
	let expression = match &template.conditions {
		Some(conditions) => Expression::All(vec![gate, Expression::record(conditions.clone())]),
		None => gate,
	};

	let mut rule = Rule::can(template.action, template.subject.clone()).with_expression(expression);
	rule.field_permissions = template.field_permissions.clone();
	rule
}

pub fn combine(rbac: Vec<Rule>, abac: Vec<Rule>) -> Vec<Rule> {
	let mut rules = rbac;
	rules.extend(abac);
	rules
}

/// Built-in RBAC rules followed by the built-in ABAC policies, computed once.
pub fn combined_rules() -> &'static [Rule] {
	&COMBINED
}
