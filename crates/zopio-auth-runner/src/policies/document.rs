// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Document ownership and sharing.
//!
//! Owners have full access to their documents. Documents with
//! `visibility = "organization"` are readable by members of the owning
//! organization.

use serde_json::json;
use zopio_auth_rbac::{Action, Expression, Rule};

pub const DOCUMENT: &str = "Document";

fn owned() -> Expression {
	Expression::record(json!({ "ownerId": "${user.id}" }))
}

fn shared_with_organization() -> Expression {
	Expression::All(vec![
		Expression::context(json!({ "organizationId": { "$exists": true } })),
		Expression::record(json!({
			"organizationId": "${user.organizationId}",
			"visibility": "organization",
		})),
	])
}

pub fn rules() -> Vec<Rule> {
	vec![
		Rule::can(Action::Read, DOCUMENT).with_expression(Expression::Any(vec![
			owned(),
			shared_with_organization(),
		])),
		Rule::can(Action::Create, DOCUMENT),
		Rule::can(Action::Update, DOCUMENT).with_expression(owned()),
		Rule::can(Action::Delete, DOCUMENT).with_expression(owned()),
	]
}
