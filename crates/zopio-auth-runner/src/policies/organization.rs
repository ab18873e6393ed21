// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Organization membership policies.

use serde_json::Value;
use zopio_auth_rbac::{Action, FieldAccess, Record, Rule, UserContext};

/// Context attribute holding the user's role within their organization.
pub const ORG_ROLE_ATTRIBUTE: &str = "orgRole";

pub fn rules() -> Vec<Rule> {
	vec![
		Rule::can(Action::Read, "Organization").with_predicate(is_member),
		Rule::can(Action::Update, "Organization")
			.with_predicate(|ctx, record| is_member(ctx, record) && is_org_admin(ctx))
			.with_field_permission("billingPlan", FieldAccess::None),
		Rule::can(Action::Read, "Project").with_predicate(belongs_to_org),
	]
}

fn is_member(ctx: &UserContext, record: Option<&Record>) -> bool {
	let Some(org_id) = ctx.organization_id.as_deref() else {
		return false;
	};
	record.and_then(|r| r.get("id")).and_then(Value::as_str) == Some(org_id)
}

fn belongs_to_org(ctx: &UserContext, record: Option<&Record>) -> bool {
	let Some(org_id) = ctx.organization_id.as_deref() else {
		return false;
	};
	record
		.and_then(|r| r.get("organizationId"))
		.and_then(Value::as_str)
		== Some(org_id)
}

fn is_org_admin(ctx: &UserContext) -> bool {
	matches!(
		ctx.attributes.get(ORG_ROLE_ATTRIBUTE).and_then(Value::as_str),
		Some("admin" | "owner")
	)
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	fn record(value: Value) -> Record {
		value.as_object().cloned().unwrap()
	}

	#[test]
	fn member_matches_own_organization() {
		let ctx = UserContext::new("1", "user").with_organization("acme");
		assert!(is_member(&ctx, Some(&record(json!({"id": "acme"})))));
		assert!(!is_member(&ctx, Some(&record(json!({"id": "globex"})))));
		assert!(!is_member(&ctx, None));
	}

	#[test]
	fn user_without_organization_is_never_a_member() {
		let ctx = UserContext::new("1", "user");
		assert!(!is_member(&ctx, Some(&record(json!({"id": ""})))));
		assert!(!belongs_to_org(&ctx, Some(&record(json!({"organizationId": null})))));
	}

	#[test]
	fn org_admin_reads_role_attribute() {
		let admin = UserContext::new("1", "user").with_attribute(ORG_ROLE_ATTRIBUTE, "owner");
		let member = UserContext::new("2", "user").with_attribute(ORG_ROLE_ATTRIBUTE, "member");
		assert!(is_org_admin(&admin));
		assert!(!is_org_admin(&member));
		assert!(!is_org_admin(&UserContext::new("3", "user")));
	}

	#[test]
	fn project_access_follows_organization() {
		let ctx = UserContext::new("1", "user").with_organization("acme");
		assert!(belongs_to_org(&ctx, Some(&record(json!({"organizationId": "acme"})))));
		assert!(!belongs_to_org(&ctx, Some(&record(json!({"organizationId": "globex"})))));
	}
}
