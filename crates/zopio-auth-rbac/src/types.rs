// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for rule-based access checks.
//!
//! - [`Action`]: the closed set of operations a rule can grant
//! - [`Rule`]: the atomic unit of policy, keyed by resource and action
//! - [`Condition`]: either a native predicate or a declarative [`Expression`]
//! - [`UserContext`]: the resolved subject of a check, passed explicitly
//!
//! A rule carries at most one condition representation. The enum makes the
//! "predicate XOR expression XOR nothing" shape impossible to violate.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::RbacError;
use crate::expression::Expression;

/// A concrete data instance being checked, such as a profile row.
pub type Record = Map<String, Value>;

/// Operations that rules grant or revoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
	/// Wildcard on the ability path: matches every other action.
	Manage,
	Create,
	Read,
	Update,
	Delete,
}

impl Action {
	/// Returns all actions.
	pub fn all() -> &'static [Action] {
		&[
			Action::Manage,
			Action::Create,
			Action::Read,
			Action::Update,
			Action::Delete,
		]
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			Action::Manage => "manage",
			Action::Create => "create",
			Action::Read => "read",
			Action::Update => "update",
			Action::Delete => "delete",
		}
	}
}

impl fmt::Display for Action {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl FromStr for Action {
	type Err = RbacError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Action::all()
			.iter()
			.copied()
			.find(|a| a.as_str() == s)
			.ok_or_else(|| RbacError::UnknownAction(s.to_string()))
	}
}

/// Access level for a single field within a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldAccess {
	/// Blocks read and write of the field even when the rule matches.
	None,
	Read,
	Write,
}

impl FieldAccess {
	pub fn is_denied(&self) -> bool {
		matches!(self, FieldAccess::None)
	}
}

/// The resolved identity a check runs against.
///
/// Built once per request by the authentication layer and never mutated
/// during a check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserContext {
	pub id: String,
	pub role: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub organization_id: Option<String>,
	#[serde(default)]
	pub attributes: BTreeMap<String, Value>,
}

impl UserContext {
	pub fn new(id: impl Into<String>, role: impl Into<String>) -> Self {
		Self {
			id: id.into(),
			role: role.into(),
			organization_id: None,
			attributes: BTreeMap::new(),
		}
	}

	/// Builder: set organization_id.
	pub fn with_organization(mut self, organization_id: impl Into<String>) -> Self {
		self.organization_id = Some(organization_id.into());
		self
	}

	/// Builder: add an attribute.
	pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.attributes.insert(key.into(), value.into());
		self
	}

	/// Resolves a dotted path such as `id`, `organizationId` or
	/// `attributes.department`.
	///
	/// A first segment that is not a context field is looked up in
	/// `attributes`, so `department` and `attributes.department` resolve alike.
	pub fn lookup(&self, path: &str) -> Option<Value> {
		let mut segments = path.split('.');
		let head = segments.next().filter(|s| !s.is_empty())?;

		let root = match head {
			"id" => Value::String(self.id.clone()),
			"role" => Value::String(self.role.clone()),
			"organizationId" | "organization_id" => Value::String(self.organization_id.clone()?),
			"attributes" => Value::Object(self.attributes_object()),
			other => self.attributes.get(other)?.clone(),
		};

		segments.try_fold(root, |current, segment| match current {
			Value::Object(mut map) => map.remove(segment),
			Value::Array(items) => segment
				.parse::<usize>()
				.ok()
				.and_then(|i| items.into_iter().nth(i)),
			_ => None,
		})
	}

	/// JSON view used by context queries: attributes flattened at the top
	/// level, shadowed by `id`, `role`, `organizationId` and `attributes`.
	pub fn view(&self) -> Value {
		let mut map = self.attributes_object();
		map.insert("attributes".to_string(), Value::Object(self.attributes_object()));
		map.insert("id".to_string(), Value::String(self.id.clone()));
		map.insert("role".to_string(), Value::String(self.role.clone()));
		if let Some(org) = &self.organization_id {
			map.insert("organizationId".to_string(), Value::String(org.clone()));
		}
		Value::Object(map)
	}

	fn attributes_object(&self) -> Map<String, Value> {
		self
			.attributes
			.iter()
			.map(|(k, v)| (k.clone(), v.clone()))
			.collect()
	}
}

type PredicateFn = dyn Fn(&UserContext, Option<&Record>) -> bool + Send + Sync;

/// A native condition over `(context, record)`.
#[derive(Clone)]
pub struct Predicate(Arc<PredicateFn>);

impl Predicate {
	pub fn new<F>(f: F) -> Self
	where
		F: Fn(&UserContext, Option<&Record>) -> bool + Send + Sync + 'static,
	{
		Self(Arc::new(f))
	}

	pub fn test(&self, context: &UserContext, record: Option<&Record>) -> bool {
		(self.0)(context, record)
	}
}

impl fmt::Debug for Predicate {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str("Predicate(<fn>)")
	}
}

#[derive(Debug, Clone)]
pub enum Condition {
	Predicate(Predicate),
	Expression(Expression),
}

/// Per-evaluation knobs that do not change rule data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluationOptions {
	/// Fail a condition when a placeholder does not resolve, instead of
	/// substituting the empty string.
	pub strict_placeholders: bool,
}

/// An access rule keyed by `(resource, action)`.
#[derive(Debug, Clone)]
pub struct Rule {
	pub resource: String,
	pub action: Action,
	pub condition: Option<Condition>,
	pub field_permissions: Option<BTreeMap<String, FieldAccess>>,
	pub inverted: bool,
}

impl Rule {
	/// Creates an unconditional grant.
	pub fn can(action: Action, resource: impl Into<String>) -> Self {
		Self {
			resource: resource.into(),
			action,
			condition: None,
			field_permissions: None,
			inverted: false,
		}
	}

	/// Creates an explicit revocation.
	pub fn cannot(action: Action, resource: impl Into<String>) -> Self {
		Self {
			inverted: true,
			..Self::can(action, resource)
		}
	}

	/// Builder: attach a native predicate.
	pub fn with_predicate<F>(mut self, f: F) -> Self
	where
		F: Fn(&UserContext, Option<&Record>) -> bool + Send + Sync + 'static,
	{
		self.condition = Some(Condition::Predicate(Predicate::new(f)));
		self
	}

	/// Builder: attach a declarative expression.
	pub fn with_expression(mut self, expression: Expression) -> Self {
		self.condition = Some(Condition::Expression(expression));
		self
	}

	/// Builder: set the access level for one field.
	pub fn with_field_permission(mut self, field: impl Into<String>, access: FieldAccess) -> Self {
		self
			.field_permissions
			.get_or_insert_with(BTreeMap::new)
			.insert(field.into(), access);
		self
	}

	pub fn matches_key(&self, action: Action, resource: &str) -> bool {
		self.action == action && self.resource == resource
	}

	/// Returns true only for an explicit `none` entry. Fields absent from the
	/// map are allowed.
	pub fn denies_field(&self, field: &str) -> bool {
		self
			.field_permissions
			.as_ref()
			.and_then(|perms| perms.get(field))
			.is_some_and(FieldAccess::is_denied)
	}
}
