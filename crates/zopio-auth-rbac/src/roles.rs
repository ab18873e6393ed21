// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Role rule registry.
//!
//! A [`RoleRegistry`] maps role names to [`RuleTemplate`] lists. Templates are
//! validated once, when the registry is built, and the registry is read-only
//! afterwards. Lookups for unknown roles return no templates, so a missing or
//! misspelled role fails closed.
//!
//! Registries can also be loaded from TOML:
//!
//! ```toml
//! [[roles.user]]
//! action = "update"
//! subject = "Profile"
//! conditions = { userId = "${user.id}" }
//! field_permissions = { ssn = "none" }
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::RbacError;
use crate::query::validate_query;
use crate::substitution::validate_placeholders;
use crate::types::{Action, FieldAccess};

/// Subject wildcard matching every resource on the ability path.
pub const ALL_SUBJECTS: &str = "all";

pub const ADMIN_ROLE: &str = "admin";
pub const USER_ROLE: &str = "user";
pub const VIEWER_ROLE: &str = "viewer";

static BUILTIN: LazyLock<RoleRegistry> = LazyLock::new(builtin_roles);

/// A rule as authored in a role table, before placeholder resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleTemplate {
	pub action: Action,
	pub subject: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub conditions: Option<Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub field_permissions: Option<BTreeMap<String, FieldAccess>>,
	#[serde(default)]
	pub inverted: bool,
}

impl RuleTemplate {
	pub fn can(action: Action, subject: impl Into<String>) -> Self {
		Self {
			action,
			subject: subject.into(),
			conditions: None,
			field_permissions: None,
			inverted: false,
		}
	}

	pub fn cannot(action: Action, subject: impl Into<String>) -> Self {
		Self {
			inverted: true,
			..Self::can(action, subject)
		}
	}

	/// Builder: set the condition query.
	pub fn with_conditions(mut self, conditions: Value) -> Self {
		self.conditions = Some(conditions);
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

	fn validate(&self) -> Result<(), String> {
		if self.subject.trim().is_empty() {
			return Err("subject must not be empty".to_string());
		}
		if let Some(conditions) = &self.conditions {
			validate_query(conditions).map_err(|e| e.to_string())?;
			validate_placeholders(conditions).map_err(|e| e.to_string())?;
		}
		Ok(())
	}
}

#[derive(Debug, Deserialize)]
struct RolesFile {
	#[serde(default)]
	roles: BTreeMap<String, Vec<RuleTemplate>>,
}

/// Static `role -> templates` table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RoleRegistry {
	roles: BTreeMap<String, Vec<RuleTemplate>>,
}

impl RoleRegistry {
	/// Builds a registry, validating every template.
	pub fn new(roles: BTreeMap<String, Vec<RuleTemplate>>) -> Result<Self, RbacError> {
		for (role, templates) in &roles {
			for (index, template) in templates.iter().enumerate() {
				template
					.validate()
					.map_err(|message| RbacError::InvalidTemplate {
						role: role.clone(),
						index,
						message,
					})?;
			}
		}

		debug!(roles = roles.len(), "role registry built");
		Ok(Self { roles })
	}

	/// The process-wide built-in role tables.
	pub fn builtin() -> &'static RoleRegistry {
		&BUILTIN
	}

	pub fn from_toml_str(content: &str) -> Result<Self, RbacError> {
		let file: RolesFile = toml::from_str(content)?;
		Self::new(file.roles)
	}

	pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, RbacError> {
		let path = path.as_ref();
		let content = std::fs::read_to_string(path).map_err(|source| RbacError::FileRead {
			path: path.to_path_buf(),
			source,
		})?;
		let registry = Self::from_toml_str(&content)?;
		info!(path = %path.display(), roles = registry.roles.len(), "loaded role tables");
		Ok(registry)
	}

	/// Templates for `role`; empty for unknown roles.
	pub fn templates(&self, role: &str) -> &[RuleTemplate] {
		self.roles.get(role).map(Vec::as_slice).unwrap_or(&[])
	}

	pub fn contains_role(&self, role: &str) -> bool {
		self.roles.contains_key(role)
	}

	pub fn role_names(&self) -> impl Iterator<Item = &str> {
		self.roles.keys().map(String::as_str)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, &[RuleTemplate])> {
		self
			.roles
			.iter()
			.map(|(role, templates)| (role.as_str(), templates.as_slice()))
	}
}

fn builtin_roles() -> RoleRegistry {
	let mut roles = BTreeMap::new();

	roles.insert(
		ADMIN_ROLE.to_string(),
		vec![RuleTemplate::can(Action::Manage, ALL_SUBJECTS)],
	);

	roles.insert(
		USER_ROLE.to_string(),
		vec![
			RuleTemplate::can(Action::Read, "Dashboard"),
			RuleTemplate::can(Action::Read, "Profile")
				.with_conditions(json!({ "userId": "${user.id}" }))
				.with_field_permission("ssn", FieldAccess::None)
				.with_field_permission("taxId", FieldAccess::None),
			RuleTemplate::can(Action::Update, "Profile")
				.with_conditions(json!({ "userId": "${user.id}" }))
				.with_field_permission("role", FieldAccess::None)
				.with_field_permission("ssn", FieldAccess::None)
				.with_field_permission("taxId", FieldAccess::None),
			RuleTemplate::can(Action::Read, "Organization")
				.with_conditions(json!({ "id": "${user.organizationId}" })),
			RuleTemplate::cannot(Action::Delete, "Organization"),
		],
	);

	roles.insert(
		VIEWER_ROLE.to_string(),
		vec![RuleTemplate::can(Action::Read, "Dashboard")],
	);

	RoleRegistry { roles }
}
