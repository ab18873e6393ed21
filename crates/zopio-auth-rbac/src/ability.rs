// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! CASL-style abilities built from role templates.
//!
//! [`RoleRegistry::expand`] resolves a role's templates against a user, and
//! [`Ability`] answers `can(action, subject, record?)` over the result.
//!
//! Unlike the raw evaluator, an ability decides by the *last* relevant rule
//! whose conditions hold. A `cannot` declared after a `can` for the same pair
//! therefore wins. `manage` matches every action and the `all` subject matches
//! every resource.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::query::matches_object;
use crate::roles::{RoleRegistry, ALL_SUBJECTS};
use crate::substitution::{substitute, try_substitute};
use crate::types::{Action, EvaluationOptions, FieldAccess, Record, UserContext};

/// A template after placeholder resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AbilityRule {
	pub action: Action,
	pub subject: String,
	pub conditions: Option<Value>,
	pub field_permissions: Option<BTreeMap<String, FieldAccess>>,
	pub inverted: bool,
}

impl AbilityRule {
	fn is_relevant(&self, action: Action, subject: &str) -> bool {
		(self.action == action || self.action == Action::Manage)
			&& (self.subject == subject || self.subject == ALL_SUBJECTS)
	}

	/// Without a record a conditional grant still applies, since some
	/// instance may satisfy it, while a conditional revocation does not.
	fn matches_conditions(&self, record: Option<&Record>) -> bool {
		match (&self.conditions, record) {
			(None, _) => true,
			(Some(_), None) => !self.inverted,
			(Some(conditions), Some(record)) => matches_object(conditions, Some(record)),
		}
	}

	fn denies_field(&self, field: &str) -> bool {
		self
			.field_permissions
			.as_ref()
			.and_then(|perms| perms.get(field))
			.is_some_and(FieldAccess::is_denied)
	}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Ability {
	rules: Vec<AbilityRule>,
}

impl Ability {
	pub fn new(rules: Vec<AbilityRule>) -> Self {
		Self { rules }
	}

	pub fn rules(&self) -> &[AbilityRule] {
		&self.rules
	}

	/// The rule that decides `(action, subject, record)`, if any.
	pub fn relevant_rule_for(
		&self,
		action: Action,
		subject: &str,
		record: Option<&Record>,
	) -> Option<&AbilityRule> {
		self
			.rules
			.iter()
			.rev()
			.filter(|rule| rule.is_relevant(action, subject))
			.find(|rule| rule.matches_conditions(record))
	}

	pub fn can(&self, action: Action, subject: &str, record: Option<&Record>) -> bool {
		self
			.relevant_rule_for(action, subject, record)
			.is_some_and(|rule| !rule.inverted)
	}

	pub fn cannot(&self, action: Action, subject: &str, record: Option<&Record>) -> bool {
		!self.can(action, subject, record)
	}

	/// Like [`Ability::can`], additionally refusing fields the deciding rule
	/// marks `none`.
	pub fn can_field(
		&self,
		action: Action,
		subject: &str,
		field: &str,
		record: Option<&Record>,
	) -> bool {
		match self.relevant_rule_for(action, subject, record) {
			Some(rule) if !rule.inverted => !rule.denies_field(field),
			_ => false,
		}
	}
}

impl RoleRegistry {
	/// Resolves `role`'s templates for `context`. Unknown roles expand to
	/// nothing.
	pub fn expand(&self, role: &str, context: &UserContext) -> Vec<AbilityRule> {
		self.expand_with(role, context, EvaluationOptions::default())
	}

	/// Like [`expand`](Self::expand), honouring `options`. With
	/// `strict_placeholders`, a template whose conditions reference a missing
	/// attribute fails closed: a `can` is dropped and a `cannot` loses its
	/// conditions, so it applies to every record.
	pub fn expand_with(
		&self,
		role: &str,
		context: &UserContext,
		options: EvaluationOptions,
	) -> Vec<AbilityRule> {
		self
			.templates(role)
			.iter()
			.filter_map(|template| {
				let conditions = match &template.conditions {
					None => None,
					Some(conditions) if !options.strict_placeholders => {
						Some(substitute(conditions, context))
					}
					Some(conditions) => match try_substitute(conditions, context) {
						Ok(resolved) => Some(resolved),
						Err(e) if template.inverted => {
							debug!(subject = %template.subject, error = %e, "cannot rule applies unconditionally");
							None
						}
						Err(e) => {
							debug!(subject = %template.subject, error = %e, "can rule dropped");
							return None;
						}
					},
				};

				Some(AbilityRule {
					action: template.action,
					subject: template.subject.clone(),
					conditions,
					field_permissions: template.field_permissions.clone(),
					inverted: template.inverted,
				})
			})
			.collect()
	}

	pub fn ability_for(&self, context: &UserContext) -> Ability {
		self.ability_for_with(context, EvaluationOptions::default())
	}

	#[instrument(level = "debug", skip(self, context), fields(user_id = %context.id, role = %context.role))]
	pub fn ability_for_with(&self, context: &UserContext, options: EvaluationOptions) -> Ability {
		Ability::new(self.expand_with(&context.role, context, options))
	}
}

/// Builds an ability from the built-in role tables.
pub fn create_ability_for(context: &UserContext) -> Ability {
	RoleRegistry::builtin().ability_for(context)
}
