// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use http::Request;
use tracing::{info, instrument, warn};
use zopio_auth_audit::{AuditService, AuditedEvaluator};
use zopio_auth_config::{load_config, AccessConfig};
use zopio_auth_rbac::{Ability, Action, EvaluationOptions, RoleRegistry, Rule, UserContext};
use zopio_auth_runner::{
	abac_rules, authorize_with, combine, combined_rules, evaluate, rbac_rules, Authorization,
	EvaluationInput, EvaluationResult,
};

use crate::error::Result;

/// Role tables, the combined rule list, evaluation options and an optional
/// audit pipeline, assembled once and shared by request handlers.
///
/// Cloning is cheap; clones share the rules and the audit service.
#[derive(Clone)]
pub struct AccessControl {
	registry: Arc<RoleRegistry>,
	rules: Arc<[Rule]>,
	options: EvaluationOptions,
	auditor: Option<AuditedEvaluator>,
}

impl AccessControl {
	/// Built-in role tables and policies, lenient placeholders, no audit.
	pub fn builtin() -> Self {
		Self {
			registry: Arc::new(RoleRegistry::builtin().clone()),
			rules: combined_rules().into(),
			options: EvaluationOptions::default(),
			auditor: None,
		}
	}

	/// Loads configuration from the standard sources and builds from it.
	pub fn load() -> Result<Self> {
		let config = load_config()?;
		Self::from_config(&config)
	}

	/// Builds from resolved configuration.
	///
	/// When audit is enabled this starts the audit service, so it must be
	/// called from within a tokio runtime.
	#[instrument(level = "debug", skip(config), fields(audit = config.audit.enabled))]
	pub fn from_config(config: &AccessConfig) -> Result<Self> {
		let mut access = match &config.policy.roles_file {
			Some(path) => Self::builtin().with_registry(RoleRegistry::load_from_path(path)?),
			None => Self::builtin(),
		};

		access.options.strict_placeholders = config.policy.strict_placeholders;

		if config.audit.enabled {
			let service = AuditService::from_config(&config.audit)?;
			access.auditor = Some(AuditedEvaluator::new(Arc::new(service)));
		}

		info!(
			roles = access.registry.role_names().count(),
			rules = access.rules.len(),
			strict_placeholders = access.options.strict_placeholders,
			audit = access.auditor.is_some(),
			"access control ready"
		);
		Ok(access)
	}

	/// Replaces the role tables and rebuilds the combined rules from them.
	pub fn with_registry(mut self, registry: RoleRegistry) -> Self {
		self.rules = combine(rbac_rules(&registry), abac_rules()).into();
		self.registry = Arc::new(registry);
		self
	}

	pub fn with_options(mut self, options: EvaluationOptions) -> Self {
		self.options = options;
		self
	}

	pub fn with_audit(mut self, service: Arc<AuditService>) -> Self {
		self.auditor = Some(AuditedEvaluator::new(service));
		self
	}

	pub fn registry(&self) -> &RoleRegistry {
		&self.registry
	}

	pub fn rules(&self) -> &[Rule] {
		&self.rules
	}

	pub fn options(&self) -> EvaluationOptions {
		self.options
	}

	pub fn is_audited(&self) -> bool {
		self.auditor.is_some()
	}

	/// An evaluation input over this instance's rules and options. Chain
	/// `with_record` and `with_field` as needed.
	pub fn input<'a>(
		&'a self,
		context: &'a UserContext,
		action: Action,
		resource: &'a str,
	) -> EvaluationInput<'a> {
		EvaluationInput::new(&self.rules, context, action, resource).with_options(self.options)
	}

	/// Evaluates `input`, queueing an audit record when audit is enabled.
	pub fn evaluate(&self, input: &EvaluationInput<'_>) -> EvaluationResult {
		match &self.auditor {
			Some(auditor) => auditor.evaluate(input),
			None => evaluate(input),
		}
	}

	/// Like [`evaluate`](Self::evaluate), but waits until the audit record is
	/// queued.
	pub async fn evaluate_and_wait(&self, input: &EvaluationInput<'_>) -> EvaluationResult {
		match &self.auditor {
			Some(auditor) => auditor.evaluate_and_wait(input).await,
			None => evaluate(input),
		}
	}

	/// Builds `context`'s ability under the same options as
	/// [`evaluate`](Self::evaluate).
	pub fn ability_for(&self, context: &UserContext) -> Ability {
		self.registry.ability_for_with(context, self.options)
	}

	/// Guards `request` for `(action, resource)`. Decisions are audited like
	/// direct evaluations.
	pub fn authorize<B>(
		&self,
		request: Request<B>,
		action: Action,
		resource: &str,
	) -> Authorization<B> {
		authorize_with(request, |context| {
			self.evaluate(&self.input(context, action, resource))
		})
	}

	/// Drains queued audit records. Records from clones that are still alive
	/// are not waited for.
	pub async fn shutdown(self) {
		let Some(auditor) = self.auditor else {
			return;
		};

		match Arc::try_unwrap(auditor.into_service()) {
			Ok(service) => service.shutdown().await,
			Err(_) => warn!("audit service still shared, skipping drain"),
		}
	}
}

impl Default for AccessControl {
	fn default() -> Self {
		Self::builtin()
	}
}

impl std::fmt::Debug for AccessControl {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AccessControl")
			.field("roles", &self.registry.role_names().collect::<Vec<_>>())
			.field("rules", &self.rules.len())
			.field("options", &self.options)
			.field("audited", &self.auditor.is_some())
			.finish()
	}
}
