// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Access control for zopio.
//!
//! Combines role rules (RBAC) and attribute rules (ABAC) into one ordered
//! list, evaluates requests against it and optionally records every decision.
//!
//! # Features
//!
//! - **First match wins**: role rules are checked before attribute rules
//! - **Field permissions**: a matched rule can hide individual fields
//! - **Abilities**: per-user rule sets with `can` / `cannot` checks
//! - **Request guard**: 401/403 responses over `http::Request`
//! - **Decision audit**: async pipeline to tracing, JSON-lines files or memory
//!
//! # Example
//!
//! ```ignore
//! use zopio_auth::{AccessControl, Action, UserContext};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = zopio_auth::load_config()?;
//!     zopio_auth::init_tracing(&config.logging)?;
//!
//!     let access = AccessControl::from_config(&config)?;
//!
//!     let user = UserContext::new("42", "user");
//!     let record = serde_json::json!({ "userId": "42" });
//!     let record = record.as_object().unwrap();
//!
//!     let result = access.evaluate(
//!         &access
//!             .input(&user, Action::Update, "Profile")
//!             .with_record(record),
//!     );
//!     assert!(result.can);
//!
//!     access.shutdown().await;
//!     Ok(())
//! }
//! ```

mod access;
mod error;

pub use access::AccessControl;
pub use error::{AccessControlError, Result};

// Re-export the types callers need for convenience
pub use zopio_auth_audit::{AuditRecord, AuditService, AuditSink, MemoryAuditSink};
pub use zopio_auth_config::{
	init_tracing, load_config, load_config_with_file, AccessConfig, ConfigError, FileSinkConfig,
	OutcomeFilter, QueueOverflowPolicy,
};
pub use zopio_auth_rbac::{
	create_ability_for, Ability, Action, EvaluationOptions, Expression, FieldAccess, Record,
	RoleRegistry, Rule, RuleTemplate, UserContext,
};
pub use zopio_auth_runner::{Authorization, DenyReason, EvaluationInput, EvaluationResult};
